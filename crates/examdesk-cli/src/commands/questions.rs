//! `examdesk questions ...` (admin).

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examdesk_core::admin::QuestionManager;
use examdesk_core::lettering::lettered_options;
use examdesk_core::model::QuestionUpdate;
use examdesk_core::routes::Route;

use super::{confirm, truncate, warn_if_stale, App};
use crate::QuestionsAction;

pub async fn execute(config: Option<&Path>, action: QuestionsAction) -> Result<()> {
    match action {
        QuestionsAction::List { exam_id } => list(config, exam_id).await,
        QuestionsAction::Add { exam_id, file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read questions from stdin")?;
                    buf
                }
            };
            add(config, exam_id, &text).await
        }
        QuestionsAction::Delete {
            exam_id,
            question_id,
            yes,
        } => delete(config, exam_id, question_id, yes).await,
        QuestionsAction::Edit {
            exam_id,
            question_id,
            text,
            subject,
            difficulty,
            marks,
            options,
            correct_answer,
            context,
        } => {
            let update = QuestionUpdate {
                question_text: text,
                subject,
                difficulty,
                marks,
                options,
                correct_answer,
                question_context: context,
                ..Default::default()
            };
            let app = App::for_route(config, Route::QuestionManager(exam_id))?;
            let mut manager = QuestionManager::new(&app.api, exam_id);
            let question = manager.update_question(question_id, &update).await?;
            println!(
                "{} (question {})",
                manager.toast().message().unwrap_or("Question updated"),
                question.id
            );
            warn_if_stale(manager.is_stale());
            Ok(())
        }
    }
}

async fn list(config: Option<&Path>, exam_id: u64) -> Result<()> {
    let app = App::for_route(config, Route::QuestionManager(exam_id))?;
    let mut manager = QuestionManager::new(&app.api, exam_id);
    manager.refresh().await?;

    if let Some(exam) = manager.exam() {
        println!(
            "{} ({} questions, {} marks)",
            exam.title, exam.question_count, exam.total_marks
        );
    }
    if manager.questions().is_empty() {
        println!("No questions yet. Add some with `examdesk questions add {exam_id} --file <json>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Question", "Options", "Answer", "Marks"]);
    for q in manager.questions() {
        let options: Vec<String> = lettered_options(&q.options)
            .into_iter()
            .map(|(letter, text)| format!("{letter}. {}", truncate(text, 30)))
            .collect();
        table.add_row(vec![
            Cell::new(q.id),
            Cell::new(&q.question_type),
            Cell::new(truncate(&q.question_text, 60)),
            Cell::new(options.join("\n")),
            Cell::new(q.correct_answer.as_deref().unwrap_or("-")),
            Cell::new(q.marks),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn add(config: Option<&Path>, exam_id: u64, text: &str) -> Result<()> {
    let app = App::for_route(config, Route::QuestionManager(exam_id))?;
    let mut manager = QuestionManager::new(&app.api, exam_id);
    manager.bulk_add(text).await?;
    println!("{}", manager.toast().message().unwrap_or("Questions added"));
    warn_if_stale(manager.is_stale());
    Ok(())
}

async fn delete(config: Option<&Path>, exam_id: u64, question_id: u64, yes: bool) -> Result<()> {
    let app = App::for_route(config, Route::QuestionManager(exam_id))?;
    let mut manager = QuestionManager::new(&app.api, exam_id);
    manager.refresh().await?;
    manager.request_delete(question_id)?;

    let label = truncate(manager.delete_modal().label().unwrap_or_default(), 60);
    if !confirm(&format!("Delete question \"{label}\"?"), yes)? {
        manager.cancel_delete();
        println!("Cancelled");
        return Ok(());
    }
    manager.confirm_delete().await?;
    println!("{}", manager.toast().message().unwrap_or("Question deleted"));
    warn_if_stale(manager.is_stale());
    Ok(())
}
