//! `examdesk take`: the grading flow.

use std::path::Path;

use anyhow::{bail, Context, Result};

use examdesk_core::grading::{GradingFlow, GradingState};
use examdesk_core::lettering::lettered_options;
use examdesk_core::model::{Id, Question};
use examdesk_core::presentation::bucket;
use examdesk_core::routes::Route;

use super::App;

/// Split `<question_id>=<answer>`.
pub fn parse_answer(raw: &str) -> Result<(Id, String)> {
    let Some((id, answer)) = raw.split_once('=') else {
        bail!("expected <question_id>=<answer>, got `{raw}`");
    };
    let id = id
        .trim()
        .parse::<Id>()
        .with_context(|| format!("invalid question id in `{raw}`"))?;
    Ok((id, answer.trim().to_string()))
}

pub async fn execute(config: Option<&Path>, exam_id: Id, raw_answers: Vec<String>) -> Result<()> {
    let answers = raw_answers
        .iter()
        .map(String::as_str)
        .map(parse_answer)
        .collect::<Result<Vec<_>>>()?;
    let app = App::for_route(config, Route::GradeExam)?;

    let mut flow = GradingFlow::new(&app.api);
    flow.select_exam(exam_id).await?;

    // Without answers this is a preview of the questions.
    if answers.is_empty() {
        if let GradingState::Answering {
            exam, questions, ..
        } = flow.state()
        {
            println!("{}\n", exam.title);
            for (i, q) in questions.iter().enumerate() {
                print_question(i + 1, q);
            }
            println!("Submit with `examdesk take {exam_id} --answer <question_id>=<answer>`.");
        }
        return Ok(());
    }
    for (question_id, answer) in &answers {
        flow.record_answer(*question_id, answer)?;
    }

    let result = flow.submit().await?;
    println!(
        "Score: {} / {} ({:.1}%, {})",
        result.score,
        result.total_marks,
        result.score_percentage,
        bucket(result.score_percentage)
    );
    if let Some(total) = result.total_questions {
        println!("Answered {} of {total} questions", answers.len());
    }
    if let Some(attempt_id) = result.attempt_id {
        println!("Review with `examdesk review {attempt_id}`");
    }
    flow.reset();
    Ok(())
}

fn print_question(number: usize, q: &Question) {
    let plural = if q.marks == 1 { "" } else { "s" };
    println!(
        "{number}. [id {}] {} ({} mark{plural})",
        q.id, q.question_text, q.marks
    );
    if let Some(ctx) = &q.question_context {
        println!("   Context: {ctx}");
    }
    for (letter, text) in lettered_options(&q.options) {
        println!("   {letter}. {text}");
    }
}
