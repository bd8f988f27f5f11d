//! `examdesk exams ...` (admin).

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examdesk_core::admin::AdminConsole;
use examdesk_core::model::ExamForm;
use examdesk_core::routes::Route;

use super::{confirm, format_date, warn_if_stale, App};
use crate::ExamsAction;

pub async fn execute(config: Option<&Path>, action: ExamsAction) -> Result<()> {
    let app = App::for_route(config, Route::Admin)?;
    let mut console = AdminConsole::new(&app.api);

    match action {
        ExamsAction::List => {
            console.refresh().await?;
            if console.exams().is_empty() {
                println!("No exams yet. Create one with `examdesk exams create --title <title>`.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["ID", "Title", "Status", "Questions", "Marks", "Created"]);
            for exam in console.exams() {
                table.add_row(vec![
                    Cell::new(exam.id),
                    Cell::new(&exam.title),
                    Cell::new(if exam.is_active { "active" } else { "inactive" }),
                    Cell::new(exam.question_count),
                    Cell::new(exam.total_marks),
                    Cell::new(format_date(&exam.created_at)),
                ]);
            }
            println!("{table}");
        }
        ExamsAction::Create { title, description } => {
            let form = ExamForm { title, description };
            let exam = console.create_exam(&form).await?;
            println!("{} (id {})", console.toast().message().unwrap_or("Exam created"), exam.id);
            warn_if_stale(console.is_stale());
        }
        ExamsAction::Delete { exam_id, yes } => {
            console.refresh().await?;
            console.request_delete(exam_id)?;
            let label = console.delete_modal().label().unwrap_or_default().to_string();
            let prompt = format!(
                "Delete exam \"{label}\"? This also deletes all of its questions."
            );
            if !confirm(&prompt, yes)? {
                console.cancel_delete();
                println!("Cancelled");
                return Ok(());
            }
            console.confirm_delete().await?;
            println!("{}", console.toast().message().unwrap_or("Exam deleted"));
            warn_if_stale(console.is_stale());
        }
        ExamsAction::Toggle { exam_id } => {
            console.refresh().await?;
            let updated = console.toggle_status(exam_id).await?;
            let is_active = if console.is_stale() {
                Some(updated.is_active)
            } else {
                console.exam(exam_id).map(|e| e.is_active)
            };
            let status = match is_active {
                Some(true) => "active",
                Some(false) => "inactive",
                None => "removed",
            };
            println!(
                "{} Exam {exam_id} is now {status}.",
                console.toast().message().unwrap_or("Exam status updated.")
            );
            warn_if_stale(console.is_stale());
        }
    }
    Ok(())
}
