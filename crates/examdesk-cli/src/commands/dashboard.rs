//! `examdesk dashboard`.

use std::path::Path;

use anyhow::{anyhow, Result};
use comfy_table::{Cell, Table};

use examdesk_core::auth::current_user;
use examdesk_core::cancel::CancelScope;
use examdesk_core::dashboard::{DashboardTab, LearnerDashboard};
use examdesk_core::routes::Route;

use super::{format_date, App};

pub async fn execute(config: Option<&Path>, tab: String) -> Result<()> {
    let tab: DashboardTab = tab.parse().map_err(|e: String| anyhow!(e))?;
    let app = App::for_route(config, Route::Dashboard)?;

    // Ctrl-C drops the in-flight load instead of printing a stale view.
    let scope = CancelScope::new();
    let token = scope.token();
    let load = LearnerDashboard::load(&app.api, &token);
    tokio::pin!(load);
    let mut dash = tokio::select! {
        res = &mut load => res?,
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            load.await?
        }
    };
    dash.switch_tab(tab);

    if let Ok(user) = current_user(&app.api, &app.session).await {
        println!("Welcome, {}!\n", user.username);
    }

    match dash.tab {
        DashboardTab::Available => print_available(&dash),
        DashboardTab::History => print_history(&dash),
    }
    Ok(())
}

fn print_available(dash: &LearnerDashboard) {
    if dash.available.is_empty() {
        println!("No exams available right now.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["ID", "Exam", "Questions", "Marks", "Last attempt"]);
    for card in &dash.available {
        let last = match &card.last_attempt {
            Some(a) => {
                let pct = a.computed_percentage();
                format!(
                    "{}/{} ({pct:.1}%, {}) #{}",
                    a.score,
                    a.total_marks,
                    examdesk_core::presentation::bucket(pct),
                    a.id
                )
            }
            None => "not attempted".to_string(),
        };
        table.add_row(vec![
            Cell::new(card.exam.id),
            Cell::new(&card.exam.title),
            Cell::new(card.exam.question_count),
            Cell::new(card.exam.total_marks),
            Cell::new(last),
        ]);
    }
    println!("{table}");
    println!("Take an exam with `examdesk take <id> --answer <question_id>=<answer>`.");
}

fn print_history(dash: &LearnerDashboard) {
    if dash.history.is_empty() {
        println!("No attempts yet.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Attempt", "Exam", "Score", "Percentage", "Status", "Started"]);
    for row in &dash.history {
        let a = &row.attempt;
        let title = a
            .exam_title
            .clone()
            .unwrap_or_else(|| format!("Exam {}", a.exam_id));
        table.add_row(vec![
            Cell::new(a.id),
            Cell::new(title),
            Cell::new(format!("{}/{}", a.score, a.total_marks)),
            Cell::new(format!("{:.1}% ({})", row.percentage, row.bucket)),
            Cell::new(a.status.label()),
            Cell::new(format_date(&a.started_at)),
        ]);
    }
    println!("{table}");
    println!("Review an attempt with `examdesk review <attempt>`.");
}
