//! `examdesk review`.

use std::path::Path;

use anyhow::Result;

use examdesk_core::lettering::lettered_options;
use examdesk_core::model::Id;
use examdesk_core::review::ExamReview;
use examdesk_core::routes::Route;

use super::{format_date, App};

pub async fn execute(config: Option<&Path>, attempt_id: Id) -> Result<()> {
    let app = App::for_route(config, Route::ExamReview(attempt_id))?;
    let review = ExamReview::load(&app.api, attempt_id).await?;
    let attempt = &review.attempt;
    let summary = review.summary();

    println!("{}", review.exam.title);
    println!(
        "Score: {} / {}   Percentage: {:.1}% ({})   Status: {}",
        attempt.score,
        attempt.total_marks,
        review.percentage(),
        review.bucket(),
        attempt.status.label()
    );
    println!(
        "Started: {}   Correct: {}   Incorrect: {}   Not answered: {}\n",
        format_date(&attempt.started_at),
        summary.correct,
        summary.incorrect,
        summary.unanswered
    );

    for item in &review.items {
        let q = &item.question;
        println!(
            "Question {} {} {}  ({} mark{})",
            item.number,
            item.status.icon(),
            item.status,
            q.marks,
            if q.marks == 1 { "" } else { "s" }
        );
        println!("  {}", q.question_text);
        for (letter, text) in lettered_options(&q.options) {
            println!("    {letter}. {text}");
        }
        println!(
            "  Your answer: {}   Correct answer: {}\n",
            q.user_answer.as_deref().unwrap_or("-"),
            q.correct_answer.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
