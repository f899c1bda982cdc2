use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serial_test::serial;

use cinevault::services::reminder::{Clock, ReminderEngine};

use crate::common::{create_movie, register_user, FailureMode, TestContext};

struct FixedClock(NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn now(&self) -> NaiveDateTime {
        self.0.and_hms_opt(12, 0, 0).unwrap()
    }
}

const TODAY: &str = "2026-08-06";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
}

fn engine(ctx: &TestContext) -> ReminderEngine {
    ReminderEngine::with_clock(
        ctx.db.clone(),
        Arc::new(ctx.mailer.clone()),
        9,
        Arc::new(FixedClock(today())),
    )
}

async fn reminder_sent_flag(ctx: &TestContext, id: &str) -> bool {
    sqlx::query_scalar("SELECT reminder_sent FROM movies WHERE id = ?")
        .bind(id)
        .fetch_one(&ctx.db)
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn selects_todays_movies_sends_and_marks() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;
    let movie = create_movie(&ctx, &user.token, "Premiere Today", TODAY).await;
    let id = movie["id"].as_str().unwrap();

    let summary = engine(&ctx).run_once().await;
    assert_eq!(summary.selected, 1);
    assert_eq!(summary.sent, 1);

    let sent = ctx.mailer.sent_mails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, user.email);
    assert!(sent[0].subject.contains("Premiere Today"));

    assert!(reminder_sent_flag(&ctx, id).await);

    // A second wake must not pick the movie up again
    let second = engine(&ctx).run_once().await;
    assert_eq!(second.selected, 0);
    assert_eq!(ctx.mailer.sent_mails().len(), 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn ignores_movies_releasing_on_other_days() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;
    create_movie(&ctx, &user.token, "Yesterday", "2026-08-05").await;
    create_movie(&ctx, &user.token, "Tomorrow", "2026-08-07").await;

    let summary = engine(&ctx).run_once().await;
    assert_eq!(summary.selected, 0);
    assert!(ctx.mailer.sent_mails().is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn transient_failure_leaves_movie_eligible() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;
    let movie = create_movie(&ctx, &user.token, "Flaky SMTP", TODAY).await;
    let id = movie["id"].as_str().unwrap();

    ctx.mailer.fail_with(Some(FailureMode::Transient));
    let summary = engine(&ctx).run_once().await;
    assert_eq!(summary.selected, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.transient_failures, 1);
    assert!(!reminder_sent_flag(&ctx, id).await);

    // Transport recovers; the movie is still inside the window
    ctx.mailer.fail_with(None);
    let retry = engine(&ctx).run_once().await;
    assert_eq!(retry.sent, 1);
    assert!(reminder_sent_flag(&ctx, id).await);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn permanent_failure_marks_reminder_sent() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;
    let movie = create_movie(&ctx, &user.token, "Bad Address", TODAY).await;
    let id = movie["id"].as_str().unwrap();

    ctx.mailer.fail_with(Some(FailureMode::Permanent));
    let summary = engine(&ctx).run_once().await;
    assert_eq!(summary.permanent_failures, 1);
    // Retrying a bad address can never succeed
    assert!(reminder_sent_flag(&ctx, id).await);

    ctx.mailer.fail_with(None);
    let second = engine(&ctx).run_once().await;
    assert_eq!(second.selected, 0);

    ctx.cleanup().await;
}
