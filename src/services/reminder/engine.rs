use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime};

use crate::config::DbPool;
use crate::modules::movies::crud::MovieCrud;
use crate::modules::movies::form::start_of_day;
use crate::services::mailer::{self, Mailer};

/// Time source seam so tests can pin the query window instead of relying
/// on wall-clock time.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Outcome of one wake, for logging and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub selected: usize,
    pub sent: usize,
    pub transient_failures: usize,
    pub permanent_failures: usize,
}

pub struct ReminderEngine {
    db: DbPool,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    fire_hour: u32,
}

impl ReminderEngine {
    pub fn new(db: DbPool, mailer: Arc<dyn Mailer>, fire_hour: u32) -> Self {
        Self::with_clock(db, mailer, fire_hour, Arc::new(SystemClock))
    }

    pub fn with_clock(
        db: DbPool,
        mailer: Arc<dyn Mailer>,
        fire_hour: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            mailer,
            clock,
            fire_hour,
        }
    }

    /// Spawn the daily loop. The handle owns the task lifecycle; dropping
    /// the runtime stops it.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        loop {
            let wait = duration_until_next_fire(self.clock.now(), self.fire_hour);
            tokio::time::sleep(wait).await;

            // Each run is awaited to completion before the next sleep is
            // computed, so two runs can never overlap.
            let summary = self.run_once().await;
            tracing::info!(
                "reminder run finished: {} selected, {} sent, {} transient failures, {} permanent failures",
                summary.selected,
                summary.sent,
                summary.transient_failures,
                summary.permanent_failures,
            );
        }
    }

    /// One wake: select today's unreminded movies and notify their owners
    /// sequentially. Per-item failures never abort the run.
    pub async fn run_once(&self) -> RunSummary {
        let today = self.clock.today();
        let (window_start, window_end) = reminder_window(today);

        let crud = MovieCrud::new(self.db.clone());
        let due = match crud.due_reminders(window_start, window_end).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!("reminder query failed, skipping run: {}", e);
                return RunSummary::default();
            }
        };

        tracing::info!("found {} movies to send reminders", due.len());

        let mut summary = RunSummary {
            selected: due.len(),
            ..Default::default()
        };

        for movie in due {
            let (subject, html) =
                mailer::release_reminder_email(&movie.title, movie.release_date.date());

            match self.mailer.send(&movie.owner_email, &subject, html).await {
                Ok(()) => {
                    if let Err(e) = crud.mark_reminder_sent(&movie.id).await {
                        tracing::error!("failed to mark reminder sent for {}: {}", movie.id, e);
                    }
                    summary.sent += 1;
                    tracing::info!("reminder sent for movie {}", movie.id);
                }
                Err(e) if e.is_permanent() => {
                    // Retrying a bad address can never succeed; stop
                    // reselecting this movie
                    tracing::warn!(
                        "permanent reminder failure for movie {} ({}): {}",
                        movie.id,
                        movie.owner_email,
                        e
                    );
                    if let Err(e) = crud.mark_reminder_sent(&movie.id).await {
                        tracing::error!("failed to mark reminder sent for {}: {}", movie.id, e);
                    }
                    summary.permanent_failures += 1;
                }
                Err(e) => {
                    tracing::error!("reminder for movie {} failed: {}", movie.id, e);
                    summary.transient_failures += 1;
                }
            }
        }

        summary
    }
}

/// Half-open range covering the given calendar day.
pub fn reminder_window(today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        start_of_day(today),
        start_of_day(today + ChronoDuration::days(1)),
    )
}

fn duration_until_next_fire(now: NaiveDateTime, fire_hour: u32) -> Duration {
    let today_fire = now
        .date()
        .and_hms_opt(fire_hour, 0, 0)
        .expect("fire hour is validated to < 24");

    let next = if now < today_fire {
        today_fire
    } else {
        today_fire + ChronoDuration::days(1)
    };

    (next - now).to_std().unwrap_or(Duration::ZERO)
}
