//! Daily scheduling of the recurrence materializer.
//!
//! The job runs once per day at a configured UTC hour. Missing a day (the
//! process was down) is not caught up; the per-rule fired date keeps repeated
//! runs on the same day harmless.

use crate::{config::settings::SchedulerConfig, core::recurring, errors::Result};
use chrono::{DateTime, Days, Utc};
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::{error, info, warn};

/// Next moment strictly after `now` whose UTC hour is `run_hour` (minute zero).
#[must_use]
pub fn next_run_after(now: DateTime<Utc>, run_hour: u32) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(run_hour.min(23), 0, 0)
        .map_or(now, |at| at.and_utc());
    if today > now {
        today
    } else {
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    }
}

/// Runs the materializer once.
pub async fn run_once(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<recurring::RecurrenceRun> {
    recurring::run_daily_recurrence(db, now).await
}

/// Runs the materializer once, logging a failure instead of returning it.
///
/// Returns whether the run succeeded.
async fn run_and_report(db: &DatabaseConnection, now: DateTime<Utc>) -> bool {
    match run_once(db, now).await {
        Ok(_) => true,
        Err(e) => {
            error!("Daily recurrence run failed: {e}");
            false
        }
    }
}

/// Runs the materializer every day at the configured hour, forever.
///
/// A failed run is logged and the loop carries on with the next day.
pub async fn run_scheduler(db: DatabaseConnection, config: SchedulerConfig) {
    if config.run_on_startup && !run_and_report(&db, Utc::now()).await {
        warn!("Startup recurrence run failed, waiting for the next scheduled run");
    }

    loop {
        let now = Utc::now();
        let next = next_run_after(now, config.run_hour_utc);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!("Next recurrence run at {next}");
        tokio::time::sleep(wait).await;

        if !run_and_report(&db, Utc::now()).await {
            warn!("Recurrence run failed, retrying at the next scheduled time");
        }
    }
}
