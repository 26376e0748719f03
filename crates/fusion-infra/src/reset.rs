//! Scheduled daily reset of the message quota.
//!
//! The daily message counter is zeroed at the UTC day boundary by a cron
//! job; this is the explicit reset collaborator the entitlement model
//! assumes. The lifetime image counter is never reset.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use fusion_core::profile::ProfileRepository;

/// Six-field cron expression (with seconds): midnight UTC, every day.
pub const DAILY_RESET_SCHEDULE: &str = "0 0 0 * * *";

/// Start the daily reset job.
///
/// Returns the running scheduler; dropping it stops the job, so the
/// caller must keep it alive for the lifetime of the process.
pub async fn spawn_daily_reset<P>(profiles: Arc<P>) -> anyhow::Result<JobScheduler>
where
    P: ProfileRepository + 'static,
{
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async_tz(DAILY_RESET_SCHEDULE, chrono::Utc, move |_id, _lock| {
        let profiles = profiles.clone();
        Box::pin(async move {
            match profiles.reset_daily_message_counts().await {
                Ok(count) => {
                    info!(profiles = count, "daily message counters reset");
                }
                Err(e) => {
                    error!(error = %e, "daily message counter reset failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(schedule = DAILY_RESET_SCHEDULE, "daily quota reset scheduled");
    Ok(scheduler)
}
