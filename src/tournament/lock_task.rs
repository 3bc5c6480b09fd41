use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;
use tracing::{error, info, instrument, warn};

use super::service::TournamentService;
use crate::shared::AppError;

/// Configuration for the kickoff lock task
#[derive(Debug, Clone)]
pub struct LockTaskConfig {
    /// How often to look for matches that have kicked off
    pub check_interval: Duration,
}

impl Default for LockTaskConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
        }
    }
}

/// Starts the background task that locks matches once their kickoff passes
#[instrument(skip(service))]
pub async fn start_lock_task(service: Arc<TournamentService>, config: LockTaskConfig) {
    info!(
        check_interval_secs = config.check_interval.as_secs(),
        "Starting match lock background task"
    );

    let mut check_interval = interval(config.check_interval);

    loop {
        check_interval.tick().await;

        match run_lock_check(&service, Utc::now()).await {
            Ok(0) => {}
            Ok(locked_count) => {
                info!(locked_count = locked_count, "Locked matches past kickoff");
            }
            Err(e) => {
                error!(error = %e, "Match lock task failed");
            }
        }
    }
}

/// Locks expired matches and refreshes the leaderboard when anything changed
pub(crate) async fn run_lock_check(
    service: &TournamentService,
    now: DateTime<Utc>,
) -> Result<usize, AppError> {
    let locked_count = service.lock_expired_matches(now).await?;

    if locked_count > 0 {
        if let Err(e) = service.leaderboard().recompute_all().await {
            warn!(error = %e, "Leaderboard refresh after locking failed");
        }
    }

    Ok(locked_count)
}
