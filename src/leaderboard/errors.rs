use thiserror::Error;

use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Repository error: {0}")]
    Repository(#[from] AppError),

    #[error("A leaderboard recompute is already running")]
    RecomputeInProgress,
}
