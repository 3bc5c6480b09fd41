use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("Invalid goals: {home_goals}-{away_goals}, goal counts must fit a non-negative 32-bit integer")]
    InvalidGoals { home_goals: i64, away_goals: i64 },

    #[error("Missing tiebreak: {0}")]
    MissingTiebreak(String),

    #[error("Unexpected tiebreak: {0}")]
    UnexpectedTiebreak(String),

    /// Stored knockout result that is level after regulation with no tiebreak.
    #[error("Incomplete result for knockout match {match_id}")]
    IncompleteResult { match_id: String },
}
