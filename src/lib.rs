// Library crate for the tournament predictor
// This file exposes the public API for integration tests

pub mod config;
pub mod leaderboard;
pub mod scoring;
pub mod shared;
pub mod tournament;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, ConfigError};
pub use leaderboard::{LeaderboardEntry, LeaderboardError, LeaderboardService, RecomputeSummary};
pub use scoring::{ScoreSubmission, Scoreline, ScoringError, ScoringRules};
pub use shared::AppError;
pub use tournament::{
    InMemoryTournamentRepository, MatchModel, PredictionModel, TournamentRepository,
    TournamentService, TournamentSnapshot, UserModel,
};
