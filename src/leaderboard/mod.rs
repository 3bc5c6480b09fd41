mod errors;
pub mod models;
pub mod service;

pub use errors::LeaderboardError;
pub use models::*;
pub use service::{rank_users, LeaderboardService, LeaderboardServiceBuilder};
