pub mod lock_task;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use lock_task::{start_lock_task, LockTaskConfig};
pub use models::*;
pub use postgres::PostgresTournamentRepository;
pub use repository::{InMemoryTournamentRepository, TournamentRepository};
pub use service::{parse_kickoff, TournamentService, KICKOFF_FORMAT};
