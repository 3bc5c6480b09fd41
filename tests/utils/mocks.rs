use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use tournament_predictor::{
    AppError, InMemoryTournamentRepository, MatchModel, PredictionModel, TournamentRepository,
    TournamentSnapshot, UserModel,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory repository whose user writes fail for selected ids
pub struct FlakyRepository {
    inner: InMemoryTournamentRepository,
    failing_users: RwLock<HashSet<String>>,
}

impl FlakyRepository {
    pub fn new(snapshot: TournamentSnapshot) -> Self {
        Self {
            inner: InMemoryTournamentRepository::from_snapshot(snapshot),
            failing_users: RwLock::new(HashSet::new()),
        }
    }

    pub async fn fail_writes_for(&self, user_id: &str) {
        self.failing_users.write().await.insert(user_id.to_string());
    }
}

#[async_trait]
impl TournamentRepository for FlakyRepository {
    async fn get_all_users(&self) -> Result<Vec<UserModel>, AppError> {
        self.inner.get_all_users().await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        self.inner.get_user(user_id).await
    }

    async fn save_user(&self, user: &UserModel) -> Result<(), AppError> {
        if self.failing_users.read().await.contains(&user.id) {
            return Err(AppError::DatabaseError(format!(
                "connection reset while saving {}",
                user.id
            )));
        }
        self.inner.save_user(user).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.inner.delete_user(user_id).await
    }

    async fn get_all_matches(&self) -> Result<Vec<MatchModel>, AppError> {
        self.inner.get_all_matches().await
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        self.inner.get_match(match_id).await
    }

    async fn save_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        self.inner.save_match(fixture).await
    }

    async fn lock_match(&self, match_id: &str) -> Result<bool, AppError> {
        self.inner.lock_match(match_id).await
    }

    async fn get_all_predictions(&self) -> Result<Vec<PredictionModel>, AppError> {
        self.inner.get_all_predictions().await
    }

    async fn get_user_predictions(
        &self,
        user_id: &str,
    ) -> Result<Vec<PredictionModel>, AppError> {
        self.inner.get_user_predictions(user_id).await
    }

    async fn save_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError> {
        self.inner.save_prediction(prediction).await
    }
}

/// Read that `BlockingRepository` holds open on its first call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PausePoint {
    /// Holds a leaderboard recompute mid-run
    AllUsers,
    /// Holds a lock sweep between its read and its writes
    AllMatches,
}

/// Repository that parks the first read at its `PausePoint` until released.
pub struct BlockingRepository {
    inner: InMemoryTournamentRepository,
    pause_at: PausePoint,
    armed: AtomicBool,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl BlockingRepository {
    pub fn new(snapshot: TournamentSnapshot, pause_at: PausePoint) -> Self {
        Self {
            inner: InMemoryTournamentRepository::from_snapshot(snapshot),
            pause_at,
            armed: AtomicBool::new(true),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    async fn pause_if(&self, point: PausePoint) {
        if self.pause_at == point && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl TournamentRepository for BlockingRepository {
    async fn get_all_users(&self) -> Result<Vec<UserModel>, AppError> {
        self.pause_if(PausePoint::AllUsers).await;
        self.inner.get_all_users().await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        self.inner.get_user(user_id).await
    }

    async fn save_user(&self, user: &UserModel) -> Result<(), AppError> {
        self.inner.save_user(user).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.inner.delete_user(user_id).await
    }

    async fn get_all_matches(&self) -> Result<Vec<MatchModel>, AppError> {
        self.pause_if(PausePoint::AllMatches).await;
        self.inner.get_all_matches().await
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        self.inner.get_match(match_id).await
    }

    async fn save_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        self.inner.save_match(fixture).await
    }

    async fn lock_match(&self, match_id: &str) -> Result<bool, AppError> {
        self.inner.lock_match(match_id).await
    }

    async fn get_all_predictions(&self) -> Result<Vec<PredictionModel>, AppError> {
        self.inner.get_all_predictions().await
    }

    async fn get_user_predictions(
        &self,
        user_id: &str,
    ) -> Result<Vec<PredictionModel>, AppError> {
        self.inner.get_user_predictions(user_id).await
    }

    async fn save_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError> {
        self.inner.save_prediction(prediction).await
    }
}
