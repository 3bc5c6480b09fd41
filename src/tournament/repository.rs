use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::models::{MatchModel, PredictionModel, TournamentSnapshot, UserModel};
use crate::shared::AppError;

/// Persistence collaborator for users, matches and predictions.
///
/// `get_all_users` must return users in a stable order: the leaderboard
/// keeps that order among equal scores.
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    async fn get_all_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    /// Inserts the user or replaces the stored record with the same id
    async fn save_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;

    async fn get_all_matches(&self) -> Result<Vec<MatchModel>, AppError>;
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError>;
    async fn save_match(&self, fixture: &MatchModel) -> Result<(), AppError>;
    /// Sets only the locked flag, leaving the rest of the stored match as is.
    /// Returns false when the match is unknown or already locked.
    async fn lock_match(&self, match_id: &str) -> Result<bool, AppError>;

    async fn get_all_predictions(&self) -> Result<Vec<PredictionModel>, AppError>;
    async fn get_user_predictions(&self, user_id: &str)
        -> Result<Vec<PredictionModel>, AppError>;
    /// Replaces any earlier prediction for the same (user, match) pair
    async fn save_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError>;
}

/// In-memory implementation of TournamentRepository for development and testing.
///
/// Records are kept in insertion order; replacing a record keeps its slot.
#[derive(Debug, Default)]
pub struct InMemoryTournamentRepository {
    state: RwLock<TournamentSnapshot>,
}

impl InMemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated from a snapshot
    pub fn from_snapshot(snapshot: TournamentSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub async fn snapshot(&self) -> TournamentSnapshot {
        self.state.read().await.clone()
    }
}

fn upsert<T: Clone>(records: &mut Vec<T>, record: &T, same: impl Fn(&T) -> bool) {
    match records.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    #[instrument(skip(self))]
    async fn get_all_users(&self) -> Result<Vec<UserModel>, AppError> {
        let state = self.state.read().await;
        debug!(user_count = state.users.len(), "Listing users from memory");
        Ok(state.users.clone())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        upsert(&mut state.users, user, |u| u.id == user.id);
        debug!(score = ?user.score, "User saved in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.users.retain(|u| u.id != user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all_matches(&self) -> Result<Vec<MatchModel>, AppError> {
        let state = self.state.read().await;
        debug!(match_count = state.matches.len(), "Listing matches from memory");
        Ok(state.matches.clone())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        let state = self.state.read().await;
        Ok(state.matches.iter().find(|m| m.id == match_id).cloned())
    }

    #[instrument(skip(self, fixture), fields(match_id = %fixture.id))]
    async fn save_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        upsert(&mut state.matches, fixture, |m| m.id == fixture.id);
        debug!(locked = fixture.locked, "Match saved in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn lock_match(&self, match_id: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.matches.iter_mut().find(|m| m.id == match_id) {
            Some(fixture) if !fixture.locked => {
                fixture.lock();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn get_all_predictions(&self) -> Result<Vec<PredictionModel>, AppError> {
        let state = self.state.read().await;
        Ok(state.predictions.clone())
    }

    #[instrument(skip(self))]
    async fn get_user_predictions(
        &self,
        user_id: &str,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    #[instrument(
        skip(self, prediction),
        fields(user_id = %prediction.user_id, match_id = %prediction.match_id)
    )]
    async fn save_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        upsert(&mut state.predictions, prediction, |p| {
            p.user_id == prediction.user_id && p.match_id == prediction.match_id
        });
        debug!("Prediction saved in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Scoreline;
    use crate::shared::test_utils::{group_match, prediction, scored_user, user};

    #[tokio::test]
    async fn test_save_user_replaces_in_place() {
        let repo = InMemoryTournamentRepository::new();
        repo.save_user(&user("u1", "Ana")).await.unwrap();
        repo.save_user(&user("u2", "Ben")).await.unwrap();

        repo.save_user(&scored_user("u1", "Ana", 4)).await.unwrap();

        let users = repo.get_all_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "u1");
        assert_eq!(users[0].score, Some(4));
        assert_eq!(users[1].id, "u2");
    }

    #[tokio::test]
    async fn test_get_nonexistent_records() {
        let repo = InMemoryTournamentRepository::new();

        assert!(repo.get_user("missing").await.unwrap().is_none());
        assert!(repo.get_match("missing").await.unwrap().is_none());
        assert!(repo.get_user_predictions("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_match_keeps_result() {
        let repo = InMemoryTournamentRepository::new();
        let mut fixture = group_match("m1");
        fixture.result = Some(Scoreline::new(2, 1));
        repo.save_match(&fixture).await.unwrap();

        assert!(repo.lock_match("m1").await.unwrap());
        assert!(!repo.lock_match("m1").await.unwrap());
        assert!(!repo.lock_match("missing").await.unwrap());

        let stored = repo.get_match("m1").await.unwrap().unwrap();
        assert!(stored.locked);
        assert_eq!(stored.result, Some(Scoreline::new(2, 1)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = InMemoryTournamentRepository::new();
        repo.save_user(&user("u1", "Ana")).await.unwrap();
        repo.save_user(&user("u2", "Ben")).await.unwrap();

        repo.delete_user("u1").await.unwrap();
        repo.delete_user("missing").await.unwrap();

        let users = repo.get_all_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u2");
    }

    #[tokio::test]
    async fn test_latest_prediction_wins() {
        let repo = InMemoryTournamentRepository::new();
        repo.save_match(&group_match("m1")).await.unwrap();

        repo.save_prediction(&prediction("u1", "m1", Scoreline::new(1, 0)))
            .await
            .unwrap();
        repo.save_prediction(&prediction("u2", "m1", Scoreline::new(0, 0)))
            .await
            .unwrap();
        repo.save_prediction(&prediction("u1", "m1", Scoreline::new(3, 2)))
            .await
            .unwrap();

        let all = repo.get_all_predictions().await.unwrap();
        assert_eq!(all.len(), 2);

        let mine = repo.get_user_predictions("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].scoreline, Scoreline::new(3, 2));
    }

    #[tokio::test]
    async fn test_from_snapshot_round_trips() {
        let snapshot = TournamentSnapshot {
            users: vec![user("u1", "Ana")],
            matches: vec![group_match("m1")],
            predictions: vec![prediction("u1", "m1", Scoreline::new(2, 2))],
        };

        let repo = InMemoryTournamentRepository::from_snapshot(snapshot.clone());

        assert_eq!(repo.snapshot().await, snapshot);
        assert_eq!(repo.get_match("m1").await.unwrap(), Some(group_match("m1")));
    }
}
