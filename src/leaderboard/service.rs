use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};

use super::{LeaderboardEntry, LeaderboardError, MatchPoints, RecomputeSummary, UserRank};
use crate::{
    scoring::{RuleBasedCalculator, ScoreCalculator, Scoreline, ScoringRules},
    tournament::{MatchModel, PredictionModel, TournamentRepository, UserModel},
};

/// Recomputes user scores from predictions and results, and serves the ranked view.
pub struct LeaderboardService {
    repository: Arc<dyn TournamentRepository>,
    calculator: Arc<dyn ScoreCalculator>,
    recompute_lock: AsyncMutex<()>,
}

impl LeaderboardService {
    pub fn builder(repository: Arc<dyn TournamentRepository>) -> LeaderboardServiceBuilder {
        LeaderboardServiceBuilder::new(repository)
    }

    /// Rescores every user from scratch and overwrites their stored score.
    ///
    /// Predictions whose match is unknown, unresolved or unscoreable count
    /// as skipped. A failed write for one user is logged and the run moves
    /// on. Users left with nothing scored are stored as unscored.
    #[instrument(skip(self))]
    pub async fn recompute_all(&self) -> Result<RecomputeSummary, LeaderboardError> {
        let _guard = self.recompute_lock.try_lock().map_err(|_| {
            warn!("Leaderboard recompute requested while another run is active");
            LeaderboardError::RecomputeInProgress
        })?;

        let users = self.repository.get_all_users().await?;
        let matches = index_matches(self.repository.get_all_matches().await?);

        let mut predictions_by_user: HashMap<String, Vec<PredictionModel>> = HashMap::new();
        for prediction in self.repository.get_all_predictions().await? {
            predictions_by_user
                .entry(prediction.user_id.clone())
                .or_default()
                .push(prediction);
        }

        let mut summary = RecomputeSummary::default();

        for mut user in users {
            let predictions = predictions_by_user.remove(&user.id).unwrap_or_default();

            let mut total = 0;
            let mut scored = 0;
            for prediction in &predictions {
                let points = matches
                    .get(&prediction.match_id)
                    .and_then(|fixture| self.points_for(&prediction.scoreline, fixture, &user.id));
                match points {
                    Some(points) => {
                        total += points;
                        scored += 1;
                    }
                    None => summary.predictions_skipped += 1,
                }
            }
            summary.predictions_scored += scored;

            let score = (scored > 0).then_some(total);
            if score.is_none() && user.score.is_none() {
                continue;
            }

            user.score = score;
            match self.repository.save_user(&user).await {
                Ok(()) => {
                    debug!(user_id = %user.id, score = ?score, "User score replaced");
                    summary.users_updated += 1;
                }
                Err(err) => {
                    error!(user_id = %user.id, error = %err, "Failed to store recomputed score");
                    summary.users_failed += 1;
                }
            }
        }

        let orphaned: usize = predictions_by_user.values().map(Vec::len).sum();
        if orphaned > 0 {
            debug!(orphaned, "Skipped predictions from unknown users");
        }
        summary.predictions_skipped += orphaned;

        info!(
            users_updated = summary.users_updated,
            users_failed = summary.users_failed,
            predictions_scored = summary.predictions_scored,
            predictions_skipped = summary.predictions_skipped,
            "Leaderboard recomputed"
        );

        Ok(summary)
    }

    /// Scored users, highest first, ranked by position
    #[instrument(skip(self))]
    pub async fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let users = self.repository.get_all_users().await?;
        Ok(rank_users(users))
    }

    /// The first `limit` leaderboard entries
    pub async fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut leaderboard = self.get_leaderboard().await?;
        leaderboard.truncate(limit);
        Ok(leaderboard)
    }

    #[instrument(skip(self))]
    pub async fn get_user_rank(&self, user_id: &str) -> Result<UserRank, LeaderboardError> {
        let rank = self
            .get_leaderboard()
            .await?
            .into_iter()
            .find(|entry| entry.user_id == user_id)
            .map(|entry| UserRank {
                rank: Some(entry.rank),
                score: entry.score,
            })
            .unwrap_or_else(UserRank::unranked);

        Ok(rank)
    }

    /// The user's predictions on known matches, in kickoff order, with points earned
    #[instrument(skip(self))]
    pub async fn prediction_breakdown(
        &self,
        user_id: &str,
    ) -> Result<Vec<MatchPoints>, LeaderboardError> {
        let predictions = self.repository.get_user_predictions(user_id).await?;
        let matches = index_matches(self.repository.get_all_matches().await?);

        let mut rows: Vec<(&MatchModel, PredictionModel)> = predictions
            .into_iter()
            .filter_map(|prediction| {
                matches
                    .get(&prediction.match_id)
                    .map(|fixture| (fixture, prediction))
            })
            .collect();
        rows.sort_by_key(|(fixture, _)| fixture.kickoff);

        Ok(rows
            .into_iter()
            .map(|(fixture, prediction)| MatchPoints {
                match_id: fixture.id.clone(),
                team1: fixture.team1.clone(),
                team2: fixture.team2.clone(),
                prediction: prediction.scoreline,
                result: fixture.result,
                points: self.points_for(&prediction.scoreline, fixture, user_id),
            })
            .collect())
    }

    fn points_for(&self, prediction: &Scoreline, fixture: &MatchModel, user_id: &str) -> Option<i32> {
        let result = fixture.result.as_ref()?;

        match self
            .calculator
            .calculate(prediction, result, &fixture.calculation_context())
        {
            Ok(points) => Some(points),
            Err(err) => {
                warn!(
                    user_id = %user_id,
                    match_id = %fixture.id,
                    error = %err,
                    "Skipping unscoreable prediction"
                );
                None
            }
        }
    }
}

fn index_matches(matches: Vec<MatchModel>) -> HashMap<String, MatchModel> {
    matches
        .into_iter()
        .map(|fixture| (fixture.id.clone(), fixture))
        .collect()
}

/// Ranks users that carry a score. The sort is stable, so equal scores keep
/// the input order and still get distinct consecutive ranks.
pub fn rank_users(users: impl IntoIterator<Item = UserModel>) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(UserModel, i32)> = users
        .into_iter()
        .filter_map(|user| user.score.map(|score| (user, score)))
        .collect();

    scored.sort_by(|(_, a), (_, b)| b.cmp(a));

    scored
        .into_iter()
        .enumerate()
        .map(|(position, (user, score))| LeaderboardEntry {
            user_id: user.id,
            name: user.first_name,
            username: user.username,
            score,
            rank: position + 1,
        })
        .collect()
}

pub struct LeaderboardServiceBuilder {
    repository: Arc<dyn TournamentRepository>,
    calculator: Arc<dyn ScoreCalculator>,
}

impl LeaderboardServiceBuilder {
    fn new(repository: Arc<dyn TournamentRepository>) -> Self {
        Self {
            repository,
            calculator: Arc::new(RuleBasedCalculator::default()),
        }
    }

    pub fn with_rules(mut self, rules: ScoringRules) -> Self {
        self.calculator = Arc::new(RuleBasedCalculator::new(rules));
        self
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn ScoreCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn build(self) -> LeaderboardService {
        LeaderboardService {
            repository: self.repository,
            calculator: self.calculator,
            recompute_lock: AsyncMutex::new(()),
        }
    }
}
