use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::{
    models::{MatchModel, PredictionModel, UserModel},
    repository::TournamentRepository,
};
use crate::{
    leaderboard::{LeaderboardService, RecomputeSummary},
    scoring::ScoreSubmission,
    shared::AppError,
};

/// Kickoff format accepted from admins, read as UTC
pub const KICKOFF_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn parse_kickoff(value: &str) -> Result<DateTime<Utc>, AppError> {
    NaiveDateTime::parse_from_str(value.trim(), KICKOFF_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            AppError::Validation(format!(
                "kickoff '{value}' does not match {KICKOFF_FORMAT}: {e}"
            ))
        })
}

fn placeholder_id(username: &str) -> String {
    format!("placeholder_{username}")
}

/// Service for match lifecycle, prediction intake and user records
pub struct TournamentService {
    repository: Arc<dyn TournamentRepository>,
    leaderboard: Arc<LeaderboardService>,
}

impl TournamentService {
    pub fn new(
        repository: Arc<dyn TournamentRepository>,
        leaderboard: Arc<LeaderboardService>,
    ) -> Self {
        Self {
            repository,
            leaderboard,
        }
    }

    pub fn leaderboard(&self) -> &Arc<LeaderboardService> {
        &self.leaderboard
    }

    /// Creates the user, or refreshes profile fields of an existing one
    /// while keeping its admin flag, score and registration time. An admin
    /// flag granted by username before registration is moved onto the user.
    #[instrument(skip(self))]
    pub async fn register_user(
        &self,
        user_id: &str,
        first_name: &str,
        last_name: Option<String>,
        username: Option<String>,
    ) -> Result<UserModel, AppError> {
        let mut user = match self.repository.get_user(user_id).await? {
            Some(existing) => UserModel {
                first_name: first_name.to_string(),
                last_name,
                username,
                ..existing
            },
            None => UserModel::new(user_id, first_name, last_name, username, Utc::now()),
        };

        let placeholder = match user.username.as_deref() {
            Some(username) if user.id != placeholder_id(username) => {
                self.repository.get_user(&placeholder_id(username)).await?
            }
            _ => None,
        };
        if let Some(placeholder) = &placeholder {
            user.is_admin |= placeholder.is_admin;
        }

        self.repository.save_user(&user).await?;

        if let Some(placeholder) = placeholder {
            self.repository.delete_user(&placeholder.id).await?;
            info!(
                user_id = %user.id,
                is_admin = user.is_admin,
                "Placeholder user merged on registration"
            );
        }

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn is_admin(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self
            .repository
            .get_user(user_id)
            .await?
            .map(|user| user.is_admin)
            .unwrap_or(false))
    }

    #[instrument(skip(self))]
    pub async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<(), AppError> {
        let mut user = self
            .repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        user.is_admin = is_admin;
        self.repository.save_user(&user).await
    }

    /// Flags every user with this username. When nobody has it yet, a
    /// `placeholder_<username>` record carries the flag until they register.
    #[instrument(skip(self))]
    pub async fn set_admin_by_username(
        &self,
        username: &str,
        is_admin: bool,
    ) -> Result<usize, AppError> {
        if username.is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }

        let mut updated = 0;
        for mut user in self.repository.get_all_users().await? {
            if user.username.as_deref() == Some(username) {
                user.is_admin = is_admin;
                self.repository.save_user(&user).await?;
                updated += 1;
            }
        }

        if updated == 0 {
            let mut placeholder = UserModel::new(
                placeholder_id(username),
                username,
                None,
                Some(username.to_string()),
                Utc::now(),
            );
            placeholder.is_admin = is_admin;
            self.repository.save_user(&placeholder).await?;
            info!(username = %username, "Created placeholder user for admin flag");
            updated = 1;
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn add_match(
        &self,
        team1: &str,
        team2: &str,
        kickoff: DateTime<Utc>,
        is_knockout: bool,
    ) -> Result<MatchModel, AppError> {
        if team1.trim().is_empty() || team2.trim().is_empty() {
            return Err(AppError::Validation("team names must not be empty".to_string()));
        }

        let fixture = MatchModel::new(
            uuid::Uuid::new_v4().to_string(),
            team1.trim(),
            team2.trim(),
            kickoff,
            is_knockout,
        );
        self.repository.save_match(&fixture).await?;

        info!(match_id = %fixture.id, "Match added");
        Ok(fixture)
    }

    pub async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        self.repository.get_match(match_id).await
    }

    /// Matches still open for predictions at `now`, soonest first
    #[instrument(skip(self))]
    pub async fn upcoming_matches(&self, now: DateTime<Utc>) -> Result<Vec<MatchModel>, AppError> {
        let mut upcoming: Vec<MatchModel> = self
            .repository
            .get_all_matches()
            .await?
            .into_iter()
            .filter(|fixture| !fixture.is_closed_at(now))
            .collect();
        upcoming.sort_by_key(|fixture| fixture.kickoff);

        debug!(count = upcoming.len(), "Upcoming matches listed");
        Ok(upcoming)
    }

    /// Stores the user's prediction, replacing any earlier one for the match.
    #[instrument(skip(self, submission))]
    pub async fn save_prediction(
        &self,
        user_id: &str,
        match_id: &str,
        submission: ScoreSubmission,
        now: DateTime<Utc>,
    ) -> Result<PredictionModel, AppError> {
        let fixture = self
            .repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("match {match_id}")))?;

        if fixture.is_closed_at(now) {
            warn!(user_id = %user_id, match_id = %match_id, "Prediction rejected, match locked");
            return Err(AppError::MatchLocked(match_id.to_string()));
        }

        let scoreline = submission.into_scoreline(fixture.is_knockout)?;
        let prediction = PredictionModel::new(user_id, match_id, scoreline, now);
        self.repository.save_prediction(&prediction).await?;

        info!(user_id = %user_id, match_id = %match_id, "Prediction saved");
        Ok(prediction)
    }

    pub async fn user_predictions(&self, user_id: &str) -> Result<Vec<PredictionModel>, AppError> {
        self.repository.get_user_predictions(user_id).await
    }

    /// Records (or corrects) the result, locks the match and recomputes the
    /// leaderboard. Returns `None` when the recompute could not complete;
    /// the result itself is stored either way.
    #[instrument(skip(self, submission))]
    pub async fn set_match_result(
        &self,
        match_id: &str,
        submission: ScoreSubmission,
    ) -> Result<Option<RecomputeSummary>, AppError> {
        let mut fixture = self
            .repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("match {match_id}")))?;

        let result = submission.into_scoreline(fixture.is_knockout)?;
        fixture.record_result(result);
        self.repository.save_match(&fixture).await?;

        info!(
            match_id = %match_id,
            home_goals = result.home_goals,
            away_goals = result.away_goals,
            "Match result recorded"
        );

        match self.leaderboard.recompute_all().await {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                warn!(match_id = %match_id, error = %err, "Leaderboard not refreshed after result");
                Ok(None)
            }
        }
    }

    /// Locks every open match whose kickoff is at or before `now`.
    /// Only the lock flag is written, so a result recorded meanwhile is kept.
    /// A failed write is logged and the remaining matches are still processed.
    #[instrument(skip(self))]
    pub async fn lock_expired_matches(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut locked = 0;

        for fixture in self.repository.get_all_matches().await? {
            if fixture.locked || fixture.kickoff > now {
                continue;
            }

            match self.repository.lock_match(&fixture.id).await {
                Ok(true) => {
                    debug!(match_id = %fixture.id, "Match locked at kickoff");
                    locked += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(match_id = %fixture.id, error = %err, "Failed to lock match");
                }
            }
        }

        Ok(locked)
    }
}
