use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{CalculationContext, Scoreline};

/// A registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub registered_at: DateTime<Utc>,
    /// `None` until the leaderboard has scored at least one prediction
    #[serde(default)]
    pub score: Option<i32>,
}

impl UserModel {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: Option<String>,
        username: Option<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name,
            username,
            is_admin: false,
            registered_at,
            score: None,
        }
    }
}

/// A scheduled fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchModel {
    pub id: String,
    pub team1: String,
    pub team2: String,
    pub kickoff: DateTime<Utc>,
    #[serde(default)]
    pub is_knockout: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub result: Option<Scoreline>,
}

impl MatchModel {
    pub fn new(
        id: impl Into<String>,
        team1: impl Into<String>,
        team2: impl Into<String>,
        kickoff: DateTime<Utc>,
        is_knockout: bool,
    ) -> Self {
        Self {
            id: id.into(),
            team1: team1.into(),
            team2: team2.into(),
            kickoff,
            is_knockout,
            locked: false,
            result: None,
        }
    }

    /// Whether predictions are closed at `now`, either by flag or by kickoff
    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.locked || self.kickoff <= now
    }

    /// Locking never reverts
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn record_result(&mut self, result: Scoreline) {
        self.result = Some(result);
        self.lock();
    }

    pub fn calculation_context(&self) -> CalculationContext<'_> {
        CalculationContext::new(&self.id, self.is_knockout)
    }
}

/// A user's guess for one match. One per (user, match); later writes replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionModel {
    pub user_id: String,
    pub match_id: String,
    #[serde(flatten)]
    pub scoreline: Scoreline,
    pub updated_at: DateTime<Utc>,
}

impl PredictionModel {
    pub fn new(
        user_id: impl Into<String>,
        match_id: impl Into<String>,
        scoreline: Scoreline,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            match_id: match_id.into(),
            scoreline,
            updated_at,
        }
    }
}

/// Full contents of a repository, used to seed the in-memory backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    #[serde(default)]
    pub users: Vec<UserModel>,
    #[serde(default)]
    pub matches: Vec<MatchModel>,
    #[serde(default)]
    pub predictions: Vec<PredictionModel>,
}
