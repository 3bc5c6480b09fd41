use serde::{Deserialize, Serialize};

use crate::scoring::Scoreline;

/// One ranked row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub username: Option<String>,
    pub score: i32,
    pub rank: usize,
}

/// A user's standing. `rank` is `None` when the user has never been scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRank {
    pub rank: Option<usize>,
    pub score: i32,
}

impl UserRank {
    pub fn unranked() -> Self {
        Self {
            rank: None,
            score: 0,
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.rank.is_some()
    }
}

/// Points a single prediction earned, for "points earned" displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPoints {
    pub match_id: String,
    pub team1: String,
    pub team2: String,
    pub prediction: Scoreline,
    pub result: Option<Scoreline>,
    /// `None` while the match has no scoreable result
    pub points: Option<i32>,
}

/// Counters from one `recompute_all` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub users_updated: usize,
    pub users_failed: usize,
    pub predictions_scored: usize,
    pub predictions_skipped: usize,
}
