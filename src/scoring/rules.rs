use serde::{Deserialize, Serialize};

/// What a wrong regulation winner costs in a knockout match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnockoutMissPolicy {
    /// Apply `WRONG_PREDICTION` and keep scoring the other criteria.
    #[default]
    Penalize,
    /// Return `WRONG_PREDICTION` and nothing else, as in the group stage.
    Forfeit,
}

/// Point table applied by the calculator. Keys follow the canonical
/// category names so a JSON table like `{"CORRECT_WINNER": 1}` overrides
/// single entries and keeps the reference value for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ScoringRules {
    pub correct_winner: i32,
    pub correct_goal_diff: i32,
    pub exact_score: i32,
    pub correct_ko_winner: i32,
    pub correct_ko_resolution: i32,
    pub wrong_prediction: i32,
    pub knockout_miss: KnockoutMissPolicy,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            correct_winner: 2,
            correct_goal_diff: 1,
            exact_score: 2,
            correct_ko_winner: 1,
            correct_ko_resolution: 1,
            wrong_prediction: -1,
            knockout_miss: KnockoutMissPolicy::Penalize,
        }
    }
}
