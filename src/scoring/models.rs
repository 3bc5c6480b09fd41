use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::ScoringError;

/// How a match was decided. `FullTime` is implied for any scoreline that
/// is not level after regulation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum ResolutionType {
    #[serde(rename = "FT")]
    #[strum(serialize = "FT")]
    FullTime,
    #[serde(rename = "ET")]
    #[strum(serialize = "ET")]
    ExtraTime,
    #[serde(rename = "PEN")]
    #[strum(serialize = "PEN")]
    Penalties,
}

/// The side that advances from a knockout match. `Team1` is the home side.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum KnockoutWinner {
    #[serde(rename = "1")]
    #[strum(serialize = "1")]
    Team1,
    #[serde(rename = "2")]
    #[strum(serialize = "2")]
    Team2,
}

/// Regulation-time outcome of a scoreline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Away,
    Draw,
}

impl Outcome {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Less => Outcome::Away,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// The side this outcome sends through, if regulation decided it.
    pub fn winner(self) -> Option<KnockoutWinner> {
        match self {
            Outcome::Home => Some(KnockoutWinner::Team1),
            Outcome::Away => Some(KnockoutWinner::Team2),
            Outcome::Draw => None,
        }
    }
}

/// How a knockout tie level after regulation was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiebreak {
    pub resolution_type: ResolutionType,
    pub knockout_winner: KnockoutWinner,
}

/// Shared shape of a match result and a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreline {
    pub home_goals: u32,
    pub away_goals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<Tiebreak>,
}

impl Scoreline {
    pub fn new(home_goals: u32, away_goals: u32) -> Self {
        Self {
            home_goals,
            away_goals,
            tiebreak: None,
        }
    }

    pub fn with_tiebreak(
        home_goals: u32,
        away_goals: u32,
        resolution_type: ResolutionType,
        knockout_winner: KnockoutWinner,
    ) -> Self {
        Self {
            home_goals,
            away_goals,
            tiebreak: Some(Tiebreak {
                resolution_type,
                knockout_winner,
            }),
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_goals(self.home_goals, self.away_goals)
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.home_goals) - i64::from(self.away_goals)
    }

    pub fn is_exact(&self, other: &Scoreline) -> bool {
        self.home_goals == other.home_goals && self.away_goals == other.away_goals
    }

    /// Resolution type with `FT` implied for decided scorelines. `None` for
    /// a draw that carries no tiebreak.
    pub fn resolution_type(&self) -> Option<ResolutionType> {
        match self.outcome() {
            Outcome::Draw => self.tiebreak.map(|t| t.resolution_type),
            _ => Some(ResolutionType::FullTime),
        }
    }

    /// Side that advances once the tiebreak is taken into account.
    pub fn final_winner(&self) -> Option<KnockoutWinner> {
        self.outcome()
            .winner()
            .or_else(|| self.tiebreak.map(|t| t.knockout_winner))
    }
}

/// Raw prediction or result as submitted by a collaborator, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub home_goals: i64,
    pub away_goals: i64,
    #[serde(default)]
    pub resolution_type: Option<ResolutionType>,
    #[serde(default)]
    pub knockout_winner: Option<KnockoutWinner>,
}

impl ScoreSubmission {
    pub fn new(home_goals: i64, away_goals: i64) -> Self {
        Self {
            home_goals,
            away_goals,
            resolution_type: None,
            knockout_winner: None,
        }
    }

    pub fn with_tiebreak(
        mut self,
        resolution_type: ResolutionType,
        knockout_winner: KnockoutWinner,
    ) -> Self {
        self.resolution_type = Some(resolution_type);
        self.knockout_winner = Some(knockout_winner);
        self
    }

    /// Validates the submission for a match of the given stage.
    ///
    /// A tiebreak is required for a level knockout scoreline and rejected
    /// everywhere else. `FT`, and a knockout winner that agrees with a
    /// decided scoreline, are accepted and dropped.
    pub fn into_scoreline(self, is_knockout: bool) -> Result<Scoreline, ScoringError> {
        let invalid_goals = || ScoringError::InvalidGoals {
            home_goals: self.home_goals,
            away_goals: self.away_goals,
        };
        let home_goals = goal_count(self.home_goals).ok_or_else(invalid_goals)?;
        let away_goals = goal_count(self.away_goals).ok_or_else(invalid_goals)?;

        let outcome = Outcome::from_goals(home_goals, away_goals);

        if is_knockout && outcome == Outcome::Draw {
            let resolution_type = match self.resolution_type {
                Some(ResolutionType::FullTime) | None => {
                    return Err(ScoringError::MissingTiebreak(
                        "a level knockout scoreline needs ET or PEN".to_string(),
                    ))
                }
                Some(resolution_type) => resolution_type,
            };
            let knockout_winner = self.knockout_winner.ok_or_else(|| {
                ScoringError::MissingTiebreak(
                    "a level knockout scoreline needs a knockout winner".to_string(),
                )
            })?;
            return Ok(Scoreline::with_tiebreak(
                home_goals,
                away_goals,
                resolution_type,
                knockout_winner,
            ));
        }

        if let Some(resolution_type) = self.resolution_type {
            if resolution_type != ResolutionType::FullTime {
                return Err(ScoringError::UnexpectedTiebreak(format!(
                    "{resolution_type} given for a {home_goals}-{away_goals} scoreline"
                )));
            }
        }

        if let Some(knockout_winner) = self.knockout_winner {
            if !is_knockout || outcome.winner() != Some(knockout_winner) {
                return Err(ScoringError::UnexpectedTiebreak(format!(
                    "knockout winner {knockout_winner} given for a {home_goals}-{away_goals} scoreline"
                )));
            }
        }

        Ok(Scoreline::new(home_goals, away_goals))
    }
}

/// Goal counts are stored as non-negative `INTEGER` columns
fn goal_count(value: i64) -> Option<u32> {
    i32::try_from(value)
        .ok()
        .and_then(|goals| u32::try_from(goals).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_resolution_and_winner_tokens() {
        assert_eq!(
            ResolutionType::from_str("PEN").unwrap(),
            ResolutionType::Penalties
        );
        assert_eq!(ResolutionType::ExtraTime.to_string(), "ET");
        assert_eq!(KnockoutWinner::from_str("2").unwrap(), KnockoutWinner::Team2);
        assert!(ResolutionType::from_str("AET").is_err());
    }

    #[test]
    fn tokens_survive_display_and_parse() {
        for resolution in ResolutionType::iter() {
            assert_eq!(ResolutionType::from_str(resolution.as_ref()), Ok(resolution));
        }
        for winner in KnockoutWinner::iter() {
            assert_eq!(winner.to_string().parse::<KnockoutWinner>(), Ok(winner));
        }
    }

    #[test]
    fn decided_scoreline_implies_full_time() {
        let scoreline = Scoreline::new(3, 1);
        assert_eq!(scoreline.resolution_type(), Some(ResolutionType::FullTime));
        assert_eq!(scoreline.final_winner(), Some(KnockoutWinner::Team1));
        assert_eq!(scoreline.goal_difference(), 2);
    }

    #[test]
    fn level_scoreline_takes_winner_from_tiebreak() {
        let scoreline =
            Scoreline::with_tiebreak(1, 1, ResolutionType::Penalties, KnockoutWinner::Team2);
        assert_eq!(scoreline.outcome(), Outcome::Draw);
        assert_eq!(scoreline.final_winner(), Some(KnockoutWinner::Team2));
        assert_eq!(scoreline.resolution_type(), Some(ResolutionType::Penalties));

        let bare = Scoreline::new(0, 0);
        assert_eq!(bare.final_winner(), None);
        assert_eq!(bare.resolution_type(), None);
    }

    #[test]
    fn rejects_negative_goals() {
        let result = ScoreSubmission::new(-1, 2).into_scoreline(false);
        assert!(matches!(
            result,
            Err(ScoringError::InvalidGoals {
                home_goals: -1,
                away_goals: 2
            })
        ));
    }

    #[test]
    fn rejects_goal_counts_beyond_storage_range() {
        let too_many = i64::from(i32::MAX) + 1;
        let result = ScoreSubmission::new(too_many, 0).into_scoreline(false);
        assert!(matches!(result, Err(ScoringError::InvalidGoals { .. })));

        let largest = ScoreSubmission::new(i64::from(i32::MAX), 0)
            .into_scoreline(false)
            .unwrap();
        assert_eq!(largest.home_goals, i32::MAX as u32);
    }

    #[test]
    fn knockout_draw_requires_tiebreak() {
        let missing = ScoreSubmission::new(2, 2).into_scoreline(true);
        assert!(matches!(missing, Err(ScoringError::MissingTiebreak(_))));

        let full_time = ScoreSubmission::new(2, 2)
            .with_tiebreak(ResolutionType::FullTime, KnockoutWinner::Team1)
            .into_scoreline(true);
        assert!(matches!(full_time, Err(ScoringError::MissingTiebreak(_))));

        let settled = ScoreSubmission::new(2, 2)
            .with_tiebreak(ResolutionType::ExtraTime, KnockoutWinner::Team1)
            .into_scoreline(true)
            .unwrap();
        assert_eq!(
            settled.tiebreak,
            Some(Tiebreak {
                resolution_type: ResolutionType::ExtraTime,
                knockout_winner: KnockoutWinner::Team1,
            })
        );
    }

    #[test]
    fn tiebreak_rejected_outside_level_knockout() {
        let group = ScoreSubmission::new(1, 1)
            .with_tiebreak(ResolutionType::Penalties, KnockoutWinner::Team1)
            .into_scoreline(false);
        assert!(matches!(group, Err(ScoringError::UnexpectedTiebreak(_))));

        let decided = ScoreSubmission::new(2, 1)
            .with_tiebreak(ResolutionType::ExtraTime, KnockoutWinner::Team1)
            .into_scoreline(true);
        assert!(matches!(decided, Err(ScoringError::UnexpectedTiebreak(_))));

        let contradicting = ScoreSubmission::new(2, 1)
            .with_tiebreak(ResolutionType::FullTime, KnockoutWinner::Team2)
            .into_scoreline(true);
        assert!(matches!(
            contradicting,
            Err(ScoringError::UnexpectedTiebreak(_))
        ));
    }

    #[test]
    fn full_time_marker_is_dropped() {
        let scoreline = ScoreSubmission::new(2, 1)
            .with_tiebreak(ResolutionType::FullTime, KnockoutWinner::Team1)
            .into_scoreline(true)
            .unwrap();
        assert_eq!(scoreline, Scoreline::new(2, 1));
    }
}
