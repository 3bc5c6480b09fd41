pub mod calculators;

mod errors;
pub mod models;
pub mod rules;

pub use calculators::{calculate_score, RuleBasedCalculator};
pub use errors::ScoringError;
pub use models::*;
pub use rules::{KnockoutMissPolicy, ScoringRules};

/// Match metadata a calculator needs besides the two scorelines.
#[derive(Debug, Clone, Copy)]
pub struct CalculationContext<'a> {
    pub match_id: &'a str,
    pub is_knockout: bool,
}

impl<'a> CalculationContext<'a> {
    pub fn new(match_id: &'a str, is_knockout: bool) -> Self {
        Self {
            match_id,
            is_knockout,
        }
    }
}

/// Maps one prediction against one result to a point value.
///
/// Implementations are pure. An `Err` means the pair cannot be scored
/// and the caller should leave it out of any total.
pub trait ScoreCalculator: Send + Sync {
    fn calculate(
        &self,
        prediction: &Scoreline,
        result: &Scoreline,
        context: &CalculationContext,
    ) -> Result<i32, ScoringError>;
}
