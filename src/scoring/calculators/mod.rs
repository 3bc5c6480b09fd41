mod rule_based;

pub use rule_based::{calculate_score, RuleBasedCalculator};
