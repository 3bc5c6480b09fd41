use super::super::{
    CalculationContext, KnockoutMissPolicy, ScoreCalculator, Scoreline, ScoringError,
    ScoringRules,
};

/// Calculator driven by a single `ScoringRules` table.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedCalculator {
    rules: ScoringRules,
}

impl RuleBasedCalculator {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }
}

impl ScoreCalculator for RuleBasedCalculator {
    fn calculate(
        &self,
        prediction: &Scoreline,
        result: &Scoreline,
        context: &CalculationContext,
    ) -> Result<i32, ScoringError> {
        calculate_score(&self.rules, prediction, result, context)
    }
}

/// Scores one prediction against the recorded result of its match.
pub fn calculate_score(
    rules: &ScoringRules,
    prediction: &Scoreline,
    result: &Scoreline,
    context: &CalculationContext,
) -> Result<i32, ScoringError> {
    if context.is_knockout {
        score_knockout(rules, prediction, result, context)
    } else {
        Ok(score_group_stage(rules, prediction, result))
    }
}

fn score_group_stage(rules: &ScoringRules, prediction: &Scoreline, result: &Scoreline) -> i32 {
    if prediction.outcome() != result.outcome() {
        return rules.wrong_prediction;
    }

    rules.correct_winner + score_scoreline(rules, prediction, result)
}

fn score_knockout(
    rules: &ScoringRules,
    prediction: &Scoreline,
    result: &Scoreline,
    context: &CalculationContext,
) -> Result<i32, ScoringError> {
    let actual_winner = result
        .final_winner()
        .ok_or_else(|| ScoringError::IncompleteResult {
            match_id: context.match_id.to_string(),
        })?;

    let outcome_matched = prediction.outcome() == result.outcome();

    let mut score = if outcome_matched {
        rules.correct_winner
    } else if rules.knockout_miss == KnockoutMissPolicy::Forfeit {
        return Ok(rules.wrong_prediction);
    } else {
        rules.wrong_prediction
    };

    score += score_scoreline(rules, prediction, result);

    if prediction.final_winner() == Some(actual_winner) {
        score += rules.correct_ko_winner;
    }

    // Resolution only counts when the regulation outcome was right.
    let predicted_resolution = prediction.resolution_type();
    if outcome_matched
        && predicted_resolution.is_some()
        && predicted_resolution == result.resolution_type()
    {
        score += rules.correct_ko_resolution;
    }

    Ok(score)
}

/// Goal difference and exact score bonuses, independent of the winner.
fn score_scoreline(rules: &ScoringRules, prediction: &Scoreline, result: &Scoreline) -> i32 {
    let mut score = 0;

    if prediction.goal_difference() == result.goal_difference() {
        score += rules.correct_goal_diff;
    }

    if prediction.is_exact(result) {
        score += rules.exact_score;
    }

    score
}
