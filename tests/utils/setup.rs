use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use tournament_predictor::{
    scoring::ScoringRules, InMemoryTournamentRepository, LeaderboardService, MatchModel,
    TournamentRepository, TournamentService, TournamentSnapshot, UserModel,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Reference instant all fixtures are scheduled against
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap()
}

pub struct TestSetup {
    pub repository: Arc<dyn TournamentRepository>,
    pub leaderboard: Arc<LeaderboardService>,
    pub service: Arc<TournamentService>,
}

impl TestSetup {
    /// Adds a match kicking off `days` after `now()`
    pub async fn add_match(&self, is_knockout: bool, days: i64) -> MatchModel {
        self.service
            .add_match("Home FC", "Away FC", now() + Duration::days(days), is_knockout)
            .await
            .expect("adding a match should succeed")
    }
}

pub struct TestSetupBuilder {
    users: Vec<(String, String)>,
    rules: ScoringRules,
    repository: Option<Arc<dyn TournamentRepository>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            rules: ScoringRules::default(),
            repository: None,
        }
    }

    pub fn with_users(mut self, names: Vec<&str>) -> Self {
        self.users = names
            .into_iter()
            .map(|name| (name.to_lowercase(), name.to_string()))
            .collect();
        self
    }

    pub fn with_rules(mut self, rules: ScoringRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn TournamentRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository: Arc<dyn TournamentRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(InMemoryTournamentRepository::from_snapshot(
                TournamentSnapshot::default(),
            )),
        };

        for (id, name) in &self.users {
            let user = UserModel::new(id.as_str(), name.as_str(), None, Some(id.clone()), now());
            repository
                .save_user(&user)
                .await
                .expect("seeding users should succeed");
        }

        let leaderboard = Arc::new(
            LeaderboardService::builder(repository.clone())
                .with_rules(self.rules)
                .build(),
        );
        let service = Arc::new(TournamentService::new(repository.clone(), leaderboard.clone()));

        TestSetup {
            repository,
            leaderboard,
            service,
        }
    }
}
