use std::error::Error;
use std::sync::Arc;

use tournament_predictor::{
    config::AppConfig,
    leaderboard::LeaderboardService,
    tournament::{
        start_lock_task, InMemoryTournamentRepository, LockTaskConfig,
        PostgresTournamentRepository, TournamentRepository, TournamentService,
    },
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tournament_predictor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tournament predictor");

    let config = AppConfig::from_env()?;

    let repository: Arc<dyn TournamentRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            info!("Using PostgreSQL repository");
            Arc::new(PostgresTournamentRepository::new(pool))
        }
        None => {
            let snapshot = config.load_snapshot()?;
            info!(
                users = snapshot.users.len(),
                matches = snapshot.matches.len(),
                predictions = snapshot.predictions.len(),
                "Using in-memory repository"
            );
            Arc::new(InMemoryTournamentRepository::from_snapshot(snapshot))
        }
    };

    let leaderboard = Arc::new(
        LeaderboardService::builder(repository.clone())
            .with_rules(config.scoring_rules)
            .build(),
    );
    let service = Arc::new(TournamentService::new(repository, leaderboard.clone()));

    // Scores may be stale from a previous run or a different rules table
    if let Err(e) = leaderboard.recompute_all().await {
        warn!(error = %e, "Initial leaderboard recompute failed");
    }

    let lock_task = tokio::spawn(start_lock_task(
        service,
        LockTaskConfig {
            check_interval: config.lock_check_interval,
        },
    ));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    lock_task.abort();

    Ok(())
}
