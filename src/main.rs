use docflow::{auth, config, routes, state, storage};
use std::sync::Arc;
use std::time::Duration;

/// How often expired sessions are swept from memory.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docflow=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    storage::ensure_dirs(&config.upload_folder)?;

    let state = Arc::new(state::AppState::from_config(config).await?);

    if state.config.seed_demo_users {
        auth::seed_demo_users(&state).await?;
    }
    if state.grammar.is_none() {
        tracing::info!("Grammar checking disabled (GRAMMAR_CHECK_URL not set)");
    }

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweeper.sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} expired sessions", purged);
            }
        }
    });

    let app = routes::router(state.clone());

    let addr = format!("{}:{}", state.config.host, state.config.port);
    tracing::info!("docflow listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
