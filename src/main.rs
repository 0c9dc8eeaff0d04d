use tracing::{error, warn};

mod app;
mod auth;
mod config;
mod dashboard;
mod db;
mod error;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "worknet=debug,axum=info,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        warn!(error = %e, "migration failed; continuing");
    }

    // Fire-and-forget warm-up so a cold serverless database is ready
    // before the first real request hits it.
    let pool = state.db.clone();
    tokio::spawn(async move {
        if let Err(e) = db::warm_up(&pool).await {
            error!(error = %e, "database warm-up failed on startup");
        }
    });

    let app = app::build_app(state);
    app::serve(app).await
}
