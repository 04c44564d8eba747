mod app;
mod assignments;
mod auth;
mod config;
mod cookies;
mod db;
mod error;
mod flash;
mod lessons;
mod state;
mod users;
mod validation;
mod views;


use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "eduleaner=debug,axum=info,tower_http=info".to_string());
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

    views::init()?;
    let state = AppState::init().await?;
    let app = app::build_app(state);
    app::serve(app).await
}
