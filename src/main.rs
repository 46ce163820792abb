mod admin;
mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod images;
mod shifts;
mod state;
mod storage;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "doctorshift=debug,axum=info,tower_http=info".to_string());
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

    let (state, pool) = state::AppState::init().await?;
    db::migrate(&pool).await?;

    tracing::info!(
        upload_dir = %state.config.upload_dir.display(),
        origins = ?state.config.cors_origins,
        "starting doctorshift"
    );

    let app = app::build_app(state);
    app::serve(app).await
}
