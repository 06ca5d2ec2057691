use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cookie_sessions::{routes, Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;

    match state.sessions.codec().self_test() {
        Ok(()) => {
            tracing::info!("✅ Session encryption self-test passed");
        }
        Err(e) => {
            tracing::error!("❌ Session encryption self-test failed: {}", e);
            return Err(e.into());
        }
    }

    let app = routes::app(state);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
