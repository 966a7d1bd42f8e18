use finance_assistant::{api::start_server, config::AppConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Finance Assistant - API Server");
    info!("📍 Port: {}", config.port);
    info!("🧠 Model: {}", config.inference.model);
    if config.inference.api_token.is_none() {
        eprintln!("⚠️  HF_API_TOKEN not set in .env; AI features will answer with fallback tips");
    }

    info!("📡 Starting API server...");
    start_server(config).await?;

    Ok(())
}
