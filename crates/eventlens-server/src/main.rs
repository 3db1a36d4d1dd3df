//! EventLens: keyphrase extraction and event recommendation server.

use std::sync::Arc;

use eventlens_core::EventLensConfig;
use eventlens_llm::LlmConfig;
use eventlens_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--help" | "-h" | "help" => {
                println!("EventLens: keyphrase extraction and event recommendations");
                println!();
                println!("Usage: eventlens");
                println!();
                println!("Environment:");
                println!("  PORT                        HTTP port (default 3004)");
                println!("  EVENTLENS_CONFIG            JSON file with pipeline/ranker settings");
                println!("  EVENTLENS_LLM_CONFIG        LLM provider config file");
                println!("  EVENTLENS_MAX_RETRIES       Enhancer attempts per text");
                println!("  EVENTLENS_TIMEOUT_MS        Enhancer call timeout");
                println!("  EVENTLENS_CACHE_ENABLED     true/false");
                println!("  EVENTLENS_CACHE_TTL_HOURS   Keyphrase cache lifetime");
                println!("  EVENTLENS_BATCH_DELAY_MS    Delay between items in bulk ingestion");
                println!("  OPENAI_API_KEY / ANTHROPIC_API_KEY / GROQ_API_KEY");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}. Use 'eventlens help' for usage.", other);
                std::process::exit(1);
            }
        }
    }

    let config = EventLensConfig::from_env()?;
    let port = config.port;
    let llm_config = LlmConfig::load(&config.llm_config_file);

    let state = Arc::new(AppState::new(config, llm_config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("EventLens server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
