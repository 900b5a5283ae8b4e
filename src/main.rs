// ABOUTME: Entry point for the quizd binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;

use quizd_agent::HttpGateway;
use quizd_server::{AppState, QuizdConfig, create_router};

#[derive(Parser, Debug)]
#[command(name = "quizd", about = "Agent-driven trivia quiz service")]
struct Cli {
    /// Socket address to bind, overriding QUIZD_BIND.
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizd=debug,tower_http=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = QuizdConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    let gateway = Arc::new(HttpGateway::new(config.agent_url.clone()));
    let state = Arc::new(AppState::new(gateway, config.agent_id.clone()));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(bind = %config.bind, agent_url = %config.agent_url, agent_id = %config.agent_id, "quizd listening");
    axum::serve(listener, router).await?;

    Ok(())
}
