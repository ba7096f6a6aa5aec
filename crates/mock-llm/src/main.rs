use clap::Parser;
use mock_llm::{Config, ConfigStore, MockLlmServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mock-llm", version, about = "Mock OpenAI-style chat-completion server")]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,
    /// YAML configuration file (defaults to ./mock-llm.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let path = args.config.unwrap_or_else(Config::default_path);
    let config = Config::from_file(&path)?;
    config.log_summary(&format!("Loaded configuration from {}", path.display()));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let store = Arc::new(ConfigStore::new(config)?);

    tokio::select! {
        result = MockLlmServer::new(addr, store).run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
