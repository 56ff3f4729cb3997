//! Minimal host that serves a handler chain built from a configuration file

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use visitorip_core::{handler_fn, Context, IntoResponse, Registry, Server};

/// Serve HTTP through the handlers declared in a configuration file
#[derive(Parser, Debug)]
#[command(name = "visitorip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, one directive per line (e.g. `visitor_ip stdout`)
    #[arg(short, long)]
    config: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut registry = Registry::new();
    visitorip::register(&mut registry)?;

    let file = cli.config.display().to_string();
    let input = tokio::fs::read_to_string(&cli.config).await?;
    let layers = registry.load_config(&file, &input, &Context::new())?;

    let handler = handler_fn(|_req| async { Ok(().into_response()) });
    Server::new(layers, handler).run(&cli.listen).await
}
