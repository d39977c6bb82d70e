use std::sync::Arc;

use clap::{Parser, ValueEnum};
use mxp_gateway::{
    build_app, config::Config, logging, mcp::stdio::serve_stdio, mxp_client::MxpClient, AppState,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// REST routes and MCP over HTTP
    Http,
    /// MCP over newline-delimited stdin/stdout
    Stdio,
}

#[derive(Parser)]
#[command(name = "mxp-gateway", version, about = "MCP and REST gateway for the MXP backend")]
struct Cli {
    #[arg(long, value_enum, default_value_t = Transport::Http)]
    transport: Transport,

    /// Overrides BIND_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging();

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    let client = MxpClient::new(&config.upstream)?;
    info!(upstream = ?config.upstream, "mxp client configured");
    let state = AppState::new(config.api_token.clone(), Arc::new(client));

    match cli.transport {
        Transport::Stdio => serve_stdio(state).await?,
        Transport::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                auth = config.api_token.is_some(),
                "server starting"
            );

            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
