use mcp_time::config::Configuration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "mcp_time=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Configuration::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        },
    };

    let state = mcp_time::initialize_state()?;
    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!(address = %config.address(), hostname = %state.hostname, "server started");

    axum::serve(listener, mcp_time::app(state)).await?;

    Ok(())
}
