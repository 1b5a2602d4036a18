//! The `vibedj serve` command.

use clap::Args;
use vibedj_core::{AppState, Config, LlmClientFactory, Server};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Execute the serve command.
///
/// The backend is chosen here, once, before the listener accepts anything.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!(
        mode = %config.llm.mode,
        max_body_mb = config.limits.max_body_mb,
        "Starting Vibe DJ v{}",
        vibedj_core::VERSION
    );

    let client = LlmClientFactory::create(&config.llm, config.llm_timeout()).inspect_err(|e| {
        tracing::error!(stage = "startup", "Could not create LLM client: {e}");
    })?;

    let state = AppState::new(client, &config);
    let server = Server::bind(&config.server, state).await?;
    server.run().await?;

    Ok(())
}
