//! Vibe DJ - ask a vision LLM for the musical vibe of an image.
//!
//! # Usage
//!
//! ```bash
//! # Serve with the local Ollama backend
//! vibedj serve
//!
//! # Serve with the hosted backend, reading ENV/REPLICATE_API_TOKEN from a file
//! vibedj --env-file ../.env serve
//!
//! # Describe an image
//! curl --data-binary @photo.jpg http://localhost:8080/findTheVibe
//!
//! # View configuration
//! vibedj config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod env_file;
mod logging;

/// Vibe DJ - HTTP front-end that describes the musical vibe of an image.
#[derive(Parser, Debug)]
#[command(name = "vibedj")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "VIBEDJ_CONFIG")]
    config: Option<String>,

    /// Environment file to load before reading ENV, LLM_URL and
    /// REPLICATE_API_TOKEN (defaults to ./.env if present)
    #[arg(long, global = true)]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(cli::serve::ServeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The env file must be loaded before the config reads the environment.
    let env_file = env_file::load(cli.env_file.as_deref());
    let config = cli::load_config(cli.config.as_deref());

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let logging_config = match &config {
        Ok(config) => config.logging.clone(),
        Err(e) => {
            eprintln!("Warning: Failed to load config: {e}");
            Default::default()
        }
    };
    logging::init_from_config(&logging_config, cli.verbose, cli.json_logs);

    tracing::debug!("Vibe DJ v{}", vibedj_core::VERSION);

    match env_file {
        Ok(Some(path)) => tracing::info!("Loaded environment from {}", path.display()),
        Ok(None) => tracing::debug!("No .env file found, using process environment"),
        Err(e) => {
            tracing::error!(stage = "startup", "{e:#}");
            return Err(e);
        }
    }

    match cli.command {
        Commands::Serve(args) => {
            let config = config.inspect_err(|e| {
                tracing::error!(stage = "startup", "Configuration error: {e}");
            })?;
            cli::serve::execute(args, config).await
        }
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    }
}
