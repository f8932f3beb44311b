//! PromptAssist - Rust Implementation
//!
//! Prompt analysis and optimization service with an HTTP API and an MCP
//! stdio server.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use prompt_assist::api::{self, AppState};
use prompt_assist::config::Config;
use prompt_assist::mcp::McpServer;
use prompt_assist::service::{PromptService, VERSION};
use prompt_assist::telemetry::{self, LogTarget};

/// PromptAssist
#[derive(Parser)]
#[command(name = "prompt-assist")]
#[command(author, version, about = "PromptAssist - AI-powered prompt analysis and optimization")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Override API_HOST
        #[arg(long)]
        host: Option<String>,

        /// Override API_PORT
        #[arg(long)]
        port: Option<u16>,

        /// Override LOG_LEVEL
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Run the MCP server on stdio
    Mcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::new().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        log_level: None,
    }) {
        Commands::Serve {
            host,
            port,
            log_level,
        } => {
            if let Some(host) = host {
                config.api_host = host;
            }
            if let Some(port) = port {
                config.api_port = port;
            }
            if let Some(level) = log_level {
                config.log_level = level;
            }

            telemetry::init(&config, LogTarget::Stdout)?;
            run_api(config).await
        }
        Commands::Mcp => {
            // Tools call the analyzer directly.
            config.cache_enabled = false;

            telemetry::init(&config, LogTarget::Stderr)?;
            run_mcp(config).await
        }
    }
}

async fn run_api(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting PromptAssist API v{}", VERSION);
    tracing::info!("Environment: {}", config.api_env);

    let service = PromptService::from_config(config)
        .await
        .context("failed to initialize prompt service")?;

    api::serve(AppState::new(Arc::new(service))).await?;
    Ok(())
}

async fn run_mcp(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting PromptAssist MCP server v{}", VERSION);

    let service = PromptService::from_config(config)
        .await
        .context("failed to initialize prompt service")?;

    let mut server = McpServer::new(Arc::new(service));
    server.run_stdio().await?;

    Ok(())
}
