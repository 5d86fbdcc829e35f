//! docforge: generates customised agreement documents from `.docx` templates.
//!
//! `docforge serve` runs the HTTP service; `docforge init` scaffolds a
//! configuration file and bucket directory; `docforge variants` lists the
//! template variants the service would register.

mod api;
mod commands;
mod output;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docforge_core::config::{ServiceConfig, CONFIG_FILE};

#[derive(Parser)]
#[command(
    name = "docforge",
    about = "Agreement generator: targeted substitutions in .docx templates",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to docforge.config.json (default: ./docforge.config.json)
    #[arg(long, global = true, default_value = CONFIG_FILE, env = "DOCFORGE_CONFIG")]
    config: PathBuf,

    /// Bucket root directory (overrides the config file)
    #[arg(long, global = true, env = "DOCFORGE_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Base URL under which generated documents are served (overrides the config file)
    #[arg(long, global = true, env = "DOCFORGE_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Listen address (overrides the config file)
        #[arg(long, env = "DOCFORGE_BIND")]
        bind: Option<SocketAddr>,
    },

    /// Write a default config file and create the bucket directories
    Init,

    /// List the registered template variants and the edit keys they accept
    Variants,
}

impl Cli {
    /// Config file values with command-line overrides applied.
    fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = ServiceConfig::load_or_default(&self.config)?;
        if let Some(root) = &self.storage_root {
            config.storage_root = root.clone();
        }
        if let Some(url) = &self.public_base_url {
            config.public_base_url = url.clone();
        }
        if let Commands::Serve { bind: Some(bind) } = &self.command {
            config.bind = *bind;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG takes precedence over -v.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = cli.service_config()?;
    match cli.command {
        Commands::Serve { .. } => commands::serve::run(config).await?,
        Commands::Init => commands::init::run(&cli.config, &config)?,
        Commands::Variants => commands::variants::run(&config)?,
    }

    Ok(())
}
