//! remu CLI - per-site build configuration and multi-domain static hosting.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use remu_site::OutputFormat;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "remu")]
#[command(about = "Per-site build configuration and multi-domain static hosting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to remu.toml config file
    #[arg(short, long, default_value = "remu.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the build configuration for the site named by SITE
    Site {
        /// Output format (json or toml)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Project root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the built sites by host name
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        listen: Option<String>,

        /// Reload cached files when they change on disk
        #[arg(long)]
        watch: bool,

        /// Open browser on the local test domain
        #[arg(long)]
        open: bool,
    },

    /// Write a default remu.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for rendered configuration
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Site {
            format,
            root,
            output,
        } => {
            let site = remu_site::site_from_env();
            commands::site::run(site.as_deref(), root, format, output)?;
        }
        Commands::Serve {
            listen,
            watch,
            open,
        } => {
            commands::serve::run(&cli.config, listen, watch, open).await?;
        }
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
    }

    Ok(())
}
