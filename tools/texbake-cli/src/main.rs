//! texbake CLI: bake textures onto ship models and fetch remote imagery.
//!
//! Usage:
//!   texbake render --model <P> --texture <TOP> --texture <SIDE>   Bake explicit paths
//!   texbake bake <SHIP_MODEL> <TEXTURE_DATE>                     Bake named inputs
//!   texbake fetch <REMOTE_PATH> [-o FILE]                        Fetch a file from the mount
//!   texbake check                                                Check renderer, template and dirs
//!   texbake config [--save]                                      Show the effective config
//!
//! Job outcomes are printed to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use texbake_common::config::ServiceConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "texbake",
    about = "Texture baking render orchestration",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/texbake/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake textures onto a model given explicit paths or URLs
    Render {
        /// Model path or URL
        #[arg(short, long)]
        model: String,

        /// Texture paths in order: top view, side view, then any extras
        #[arg(short, long = "texture", required = true)]
        textures: Vec<String>,
    },

    /// Bake the textures for a date onto a named ship model
    Bake {
        /// Model name, without extension
        ship_model: String,

        /// Texture date (YYYYMMDD)
        texture_date: String,
    },

    /// Fetch a file from the remote mount
    Fetch {
        /// Absolute path under the allow-listed mount prefix
        remote_path: String,

        /// Write the bytes here instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check renderer, script template and directories
    Check,

    /// Print the effective configuration (secrets omitted)
    Config {
        /// Also write it to the standard config location
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load_from(path)?,
        None => ServiceConfig::load(),
    };
    config.apply_env_overrides()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    texbake_common::logging::init_logging(&config.logging);

    let succeeded = match cli.command {
        Commands::Render { model, textures } => commands::render::run(&config, model, textures).await?,
        Commands::Bake {
            ship_model,
            texture_date,
        } => commands::bake::run(&config, ship_model, texture_date).await?,
        Commands::Fetch {
            remote_path,
            output,
        } => commands::fetch::run(&config, remote_path, output).await?,
        Commands::Check => commands::check::run(&config)?,
        Commands::Config { save } => commands::config::run(&config, save)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
