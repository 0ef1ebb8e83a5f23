//! remote-launch: start containers on remote hosts from a launch description

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use launch_description::parser;
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "remote-launch")]
#[command(about = "Launch containers on remote hosts inside detached screen sessions")]
#[command(version)]
struct Cli {
    /// Launch description file
    #[arg(short, long, global = true, default_value = "launch.yaml")]
    description: PathBuf,

    /// Override a description argument
    #[arg(short = 'a', long = "arg", global = true, value_name = "KEY=VALUE", value_parser = parse_key_val)]
    args: Vec<(String, String)>,

    /// Log level, overrides settings.log_level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the description file
    Validate {
        /// Strict mode - fail on references that cannot be resolved
        #[arg(short, long)]
        strict: bool,
    },

    /// Print the composed commands without running anything
    Compose {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Start every action and wait for all of them to finish
    Run,
}

/// Output format for `compose`
#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    /// Human readable
    Text,
    /// One JSON array of plans
    Json,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn main() -> Result<()> {
    let Cli {
        description: path,
        args,
        log_level,
        command,
    } = Cli::parse();

    let description = parser::parse_file(&path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    logging::init(log_level.as_deref().or(description.settings.log_level.as_deref()))?;

    let ctx = description.resolution_context(args.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    smol::block_on(async move {
        match command {
            Commands::Validate { strict } => {
                commands::validate::run(&path, &description, &ctx, strict).await
            }
            Commands::Compose { format } => commands::compose::run(&description, &ctx, format).await,
            Commands::Run => commands::run::run(&description, &ctx).await,
        }
    })
}
