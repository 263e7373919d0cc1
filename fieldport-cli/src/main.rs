//! fieldport CLI.
//!
//! Commands:
//! - `fieldport export --site <dir> (--handle <h>... | --all) [--with-ids] [-o <file>]`
//! - `fieldport import --site <dir> <file>`
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error, or at least one field failed to import

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("fieldport=debug,fieldport_site=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = dispatch_command(cli).await;
    std::process::exit(exit_code);
}

async fn dispatch_command(cli: Cli) -> i32 {
    let config = match config::load_config(Path::new("."), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };

    match cli.command {
        Commands::Export {
            site,
            handles,
            all,
            with_ids,
            output,
        } => result_to_exit(run_export(config, &site, &handles, all, with_ids, output.as_deref()).await),
        Commands::Import { site, file } => match commands::import(config, &site, &file).await {
            Ok(summary) => {
                for (handle, id) in &summary.imported {
                    eprintln!("imported {handle} ({id})");
                }
                for handle in &summary.failed {
                    eprintln!("failed {handle}");
                }
                for issue in &summary.issues {
                    eprintln!("  {issue}");
                }
                summary.exit_code()
            }
            Err(e) => result_to_exit::<anyhow::Error>(Err(e)),
        },
    }
}

async fn run_export(
    config: fieldport::MigrationConfig,
    site: &Path,
    handles: &[String],
    all: bool,
    with_ids: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (json, manifest) = commands::export(config, site, handles, all, with_ids).await?;
    match output {
        Some(path) => tokio::fs::write(path, json).await?,
        None => println!("{json}"),
    }
    for handle in manifest {
        eprintln!("exported {handle}");
    }
    Ok(())
}

/// Convert a `Result<(), E: Display>` to an exit code.
fn result_to_exit<E: std::fmt::Display>(result: Result<(), E>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
