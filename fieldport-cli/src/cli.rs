//! CLI definition for the fieldport command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// fieldport - CMS field migrations
///
/// Exports field definitions from a site snapshot into a portable JSON
/// document and imports such documents into another site, merging by handle.
#[derive(Parser, Debug)]
#[command(name = "fieldport")]
#[command(version)]
#[command(about = "Export and import CMS field definitions")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file read after fieldport.yaml and fieldport.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export fields to a portable JSON document
    Export {
        /// Site snapshot directory
        #[arg(long, value_name = "DIR")]
        site: PathBuf,
        /// Handle of a top-level field to export (repeatable)
        #[arg(long = "handle", value_name = "HANDLE")]
        handles: Vec<String>,
        /// Export every top-level field
        #[arg(long, conflicts_with = "handles")]
        all: bool,
        /// Key nested items by their live ids instead of placeholders
        #[arg(long)]
        with_ids: bool,
        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Import a portable JSON document into a site
    Import {
        /// Site snapshot directory
        #[arg(long, value_name = "DIR")]
        site: PathBuf,
        /// Document holding one field or an array of fields
        file: PathBuf,
    },
}
