//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Per-target store filename, kept in the sync target directory
pub const TARGET_STORE_FILE: &str = ".sandworm.json";

/// Host-wide store filename, kept in the sandworm config directory
pub const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Parser, Debug)]
#[command(
    name = "sandworm",
    version,
    about = "Keep a claude.ai project document in sync with a local file"
)]
pub struct Cli {
    /// Sync target directory
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Configure the session key, organization and project
    Setup {
        /// Ask again even for values that are already configured
        #[arg(long)]
        force: bool,
    },
    /// Upload a file, replacing the previously pushed document
    Push {
        file: PathBuf,
        /// Document name in the project (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete every document in the project
    Purge {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the configured project and tracked document
    Status,
}

impl Cli {
    pub fn target_store_path(&self) -> PathBuf {
        self.dir.join(TARGET_STORE_FILE)
    }
}

/// Document name for `file` when none was given
pub fn remote_name(file: &Path, name: Option<&str>) -> Option<String> {
    match name {
        Some(name) => Some(name.to_string()),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
    }
}
