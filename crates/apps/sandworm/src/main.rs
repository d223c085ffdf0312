//! Sandworm - push a local file into a claude.ai project

mod cli;
mod prompt;

use anyhow::{Context, Result, bail};
use clap::Parser;
use claude::{ClientConfig, ProjectSync, PushOutcome, SetupOutcome, keys};
use config::{ConfigStore, JsonFileStore};
use dialoguer::Confirm;
use log::{error, info};
use std::sync::Arc;

use cli::{CREDENTIALS_FILE, Cli, Command};
use prompt::TerminalPrompter;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let client_config = ClientConfig::load().context("Failed to load client settings")?;

    let credentials = Arc::new(
        JsonFileStore::open_in_config_dir(CREDENTIALS_FILE)
            .context("Failed to open credential store")?,
    );
    let target_path = cli.target_store_path();
    let target = Arc::new(
        JsonFileStore::open(&target_path)
            .with_context(|| format!("Failed to open {}", target_path.display()))?,
    );

    let sync = claude::connect(&client_config, credentials, target.clone())?;

    match cli.command {
        Command::Setup { force } => setup(&sync, force),
        Command::Push { file, name } => {
            let Some(name) = cli::remote_name(&file, name.as_deref()) else {
                bail!("Cannot derive a document name from {}", file.display());
            };
            push(&sync, &file, &name)
        }
        Command::Purge { yes } => purge(&sync, yes),
        Command::Status => {
            status(&sync, target.as_ref());
            Ok(())
        }
    }
}

fn setup(sync: &ProjectSync, force: bool) -> Result<()> {
    match sync.setup(&mut TerminalPrompter, force)? {
        SetupOutcome::Ready => {
            info!("Setup complete");
            Ok(())
        }
        SetupOutcome::NoOrganizations => bail!("Setup incomplete: no organizations"),
        SetupOutcome::NoActiveProjects => bail!("Setup incomplete: no active projects"),
    }
}

fn push(sync: &ProjectSync, file: &std::path::Path, name: &str) -> Result<()> {
    match sync.push(file, name)? {
        PushOutcome::Unchanged { document_id } => {
            println!("{} is unchanged (document {})", name, document_id);
        }
        PushOutcome::Uploaded {
            document_id,
            replaced,
        } => {
            if let Some(old) = replaced {
                println!("Replaced document {}", old);
            }
            println!("Uploaded {} as document {}", name, document_id);
        }
    }
    Ok(())
}

fn purge(sync: &ProjectSync, yes: bool) -> Result<()> {
    sync.validate_config()?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every document in the selected project?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Purge cancelled");
            return Ok(());
        }
    }

    let deleted = sync.purge_project_files(|name, index, total| {
        println!("[{}/{}] Deleting {}", index, total, name);
    })?;
    println!("Purged {} document(s)", deleted);
    Ok(())
}

fn status(sync: &ProjectSync, target: &dyn ConfigStore) {
    let show = |label: &str, value: Option<String>| {
        println!("{:<14} {}", label, value.as_deref().unwrap_or("(not set)"));
    };

    let session = if sync.api().session().is_present() {
        "configured"
    } else {
        "(not set)"
    };
    println!("{:<14} {}", "Session key:", session);
    show("Organization:", target.get(keys::ORGANIZATION_ID));
    show("Project:", target.get(keys::PROJECT_ID));

    let tracked = sync.tracked_document();
    show("Document:", tracked.document_id);
    show("Content hash:", tracked.content_hash);
}
