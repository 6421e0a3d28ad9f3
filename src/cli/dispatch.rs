//! `dispatch` command - the alerting side
//!
//! Reads one alert event (file or stdin), dispatches it and returns the
//! structured outcome. Secret references come from the environment.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::DispatcherConfig;
use crate::notification::{AlertDispatcher, DispatchOutcome, HttpChannelFactory};
use crate::secrets::{EnvSecretStore, FileParameterStore, SecretResolver};

/// `dispatch` command arguments
#[derive(Args)]
pub struct DispatchArgs {
    /// Event JSON file; reads stdin when omitted
    #[arg(long, short)]
    pub event: Option<PathBuf>,

    /// Resolve secrets and select channels without sending
    #[arg(long)]
    pub dry_run: bool,
}

fn read_event(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read event file {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw).context("failed to read event from stdin")?;
            Ok(raw)
        }
    }
}

/// Secret store selected by configuration
pub fn secret_resolver(config: &DispatcherConfig) -> Arc<dyn SecretResolver> {
    match &config.secret_store {
        Some(path) => {
            info!(path = %path.display(), "Resolving secrets from parameter file");
            Arc::new(FileParameterStore::new(path))
        }
        None => {
            info!("Resolving secrets from environment");
            Arc::new(EnvSecretStore::new())
        }
    }
}

/// Build a dispatcher from the environment and dispatch one raw event
pub fn run_dispatch(config: DispatcherConfig, raw_event: &str, dry_run: bool) -> Result<DispatchOutcome> {
    let resolver = secret_resolver(&config);
    let factory = Arc::new(HttpChannelFactory::from_config(&config));
    AlertDispatcher::new(config, resolver, factory)
        .with_dry_run(dry_run)
        .dispatch_json(raw_event)
}

pub fn handle_dispatch(args: DispatchArgs) -> Result<DispatchOutcome> {
    let config = DispatcherConfig::from_env()?;
    let raw = read_event(args.event.as_ref())?;
    run_dispatch(config, &raw, args.dry_run)
}
