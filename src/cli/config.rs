use std::fs;

use anyhow::Context;
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Show the stored configuration
    Show,

    /// Set a configuration value
    ///
    /// Keys: remote_url, remote_key, undo_window_secs. An empty value clears
    /// a remote setting.
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Command {
    #[instrument(skip(workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let mut config = workspace.stored_config()?;

        match self {
            Self::Show => {
                println!("Configuration:");
                println!(
                    "  remote_url: {}",
                    config.remote_url().unwrap_or("(not set)")
                );
                println!(
                    "  remote_key: {}",
                    if config.has_remote_key() {
                        "(set)".to_string()
                    } else {
                        "(not set)".dim()
                    }
                );
                println!("  undo_window_secs: {}", config.undo_window_secs());
                if config.remote_credentials().is_none() {
                    println!("{}", "Running against local storage only".dim());
                }
            }
            Self::Set { key, value } => {
                match key.as_str() {
                    "remote_url" => config = config.with_remote_url(Some(value.trim().to_string())),
                    "remote_key" => config = config.with_remote_key(Some(value.trim().to_string())),
                    "undo_window_secs" => {
                        let secs = value.trim().parse().with_context(|| {
                            format!("undo_window_secs must be a whole number of seconds, got '{value}'")
                        })?;
                        config.set_undo_window_secs(secs);
                    }
                    _ => anyhow::bail!(
                        "Unknown configuration key '{key}' (expected remote_url, remote_key or undo_window_secs)"
                    ),
                }

                fs::create_dir_all(&workspace.data_dir).with_context(|| {
                    format!("Failed to create {}", workspace.data_dir.display())
                })?;
                config
                    .save(&workspace.config_path())
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                println!("{}", format!("Set {key}").success());
            }
        }
        Ok(())
    }
}
