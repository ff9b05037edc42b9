use std::path::{Path, PathBuf};

mod config;
mod game;
mod lesson;
mod stats;
mod status;
mod terminal;
mod theme;
mod transfer;

use anyhow::Context;
use clap::ArgAction;
use gameplan::{Config, RecordId, Session};
use status::Status;
use tracing::instrument;

/// Name of the configuration file inside the data directory.
const CONFIG_FILE: &str = "config.toml";

/// Parse a record identifier, rejecting blank input.
fn parse_id(s: &str) -> Result<RecordId, String> {
    s.parse()
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding local data and the configuration file
    #[arg(
        short,
        long,
        env = "GAMEPLAN_DATA_DIR",
        default_value = ".gameplan",
        global = true
    )]
    data_dir: PathBuf,

    /// Base URL of the remote store
    #[arg(long, env = "GAMEPLAN_REMOTE_URL", global = true)]
    remote_url: Option<String>,

    /// Access key for the remote store
    #[arg(long, env = "GAMEPLAN_REMOTE_KEY", hide_env_values = true, global = true)]
    remote_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let workspace = Workspace {
            data_dir: self.data_dir,
            remote_url: self.remote_url,
            remote_key: self.remote_key,
        };

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(&workspace)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Where a command finds its data, and the credential overrides from the
/// command line.
#[derive(Debug, Clone)]
pub struct Workspace {
    data_dir: PathBuf,
    remote_url: Option<String>,
    remote_key: Option<String>,
}

impl Workspace {
    /// A workspace with no credential overrides.
    #[cfg(test)]
    pub const fn local(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            remote_url: None,
            remote_key: None,
        }
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// The stored configuration, without command-line overrides.
    fn stored_config(&self) -> anyhow::Result<Config> {
        load_config(&self.config_path())
    }

    /// The configuration with command-line and environment overrides applied.
    fn config(&self) -> anyhow::Result<Config> {
        Ok(self
            .stored_config()?
            .with_remote_url(self.remote_url.clone())
            .with_remote_key(self.remote_key.clone()))
    }

    /// Opens a session on this workspace.
    #[instrument(level = "debug", skip(self))]
    fn open(&self) -> anyhow::Result<Session> {
        let config = self.config()?;
        Ok(Session::open(&config, self.data_dir.clone()))
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Config::load(path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("in {}", path.display()))
}

/// Ask a yes/no question on the terminal. Defaults to no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show the backend and collection sizes (default)
    Status(Status),

    /// Manage games
    #[command(subcommand)]
    Game(game::Command),

    /// Manage lessons
    #[command(subcommand)]
    Lesson(lesson::Command),

    /// Write every game and lesson to a file
    Export(transfer::Export),

    /// Load games and lessons from an export file
    ///
    /// A full export is added to the existing records. An older export
    /// holding only a list of games replaces the existing games.
    Import(transfer::Import),

    /// Show summary statistics
    Stats(stats::Stats),

    /// Reload both collections from the backend
    Refresh,

    /// Show or change the preferred color theme
    Theme(theme::Theme),

    /// Show or modify configuration settings
    #[command(subcommand)]
    Config(config::Command),
}

impl Command {
    fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(workspace)?,
            Self::Game(command) => command.run(workspace)?,
            Self::Lesson(command) => command.run(workspace)?,
            Self::Export(command) => command.run(workspace)?,
            Self::Import(command) => command.run(workspace)?,
            Self::Stats(command) => command.run(workspace)?,
            Self::Refresh => refresh(workspace)?,
            Self::Theme(command) => command.run(workspace)?,
            Self::Config(command) => command.run(workspace)?,
        }
        Ok(())
    }
}

#[instrument(skip(workspace))]
fn refresh(workspace: &Workspace) -> anyhow::Result<()> {
    use terminal::Colorize;

    let mut session = workspace.open()?;
    session.refresh();
    println!(
        "{}",
        format!(
            "Reloaded {} games and {} lessons from {} storage",
            session.games.len(),
            session.lessons.len(),
            session.backend()
        )
        .success()
    );
    Ok(())
}
