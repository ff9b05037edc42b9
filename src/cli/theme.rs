use clap::Parser;
use gameplan::Theme as Preference;
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Show or change the preferred color theme")]
pub struct Theme {
    /// The theme to switch to (light, dark, toggle). Shows the current theme
    /// when omitted.
    #[arg(value_name = "THEME")]
    change: Option<Change>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Change {
    Light,
    Dark,
    Toggle,
}

impl Theme {
    #[instrument(level = "debug", skip(workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let session = workspace.open()?;
        let storage = session.storage();
        let current = storage.theme();

        let Some(change) = self.change else {
            println!("{current}");
            return Ok(());
        };

        let next = match change {
            Change::Light => Preference::Light,
            Change::Dark => Preference::Dark,
            Change::Toggle => current.toggled(),
        };
        storage.set_theme(next)?;
        println!("{}", format!("Theme set to {next}").success());
        Ok(())
    }
}
