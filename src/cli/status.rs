use clap::Parser;
use gameplan::{BackendKind, Session};
use tracing::instrument;

use super::{
    Workspace,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show the backend in use and collection sizes")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Skip the remote connection check
    #[arg(long)]
    offline: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Status {
    #[instrument(level = "debug", skip(self, workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let session = workspace.open()?;

        let connection = if self.offline || session.backend() == BackendKind::Local {
            None
        } else {
            Some(session.probe().map_err(|e| e.to_string()))
        };

        match self.output {
            OutputFormat::Json => Self::output_json(&session, connection.as_ref())?,
            OutputFormat::Table => Self::output_table(&session, connection.as_ref()),
        }
        Ok(())
    }

    fn output_json(
        session: &Session,
        connection: Option<&Result<(), String>>,
    ) -> anyhow::Result<()> {
        use serde_json::json;

        let output = json!({
            "backend": session.backend().to_string(),
            "connected": connection.map(Result::is_ok),
            "error": connection.and_then(|c| c.as_ref().err()),
            "games": session.games.len(),
            "lessons": session.lessons.len(),
            "last_saved": session.games.last_saved(),
            "theme": session.storage().theme().to_string(),
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(session: &Session, connection: Option<&Result<(), String>>) {
        let backend = match (session.backend(), connection) {
            (BackendKind::Remote, Some(Ok(()))) => "remote (connected)".success(),
            (BackendKind::Remote, Some(Err(e))) => {
                format!("remote (unreachable: {e})").warning()
            }
            (BackendKind::Remote, None) => "remote".info(),
            (BackendKind::Local, _) => "local only".info(),
        };

        let last_saved = session.games.last_saved().map_or_else(
            || "never".dim(),
            |at| at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
        );

        if is_narrow() {
            println!("{backend}");
            println!("{} games, {} lessons", session.games.len(), session.lessons.len());
            return;
        }

        println!("Backend     {backend}");
        println!("Games       {}", session.games.len());
        println!("Lessons     {}", session.lessons.len());
        println!("Last saved  {last_saved}");

        if session.games.is_empty() && session.lessons.is_empty() {
            println!();
            println!(
                "{}",
                "No games yet. Add one with 'gameplan game add <POSITION>'.".dim()
            );
        }
    }
}
