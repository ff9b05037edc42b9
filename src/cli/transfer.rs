use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use gameplan::transfer::{
    self, ImportDocument, ImportObserver, ImportOutcome, ImportPlan, export_all,
    export_collection,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::instrument;

use super::{Workspace, confirm, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Export {
    /// File to write to. Prints to stdout when omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Export a single collection as a bare list
    #[arg(long, value_name = "COLLECTION")]
    only: Option<Only>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Only {
    Games,
    Lessons,
}

impl Export {
    #[instrument(skip(workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let session = workspace.open()?;

        let json = match self.only {
            None => export_all(&session.games, &session.lessons).to_json_pretty()?,
            Some(Only::Games) => export_collection(session.games.records())?,
            Some(Only::Lessons) => export_collection(session.lessons.records())?,
        };

        let Some(path) = self.output else {
            println!("{json}");
            return Ok(());
        };
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!(
            "{}",
            format!(
                "Exported {} games and {} lessons to {}",
                if matches!(self.only, Some(Only::Lessons)) { 0 } else { session.games.len() },
                if matches!(self.only, Some(Only::Games)) { 0 } else { session.lessons.len() },
                path.display()
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Import {
    /// The export file to read
    file: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Import {
    #[instrument(skip(workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let text = fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let document = ImportDocument::parse(&text)?;

        let mut session = workspace.open()?;
        let mut observer = Progress {
            yes: self.yes,
            bar: None,
            prompt_error: None,
        };

        let outcome = transfer::import_all(
            &mut session.games,
            &mut session.lessons,
            document,
            &mut observer,
        );
        if let Some(bar) = &observer.bar {
            bar.finish_and_clear();
        }
        if let Some(e) = observer.prompt_error {
            return Err(e);
        }

        match outcome? {
            ImportOutcome::Cancelled => println!("Cancelled"),
            ImportOutcome::Imported { games, lessons } => println!(
                "{}",
                format!("Imported {games} games and {lessons} lessons").success()
            ),
        }
        Ok(())
    }
}

/// Asks for confirmation, then shows a progress bar while records are
/// created.
struct Progress {
    yes: bool,
    bar: Option<ProgressBar>,
    prompt_error: Option<anyhow::Error>,
}

impl Progress {
    fn ask(plan: &ImportPlan) -> anyhow::Result<bool> {
        if plan.replaces_games {
            println!(
                "This looks like an older games-only export. It will replace your {} games \
                 with {} imported games. Lessons are left unchanged.",
                plan.current_games, plan.incoming_games
            );
        } else {
            println!(
                "This will add {} games and {} lessons to your {} games and {} lessons.",
                plan.incoming_games, plan.incoming_lessons, plan.current_games, plan.current_lessons
            );
        }
        confirm("Proceed?")
    }
}

impl ImportObserver for Progress {
    fn confirm(&mut self, plan: &ImportPlan) -> bool {
        let proceed = if self.yes {
            true
        } else {
            match Self::ask(plan) {
                Ok(proceed) => proceed,
                Err(e) => {
                    self.prompt_error = Some(e);
                    false
                }
            }
        };

        if proceed {
            let total = (plan.incoming_games + plan.incoming_lessons) as u64;
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            self.bar = Some(bar);
        }
        proceed
    }

    fn created(&mut self, collection: &'static str) {
        if let Some(bar) = &self.bar {
            bar.set_message(collection);
            bar.inc(1);
        }
    }
}
