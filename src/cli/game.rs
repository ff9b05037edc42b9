use clap::Parser;
use gameplan::{Game, GameDraft, GamePatch, RecordId, Session, SortBy};
use tracing::instrument;

use super::{
    Workspace, confirm, parse_id,
    terminal::{Colorize, is_narrow, remaining_width, truncate},
};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Add a game
    Add(Add),

    /// Change fields of a game
    Edit(Edit),

    /// Delete one or more games
    Delete(Delete),

    /// List games, optionally filtered and sorted
    List(List),

    /// Show every field of a game
    Show(Show),

    /// List the positions in use
    Positions,
}

impl Command {
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let mut session = workspace.open()?;
        match self {
            Self::Add(command) => command.run(&mut session),
            Self::Edit(command) => command.run(&mut session),
            Self::Delete(command) => command.run(&mut session),
            Self::List(command) => command.run(&session),
            Self::Show(command) => command.run(&session),
            Self::Positions => {
                for position in session.games.unique_positions() {
                    println!("{position}");
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Parser)]
pub struct Add {
    /// The starting position
    position: String,

    /// A display label
    #[arg(long, short)]
    name: Option<String>,

    /// The constraint that must hold while playing
    #[arg(long, short)]
    invariant: Option<String>,

    /// The objective of the first player
    #[arg(long, short = 'a')]
    task_a: Option<String>,

    /// The objective of the second player
    #[arg(long, short = 'b')]
    task_b: Option<String>,

    /// How to make the game easier or harder
    #[arg(long)]
    differentiation: Option<String>,
}

impl Add {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        let draft = GameDraft {
            name: self.name.unwrap_or_default(),
            position: self.position,
            invariant: self.invariant.unwrap_or_default(),
            task_player_a: self.task_a.unwrap_or_default(),
            task_player_b: self.task_b.unwrap_or_default(),
            differentiation: self.differentiation.unwrap_or_default(),
        };

        let game = session.games.add(draft)?;
        println!(
            "{}",
            format!("Added game {} ({})", game.id, game.position).success()
        );
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Edit {
    /// The identifier of the game
    #[clap(value_parser = parse_id)]
    id: RecordId,

    /// New display label
    #[arg(long, short)]
    name: Option<String>,

    /// New starting position
    #[arg(long, short)]
    position: Option<String>,

    /// New constraint
    #[arg(long, short)]
    invariant: Option<String>,

    /// New objective for the first player
    #[arg(long, short = 'a')]
    task_a: Option<String>,

    /// New objective for the second player
    #[arg(long, short = 'b')]
    task_b: Option<String>,

    /// New differentiation notes
    #[arg(long)]
    differentiation: Option<String>,
}

impl Edit {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        if session.games.get(&self.id).is_none() {
            anyhow::bail!("Game {} not found", self.id);
        }

        let patch = GamePatch {
            name: self.name,
            position: self.position,
            invariant: self.invariant,
            task_player_a: self.task_a,
            task_player_b: self.task_b,
            differentiation: self.differentiation,
        };
        if patch.is_empty() {
            println!("{}", "Nothing to change".dim());
            return Ok(());
        }

        match session.games.update(&self.id, patch)? {
            Some(game) => println!("{}", format!("Updated game {}", game.id).success()),
            None => println!("{}", format!("Game {} was saved but is no longer listed", self.id).warning()),
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Delete {
    /// The identifiers of the games to delete
    #[clap(required = true, value_parser = parse_id)]
    ids: Vec<RecordId>,

    /// Skip confirmation and undo prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        if let Some(missing) = self.ids.iter().find(|id| session.games.get(id).is_none()) {
            anyhow::bail!("Game {missing} not found");
        }

        if !self.yes {
            println!("Will delete {} game(s):", self.ids.len());
            for game in self.ids.iter().filter_map(|id| session.games.get(id)) {
                println!("  • {}", describe(game));
            }
            if !confirm("Proceed?")? {
                println!("Cancelled");
                return Ok(());
            }
        }

        let removed = session.games.delete_many(&self.ids)?;
        println!(
            "{}",
            format!("Deleted {} game(s)", removed.len()).success()
        );

        if self.yes {
            return Ok(());
        }
        let Some(last) = session.games.undo_available() else {
            return Ok(());
        };
        let prompt = format!("Undo deleting {}?", describe(last));
        if confirm(&prompt)? {
            match session.games.undo_delete()? {
                Some(game) => println!("{}", format!("Restored as {}", game.id).success()),
                None => println!("{}", "Too late, the undo window has closed".warning()),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct List {
    /// Case-insensitive text to look for in any field
    #[arg(long, short, default_value = "")]
    search: String,

    /// Case-insensitive text the position must contain
    #[arg(long, short, default_value = "")]
    position: String,

    /// Sort order (newest, oldest, updated, position)
    #[arg(long, default_value_t)]
    sort: SortBy,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl List {
    #[instrument(level = "debug", skip(session))]
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let games = session.games.filtered(&self.search, &self.position, self.sort);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&games)?);
            return Ok(());
        }

        if games.is_empty() {
            println!("{}", "No games match".dim());
            return Ok(());
        }

        let id_width = games.iter().map(|g| g.id.as_str().len()).max().unwrap_or(0);
        for game in &games {
            if is_narrow() {
                println!("{}", truncate(&describe(game), remaining_width(0)));
            } else {
                let room = remaining_width(id_width + 2);
                println!(
                    "{}  {}",
                    format!("{:<id_width$}", game.id.as_str()).dim(),
                    truncate(&describe(game), room)
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Show {
    /// The identifier of the game
    #[clap(value_parser = parse_id)]
    id: RecordId,
}

impl Show {
    #[instrument(level = "debug", skip(session))]
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let Some(game) = session.games.get(&self.id) else {
            anyhow::bail!("Game {} not found", self.id);
        };

        println!("{}", describe(game).info());
        let fields = [
            ("Invariant", &game.invariant),
            ("Player A", &game.task_player_a),
            ("Player B", &game.task_player_b),
            ("Differentiation", &game.differentiation),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                println!("{label:<16} {value}");
            }
        }
        println!(
            "{}",
            format!(
                "Created {}, updated {}",
                game.created_at.format("%Y-%m-%d %H:%M"),
                game.updated_at.format("%Y-%m-%d %H:%M")
            )
            .dim()
        );
        Ok(())
    }
}

/// One-line summary of a game: its name, if any, and position.
pub fn describe(game: &Game) -> String {
    if game.name.is_empty() {
        game.position.clone()
    } else {
        format!("{} ({})", game.name, game.position)
    }
}
