use clap::Parser;
use gameplan::{
    LessonDraft, LessonPatch, RecordId, Session,
    collection::{GameSlot, LessonView},
    domain::Lesson,
};
use tracing::instrument;

use super::{
    Workspace, confirm,
    game::describe,
    parse_id,
    terminal::{Colorize, remaining_width, truncate},
};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Compose a lesson from existing games
    Add(Add),

    /// Change fields of a lesson
    Edit(Edit),

    /// Delete a lesson
    Delete(Delete),

    /// List lessons
    List(List),

    /// Show a lesson with its games in order
    Show(Show),
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
        }
    }
}

#[derive(Debug, Parser)]
pub struct Add {
    /// The lesson name
    name: String,

    /// The games in teaching order (comma-separated identifiers)
    #[clap(long, short, required = true, value_delimiter = ',', value_parser = parse_id)]
    games: Vec<RecordId>,

    /// A free-text description
    #[arg(long)]
    description: Option<String>,

    /// Planned duration in minutes (1-600)
    #[arg(long, short = 't')]
    duration: Option<String>,

    /// Target level
    #[arg(long, short)]
    level: Option<String>,

    /// Coaching notes
    #[arg(long, short)]
    notes: Option<String>,
}

impl Add {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        let unknown = unknown_games(session, &self.games);
        if !unknown.is_empty() {
            anyhow::bail!("Unknown game(s): {}", unknown.join(", "));
        }

        let draft = LessonDraft {
            name: self.name,
            description: self.description.unwrap_or_default(),
            duration: self.duration,
            level: self.level.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            game_ids: self.games,
        };

        let lesson = session.lessons.add(draft)?;
        println!(
            "{}",
            format!(
                "Added lesson {} ({}, {} games)",
                lesson.id,
                lesson.name,
                lesson.game_ids.len()
            )
            .success()
        );
        Ok(())
    }
}

fn unknown_games(session: &Session, ids: &[RecordId]) -> Vec<String> {
    ids.iter()
        .filter(|id| session.games.get(id).is_none())
        .map(ToString::to_string)
        .collect()
}

#[derive(Debug, Parser)]
pub struct Edit {
    /// The identifier of the lesson
    #[clap(value_parser = parse_id)]
    id: RecordId,

    /// New name
    #[arg(long)]
    name: Option<String>,

    /// New game sequence (comma-separated identifiers)
    #[clap(long, short, value_delimiter = ',', value_parser = parse_id)]
    games: Option<Vec<RecordId>>,

    /// New description
    #[arg(long)]
    description: Option<String>,

    /// New duration in minutes; an empty value clears it
    #[arg(long, short = 't')]
    duration: Option<String>,

    /// New level
    #[arg(long, short)]
    level: Option<String>,

    /// New notes
    #[arg(long, short)]
    notes: Option<String>,
}

impl Edit {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        if session.lessons.get(&self.id).is_none() {
            anyhow::bail!("Lesson {} not found", self.id);
        }
        if let Some(games) = &self.games {
            let unknown = unknown_games(session, games);
            if !unknown.is_empty() {
                anyhow::bail!("Unknown game(s): {}", unknown.join(", "));
            }
        }

        let patch = LessonPatch {
            name: self.name,
            description: self.description,
            duration: self.duration,
            level: self.level,
            notes: self.notes,
            game_ids: self.games,
        };
        if patch.is_empty() {
            println!("{}", "Nothing to change".dim());
            return Ok(());
        }

        match session.lessons.update(&self.id, patch)? {
            Some(lesson) => println!("{}", format!("Updated lesson {}", lesson.id).success()),
            None => println!(
                "{}",
                format!("Lesson {} was saved but is no longer listed", self.id).warning()
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Delete {
    /// The identifier of the lesson
    #[clap(value_parser = parse_id)]
    id: RecordId,

    /// Skip confirmation and undo prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        let Some(lesson) = session.lessons.get(&self.id) else {
            anyhow::bail!("Lesson {} not found", self.id);
        };

        if !self.yes && !confirm(&format!("Delete lesson '{}'?", lesson.name))? {
            println!("Cancelled");
            return Ok(());
        }

        let Some(removed) = session.lessons.delete(&self.id)? else {
            return Ok(());
        };
        println!("{}", format!("Deleted lesson '{}'", removed.name).success());

        if !self.yes && confirm("Undo?")? {
            match session.lessons.undo_delete()? {
                Some(lesson) => println!("{}", format!("Restored as {}", lesson.id).success()),
                None => println!("{}", "Too late, the undo window has closed".warning()),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct List {
    /// Case-insensitive text to look for in name, description, level or notes
    #[arg(long, short, default_value = "")]
    search: String,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl List {
    #[instrument(level = "debug", skip(session))]
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let lessons = session.lessons.filtered(&self.search);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&lessons)?);
            return Ok(());
        }

        if lessons.is_empty() {
            println!("{}", "No lessons match".dim());
            return Ok(());
        }

        let id_width = lessons.iter().map(|l| l.id.as_str().len()).max().unwrap_or(0);
        for lesson in lessons {
            println!(
                "{}  {}",
                format!("{:<id_width$}", lesson.id.as_str()).dim(),
                truncate(&summary(lesson), remaining_width(id_width + 2))
            );
        }
        Ok(())
    }
}

fn summary(lesson: &Lesson) -> String {
    let mut parts = vec![format!("{} games", lesson.game_ids.len())];
    if let Some(minutes) = lesson.duration {
        parts.push(format!("{minutes} min"));
    }
    if !lesson.level.is_empty() {
        parts.push(lesson.level.clone());
    }
    format!("{} ({})", lesson.name, parts.join(", "))
}

#[derive(Debug, Parser)]
pub struct Show {
    /// The identifier of the lesson
    #[clap(value_parser = parse_id)]
    id: RecordId,
}

impl Show {
    #[instrument(level = "debug", skip(session))]
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let Some(lesson) = session.lessons.get(&self.id) else {
            anyhow::bail!("Lesson {} not found", self.id);
        };
        let view = LessonView::resolve(lesson, session.games.records());

        println!("{}", summary(lesson).info());
        if !lesson.description.is_empty() {
            println!("{}", lesson.description);
        }
        println!();
        for (index, slot) in view.games.iter().enumerate() {
            match slot {
                GameSlot::Found(game) => println!("{:>3}. {}", index + 1, describe(game)),
                GameSlot::Missing(id) => println!(
                    "{:>3}. {}",
                    index + 1,
                    format!("missing game {id}").warning()
                ),
            }
        }
        if !lesson.notes.is_empty() {
            println!();
            println!("{}", lesson.notes.dim());
        }

        let missing = view.missing().count();
        if missing > 0 {
            tracing::warn!("Lesson {} refers to {missing} deleted game(s)", lesson.id);
        }
        Ok(())
    }
}
