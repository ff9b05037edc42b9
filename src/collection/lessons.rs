use crate::{
    collection::Lessons,
    domain::{Game, Lesson, Record, RecordId},
};

impl Lessons {
    /// The lessons whose name, description, level or notes contain `search`,
    /// ignoring case. A blank search matches everything.
    #[must_use]
    pub fn filtered(&self, search: &str) -> Vec<&Lesson> {
        let needle = search.trim().to_lowercase();
        self.records()
            .iter()
            .filter(|lesson| needle.is_empty() || lesson.matches(&needle))
            .collect()
    }
}

/// One entry of a lesson's game sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSlot<'a> {
    /// The game exists.
    Found(&'a Game),
    /// The lesson refers to a game that no longer exists.
    Missing(&'a RecordId),
}

/// A lesson with its game sequence resolved against the games collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonView<'a> {
    /// The lesson.
    pub lesson: &'a Lesson,
    /// The games in teaching order, duplicates included.
    pub games: Vec<GameSlot<'a>>,
}

impl<'a> LessonView<'a> {
    /// Resolves each of the lesson's game identifiers.
    #[must_use]
    pub fn resolve(lesson: &'a Lesson, games: &'a [Game]) -> Self {
        let games = lesson
            .game_ids
            .iter()
            .map(|id| {
                games
                    .iter()
                    .find(|game| &game.id == id)
                    .map_or(GameSlot::Missing(id), GameSlot::Found)
            })
            .collect();
        Self { lesson, games }
    }

    /// The identifiers that do not resolve to a game.
    pub fn missing(&self) -> impl Iterator<Item = &'a RecordId> + '_ {
        self.games.iter().filter_map(|slot| match slot {
            GameSlot::Missing(id) => Some(*id),
            GameSlot::Found(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        collection::Collection,
        domain::{GameDraft, LessonDraft},
        storage::{Gateway, LocalStorage, LocalStore},
    };

    fn game(id: &str, position: &str) -> Game {
        Game::from_draft(RecordId::new(id), GameDraft::new(position), Utc::now())
    }

    #[test]
    fn resolves_games_in_order_and_reports_missing() {
        let games = vec![game("g1", "Mount"), game("g2", "Guard")];
        let lesson = Lesson::from_draft(
            RecordId::new("l1"),
            LessonDraft::new(
                "Week 1",
                vec![
                    RecordId::new("g2"),
                    RecordId::new("gone"),
                    RecordId::new("g1"),
                    RecordId::new("g2"),
                ],
            ),
            Utc::now(),
        );

        let view = LessonView::resolve(&lesson, &games);

        assert_eq!(
            view.games,
            vec![
                GameSlot::Found(&games[1]),
                GameSlot::Missing(&lesson.game_ids[1]),
                GameSlot::Found(&games[0]),
                GameSlot::Found(&games[1]),
            ]
        );
        assert_eq!(view.missing().collect::<Vec<_>>(), [&RecordId::new("gone")]);
    }

    #[test]
    fn filtered_searches_text_fields_in_owned_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf());
        let mut lessons: Lessons =
            Collection::new(Gateway::local(LocalStore::new(storage.clone())), storage);
        let games = vec![RecordId::new("g1")];

        let basics = lessons
            .add(LessonDraft {
                level: "Beginner".to_string(),
                ..LessonDraft::new("Guard basics", games.clone())
            })
            .unwrap();
        let passing = lessons
            .add(LessonDraft {
                notes: "Pair beginners with seniors".to_string(),
                ..LessonDraft::new("Passing", games)
            })
            .unwrap();

        assert_eq!(lessons.filtered("BEGINNER"), vec![&passing, &basics]);
        assert_eq!(lessons.filtered("guard"), vec![&basics]);
        assert_eq!(lessons.filtered(" "), vec![&passing, &basics]);
    }
}
