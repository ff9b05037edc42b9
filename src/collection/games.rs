use std::{fmt, str::FromStr};

use crate::{
    collection::Games,
    domain::{Game, Record},
};

/// Orderings offered for the games view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Most recently created first.
    #[default]
    Newest,
    /// Least recently created first.
    Oldest,
    /// Most recently modified first.
    Updated,
    /// Alphabetical by position, ignoring case.
    Position,
}

impl SortBy {
    const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::Updated, Self::Position];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Updated => "updated",
            Self::Position => "position",
        }
    }

    fn sort(self, games: &mut [&Game]) {
        match self {
            Self::Newest => games.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Oldest => games.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Self::Updated => games.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            Self::Position => games.sort_by_cached_key(|game| game.position.to_lowercase()),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown sort order '{s}' (expected newest, oldest, updated or position)")
            })
    }
}

impl Games {
    /// The games matching a free-text search and a position filter, in the
    /// requested order.
    ///
    /// Both filters are case-insensitive substring matches and are ignored
    /// when blank. The search looks at every text field; the position filter
    /// only at the position. Games that compare equal keep their relative
    /// order.
    #[must_use]
    pub fn filtered(&self, search: &str, position: &str, sort: SortBy) -> Vec<&Game> {
        let needle = search.trim().to_lowercase();
        let position = position.trim().to_lowercase();

        let mut games: Vec<&Game> = self
            .records()
            .iter()
            .filter(|game| needle.is_empty() || game.matches(&needle))
            .filter(|game| position.is_empty() || game.position.to_lowercase().contains(&position))
            .collect();
        sort.sort(&mut games);
        games
    }

    /// The distinct positions in use, sorted.
    #[must_use]
    pub fn unique_positions(&self) -> Vec<String> {
        unique_positions(self.records())
    }
}

/// The distinct trimmed, non-empty positions of `games`, sorted.
///
/// Positions that differ only in case are kept apart.
#[must_use]
pub fn unique_positions(games: &[Game]) -> Vec<String> {
    let mut positions: Vec<String> = games
        .iter()
        .map(|game| game.position.trim())
        .filter(|position| !position.is_empty())
        .map(str::to_string)
        .collect();
    positions.sort();
    positions.dedup();
    positions
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};
    use test_case::test_case;

    use super::*;
    use crate::{
        collection::Collection,
        domain::{GameDraft, RecordId},
        storage::{Gateway, LocalStorage, LocalStore},
    };

    fn game(id: &str, position: &str, created_secs: i64, updated_secs: i64) -> Game {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Game {
            id: RecordId::new(id),
            name: String::new(),
            position: position.to_string(),
            invariant: String::new(),
            task_player_a: String::new(),
            task_player_b: String::new(),
            differentiation: String::new(),
            created_at: epoch + TimeDelta::seconds(created_secs),
            updated_at: epoch + TimeDelta::seconds(updated_secs),
        }
    }

    fn ids(games: &[&Game]) -> Vec<String> {
        games.iter().map(|game| game.id.to_string()).collect()
    }

    fn sample() -> Vec<Game> {
        vec![
            game("c", "mount", 30, 30),
            game("b", "Closed Guard", 20, 50),
            game("a", "Half Guard", 10, 40),
        ]
    }

    fn sort(games: &[Game], sort: SortBy) -> Vec<String> {
        let mut refs: Vec<&Game> = games.iter().collect();
        sort.sort(&mut refs);
        ids(&refs)
    }

    #[test_case(SortBy::Newest, &["c", "b", "a"]; "newest")]
    #[test_case(SortBy::Oldest, &["a", "b", "c"]; "oldest")]
    #[test_case(SortBy::Updated, &["b", "a", "c"]; "updated")]
    #[test_case(SortBy::Position, &["b", "a", "c"]; "position ignores case")]
    fn sorts(order: SortBy, expected: &[&str]) {
        assert_eq!(sort(&sample(), order), expected);
    }

    #[test]
    fn position_sort_is_stable() {
        let games = vec![
            game("first", "Guard", 10, 10),
            game("second", "guard", 20, 20),
            game("third", "GUARD", 5, 5),
        ];
        assert_eq!(sort(&games, SortBy::Position), ["first", "second", "third"]);
    }

    #[test_case("newest", SortBy::Newest)]
    #[test_case("Oldest", SortBy::Oldest)]
    #[test_case(" updated ", SortBy::Updated)]
    #[test_case("POSITION", SortBy::Position)]
    fn parses_sort_order(input: &str, expected: SortBy) {
        assert_eq!(input.parse::<SortBy>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<SortBy>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_sort_order() {
        assert!("alphabetical".parse::<SortBy>().is_err());
    }

    #[test]
    fn unique_positions_are_trimmed_sorted_and_case_sensitive() {
        let games = vec![
            game("1", " Mount", 0, 0),
            game("2", "mount", 0, 0),
            game("3", "Mount ", 0, 0),
            game("4", "", 0, 0),
            game("5", "Back", 0, 0),
        ];
        assert_eq!(unique_positions(&games), ["Back", "Mount", "mount"]);
    }

    #[test]
    fn filtered_applies_search_and_position() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf());
        let mut games: Games = Collection::new(Gateway::local(LocalStore::new(storage.clone())), storage);

        let guard_pass = games
            .add(GameDraft {
                task_player_a: "Pass the GUARD".to_string(),
                ..GameDraft::new("Half Guard")
            })
            .unwrap();
        let mount = games
            .add(GameDraft {
                invariant: "Stay on top".to_string(),
                ..GameDraft::new("Mount")
            })
            .unwrap();
        let sweep = games
            .add(GameDraft {
                name: "Sweep drill".to_string(),
                ..GameDraft::new("Closed Guard")
            })
            .unwrap();

        let all = games.filtered("", "", SortBy::Newest);
        assert_eq!(all, vec![&sweep, &mount, &guard_pass]);

        assert_eq!(games.filtered("  pass ", "", SortBy::Newest), vec![&guard_pass]);
        assert_eq!(games.filtered("", "guard", SortBy::Position), vec![&sweep, &guard_pass]);
        assert_eq!(games.filtered("top", "guard", SortBy::Newest), Vec::<&Game>::new());

        // The owned order is untouched by filtering.
        assert_eq!(games.records()[0], sweep);
    }
}
