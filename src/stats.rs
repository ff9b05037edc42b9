//! Summary figures across both collections.

use std::fmt;

use crate::{
    collection::unique_positions,
    domain::{Game, Lesson},
};

/// Label counted for games without a position.
pub const NO_POSITION: &str = "No position";

/// A non-negative number rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OneDecimal {
    tenths: u64,
}

impl OneDecimal {
    /// `numerator / denominator`, rounded half up. `None` if the denominator
    /// is zero.
    #[must_use]
    pub const fn ratio(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        Some(Self {
            tenths: (numerator * 20 + denominator) / (denominator * 2),
        })
    }

    /// The value in tenths.
    #[must_use]
    pub const fn tenths(self) -> u64 {
        self.tenths
    }
}

impl fmt::Display for OneDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

/// Dashboard figures for the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    /// Number of games.
    pub total_games: usize,
    /// Number of lessons.
    pub total_lessons: usize,
    /// Mean length of the lessons' game sequences. `None` without lessons.
    pub average_games_per_lesson: Option<OneDecimal>,
    /// Mean planned duration in whole minutes. Lessons without a duration
    /// count as zero.
    pub average_duration: u64,
    /// The distinct positions, sorted, each with the number of games whose
    /// position is exactly that text.
    pub positions: Vec<(String, usize)>,
    /// The position used by the most games. Ties go to the position seen
    /// first.
    pub most_used_position: Option<String>,
}

impl Dashboard {
    /// Computes the figures.
    #[must_use]
    pub fn compute(games: &[Game], lessons: &[Lesson]) -> Self {
        let lesson_count = lessons.len() as u64;
        let games_in_lessons: u64 = lessons.iter().map(|l| l.game_ids.len() as u64).sum();
        let total_duration: u64 = lessons
            .iter()
            .map(|lesson| u64::from(lesson.duration.unwrap_or(0)))
            .sum();

        let positions = unique_positions(games)
            .into_iter()
            .map(|position| {
                let count = games.iter().filter(|g| g.position == position).count();
                (position, count)
            })
            .collect();

        Self {
            total_games: games.len(),
            total_lessons: lessons.len(),
            average_games_per_lesson: OneDecimal::ratio(games_in_lessons, lesson_count),
            average_duration: (total_duration * 2 + lesson_count.max(1)) / (lesson_count.max(1) * 2),
            positions,
            most_used_position: most_used_position(games),
        }
    }

    /// The number of distinct positions.
    #[must_use]
    pub fn unique_positions(&self) -> usize {
        self.positions.len()
    }
}

fn most_used_position(games: &[Game]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for game in games {
        let position = if game.position.is_empty() {
            NO_POSITION
        } else {
            game.position.as_str()
        };
        match counts.iter_mut().find(|(seen, _)| *seen == position) {
            Some((_, count)) => *count += 1,
            None => counts.push((position, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (position, count) in counts {
        if best.is_none_or(|(_, max)| count > max) {
            best = Some((position, count));
        }
    }
    best.map(|(position, _)| position.to_string())
}
