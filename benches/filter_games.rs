//! This bench measures searching, filtering and sorting a large games
//! collection, and reloading it from local storage.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gameplan::{
    GameDraft, Games, LocalStorage, SortBy,
    storage::{Gateway, LocalStore},
};
use tempfile::TempDir;

const POSITIONS: [&str; 6] = [
    "Closed Guard",
    "Half Guard",
    "Mount",
    "Side Control",
    "Back Control",
    "Turtle",
];

fn open(dir: &TempDir) -> Games {
    let storage = LocalStorage::new(dir.path().to_path_buf());
    let mut games = Games::new(Gateway::local(LocalStore::new(storage.clone())), storage);
    games.load();
    games
}

/// Fills a local collection with games spread over a handful of positions
fn preseed(dir: &TempDir) -> Games {
    let mut games = open(dir);
    for i in 0..500 {
        games
            .add(GameDraft {
                name: format!("Drill {i}"),
                invariant: if i % 3 == 0 {
                    "Keep a grip on the collar".to_string()
                } else {
                    String::new()
                },
                ..GameDraft::new(POSITIONS[i % POSITIONS.len()])
            })
            .unwrap();
    }
    games
}

fn filter_games(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let games = preseed(&dir);

    c.bench_function("filter games by text", |b| {
        b.iter(|| games.filtered("collar", "", SortBy::Newest).len());
    });

    c.bench_function("filter games by position, sorted", |b| {
        b.iter(|| games.filtered("", "guard", SortBy::Position).len());
    });

    c.bench_function("reload games", |b| {
        b.iter_batched(|| open(&dir), |mut games| games.load(), BatchSize::SmallInput);
    });
}

criterion_group!(benches, filter_games);
criterion_main!(benches);
