//! Snapshot (de)serialization for the collected corpus.
//!
//! The retrieval collaborator periodically dumps the crawled games
//! and ratings into a snapshot directory; the engine only ever reads
//! those dumps. Files are plain JSON:
//!
//! - `games.json`: list of [`Game`] records with their forum corpus
//! - `users_rating.json`: user -> game -> rating map

use crate::error::{DataError, Result};
use crate::types::{Game, RatingStore};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

pub const GAMES_FILENAME: &str = "games.json";
pub const RATINGS_FILENAME: &str = "users_rating.json";

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| DataError::SnapshotFormat {
        file: path.display().to_string(),
        source,
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), value).map_err(|source| {
        DataError::SnapshotFormat {
            file: path.display().to_string(),
            source,
        }
    })
}

/// Load the game corpus from a snapshot directory.
pub fn load_games(snapshot_dir: &Path) -> Result<Vec<Game>> {
    let games: Vec<Game> = read_json(&snapshot_dir.join(GAMES_FILENAME))?;
    info!(games = games.len(), "loaded game snapshot");
    Ok(games)
}

/// Load the rating store from a snapshot directory.
pub fn load_ratings(snapshot_dir: &Path) -> Result<RatingStore> {
    let ratings: RatingStore = read_json(&snapshot_dir.join(RATINGS_FILENAME))?;
    let (users, observed) = ratings.counts();
    info!(users, observed, "loaded rating snapshot");
    Ok(ratings)
}

pub fn save_games(snapshot_dir: &Path, games: &[Game]) -> Result<()> {
    write_json(&snapshot_dir.join(GAMES_FILENAME), &games.to_vec())
}

pub fn save_ratings(snapshot_dir: &Path, ratings: &RatingStore) -> Result<()> {
    write_json(&snapshot_dir.join(RATINGS_FILENAME), ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Forum, Post, Thread};
    use std::collections::BTreeMap;

    fn create_test_game() -> Game {
        let thread = Thread {
            id: 101,
            subject: "First impressions".to_string(),
            author: "alice".to_string(),
            posts: vec![
                Post {
                    poster: Some("bob".to_string()),
                    body: "Agreed, great game".to_string(),
                },
                Post {
                    poster: None,
                    body: "[deleted]".to_string(),
                },
            ],
        };
        let mut forums = BTreeMap::new();
        forums.insert(
            "Reviews".to_string(),
            Forum {
                title: "Reviews".to_string(),
                threads: vec![thread],
            },
        );
        Game {
            id: "174430".to_string(),
            name: "Gloomhaven".to_string(),
            description: "Tactical combat campaign".to_string(),
            year_published: Some(2017),
            categories: vec!["Adventure".to_string()],
            forums,
        }
    }

    #[test]
    fn test_game_json_round_trip() {
        let game = create_test_game();
        let json = serde_json::to_string(&game).unwrap();
        let restored: Game = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, game.id);
        let forum = &restored.forums["Reviews"];
        assert_eq!(forum.threads.len(), 1);
        assert_eq!(forum.threads[0].author, "alice");
        assert_eq!(forum.threads[0].posts[0].poster.as_deref(), Some("bob"));
        assert_eq!(forum.threads[0].posts[1].poster, None);
    }

    #[test]
    fn test_snapshot_files_round_trip() {
        let dir = std::env::temp_dir().join(format!("board-data-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let games = vec![create_test_game()];
        let mut ratings = RatingStore::new();
        ratings.insert("alice", "174430", 9.0);

        save_games(&dir, &games).unwrap();
        save_ratings(&dir, &ratings).unwrap();

        let loaded_games = load_games(&dir).unwrap();
        let loaded_ratings = load_ratings(&dir).unwrap();
        assert_eq!(loaded_games.len(), 1);
        assert_eq!(loaded_ratings.rating("alice", "174430"), Some(9.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let missing = Path::new("/nonexistent/snapshot/dir");
        assert!(matches!(load_games(missing), Err(DataError::IoError(_))));
    }
}
