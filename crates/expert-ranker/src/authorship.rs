//! Thread authorship index.
//!
//! Answers "which threads did this user open for this game, per forum
//! category" in O(1), which the quota selector and the presentation
//! layer both need. Built once per corpus pass.

use board_data::{Game, GameId, ThreadId, UserId};
use std::collections::HashMap;

/// author -> game -> forum title -> thread ids
#[derive(Debug, Clone, Default)]
pub struct ThreadAuthorship {
    threads: HashMap<UserId, HashMap<GameId, HashMap<String, Vec<ThreadId>>>>,
}

impl ThreadAuthorship {
    /// Index every thread of the corpus by its opening author.
    pub fn from_games(games: &[Game]) -> Self {
        let mut threads: HashMap<UserId, HashMap<GameId, HashMap<String, Vec<ThreadId>>>> =
            HashMap::new();

        for game in games {
            for (title, forum) in game.forums() {
                for thread in &forum.threads {
                    threads
                        .entry(thread.author.clone())
                        .or_default()
                        .entry(game.id.clone())
                        .or_default()
                        .entry(title.to_string())
                        .or_default()
                        .push(thread.id);
                }
            }
        }

        Self { threads }
    }

    /// Threads a user authored under one forum category of one game.
    pub fn thread_ids(&self, user: &str, game: &str, forum: &str) -> &[ThreadId] {
        self.threads
            .get(user)
            .and_then(|games| games.get(game))
            .and_then(|forums| forums.get(forum))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_authored(&self, user: &str, game: &str, forum: &str) -> bool {
        !self.thread_ids(user, game, forum).is_empty()
    }

    /// All (forum title, thread ids) pairs of a user for one game.
    pub fn forums(&self, user: &str, game: &str) -> impl Iterator<Item = (&str, &[ThreadId])> {
        self.threads
            .get(user)
            .and_then(|games| games.get(game))
            .into_iter()
            .flat_map(|forums| {
                forums
                    .iter()
                    .map(|(title, ids)| (title.as_str(), ids.as_slice()))
            })
    }
}
