//! Core domain types for the BoardGameGeek forum corpus.
//!
//! This module defines the structures the analytical engine consumes:
//! games with their per-category forums, threads with ordered post
//! lists, and the user rating store. All of them arrive pre-fetched
//! from the collaborator that talks to the remote API; nothing in
//! this crate performs network I/O.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================
// BGG identifies users by username and games/threads by numeric ids
// serialized as strings in most API responses.

/// Forum username, unique per user
pub type UserId = String;

/// Unique identifier for a board game
pub type GameId = String;

/// Unique identifier for a forum thread
pub type ThreadId = u64;

// =============================================================================
// Forum corpus types
// =============================================================================

/// A single post inside a thread.
///
/// The poster field is `None` for posts whose author was absent from
/// the interaction log (deleted accounts, scrubbed records). Such
/// posts never contribute reply edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub poster: Option<UserId>,
    pub body: String,
}

/// A forum thread: an opening author plus an ordered list of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub subject: String,
    pub author: UserId,
    pub posts: Vec<Post>,
}

/// One named forum category of a game (e.g. "Reviews", "Strategy")
/// and all of its threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    pub title: String,
    pub threads: Vec<Thread>,
}

/// A board game together with its forum corpus.
///
/// Forums are keyed by title in a `BTreeMap` so corpus iteration is
/// deterministic run-over-run, which keeps edge aggregation and the
/// downstream rankings reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub description: String,
    pub year_published: Option<u16>,
    pub categories: Vec<String>,
    pub forums: BTreeMap<String, Forum>,
}

impl Game {
    /// Iterate over (forum title, forum) pairs in title order.
    pub fn forums(&self) -> impl Iterator<Item = (&str, &Forum)> {
        self.forums.iter().map(|(title, forum)| (title.as_str(), forum))
    }
}

// =============================================================================
// Rating store
// =============================================================================

/// All collected ratings: user -> game -> rating.
///
/// A missing (user, game) entry means "not rated"; a rating of 0.0 is
/// never used as a sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingStore {
    ratings: HashMap<UserId, HashMap<GameId, f64>>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rating, overwriting any previous value for the pair.
    pub fn insert(&mut self, user: impl Into<UserId>, game: impl Into<GameId>, rating: f64) {
        self.ratings
            .entry(user.into())
            .or_default()
            .insert(game.into(), rating);
    }

    /// Whether this user rated this game.
    pub fn has_rated(&self, user: &str, game: &str) -> bool {
        self.ratings
            .get(user)
            .map(|games| games.contains_key(game))
            .unwrap_or(false)
    }

    pub fn rating(&self, user: &str, game: &str) -> Option<f64> {
        self.ratings.get(user).and_then(|games| games.get(game)).copied()
    }

    /// All ratings of one user, empty map reference if unknown.
    pub fn user_ratings(&self, user: &str) -> Option<&HashMap<GameId, f64>> {
        self.ratings.get(user)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.ratings.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &HashMap<GameId, f64>)> {
        self.ratings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// (user count, observed rating count)
    pub fn counts(&self) -> (usize, usize) {
        let observed = self.ratings.values().map(|games| games.len()).sum();
        (self.ratings.len(), observed)
    }
}
