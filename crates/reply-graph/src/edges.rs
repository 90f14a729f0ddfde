//! Reply edge aggregation.
//!
//! Turns the noisy thread corpus into per-game weighted directed
//! edges between users: every distinct poster replying inside a
//! thread contributes the forum's normalized weight to the edge
//! (poster -> thread author). Both endpoints must have rated the
//! game in question, so users outside the rater population never
//! become graph nodes.

use crate::weights::ForumWeights;
use board_data::{Game, GameId, RatingStore, UserId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Per-game accumulated reply edges: (replier, author) -> weight.
#[derive(Debug, Clone, Default)]
pub struct ReplyEdges {
    edges: HashMap<GameId, HashMap<(UserId, UserId), f64>>,
}

impl ReplyEdges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate weight onto an edge, creating game and edge entries
    /// on first touch. Accumulation is strictly additive: a pair
    /// replying across several threads or forums sums weights, never
    /// overwrites.
    pub fn add(&mut self, game: &str, replier: &str, author: &str, weight: f64) {
        *self
            .edges
            .entry(game.to_string())
            .or_default()
            .entry((replier.to_string(), author.to_string()))
            .or_insert(0.0) += weight;
    }

    /// All edges of one game, `None` if the game produced no
    /// qualifying edges.
    pub fn for_game(&self, game: &str) -> Option<&HashMap<(UserId, UserId), f64>> {
        self.edges.get(game)
    }

    pub fn edge_weight(&self, game: &str, replier: &str, author: &str) -> Option<f64> {
        self.edges
            .get(game)?
            .get(&(replier.to_string(), author.to_string()))
            .copied()
    }

    pub fn games(&self) -> impl Iterator<Item = &GameId> {
        self.edges.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Build the per-game reply edges from the thread corpus.
///
/// Qualification rules per thread:
/// - the thread author must have rated the owning game, otherwise the
///   whole thread is skipped;
/// - each *distinct* named poster of the thread (anonymous posts are
///   ignored) adds one forum weight to (poster -> author), provided
///   the poster also rated the game and is not the author;
/// - forums whose title is absent from the weight table contribute
///   nothing.
pub fn build_reply_edges(
    games: &[Game],
    ratings: &RatingStore,
    weights: &ForumWeights,
) -> ReplyEdges {
    let mut edges = ReplyEdges::new();

    for game in games {
        for (title, forum) in game.forums() {
            let Some(forum_weight) = weights.weight(title) else {
                debug!(game = %game.id, forum = title, "forum outside weight catalogue, skipped");
                continue;
            };

            for thread in &forum.threads {
                let author = &thread.author;
                if !ratings.has_rated(author, &game.id) {
                    continue;
                }

                // A poster counts once per thread no matter how many
                // posts they wrote in it.
                let posters: HashSet<&UserId> = thread
                    .posts
                    .iter()
                    .filter_map(|post| post.poster.as_ref())
                    .collect();

                for poster in posters {
                    if poster == author {
                        continue;
                    }
                    if !ratings.has_rated(poster, &game.id) {
                        continue;
                    }
                    edges.add(&game.id, poster, author, forum_weight);
                }
            }
        }
    }

    edges
}
