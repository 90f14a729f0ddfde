//! # Reply Graph Crate
//!
//! Builds the weighted directed interaction graph between raters of a
//! game and ranks them by PageRank centrality.
//!
//! ## Components
//!
//! - **weights**: softmax-normalized forum category weight table
//! - **edges**: per-game (replier -> author) edge aggregation from
//!   the thread corpus, scoped to users who rated the game
//! - **pagerank**: damped weighted random-walk centrality over one
//!   game's edge set
//!
//! ## Example Usage
//!
//! ```ignore
//! use reply_graph::{build_reply_edges, pagerank, ForumWeights, PageRankConfig};
//!
//! let weights = ForumWeights::default();
//! let edges = build_reply_edges(&games, &ratings, &weights);
//!
//! if let Some(game_edges) = edges.for_game("174430") {
//!     let centrality = pagerank(game_edges, &PageRankConfig::default());
//! }
//! ```

pub mod edges;
pub mod pagerank;
pub mod weights;

// Re-export commonly used types
pub use edges::{build_reply_edges, ReplyEdges};
pub use pagerank::{graph_stats, pagerank, GraphStats, PageRankConfig};
pub use weights::ForumWeights;
