//! Expert ranking: fuse reply-graph centrality with latent taste
//! similarity and hand out per-forum expert quotas.
//!
//! The pipeline this crate sits at the end of:
//! 1. centrality scores per user arrive from the reply graph,
//! 2. [`rank_by_centrality`] orders them into an analysis window,
//! 3. [`personalize`] re-ranks the window by cosine similarity to the
//!    query user's latent factor vector (or degrades to pure
//!    centrality order when the query user is unknown),
//! 4. [`ExpertPool`] fills each forum category's quota with the
//!    highest-ranked remaining candidates who authored threads there.

pub mod authorship;
pub mod fusion;
pub mod selector;

pub use authorship::ThreadAuthorship;
pub use fusion::{cosine_similarity, personalize, rank_by_centrality, ExpertRanking, RankedExpert};
pub use selector::ExpertPool;
