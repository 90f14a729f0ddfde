//! Greedy per-forum quota selection over a shared candidate pool.
//!
//! Given a fused, ordered candidate list, each forum category pops
//! the highest-ranked remaining users who actually opened at least
//! one thread of that category for the game, until its quota fills or
//! the pool runs dry. Selected users leave the pool, so one user can
//! never be picked for two categories within a single ranking pass.

use crate::authorship::ThreadAuthorship;
use crate::fusion::RankedExpert;
use tracing::debug;

/// Ordered candidate pool that forums draw from.
#[derive(Debug, Clone)]
pub struct ExpertPool {
    pool: Vec<RankedExpert>,
}

impl ExpertPool {
    pub fn new(experts: Vec<RankedExpert>) -> Self {
        Self { pool: experts }
    }

    /// Pop up to `quota` pool members who authored a thread of the
    /// given forum category for the game, preserving their relative
    /// order. Selected members are removed from the pool.
    pub fn take_for_forum(
        &mut self,
        authorship: &ThreadAuthorship,
        game: &str,
        forum: &str,
        quota: usize,
    ) -> Vec<RankedExpert> {
        let mut selected = Vec::with_capacity(quota);
        let mut cursor = 0;

        while cursor < self.pool.len() && selected.len() < quota {
            if authorship.has_authored(&self.pool[cursor].user, game, forum) {
                selected.push(self.pool.remove(cursor));
            } else {
                cursor += 1;
            }
        }

        debug!(
            forum,
            game,
            selected = selected.len(),
            remaining = self.pool.len(),
            "filled forum quota"
        );
        selected
    }

    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
