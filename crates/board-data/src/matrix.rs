//! Rating matrix construction and index mappings.
//!
//! The raters arrive as a nested map (user -> game -> rating); the
//! ALS engine wants a dense matrix with explicit missing-value
//! markers. This module builds that matrix together with stable,
//! bijective mappings between external identifiers and row/column
//! positions, so centrality and similarity results can always be
//! reported under the same usernames and game ids used everywhere
//! else.

use crate::error::{DataError, Result};
use crate::types::RatingStore;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Bijective mapping between external string identifiers and dense
/// matrix positions.
///
/// Built once from a sorted, de-duplicated id list and never mutated
/// afterwards, so positions stay stable for the lifetime of a fit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityIndex {
    ids: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl EntityIndex {
    /// Build an index from an arbitrary id collection.
    ///
    /// Ids are sorted and de-duplicated, which makes the mapping a
    /// pure function of the id set.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self::from_sorted(ids)
    }

    fn from_sorted(ids: Vec<String>) -> Self {
        let positions = ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();
        Self { ids, positions }
    }

    /// Row/column position of an external id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// External id sitting at a row/column position.
    pub fn id(&self, position: usize) -> Option<&str> {
        self.ids.get(position).map(String::as_str)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rebuild the id -> position map after deserialization.
    ///
    /// The map is skipped during serde so mapping files on disk stay
    /// a plain id list.
    pub fn rehydrate(&mut self) {
        self.positions = self
            .ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();
    }
}

/// Dense user x game rating matrix with `f64::NAN` marking unrated
/// cells, plus the index mappings for both axes.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    values: DMatrix<f64>,
    users: EntityIndex,
    games: EntityIndex,
}

impl RatingMatrix {
    /// Build the matrix from a rating store.
    ///
    /// Row order is sorted usernames, column order is sorted game
    /// ids; both orders are therefore stable across runs for the same
    /// store contents.
    pub fn from_store(store: &RatingStore) -> Result<Self> {
        if store.is_empty() {
            return Err(DataError::EmptyRatings);
        }

        let users = EntityIndex::from_ids(store.users().cloned());
        let games = EntityIndex::from_ids(
            store
                .iter()
                .flat_map(|(_, ratings)| ratings.keys().cloned()),
        );

        let mut values = DMatrix::from_element(users.len(), games.len(), f64::NAN);
        for (user, ratings) in store.iter() {
            // Positions exist by construction of the two indices.
            let row = users.position(user).expect("user indexed above");
            for (game, &rating) in ratings {
                let col = games.position(game).expect("game indexed above");
                values[(row, col)] = rating;
            }
        }

        debug!(
            users = users.len(),
            games = games.len(),
            observed = values.iter().filter(|v| !v.is_nan()).count(),
            "built rating matrix"
        );

        Ok(Self { values, users, games })
    }

    /// Assemble a matrix from pre-built parts. The caller owns shape
    /// consistency; used by the masking helper and tests.
    pub fn from_parts(values: DMatrix<f64>, users: EntityIndex, games: EntityIndex) -> Self {
        Self { values, users, games }
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn users(&self) -> &EntityIndex {
        &self.users
    }

    pub fn games(&self) -> &EntityIndex {
        &self.games
    }

    /// (user rows, game columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.values.nrows(), self.values.ncols())
    }

    /// Rating by external identifiers, `None` when either id is
    /// unknown or the cell is unobserved.
    pub fn rating(&self, user: &str, game: &str) -> Option<f64> {
        let row = self.users.position(user)?;
        let col = self.games.position(game)?;
        let value = self.values[(row, col)];
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    /// Number of observed (non-missing) cells.
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> RatingStore {
        let mut store = RatingStore::new();
        store.insert("bob", "g2", 7.0);
        store.insert("alice", "g1", 8.0);
        store.insert("alice", "g2", 6.0);
        store.insert("carol", "g1", 9.0);
        store
    }

    #[test]
    fn test_entity_index_is_bijective() {
        let index = EntityIndex::from_ids(["carol", "alice", "bob", "alice"]);

        assert_eq!(index.len(), 3);
        for pos in 0..index.len() {
            let id = index.id(pos).unwrap();
            assert_eq!(index.position(id), Some(pos));
        }
        assert_eq!(index.position("dave"), None);
        assert_eq!(index.id(3), None);
    }

    #[test]
    fn test_entity_index_rehydrate() {
        let index = EntityIndex::from_ids(["alice", "bob"]);
        let json = serde_json::to_string(&index).unwrap();
        let mut restored: EntityIndex = serde_json::from_str(&json).unwrap();
        restored.rehydrate();

        assert_eq!(restored, index);
        assert_eq!(restored.position("bob"), Some(1));
    }

    #[test]
    fn test_matrix_from_store() {
        let matrix = RatingMatrix::from_store(&create_test_store()).unwrap();

        assert_eq!(matrix.shape(), (3, 2));
        assert_eq!(matrix.observed_count(), 4);
        assert_eq!(matrix.rating("alice", "g1"), Some(8.0));
        assert_eq!(matrix.rating("bob", "g2"), Some(7.0));
        // bob never rated g1: missing, not zero
        assert_eq!(matrix.rating("bob", "g1"), None);
        assert_eq!(matrix.rating("unknown", "g1"), None);
    }

    #[test]
    fn test_matrix_row_order_is_stable() {
        let a = RatingMatrix::from_store(&create_test_store()).unwrap();
        let b = RatingMatrix::from_store(&create_test_store()).unwrap();

        assert_eq!(a.users().ids(), b.users().ids());
        assert_eq!(a.games().ids(), b.games().ids());
        assert_eq!(a.users().ids(), &["alice", "bob", "carol"]);
    }

    #[test]
    fn test_empty_store_is_rejected() {
        let result = RatingMatrix::from_store(&RatingStore::new());
        assert!(matches!(result, Err(DataError::EmptyRatings)));
    }
}
