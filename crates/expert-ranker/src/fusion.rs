//! Centrality ranking and latent-factor fusion.
//!
//! Converts a centrality score map into an ordered candidate list,
//! then re-ranks it by cosine similarity between each candidate's
//! latent taste vector and the query user's. Centrality and
//! similarity live on different scales and are never summed; the two
//! scores only drive the two ordering stages.

use board_data::{EntityIndex, UserId};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use tracing::warn;

/// One ranked candidate: the user, their reply-graph centrality and
/// their taste similarity to the query user (0.0 when unknown).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedExpert {
    pub user: UserId,
    pub centrality: f64,
    pub similarity: f64,
}

/// Final fused ranking. `personalized` is false when the query user
/// had no factor vector, in which case the order is pure centrality
/// and every similarity is exactly 0.0.
#[derive(Debug, Clone)]
pub struct ExpertRanking {
    pub experts: Vec<RankedExpert>,
    pub personalized: bool,
}

/// Order users by descending centrality, optionally truncated to a
/// top-N analysis window. Ties break on username so the order is
/// deterministic.
pub fn rank_by_centrality(
    centrality: &HashMap<UserId, f64>,
    top_n: Option<usize>,
) -> Vec<(UserId, f64)> {
    let mut ranked: Vec<(UserId, f64)> = centrality
        .iter()
        .map(|(user, &score)| (user.clone(), score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    if let Some(n) = top_n {
        ranked.truncate(n);
    }
    ranked
}

/// Cosine of the angle between two factor vectors, in [-1, 1].
/// Zero vectors yield 0.0.
pub fn cosine_similarity(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let norms = a.norm() * b.norm();
    if norms == 0.0 {
        0.0
    } else {
        a.dot(b) / norms
    }
}

/// Re-rank a centrality-ordered candidate list by taste similarity to
/// the query user.
///
/// Degrades gracefully: an unknown query user (absent from the index,
/// or mapped outside the loaded factor matrix) disables
/// personalization instead of failing, and candidates without a
/// factor vector of their own get a neutral 0.0 similarity.
pub fn personalize(
    ranked: Vec<(UserId, f64)>,
    user_factors: &DMatrix<f64>,
    users: &EntityIndex,
    query_user: &str,
) -> ExpertRanking {
    let query_vector = user_vector(user_factors, users, query_user);

    let Some(query_vector) = query_vector else {
        warn!(user = query_user, "query user unknown to the fit, falling back to centrality order");
        let experts = ranked
            .into_iter()
            .map(|(user, centrality)| RankedExpert {
                user,
                centrality,
                similarity: 0.0,
            })
            .collect();
        return ExpertRanking {
            experts,
            personalized: false,
        };
    };

    let mut experts: Vec<RankedExpert> = ranked
        .into_iter()
        .map(|(user, centrality)| {
            let similarity = user_vector(user_factors, users, &user)
                .map(|v| cosine_similarity(&v, &query_vector))
                .unwrap_or(0.0);
            RankedExpert {
                user,
                centrality,
                similarity,
            }
        })
        .collect();

    // Stable sort: equal similarities keep their centrality order.
    experts.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ExpertRanking {
        experts,
        personalized: true,
    }
}

fn user_vector(
    user_factors: &DMatrix<f64>,
    users: &EntityIndex,
    user: &str,
) -> Option<DVector<f64>> {
    let row = users.position(user)?;
    if row >= user_factors.nrows() {
        // Index and factor blob disagree; treat the user as unknown
        // rather than guessing.
        warn!(user, row, rows = user_factors.nrows(), "index maps user outside factor matrix");
        return None;
    }
    Some(user_factors.row(row).transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_factors() -> (DMatrix<f64>, EntityIndex) {
        // alice and carol point the same way, bob is orthogonal
        let factors = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 2.0, 0.0]);
        let users = EntityIndex::from_ids(["alice", "bob", "carol"]);
        (factors, users)
    }

    fn centrality_fixture() -> HashMap<UserId, f64> {
        [
            ("alice".to_string(), 0.5),
            ("bob".to_string(), 0.3),
            ("carol".to_string(), 0.2),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_rank_by_centrality_orders_and_truncates() {
        let ranked = rank_by_centrality(&centrality_fixture(), None);
        let users: Vec<&str> = ranked.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);

        let top2 = rank_by_centrality(&centrality_fixture(), Some(2));
        assert_eq!(top2.len(), 2);
        assert_eq!(top2[0].0, "alice");
    }

    #[test]
    fn test_cosine_similarity_properties() {
        let a = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
        let b = DVector::from_column_slice(&[-2.0, 1.0, 0.5]);
        let zero = DVector::from_column_slice(&[0.0, 0.0, 0.0]);

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        let value = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&value));
    }

    #[test]
    fn test_personalize_reorders_by_similarity() {
        let (factors, users) = create_test_factors();
        let ranked = rank_by_centrality(&centrality_fixture(), None);

        // carol's vector is parallel to alice's, bob's is orthogonal
        let ranking = personalize(ranked, &factors, &users, "alice");
        assert!(ranking.personalized);

        let order: Vec<&str> = ranking.experts.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(order, vec!["alice", "carol", "bob"]);
        assert!((ranking.experts[0].similarity - 1.0).abs() < 1e-12);
        assert!((ranking.experts[1].similarity - 1.0).abs() < 1e-12);
        assert!(ranking.experts[2].similarity.abs() < 1e-12);
        // Centrality scores survive for display
        assert_eq!(ranking.experts[0].centrality, 0.5);
    }

    #[test]
    fn test_unknown_query_user_falls_back_to_centrality() {
        let (factors, users) = create_test_factors();
        let ranked = rank_by_centrality(&centrality_fixture(), None);

        let ranking = personalize(ranked, &factors, &users, "zoe");
        assert!(!ranking.personalized);

        let order: Vec<&str> = ranking.experts.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(order, vec!["alice", "bob", "carol"]);
        for expert in &ranking.experts {
            assert_eq!(expert.similarity, 0.0);
        }
    }

    #[test]
    fn test_candidate_without_vector_gets_neutral_similarity() {
        let (factors, users) = create_test_factors();
        let mut centrality = centrality_fixture();
        centrality.insert("dave".to_string(), 0.4);

        let ranked = rank_by_centrality(&centrality, None);
        let ranking = personalize(ranked, &factors, &users, "alice");

        let dave = ranking
            .experts
            .iter()
            .find(|e| e.user == "dave")
            .unwrap();
        assert_eq!(dave.similarity, 0.0);
    }

    #[test]
    fn test_index_outside_factor_matrix_disables_personalization() {
        let (factors, _) = create_test_factors();
        // Index claims a fourth user the 3-row factor matrix lacks
        let users = EntityIndex::from_ids(["alice", "bob", "carol", "dave"]);
        let ranked = rank_by_centrality(&centrality_fixture(), None);

        let ranking = personalize(ranked, &factors, &users, "dave");
        assert!(!ranking.personalized);
    }
}
