//! Forum category weights.
//!
//! Replies in different forum categories signal different amounts of
//! expertise: a reply inside a "Reviews" or "Strategy" discussion
//! says more about a user's standing than chatter under "Rules". The
//! raw importance catalogue is normalized exactly once via a softmax,
//! so every weight is strictly positive, the weights sum to one, and
//! heavier categories dominate lighter ones. The normalized table is
//! an explicit configuration value handed to the edge builder; it is
//! never recomputed per call and there is no global mutable state.

use std::collections::HashMap;

/// Raw importance catalogue of the tracked forum categories.
const RAW_CATALOGUE: [(&str, f64); 10] = [
    ("Crowdfunding", 2.0),
    ("General", 2.0),
    ("News", 2.0),
    ("Organized Play", 4.0),
    ("Play By Forum", 1.0),
    ("Reviews", 10.0),
    ("Rules", 1.0),
    ("Sessions", 4.0),
    ("Strategy", 6.0),
    ("Variants", 8.0),
];

/// Softmax-normalized forum weight table.
#[derive(Debug, Clone)]
pub struct ForumWeights {
    weights: HashMap<String, f64>,
}

impl ForumWeights {
    /// Normalize a raw importance catalogue.
    ///
    /// Uses the max-shifted softmax so large raw weights cannot
    /// overflow the exponentials.
    pub fn from_catalogue<I, S>(catalogue: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let raw: Vec<(String, f64)> = catalogue
            .into_iter()
            .map(|(title, weight)| (title.into(), weight))
            .collect();

        let max = raw
            .iter()
            .map(|&(_, w)| w)
            .fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = raw.iter().map(|&(_, w)| (w - max).exp()).sum();

        let weights = raw
            .into_iter()
            .map(|(title, w)| (title, (w - max).exp() / total))
            .collect();
        Self { weights }
    }

    /// Normalized weight of a forum category, `None` for categories
    /// outside the catalogue.
    pub fn weight(&self, forum_title: &str) -> Option<f64> {
        self.weights.get(forum_title).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(title, &w)| (title.as_str(), w))
    }
}

impl Default for ForumWeights {
    fn default() -> Self {
        Self::from_catalogue(RAW_CATALOGUE)
    }
}
