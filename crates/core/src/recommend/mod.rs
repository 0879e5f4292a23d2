//! Batch recommendation computation.
//!
//! Turns the catalog and the interaction log into per-product id lists:
//! content similarity over product text, behavioral co-occurrence over
//! session groups, and a global popularity fallback, merged per product.
//! Every stage is pure; loading and persisting live in the db crate.

pub mod corpus;
pub mod cooccurrence;
pub mod merger;
pub mod popularity;
pub mod similarity;
mod stop_words;
pub mod tfidf;

pub use cooccurrence::{also_bought_neighbors, behavior_neighbors, CooccurrenceMatrix};
pub use corpus::{build_corpus, build_document};
pub use merger::blend;
pub use popularity::{catalog_order, rank_by_interactions};
pub use similarity::{
    content_candidates, Capability, DisabledSimilarity, SimilarityBackend, SimilarityError,
    SimilarityMatrix,
};
pub use tfidf::{TfidfSettings, TfidfSimilarity};

/// Maximum length of a stored recommendation list.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Content candidates kept per product before blending.
pub const CONTENT_CANDIDATE_WIDTH: usize = 20;

/// Behavioral neighbors kept per product before blending.
pub const BEHAVIOR_NEIGHBORS: usize = 10;

/// Length of the "customers also bought" list.
pub const ALSO_BOUGHT_LIMIT: usize = 10;

/// Length of the global popularity fallback list.
pub const POPULAR_LIMIT: usize = 50;

/// Vocabulary cap for the text vectorizer.
pub const MAX_FEATURES: usize = 25_000;

/// Tunables shared by both batch jobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationSettings {
    pub max_recommendations: usize,
    pub content_candidates: usize,
    pub behavior_neighbors: usize,
    pub also_bought_limit: usize,
    pub popular_limit: usize,
    pub max_features: usize,
    pub content_similarity: bool,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            max_recommendations: MAX_RECOMMENDATIONS,
            content_candidates: CONTENT_CANDIDATE_WIDTH,
            behavior_neighbors: BEHAVIOR_NEIGHBORS,
            also_bought_limit: ALSO_BOUGHT_LIMIT,
            popular_limit: POPULAR_LIMIT,
            max_features: MAX_FEATURES,
            content_similarity: true,
        }
    }
}

impl RecommendationSettings {
    /// Picks the similarity backend for a run from the content switch.
    pub fn similarity_backend(&self) -> Box<dyn SimilarityBackend> {
        if self.content_similarity {
            Box::new(TfidfSimilarity::new(TfidfSettings {
                max_features: self.max_features,
                ..TfidfSettings::default()
            }))
        } else {
            Box::new(DisabledSimilarity)
        }
    }
}
