use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use glimmer_core::domain::interaction::InteractionEvent;
use glimmer_core::domain::product::{Product, ProductId};
use glimmer_core::domain::recommendation::ListWrite;
use glimmer_core::errors::ApplicationError;
use glimmer_core::recommend::{
    behavior_neighbors, blend, build_corpus, catalog_order, content_candidates,
    rank_by_interactions, Capability, RecommendationSettings,
};

use super::{JobReport, PopularitySource};
use crate::repositories::{CatalogRepository, InteractionRepository, RecommendationRepository};

const JOB_NAME: &str = "recommendations";

/// Recomputes every product's `recommended_ids` from content similarity,
/// behavioral co-occurrence and global popularity.
pub struct RecommendationJob<'a> {
    catalog: &'a dyn CatalogRepository,
    interactions: &'a dyn InteractionRepository,
    recommendations: &'a dyn RecommendationRepository,
    settings: RecommendationSettings,
}

impl<'a> RecommendationJob<'a> {
    pub fn new(
        catalog: &'a dyn CatalogRepository,
        interactions: &'a dyn InteractionRepository,
        recommendations: &'a dyn RecommendationRepository,
        settings: RecommendationSettings,
    ) -> Self {
        Self { catalog, interactions, recommendations, settings }
    }

    pub async fn run(&self) -> Result<JobReport, ApplicationError> {
        self.run_at(Utc::now()).await
    }

    /// Runs the job stamping every written record with `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<JobReport, ApplicationError> {
        info!(event_name = "jobs.recommendations.started", "recomputing recommendations");
        let mut report = JobReport::new(JOB_NAME);

        let products = self.catalog.list_products().await?;
        if products.is_empty() {
            warn!(event_name = "jobs.recommendations.aborted", "catalog is empty");
            return Ok(report.abort("catalog is empty"));
        }
        report.products = products.len();

        let events = match self.interactions.list_events().await {
            Ok(events) => Some(events),
            Err(error) => {
                warn!(
                    event_name = "jobs.recommendations.signal_unavailable",
                    signal = "interactions",
                    error = %error,
                    "interaction log unavailable; behavior signal skipped"
                );
                report.warnings.push(format!("interaction log unavailable: {error}"));
                None
            }
        };

        let content = self.content_lists(&products, &mut report);
        let behavior = self.behavior_lists(events.as_deref(), &mut report);
        let (popular, popularity_source) = match events.as_deref() {
            Some(events) => (
                rank_by_interactions(&products, events, self.settings.popular_limit),
                PopularitySource::Interactions,
            ),
            None => (
                catalog_order(&products, self.settings.popular_limit),
                PopularitySource::CatalogOrder,
            ),
        };

        let catalog: HashSet<ProductId> = products.iter().map(|product| product.id).collect();
        let mut writes = Vec::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            let similar = content.get(index).map(Vec::as_slice).unwrap_or(&[]);
            let shared = behavior.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
            // blend falls back to popularity exactly when no other product is a candidate.
            if similar.iter().chain(shared).all(|id| *id == product.id) {
                report.signals.popularity = popularity_source;
            }
            writes.push(ListWrite {
                product_id: product.id,
                ids: blend(
                    product.id,
                    similar,
                    shared,
                    &popular,
                    &catalog,
                    self.settings.max_recommendations,
                ),
            });
        }
        report.computed = writes.len();

        let written = self.recommendations.replace_recommended(&writes, now).await?;
        report.record_writes(written);

        info!(
            event_name = "jobs.recommendations.persisted",
            products = report.products,
            saved = report.saved,
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            "recommendations persisted"
        );
        Ok(report)
    }

    fn content_lists(&self, products: &[Product], report: &mut JobReport) -> Vec<Vec<ProductId>> {
        let backend = self.settings.similarity_backend();
        if let Capability::Unavailable(reason) = backend.capability() {
            warn!(
                event_name = "jobs.recommendations.signal_unavailable",
                signal = "content",
                backend = backend.name(),
                reason = %reason,
                "content similarity unavailable"
            );
            report.warnings.push(format!("content similarity unavailable: {reason}"));
            return Vec::new();
        }

        let ids: Vec<ProductId> = products.iter().map(|product| product.id).collect();
        match backend.compute(&build_corpus(products)) {
            Ok(matrix) => {
                report.signals.content = true;
                content_candidates(&matrix, &ids, self.settings.content_candidates)
            }
            Err(error) => {
                warn!(
                    event_name = "jobs.recommendations.signal_unavailable",
                    signal = "content",
                    backend = backend.name(),
                    error = %error,
                    "content similarity failed"
                );
                report.warnings.push(format!("content similarity failed: {error}"));
                Vec::new()
            }
        }
    }

    fn behavior_lists(
        &self,
        events: Option<&[InteractionEvent]>,
        report: &mut JobReport,
    ) -> BTreeMap<ProductId, Vec<ProductId>> {
        let Some(events) = events else {
            return BTreeMap::new();
        };
        if events.is_empty() {
            warn!(
                event_name = "jobs.recommendations.signal_unavailable",
                signal = "behavior",
                "no interaction events recorded"
            );
            report.warnings.push("no interaction events recorded".to_string());
            return BTreeMap::new();
        }

        let neighbors = behavior_neighbors(events, self.settings.behavior_neighbors);
        if neighbors.is_empty() {
            warn!(
                event_name = "jobs.recommendations.signal_unavailable",
                signal = "behavior",
                "no two products share a session"
            );
            report.warnings.push("no two products share a session".to_string());
        } else {
            report.signals.behavior = true;
        }
        neighbors
    }
}
