use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use glimmer_core::domain::interaction::EventKind;
use glimmer_core::domain::product::ProductId;
use glimmer_core::domain::recommendation::ListWrite;
use glimmer_core::errors::ApplicationError;
use glimmer_core::recommend::{also_bought_neighbors, RecommendationSettings};

use super::JobReport;
use crate::repositories::{CatalogRepository, InteractionRepository, RecommendationRepository};

const JOB_NAME: &str = "also_bought";

/// Recomputes "customers also bought" lists from products that share an
/// order group. When no order has ever been placed, cart groups stand in.
pub struct AlsoBoughtJob<'a> {
    catalog: &'a dyn CatalogRepository,
    interactions: &'a dyn InteractionRepository,
    recommendations: &'a dyn RecommendationRepository,
    settings: RecommendationSettings,
}

impl<'a> AlsoBoughtJob<'a> {
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

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<JobReport, ApplicationError> {
        info!(event_name = "jobs.also_bought.started", "recomputing also-bought lists");
        let mut report = JobReport::new(JOB_NAME);

        let mut events = self.interactions.list_events_of_kind(EventKind::Order).await?;
        let mut source = EventKind::Order;
        if events.is_empty() {
            events = self.interactions.list_events_of_kind(EventKind::Cart).await?;
            source = EventKind::Cart;
            if events.is_empty() {
                warn!(event_name = "jobs.also_bought.aborted", "no order or cart events");
                return Ok(report.abort("no order or cart events"));
            }
            warn!(
                event_name = "jobs.also_bought.cart_fallback",
                cart_events = events.len(),
                "no orders recorded; using cart events"
            );
            report.warnings.push("no orders recorded; using cart events".to_string());
        }
        report.signals.basket_source = Some(source);

        let products = self.catalog.list_products().await?;
        if products.is_empty() {
            warn!(event_name = "jobs.also_bought.aborted", "catalog is empty");
            return Ok(report.abort("catalog is empty"));
        }
        report.products = products.len();

        let catalog: HashSet<ProductId> = products.iter().map(|product| product.id).collect();
        let neighbors = also_bought_neighbors(&events, &catalog, self.settings.also_bought_limit);
        if neighbors.is_empty() {
            warn!(
                event_name = "jobs.also_bought.aborted",
                source = source.as_str(),
                "no catalog products share a basket"
            );
            return Ok(report.abort("no catalog products share a basket"));
        }
        report.signals.behavior = true;

        let writes: Vec<ListWrite> = neighbors
            .into_iter()
            .map(|(product_id, ids)| ListWrite { product_id, ids })
            .collect();
        report.computed = writes.len();

        let written = self.recommendations.replace_also_bought(&writes, now).await?;
        report.record_writes(written);

        info!(
            event_name = "jobs.also_bought.persisted",
            source = source.as_str(),
            saved = report.saved,
            skipped = report.skipped.len(),
            "also-bought lists persisted"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use glimmer_core::domain::interaction::{EventKind, NewInteraction};
    use glimmer_core::domain::product::{Product, ProductId};
    use glimmer_core::domain::recommendation::ListWrite;
    use glimmer_core::recommend::RecommendationSettings;

    use super::AlsoBoughtJob;
    use crate::jobs::JobOutcome;
    use crate::repositories::{
        CatalogRepository, InMemoryStore, InteractionRepository, RecommendationRepository,
    };

    async fn store_with_products(ids: &[i64]) -> InMemoryStore {
        let store = InMemoryStore::default();
        for id in ids {
            store.save_product(Product::new(*id, format!("piece {id}"))).await.expect("save");
        }
        store
    }

    async fn log(store: &InMemoryStore, session: &str, product: i64, kind: EventKind) {
        store.append(NewInteraction::new(session, ProductId(product), kind)).await.expect("append");
    }

    fn job(store: &InMemoryStore) -> AlsoBoughtJob<'_> {
        AlsoBoughtJob::new(store, store, store, RecommendationSettings::default())
    }

    #[tokio::test]
    async fn shared_orders_link_products() {
        let store = store_with_products(&[1, 2, 3]).await;
        log(&store, "A", 1, EventKind::Order).await;
        log(&store, "A", 2, EventKind::Order).await;
        log(&store, "B", 2, EventKind::Order).await;
        log(&store, "B", 3, EventKind::Order).await;

        let report = job(&store).run().await.expect("run");

        assert_eq!(report.signals.basket_source, Some(EventKind::Order));
        let middle = store.lists_for_product(ProductId(2)).await.expect("lists");
        assert_eq!(middle.also_bought, vec![ProductId(1), ProductId(3)]);
        let first = store.lists_for_product(ProductId(1)).await.expect("lists");
        assert_eq!(first.also_bought, vec![ProductId(2)]);
    }

    #[tokio::test]
    async fn carts_stand_in_when_no_orders_exist() {
        let store = store_with_products(&[4, 5, 6]).await;
        log(&store, "S", 4, EventKind::Cart).await;
        log(&store, "S", 5, EventKind::Cart).await;
        log(&store, "T", 6, EventKind::View).await;

        let report = job(&store).run().await.expect("run");

        assert_eq!(report.outcome, JobOutcome::Completed);
        assert_eq!(report.signals.basket_source, Some(EventKind::Cart));
        assert!(!report.warnings.is_empty());
        let four = store.lists_for_product(ProductId(4)).await.expect("lists");
        let five = store.lists_for_product(ProductId(5)).await.expect("lists");
        assert_eq!(four.also_bought, vec![ProductId(5)]);
        assert_eq!(five.also_bought, vec![ProductId(4)]);
    }

    #[tokio::test]
    async fn recommended_lists_are_left_alone() {
        let store = store_with_products(&[1, 2, 3]).await;
        store
            .replace_recommended(
                &[ListWrite { product_id: ProductId(1), ids: vec![ProductId(3)] }],
                Utc::now(),
            )
            .await
            .expect("seed recommended");
        log(&store, "A", 1, EventKind::Order).await;
        log(&store, "A", 2, EventKind::Order).await;

        job(&store).run().await.expect("run");

        let lists = store.lists_for_product(ProductId(1)).await.expect("lists");
        assert_eq!(lists.recommended, vec![ProductId(3)]);
        assert_eq!(lists.also_bought, vec![ProductId(2)]);
    }

    #[tokio::test]
    async fn no_baskets_aborts_without_writes() {
        let store = store_with_products(&[1, 2]).await;
        log(&store, "A", 1, EventKind::View).await;

        let report = job(&store).run().await.expect("run");

        assert_eq!(report.outcome, JobOutcome::Aborted);
        assert!(store.find_by_product(ProductId(1)).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn single_item_orders_abort() {
        let store = store_with_products(&[1, 2]).await;
        log(&store, "A", 1, EventKind::Order).await;
        log(&store, "B", 2, EventKind::Order).await;

        let report = job(&store).run().await.expect("run");

        assert_eq!(report.outcome, JobOutcome::Aborted);
        assert!(report.summary().starts_with("also_bought aborted"));
    }

    #[tokio::test]
    async fn products_without_shared_baskets_keep_empty_lists() {
        let store = store_with_products(&[1, 2, 3]).await;
        log(&store, "A", 1, EventKind::Order).await;
        log(&store, "A", 2, EventKind::Order).await;
        log(&store, "B", 3, EventKind::Order).await;

        let report = job(&store).run().await.expect("run");

        assert_eq!(report.saved, 2);
        let lonely = store.lists_for_product(ProductId(3)).await.expect("lists");
        assert!(lonely.also_bought.is_empty());
    }
}
