use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use glimmer_core::domain::interaction::{
    EventKind, InteractionEvent, InteractionId, NewInteraction,
};
use glimmer_core::domain::product::{
    resolve_in_order, CategoryId, CategoryRef, ParentCategoryId, Product, ProductId,
};
use glimmer_core::domain::recommendation::{
    ListWrite, RecommendationLists, RecommendationRecord, WriteReport,
};

use super::{
    CatalogRepository, InteractionRepository, ListField, RecommendationRepository,
    RepositoryError,
};

#[derive(Clone, Debug, Default)]
struct StoreState {
    products: BTreeMap<ProductId, Product>,
    categories: HashMap<CategoryId, String>,
    parents: HashMap<ParentCategoryId, String>,
    assignments: HashMap<CategoryId, ParentCategoryId>,
    events: Vec<InteractionEvent>,
    records: HashMap<ProductId, RecommendationRecord>,
}

impl StoreState {
    fn resolve(&self, product: &Product) -> Product {
        let category = product.category.as_ref().and_then(|category| {
            let name = self.categories.get(&category.id)?;
            let parent_name = self
                .assignments
                .get(&category.id)
                .and_then(|parent| self.parents.get(parent))
                .cloned();
            Some(CategoryRef { id: category.id, name: name.clone(), parent_name })
        });
        Product { category, ..product.clone() }
    }
}

/// Catalog, interaction log and recommendation store over one shared state,
/// so product deletion cascades the way the SQL schema does.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    async fn replace_field(
        &self,
        field: ListField,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError> {
        let mut state = self.state.write().await;
        // Applied to a copy and swapped in, like a committed transaction.
        let mut records = state.records.clone();
        let mut report = WriteReport::default();

        for write in writes {
            if !state.products.contains_key(&write.product_id) {
                report.skipped.push(write.product_id);
                continue;
            }
            let record = records
                .entry(write.product_id)
                .or_insert_with(|| RecommendationRecord::empty(write.product_id, updated_at));
            match field {
                ListField::Recommended => record.recommended_ids = write.ids.clone(),
                ListField::AlsoBought => record.also_bought_ids = write.ids.clone(),
            }
            record.updated_at = updated_at;
            report.saved += 1;
        }

        state.records = records;
        Ok(report)
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.values().map(|product| state.resolve(product)).collect())
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        let found: Vec<Product> = ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .map(|product| state.resolve(product))
            .collect();
        Ok(resolve_in_order(&found, ids))
    }

    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let removed = state.products.remove(&id).is_some();
        if removed {
            state.events.retain(|event| event.product_id != id);
            state.records.remove(&id);
        }
        Ok(removed)
    }

    async fn save_category(&self, id: CategoryId, name: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.categories.insert(id, name.to_string());
        Ok(())
    }

    async fn save_parent_category(
        &self,
        id: ParentCategoryId,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.parents.insert(id, name.to_string());
        Ok(())
    }

    async fn assign_parent(
        &self,
        category: CategoryId,
        parent: ParentCategoryId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.assignments.insert(category, parent);
        Ok(())
    }
}

#[async_trait::async_trait]
impl InteractionRepository for InMemoryStore {
    async fn list_events(&self) -> Result<Vec<InteractionEvent>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.events.clone())
    }

    async fn list_events_of_kind(
        &self,
        kind: EventKind,
    ) -> Result<Vec<InteractionEvent>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.events.iter().filter(|event| event.kind == kind).cloned().collect())
    }

    async fn append(&self, event: NewInteraction) -> Result<InteractionId, RepositoryError> {
        event.validate()?;
        let mut state = self.state.write().await;
        if !state.products.contains_key(&event.product_id) {
            return Err(RepositoryError::Decode(format!(
                "interaction references unknown product {}",
                event.product_id
            )));
        }
        let id = InteractionId(state.events.len() as i64 + 1);
        state.events.push(event.into_event(id));
        Ok(id)
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for InMemoryStore {
    async fn find_by_product(
        &self,
        id: ProductId,
    ) -> Result<Option<RecommendationRecord>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn lists_for_product(
        &self,
        id: ProductId,
    ) -> Result<RecommendationLists, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.records.get(&id).map(RecommendationRecord::lists).unwrap_or_default())
    }

    async fn replace_recommended(
        &self,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError> {
        self.replace_field(ListField::Recommended, writes, updated_at).await
    }

    async fn replace_also_bought(
        &self,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError> {
        self.replace_field(ListField::AlsoBought, writes, updated_at).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use glimmer_core::domain::interaction::{EventKind, NewInteraction};
    use glimmer_core::domain::product::{
        CategoryId, CategoryRef, ParentCategoryId, Product, ProductId,
    };
    use glimmer_core::domain::recommendation::ListWrite;

    use super::InMemoryStore;
    use crate::repositories::{
        CatalogRepository, InteractionRepository, RecommendationRepository, RepositoryError,
    };

    #[tokio::test]
    async fn in_memory_catalog_resolves_names_and_order() {
        let store = InMemoryStore::default();
        store.save_parent_category(ParentCategoryId(1), "Festive").await.expect("parent");
        store.save_category(CategoryId(5), "Bangles").await.expect("category");
        store.assign_parent(CategoryId(5), ParentCategoryId(1)).await.expect("assign");
        store
            .save_product(Product {
                category: Some(CategoryRef {
                    id: CategoryId(5),
                    name: String::new(),
                    parent_name: None,
                }),
                ..Product::new(9, "Glass Bangles")
            })
            .await
            .expect("save");
        store.save_product(Product::new(3, "Toe Ring")).await.expect("save");

        let products = store.list_products().await.expect("list");

        assert_eq!(products[0].id, ProductId(3));
        let category = products[1].category.as_ref().expect("category");
        assert_eq!(category.name, "Bangles");
        assert_eq!(category.parent_name.as_deref(), Some("Festive"));
    }

    #[tokio::test]
    async fn in_memory_delete_cascades() {
        let store = InMemoryStore::default();
        store.save_product(Product::new(1, "Anklet")).await.expect("save");
        store.save_product(Product::new(2, "Toe Ring")).await.expect("save");
        store
            .append(NewInteraction::new("s", ProductId(1), EventKind::View))
            .await
            .expect("append");
        store
            .replace_recommended(
                &[ListWrite { product_id: ProductId(1), ids: vec![ProductId(2)] }],
                Utc::now(),
            )
            .await
            .expect("replace");

        assert!(store.delete_product(ProductId(1)).await.expect("delete"));

        assert!(store.list_events().await.expect("events").is_empty());
        assert!(store.find_by_product(ProductId(1)).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn in_memory_writes_skip_missing_products() {
        let store = InMemoryStore::default();
        store.save_product(Product::new(1, "Anklet")).await.expect("save");

        let report = store
            .replace_also_bought(
                &[
                    ListWrite { product_id: ProductId(1), ids: vec![ProductId(5)] },
                    ListWrite { product_id: ProductId(5), ids: vec![ProductId(1)] },
                ],
                Utc::now(),
            )
            .await
            .expect("replace");

        assert_eq!(report.saved, 1);
        assert_eq!(report.skipped, vec![ProductId(5)]);
        let lists = store.lists_for_product(ProductId(1)).await.expect("lists");
        assert_eq!(lists.also_bought, vec![ProductId(5)]);
        assert!(lists.recommended.is_empty());
    }

    #[tokio::test]
    async fn in_memory_append_requires_known_product() {
        let store = InMemoryStore::default();

        let result = store.append(NewInteraction::new("s", ProductId(1), EventKind::Cart)).await;

        assert!(matches!(result, Err(RepositoryError::Decode(_))));
    }
}
