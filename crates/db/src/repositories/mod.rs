use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use glimmer_core::domain::interaction::{EventKind, InteractionEvent, InteractionId, NewInteraction};
use glimmer_core::domain::product::{CategoryId, ParentCategoryId, Product, ProductId};
use glimmer_core::domain::recommendation::{
    ListWrite, RecommendationLists, RecommendationRecord, WriteReport,
};
use glimmer_core::errors::{ApplicationError, DomainError};

pub mod catalog;
pub mod interaction;
pub mod memory;
pub mod recommendation;

pub use catalog::SqlCatalogRepository;
pub use interaction::SqlInteractionRepository;
pub use memory::InMemoryStore;
pub use recommendation::SqlRecommendationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Domain(domain) => ApplicationError::Domain(domain),
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

/// Product catalog as the recommendation jobs and the storefront see it.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every product in catalog order (ascending id), with category and
    /// parent category names resolved.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Products for `ids` in the requested order; unknown ids are skipped.
    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn save_product(&self, product: Product) -> Result<(), RepositoryError>;

    /// Removes the product together with its interactions and stored
    /// recommendations. Returns whether a product was removed.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    async fn save_category(&self, id: CategoryId, name: &str) -> Result<(), RepositoryError>;

    async fn save_parent_category(
        &self,
        id: ParentCategoryId,
        name: &str,
    ) -> Result<(), RepositoryError>;

    /// A category belongs to at most one parent; reassigning replaces it.
    async fn assign_parent(
        &self,
        category: CategoryId,
        parent: ParentCategoryId,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn list_events(&self) -> Result<Vec<InteractionEvent>, RepositoryError>;

    async fn list_events_of_kind(
        &self,
        kind: EventKind,
    ) -> Result<Vec<InteractionEvent>, RepositoryError>;

    async fn append(&self, event: NewInteraction) -> Result<InteractionId, RepositoryError>;
}

/// Stored recommendation lists. Each batch job owns one field and writes it
/// through its own operation; a write never touches the other field.
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn find_by_product(
        &self,
        id: ProductId,
    ) -> Result<Option<RecommendationRecord>, RepositoryError>;

    async fn lists_for_product(&self, id: ProductId)
        -> Result<RecommendationLists, RepositoryError>;

    /// Overwrites `recommended_ids` for every write in one transaction.
    /// Writes for products that no longer exist are skipped and reported.
    async fn replace_recommended(
        &self,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError>;

    /// Same contract as `replace_recommended`, for `also_bought_ids`.
    async fn replace_also_bought(
        &self,
        writes: &[ListWrite],
        updated_at: DateTime<Utc>,
    ) -> Result<WriteReport, RepositoryError>;
}

/// Which stored list a batch write targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListField {
    Recommended,
    AlsoBought,
}

impl ListField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Recommended => "recommended_ids",
            Self::AlsoBought => "also_bought_ids",
        }
    }
}

pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}
