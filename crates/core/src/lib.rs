pub mod config;
pub mod domain;
pub mod errors;
pub mod recommend;

pub use domain::interaction::{EventKind, InteractionEvent, InteractionId, NewInteraction};
pub use domain::product::{
    resolve_in_order, CategoryId, CategoryRef, ParentCategoryId, Product, ProductId,
};
pub use domain::recommendation::{ListWrite, RecommendationLists, RecommendationRecord, WriteReport};
pub use errors::{ApplicationError, DomainError};
pub use recommend::RecommendationSettings;
