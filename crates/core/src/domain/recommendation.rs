use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

/// Stored recommendations for one product. `recommended_ids` is owned by the
/// recommendations job and `also_bought_ids` by the also-bought job; neither
/// job writes the other's field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub product_id: ProductId,
    pub recommended_ids: Vec<ProductId>,
    pub also_bought_ids: Vec<ProductId>,
    pub updated_at: DateTime<Utc>,
}

impl RecommendationRecord {
    pub fn empty(product_id: ProductId, updated_at: DateTime<Utc>) -> Self {
        Self { product_id, recommended_ids: Vec::new(), also_bought_ids: Vec::new(), updated_at }
    }

    pub fn lists(&self) -> RecommendationLists {
        RecommendationLists {
            recommended: self.recommended_ids.clone(),
            also_bought: self.also_bought_ids.clone(),
        }
    }
}

/// Read model handed to the storefront. A product without a record reads as
/// two empty lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationLists {
    pub recommended: Vec<ProductId>,
    pub also_bought: Vec<ProductId>,
}

/// One product's freshly computed list, queued for a batch write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListWrite {
    pub product_id: ProductId,
    pub ids: Vec<ProductId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub saved: usize,
    pub skipped: Vec<ProductId>,
}
