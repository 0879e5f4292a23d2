use std::collections::HashMap;

use crate::domain::interaction::InteractionEvent;
use crate::domain::product::{Product, ProductId};

/// Catalog products ranked by how many interaction events (of any kind)
/// reference them. The stable sort keeps catalog order among equal counts.
pub fn rank_by_interactions(
    catalog: &[Product],
    events: &[InteractionEvent],
    limit: usize,
) -> Vec<ProductId> {
    let mut counts: HashMap<ProductId, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.product_id).or_default() += 1;
    }

    let mut ranked: Vec<(ProductId, usize)> = catalog
        .iter()
        .map(|product| (product.id, counts.get(&product.id).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|left, right| right.1.cmp(&left.1));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

/// Fallback when the interaction log cannot be read.
pub fn catalog_order(catalog: &[Product], limit: usize) -> Vec<ProductId> {
    catalog.iter().take(limit).map(|product| product.id).collect()
}
