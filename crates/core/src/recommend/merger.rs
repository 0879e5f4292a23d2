use std::collections::HashSet;

use crate::domain::product::ProductId;

/// Final recommendation list for `product`.
///
/// Content candidates come first, then behavioral neighbors, deduplicated
/// and without the product itself. Popular products fill in only when both
/// signals together yield nothing. Ids missing from `catalog` are dropped
/// last, so a stale id never reaches storage.
pub fn blend(
    product: ProductId,
    content: &[ProductId],
    behavior: &[ProductId],
    popular: &[ProductId],
    catalog: &HashSet<ProductId>,
    limit: usize,
) -> Vec<ProductId> {
    let mut merged = Vec::with_capacity(limit);
    extend_unique(&mut merged, product, content.iter().chain(behavior), limit);

    if merged.is_empty() {
        extend_unique(&mut merged, product, popular.iter(), limit);
    }

    merged.retain(|id| catalog.contains(id));
    merged.truncate(limit);
    merged
}

fn extend_unique<'a>(
    merged: &mut Vec<ProductId>,
    product: ProductId,
    candidates: impl Iterator<Item = &'a ProductId>,
    limit: usize,
) {
    for candidate in candidates {
        if merged.len() >= limit {
            break;
        }
        if *candidate != product && !merged.contains(candidate) {
            merged.push(*candidate);
        }
    }
}
