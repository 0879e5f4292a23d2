use std::collections::{BTreeMap, HashSet};

use crate::domain::interaction::InteractionEvent;
use crate::domain::product::ProductId;

/// Symmetric product × product co-occurrence counts, accumulated as the sum
/// over session groups of each group's outer product. Self pairs are never
/// stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooccurrenceMatrix {
    scores: BTreeMap<ProductId, BTreeMap<ProductId, i64>>,
}

impl CooccurrenceMatrix {
    /// Sums event weights per product within each group; a pair scores
    /// `w_a * w_b` for every group they share.
    pub fn weighted(events: &[InteractionEvent]) -> Self {
        let mut groups: BTreeMap<String, BTreeMap<ProductId, i64>> = BTreeMap::new();
        for event in events {
            *groups.entry(event.group_key()).or_default().entry(event.product_id).or_default() +=
                event.weight;
        }
        Self::from_groups(groups.into_values())
    }

    /// Each product counts once per group no matter how often it repeats.
    pub fn presence(events: &[InteractionEvent]) -> Self {
        let mut groups: BTreeMap<String, BTreeMap<ProductId, i64>> = BTreeMap::new();
        for event in events {
            groups.entry(event.group_key()).or_default().insert(event.product_id, 1);
        }
        Self::from_groups(groups.into_values())
    }

    fn from_groups(groups: impl IntoIterator<Item = BTreeMap<ProductId, i64>>) -> Self {
        let mut scores: BTreeMap<ProductId, BTreeMap<ProductId, i64>> = BTreeMap::new();
        for group in groups {
            for (&left, &left_weight) in &group {
                for (&right, &right_weight) in &group {
                    if left != right {
                        *scores.entry(left).or_default().entry(right).or_default() +=
                            left_weight * right_weight;
                    }
                }
            }
        }
        Self { scores }
    }

    pub fn score(&self, left: ProductId, right: ProductId) -> i64 {
        self.scores.get(&left).and_then(|row| row.get(&right)).copied().unwrap_or(0)
    }

    /// Products that share a group with at least one other product, ascending.
    pub fn products(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.scores.keys().copied()
    }

    /// True when no two products were ever seen together.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Positive-score neighbors by descending score, ties by ascending id.
    pub fn neighbors(&self, product: ProductId, limit: usize) -> Vec<ProductId> {
        self.neighbors_where(product, limit, |_| true)
    }

    fn neighbors_where(
        &self,
        product: ProductId,
        limit: usize,
        keep: impl Fn(ProductId) -> bool,
    ) -> Vec<ProductId> {
        let Some(row) = self.scores.get(&product) else {
            return Vec::new();
        };
        // BTreeMap iteration is ascending by id; the stable sort keeps that among ties.
        let mut ranked: Vec<(ProductId, i64)> = row
            .iter()
            .map(|(&other, &score)| (other, score))
            .filter(|&(other, score)| other != product && score > 0 && keep(other))
            .collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1));
        ranked.into_iter().take(limit).map(|(other, _)| other).collect()
    }
}

/// Weighted co-occurrence neighbors for every product seen in `events`.
pub fn behavior_neighbors(
    events: &[InteractionEvent],
    limit: usize,
) -> BTreeMap<ProductId, Vec<ProductId>> {
    let matrix = CooccurrenceMatrix::weighted(events);
    matrix.products().map(|product| (product, matrix.neighbors(product, limit))).collect()
}

/// Presence co-occurrence neighbors restricted to `catalog`, for catalog
/// products seen in `events`.
pub fn also_bought_neighbors(
    events: &[InteractionEvent],
    catalog: &HashSet<ProductId>,
    limit: usize,
) -> BTreeMap<ProductId, Vec<ProductId>> {
    let matrix = CooccurrenceMatrix::presence(events);
    matrix
        .products()
        .filter(|product| catalog.contains(product))
        .map(|product| {
            (product, matrix.neighbors_where(product, limit, |other| catalog.contains(&other)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::{also_bought_neighbors, behavior_neighbors, CooccurrenceMatrix};
    use crate::domain::interaction::{EventKind, InteractionEvent, InteractionId};
    use crate::domain::product::ProductId;

    fn event(session: &str, product: i64, kind: EventKind, weight: i64) -> InteractionEvent {
        InteractionEvent {
            id: InteractionId(product),
            user_id: None,
            session_key: Some(session.to_string()),
            product_id: ProductId(product),
            kind,
            weight,
            created_at: Utc::now(),
        }
    }

    fn order(session: &str, product: i64) -> InteractionEvent {
        event(session, product, EventKind::Order, 1)
    }

    #[test]
    fn shared_orders_count_once_per_group() {
        let events = vec![order("A", 1), order("A", 2), order("B", 2), order("B", 3)];

        let matrix = CooccurrenceMatrix::presence(&events);

        assert_eq!(matrix.score(ProductId(1), ProductId(2)), 1);
        assert_eq!(matrix.score(ProductId(2), ProductId(3)), 1);
        assert_eq!(matrix.score(ProductId(1), ProductId(3)), 0);
        assert_eq!(matrix.score(ProductId(2), ProductId(2)), 0);
    }

    #[test]
    fn weighted_views_score_shared_sessions() {
        let view = |session, product| event(session, product, EventKind::View, 1);
        let events = vec![view("A", 1), view("A", 2), view("B", 2), view("B", 3)];

        let matrix = CooccurrenceMatrix::weighted(&events);

        assert_eq!(matrix.score(ProductId(1), ProductId(2)), 1);
        assert_eq!(matrix.score(ProductId(2), ProductId(3)), 1);
        assert_eq!(matrix.score(ProductId(1), ProductId(3)), 0);
        assert_eq!(matrix.score(ProductId(3), ProductId(2)), 1);
    }

    #[test]
    fn presence_ignores_repeated_events() {
        let events = vec![order("A", 1), order("A", 1), order("A", 1), order("A", 2)];

        let matrix = CooccurrenceMatrix::presence(&events);

        assert_eq!(matrix.score(ProductId(1), ProductId(2)), 1);
    }

    #[test]
    fn weighted_scores_multiply_group_sums() {
        let events = vec![
            event("A", 1, EventKind::View, 1),
            event("A", 1, EventKind::Cart, 3),
            event("A", 2, EventKind::Wishlist, 2),
            event("B", 1, EventKind::View, 1),
            event("B", 2, EventKind::View, 1),
        ];

        let matrix = CooccurrenceMatrix::weighted(&events);

        assert_eq!(matrix.score(ProductId(1), ProductId(2)), 4 * 2 + 1);
        assert_eq!(matrix.score(ProductId(2), ProductId(1)), 9);
    }

    #[test]
    fn neighbors_break_ties_by_ascending_id() {
        let events = vec![order("A", 5), order("A", 9), order("A", 7), order("B", 5), order("B", 8)];

        let neighbors = behavior_neighbors(&events, 10);

        assert_eq!(
            neighbors.get(&ProductId(5)),
            Some(&vec![ProductId(7), ProductId(8), ProductId(9)])
        );
        assert_eq!(neighbors.get(&ProductId(8)), Some(&vec![ProductId(5)]));
    }

    #[test]
    fn neighbors_are_truncated_and_exclude_self() {
        let mut events = Vec::new();
        for product in 1..=15 {
            events.push(order("A", product));
        }

        let matrix = CooccurrenceMatrix::presence(&events);
        let neighbors = matrix.neighbors(ProductId(1), 10);

        assert_eq!(neighbors.len(), 10);
        assert!(!neighbors.contains(&ProductId(1)));
        assert_eq!(neighbors[0], ProductId(2));
    }

    #[test]
    fn also_bought_filters_to_catalog_before_truncating() {
        let events = vec![order("A", 1), order("A", 2), order("A", 3), order("B", 1), order("B", 2)];
        let catalog: HashSet<ProductId> = [ProductId(1), ProductId(3)].into_iter().collect();

        let neighbors = also_bought_neighbors(&events, &catalog, 1);

        assert_eq!(neighbors.get(&ProductId(1)), Some(&vec![ProductId(3)]));
        assert!(!neighbors.contains_key(&ProductId(2)));
    }

    #[test]
    fn empty_log_builds_empty_matrix() {
        assert!(CooccurrenceMatrix::weighted(&[]).is_empty());
        assert!(behavior_neighbors(&[], 10).is_empty());
    }

    #[test]
    fn single_product_groups_produce_no_pairs() {
        let events = vec![order("A", 1), order("A", 1), order("B", 2)];

        let matrix = CooccurrenceMatrix::presence(&events);

        assert!(matrix.is_empty());
        assert_eq!(matrix.products().count(), 0);
    }
}
