use thiserror::Error;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("corpus is empty")]
    EmptyCorpus,
    #[error("empty vocabulary; documents contain only stop words or short tokens")]
    EmptyVocabulary,
    #[error("similarity backend unavailable: {0}")]
    Unavailable(String),
}

/// Pairwise content similarity over a text corpus.
///
/// Callers check `capability` once per run and only call `compute` when the
/// backend reports itself available.
pub trait SimilarityBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn capability(&self) -> Capability;

    fn compute(&self, corpus: &[String]) -> Result<SimilarityMatrix, SimilarityError>;
}

/// Backend used when content similarity is switched off.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledSimilarity;

impl SimilarityBackend for DisabledSimilarity {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn capability(&self) -> Capability {
        Capability::Unavailable("content similarity disabled by configuration".to_string())
    }

    fn compute(&self, _corpus: &[String]) -> Result<SimilarityMatrix, SimilarityError> {
        Err(SimilarityError::Unavailable("content similarity disabled by configuration".into()))
    }
}

/// N×N similarity scores, stored row by row with only positive entries.
/// Entries in a row are kept in ascending column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimilarityMatrix {
    rows: Vec<Vec<(usize, f64)>>,
}

impl SimilarityMatrix {
    pub fn from_rows(rows: Vec<Vec<(usize, f64)>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.retain(|(_, score)| *score > 0.0);
                row.sort_by_key(|(column, _)| *column);
                row
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn score(&self, row: usize, column: usize) -> f64 {
        let Some(entries) = self.rows.get(row) else {
            return 0.0;
        };
        entries
            .binary_search_by_key(&column, |(col, _)| *col)
            .map(|index| entries[index].1)
            .unwrap_or(0.0)
    }

    pub fn row(&self, row: usize) -> &[(usize, f64)] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Content candidates per product, aligned with `ids` (catalog order).
///
/// Other products with a positive score are ordered by descending score; the
/// stable sort keeps catalog order among ties. Each list is cut to `width`.
pub fn content_candidates(
    matrix: &SimilarityMatrix,
    ids: &[ProductId],
    width: usize,
) -> Vec<Vec<ProductId>> {
    ids.iter()
        .enumerate()
        .map(|(index, _)| {
            let mut scored: Vec<(usize, f64)> = matrix
                .row(index)
                .iter()
                .copied()
                .filter(|(column, _)| *column != index && *column < ids.len())
                .collect();
            scored.sort_by(|left, right| right.1.total_cmp(&left.1));
            scored.into_iter().take(width).map(|(column, _)| ids[column]).collect()
        })
        .collect()
}
