use std::collections::{HashMap, HashSet};

use crate::recommend::similarity::{
    Capability, SimilarityBackend, SimilarityError, SimilarityMatrix,
};
use crate::recommend::stop_words::ENGLISH_STOP_WORDS;
use crate::recommend::MAX_FEATURES;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TfidfSettings {
    pub max_features: usize,
    /// Longest n-gram formed from adjacent tokens.
    pub max_ngram: usize,
    /// Shortest token kept, in characters.
    pub min_token_chars: usize,
}

impl Default for TfidfSettings {
    fn default() -> Self {
        Self { max_features: MAX_FEATURES, max_ngram: 2, min_token_chars: 2 }
    }
}

/// TF-IDF vectors with smoothed idf and L2-normalized rows; similarity is the
/// cosine of two rows.
#[derive(Clone, Debug)]
pub struct TfidfSimilarity {
    settings: TfidfSettings,
    stop_words: HashSet<&'static str>,
}

type SparseVector = Vec<(usize, f64)>;

impl TfidfSimilarity {
    pub fn new(settings: TfidfSettings) -> Self {
        Self { settings, stop_words: ENGLISH_STOP_WORDS.iter().copied().collect() }
    }

    pub fn settings(&self) -> &TfidfSettings {
        &self.settings
    }

    fn tokens(&self, document: &str) -> Vec<String> {
        let lowered = document.to_lowercase();
        lowered
            .split(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
            .filter(|token| token.chars().count() >= self.settings.min_token_chars)
            .filter(|token| !self.stop_words.contains(token))
            .map(str::to_string)
            .collect()
    }

    fn terms(&self, document: &str) -> Vec<String> {
        let tokens = self.tokens(document);
        let mut terms = tokens.clone();
        for size in 2..=self.settings.max_ngram.max(1) {
            terms.extend(tokens.windows(size).map(|window| window.join(" ")));
        }
        terms
    }

    /// Vocabulary capped at `max_features`, keeping the terms with the
    /// highest corpus-wide count. Ties resolve alphabetically. Column indices
    /// follow alphabetical order of the kept terms.
    fn vocabulary(&self, counts: &[HashMap<String, usize>]) -> HashMap<String, usize> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for document in counts {
            for (term, count) in document {
                *totals.entry(term.as_str()).or_default() += count;
            }
        }

        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        ranked.truncate(self.settings.max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();
        kept.into_iter().enumerate().map(|(column, term)| (term.to_string(), column)).collect()
    }

    fn vectors(&self, corpus: &[String]) -> Result<Vec<SparseVector>, SimilarityError> {
        let counts: Vec<HashMap<String, usize>> = corpus
            .iter()
            .map(|document| {
                let mut counts = HashMap::new();
                for term in self.terms(document) {
                    *counts.entry(term).or_default() += 1;
                }
                counts
            })
            .collect();

        let vocabulary = self.vocabulary(&counts);
        if vocabulary.is_empty() {
            return Err(SimilarityError::EmptyVocabulary);
        }

        let mut document_frequency = vec![0_usize; vocabulary.len()];
        for document in &counts {
            for term in document.keys() {
                if let Some(&column) = vocabulary.get(term) {
                    document_frequency[column] += 1;
                }
            }
        }

        let n = corpus.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Ok(counts
            .iter()
            .map(|document| {
                let mut vector: SparseVector = document
                    .iter()
                    .filter_map(|(term, &count)| {
                        vocabulary.get(term).map(|&column| (column, count as f64 * idf[column]))
                    })
                    .collect();
                vector.sort_by_key(|(column, _)| *column);
                let norm = vector.iter().map(|(_, value)| value * value).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for entry in &mut vector {
                        entry.1 /= norm;
                    }
                }
                vector
            })
            .collect())
    }
}

impl Default for TfidfSimilarity {
    fn default() -> Self {
        Self::new(TfidfSettings::default())
    }
}

impl SimilarityBackend for TfidfSimilarity {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn capability(&self) -> Capability {
        if self.settings.max_features == 0 {
            return Capability::Unavailable("max_features must be positive".to_string());
        }
        Capability::Available
    }

    fn compute(&self, corpus: &[String]) -> Result<SimilarityMatrix, SimilarityError> {
        if corpus.is_empty() {
            return Err(SimilarityError::EmptyCorpus);
        }

        let vectors = self.vectors(corpus)?;

        let mut postings: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
        for (row, vector) in vectors.iter().enumerate() {
            for &(column, value) in vector {
                postings.entry(column).or_default().push((row, value));
            }
        }

        let rows = vectors
            .iter()
            .map(|vector| {
                let mut scores: HashMap<usize, f64> = HashMap::new();
                for &(column, value) in vector {
                    if let Some(list) = postings.get(&column) {
                        for &(other, other_value) in list {
                            *scores.entry(other).or_default() += value * other_value;
                        }
                    }
                }
                scores.into_iter().collect()
            })
            .collect();

        Ok(SimilarityMatrix::from_rows(rows))
    }
}
