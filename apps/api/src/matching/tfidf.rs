//! TF-IDF vector space over pre-normalized documents.
//!
//! Unigrams + bigrams, document-frequency pruning, a frequency-ranked feature cap,
//! smooth IDF `ln((1 + n) / (1 + df)) + 1`, sublinear TF `1 + ln(tf)`, and
//! L2-normalized rows so cosine similarity is a sparse dot product.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fit-time knobs for the vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfParams {
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum share of documents a term may appear in.
    pub max_df: f64,
    pub sublinear_tf: bool,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.85,
            sublinear_tf: true,
        }
    }
}

/// Sparse row: column indices (ascending) and matching weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVec {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVec {
    pub fn dot(&self, other: &SparseVec) -> f32 {
        let mut sum = 0.0f32;
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        sum
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Weight at `index`, or 0.0 when the term is absent.
    pub fn get(&self, index: u32) -> f32 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }
}

/// A fitted TF-IDF transform: vocabulary (alphabetical) and per-term IDF weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    params: TfidfParams,
    feature_names: Vec<String>,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    #[serde(skip, default = "word_pattern")]
    word: Regex,
}

impl TfidfVectorizer {
    /// Fits the vocabulary and IDF weights, returning the transform and one row per document.
    ///
    /// When the document-frequency bounds prune every term the transform is still valid:
    /// its vocabulary is empty and every row is the zero vector.
    pub fn fit_transform(documents: &[String], params: TfidfParams) -> (Self, Vec<SparseVec>) {
        let word = word_pattern();
        let analyzed: Vec<Vec<String>> = documents
            .iter()
            .map(|d| analyze(&word, params.ngram_range, d))
            .collect();

        let n_docs = documents.len();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for term in terms {
                *counts.entry(term.as_str()).or_insert(0) += 1;
            }
            for (term, count) in counts {
                *doc_freq.entry(term).or_insert(0) += 1;
                *corpus_freq.entry(term).or_insert(0) += count;
            }
        }

        let max_doc_count = params.max_df * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = doc_freq
            .iter()
            .filter(|&(_, &df)| df >= params.min_df && (df as f64) <= max_doc_count)
            .map(|(&term, _)| (term, corpus_freq[term]))
            .collect();

        if kept.len() > params.max_features {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(params.max_features);
        }

        let mut feature_names: Vec<String> = kept.iter().map(|(t, _)| t.to_string()).collect();
        feature_names.sort();

        let vocabulary: HashMap<String, u32> = feature_names
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx as u32))
            .collect();

        let n = n_docs as f32;
        let idf: Vec<f32> = feature_names
            .iter()
            .map(|term| {
                let df = doc_freq[term.as_str()] as f32;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vectorizer = Self {
            params,
            feature_names,
            vocabulary,
            idf,
            word,
        };
        let rows = analyzed
            .iter()
            .map(|terms| vectorizer.weigh(terms))
            .collect();

        (vectorizer, rows)
    }

    /// Projects a document into the fitted space. Unknown terms are dropped.
    pub fn transform(&self, document: &str) -> SparseVec {
        let terms = analyze(&self.word, self.params.ngram_range, document);
        self.weigh(&terms)
    }

    fn weigh(&self, terms: &[String]) -> SparseVec {
        let mut tf: BTreeMap<u32, u32> = BTreeMap::new();
        for term in terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *tf.entry(idx).or_insert(0) += 1;
            }
        }

        let (indices, values): (Vec<u32>, Vec<f32>) = tf
            .into_iter()
            .map(|(idx, count)| {
                let count = count as f32;
                let scaled = if self.params.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                (idx, scaled * self.idf[idx as usize])
            })
            .unzip();

        let mut row = SparseVec { indices, values };
        row.l2_normalize();
        row
    }

    pub fn feature_name(&self, index: u32) -> Option<&str> {
        self.feature_names.get(index as usize).map(String::as_str)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.feature_names.len()
    }
}

fn word_pattern() -> Regex {
    Regex::new(r"\b\w\w+\b").expect("valid token regex")
}

/// Splits a normalized document into word tokens and joins adjacent ones into n-grams.
fn analyze(word: &Regex, ngram_range: (usize, usize), document: &str) -> Vec<String> {
    let words: Vec<&str> = word.find_iter(document).map(|m| m.as_str()).collect();
    let (min_n, max_n) = ngram_range;

    let mut terms = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n == 1 {
            terms.extend(words.iter().map(|w| w.to_string()));
        } else {
            terms.extend(words.windows(n).map(|window| window.join(" ")));
        }
    }
    terms
}
