//! Espacios vectoriales para preguntas y consultas.
//!
//! Dos estrategias, elegidas por configuración (`VECTORIZER`):
//!   - `Tfidf`: vocabulario de n-gramas ajustado sobre el corpus, IDF suavizado.
//!   - `Hashing`: hashing de n-gramas en un número fijo de cubetas.
//!
//! Ambas devuelven vectores densos normalizados (L2) y no negativos.

use std::collections::{HashMap, HashSet};

use crate::{
    config::{EngineSettings, VectorizerKind},
    error::EngineError,
    text::{ngrams, normalize},
};

/// Transformación de texto libre a un vector de dimensión fija.
pub trait Vectorizer: Send + Sync + std::fmt::Debug {
    fn dimension(&self) -> usize;
    fn transform(&self, text: &str) -> Vec<f32>;
}

/// Ajusta la estrategia indicada sobre las preguntas del corpus.
pub fn fit(
    kind: &VectorizerKind,
    documents: &[String],
    settings: &EngineSettings,
) -> Result<Box<dyn Vectorizer>, EngineError> {
    match kind {
        VectorizerKind::Tfidf => Ok(Box::new(TfidfVectorizer::fit(
            documents,
            settings.max_features,
            settings.ngram_max,
        )?)),
        VectorizerKind::Hashing => Ok(Box::new(HashingVectorizer::fit(
            documents,
            settings.max_features,
            settings.ngram_max,
        )?)),
    }
}

// ---------------------------------------------------------------------
// TF-IDF
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    ngram_max: usize,
}

impl TfidfVectorizer {
    /// Construye el vocabulario y los pesos IDF.
    ///
    /// Si hay más términos que `max_features` se conservan los de mayor
    /// frecuencia total (empates por orden lexicográfico). Las columnas
    /// quedan en orden lexicográfico, de modo que el ajuste es determinista.
    pub fn fit(
        documents: &[String],
        max_features: usize,
        ngram_max: usize,
    ) -> Result<Self, EngineError> {
        let docs: Vec<Vec<String>> = documents
            .iter()
            .map(|d| ngrams(&normalize(d), ngram_max))
            .collect();

        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();

        for doc in &docs {
            let mut seen = HashSet::new();
            for term in doc {
                *term_freq.entry(term.as_str()).or_default() += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_default() += 1;
                }
            }
        }

        if term_freq.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }

        let mut ranked: Vec<(&str, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features.max(1));

        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();

        let n_docs = docs.len() as f32;
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());

        for (column, term) in kept.into_iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.to_string(), column);
        }

        Ok(Self {
            vocabulary,
            idf,
            ngram_max,
        })
    }
}

impl Vectorizer for TfidfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.idf.len()];

        for term in ngrams(&normalize(text), self.ngram_max) {
            if let Some(&column) = self.vocabulary.get(&term) {
                v[column] += 1.0;
            }
        }
        for (x, idf) in v.iter_mut().zip(&self.idf) {
            *x *= idf;
        }

        l2_normalize(&mut v);
        v
    }
}

// ---------------------------------------------------------------------
// HASHING
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    dim: usize,
    ngram_max: usize,
}

impl HashingVectorizer {
    /// No aprende nada del corpus, pero exige que produzca algún término
    /// para que un corpus sin texto indexable se trate igual que con TF-IDF.
    pub fn fit(
        documents: &[String],
        dim: usize,
        ngram_max: usize,
    ) -> Result<Self, EngineError> {
        let any_term = documents
            .iter()
            .any(|d| !ngrams(&normalize(d), 1).is_empty());
        if !any_term {
            return Err(EngineError::EmptyVocabulary);
        }

        Ok(Self {
            dim: dim.max(8),
            ngram_max,
        })
    }

    fn bucket(&self, term: &str) -> usize {
        let mut h: u64 = 1469598103934665603;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        (h % self.dim as u64) as usize
    }
}

impl Vectorizer for HashingVectorizer {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn transform(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for term in ngrams(&normalize(text), self.ngram_max) {
            v[self.bucket(&term)] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
