//! Índice vectorial en memoria sobre las preguntas del corpus FAQ.
//!
//! API pública:
//!   - `VectorIndex::build(corpus, &EngineSettings)`
//!   - `VectorIndex::embed(&str)` y `VectorIndex::score(&[f32])`.
//!
//! El índice es inmutable: cualquier cambio del corpus obliga a construir uno
//! nuevo, porque los pesos dependen de estadísticas de todo el corpus.

use chrono::{DateTime, Utc};

use crate::{
    config::EngineSettings,
    error::EngineError,
    models::FaqEntry,
    vectorizer::{self, Vectorizer},
};

#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<FaqEntry>,
    space: Box<dyn Vectorizer>,
    embeddings: Vec<Vec<f32>>,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Ajusta el espacio vectorial y vectoriza todas las preguntas.
    /// La fila `i` de los embeddings corresponde siempre a `entries[i]`.
    pub fn build(corpus: Vec<FaqEntry>, settings: &EngineSettings) -> Result<Self, EngineError> {
        if corpus.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }

        let questions: Vec<String> = corpus.iter().map(|e| e.question.clone()).collect();
        let space = vectorizer::fit(&settings.vectorizer, &questions, settings)?;
        let embeddings = questions.iter().map(|q| space.transform(q)).collect();

        Ok(Self {
            entries: corpus,
            space,
            embeddings,
            built_at: Utc::now(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn entry(&self, faq_index: usize) -> Option<&FaqEntry> {
        self.entries.get(faq_index)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&FaqEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Vectoriza un texto en el mismo espacio ajustado para el corpus.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        self.space.transform(text)
    }

    /// Similitud coseno de la consulta contra cada pregunta indexada,
    /// en el orden del corpus.
    pub fn score(&self, query_vector: &[f32]) -> Result<Vec<f32>, EngineError> {
        if query_vector.len() != self.dimension() {
            return Err(EngineError::StaleIndex {
                expected: self.dimension(),
                found: query_vector.len(),
            });
        }
        if self.embeddings.len() != self.entries.len() {
            return Err(EngineError::StaleIndex {
                expected: self.entries.len(),
                found: self.embeddings.len(),
            });
        }

        Ok(self
            .embeddings
            .iter()
            .map(|row| cosine_similarity(query_vector, row).clamp(0.0, 1.0))
            .collect())
    }
}

/// Un vector nulo tiene similitud 0 con cualquier otro.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, na, nb) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(d, aa, bb), (x, y)| {
            (d + (x * y), aa + (x * x), bb + (y * y))
        });

    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorizerKind;

    fn corpus() -> Vec<FaqEntry> {
        vec![
            FaqEntry::new("1", "cara buat ktp baru", "A1", None),
            FaqEntry::new("2", "cetak ulang ktp hilang", "A2", None),
            FaqEntry::new("3", "jam buka kantor kelurahan", "A3", Some("layanan".into())),
        ]
    }

    #[test]
    fn cosine_handles_zero_and_unit_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        let zero = vec![0.0, 0.0, 0.0];

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let err = VectorIndex::build(Vec::new(), &EngineSettings::default()).unwrap_err();
        assert_eq!(err, EngineError::EmptyCorpus);
    }

    #[test]
    fn exact_question_scores_highest() {
        for kind in [VectorizerKind::Tfidf, VectorizerKind::Hashing] {
            let settings = EngineSettings {
                vectorizer: kind,
                ..EngineSettings::default()
            };
            let index = VectorIndex::build(corpus(), &settings).unwrap();

            for (i, entry) in index.entries().iter().enumerate() {
                let scores = index.score(&index.embed(&entry.question)).unwrap();
                assert_eq!(scores.len(), index.len());
                assert!((scores[i] - 1.0).abs() < 1e-5);
                assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
            }
        }
    }

    #[test]
    fn mismatched_query_dimension_is_stale() {
        let index = VectorIndex::build(corpus(), &EngineSettings::default()).unwrap();
        let err = index.score(&[1.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            EngineError::StaleIndex {
                expected: index.dimension(),
                found: 2
            }
        );
    }

    #[test]
    fn lookup_by_id_and_position() {
        let index = VectorIndex::build(corpus(), &EngineSettings::default()).unwrap();
        assert_eq!(index.find_by_id("2").map(|e| e.answer.as_str()), Some("A2"));
        assert_eq!(index.entry(2).map(|e| e.id.as_str()), Some("3"));
        assert!(index.find_by_id("99").is_none());
    }
}
