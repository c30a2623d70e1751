//! Motor de recuperación FAQ.
//!
//! Flujo de un turno:
//!   1. Normalización y clasificación del turno (salida, confirmación o pregunta).
//!   2. Vectorización de la consulta en el espacio del índice vigente.
//!   3. Similitud coseno contra todas las preguntas indexadas.
//!   4. Ajuste por palabras clave y política de selección.
//!   5. Respuesta literal, varias respuestas o pregunta de aclaración.
//!
//! El índice se sustituye entero en cada reconstrucción: los lectores toman
//! un `Arc` del índice vigente y nunca ven uno a medio construir.

use std::{
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::{
    config::EngineSettings,
    dialogue::{self, Turn},
    error::EngineError,
    keywords::KeywordRules,
    models::{DialogueState, FaqEntry, Outcome, Reply},
    ranking,
    text::normalize,
    vector_store::VectorIndex,
};

/// Resumen de una reconstrucción del índice.
#[derive(Debug, Clone)]
pub struct RebuildSummary {
    pub entries: usize,
    pub dimension: usize,
    pub elapsed_ms: u128,
    pub built_at: DateTime<Utc>,
}

impl std::fmt::Display for RebuildSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} preguntas indexadas en {} dimensiones ({} ms).",
            self.entries, self.dimension, self.elapsed_ms
        )
    }
}

#[derive(Debug)]
pub struct ChatEngine {
    settings: EngineSettings,
    rules: KeywordRules,
    index: RwLock<Option<Arc<VectorIndex>>>,
    rebuild_lock: Mutex<()>,
}

impl ChatEngine {
    /// Crea un motor sin índice; responde "sin datos" hasta el primer `rebuild`.
    pub fn new(settings: EngineSettings, rules: KeywordRules) -> Self {
        Self {
            settings,
            rules,
            index: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Índice vigente, si lo hay.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reconstruye el índice completo a partir de una copia del corpus.
    ///
    /// Las reconstrucciones se serializan. Si falla (corpus vacío o sin
    /// términos) el índice anterior se descarta y el motor queda sin datos.
    pub fn rebuild(&self, corpus: Vec<FaqEntry>) -> Result<RebuildSummary, EngineError> {
        let _guard = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();
        info!("Reconstruyendo índice FAQ con {} entradas...", corpus.len());

        match VectorIndex::build(corpus, &self.settings) {
            Ok(index) => {
                let summary = RebuildSummary {
                    entries: index.len(),
                    dimension: index.dimension(),
                    elapsed_ms: started.elapsed().as_millis(),
                    built_at: index.built_at(),
                };
                self.swap(Some(Arc::new(index)));
                info!("Índice FAQ listo: {summary}");
                Ok(summary)
            }
            Err(e) => {
                self.swap(None);
                warn!("Índice FAQ no disponible: {e}");
                Err(e)
            }
        }
    }

    fn swap(&self, next: Option<Arc<VectorIndex>>) {
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Puntúa una consulta y aplica la política de selección.
    pub fn predict(&self, query_text: &str) -> Result<(Outcome, Arc<VectorIndex>), EngineError> {
        let normalized = normalize(query_text);
        if normalized.is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        let index = self.snapshot().ok_or(EngineError::EmptyCorpus)?;
        let outcome = self.rank(&index, &normalized)?;
        Ok((outcome, index))
    }

    fn rank(&self, index: &VectorIndex, normalized: &str) -> Result<Outcome, EngineError> {
        let query_vector = index.embed(normalized);
        let base_scores = index.score(&query_vector)?;
        let questions: Vec<&str> = index.entries().iter().map(|e| e.question.as_str()).collect();

        let candidates = ranking::score_candidates(
            &base_scores,
            &questions,
            normalized,
            &self.rules,
            self.settings.similarity_threshold,
        );
        let outcome = ranking::select(&candidates, &self.settings);
        debug!("Consulta '{normalized}' -> {outcome:?}");
        Ok(outcome)
    }

    /// Atiende un turno del chat. Nunca falla: cualquier error se traduce en
    /// un mensaje fijo para el usuario.
    pub fn respond(&self, query_text: &str, state: &DialogueState) -> Reply {
        let normalized = normalize(query_text);

        match dialogue::classify(&normalized, state) {
            Turn::Exit => reply(dialogue::FAREWELL_MESSAGE, DialogueState::idle()),
            Turn::Confirm => match self.snapshot() {
                Some(index) => confirm(&index, state),
                None => reply(dialogue::NO_DATA_MESSAGE, DialogueState::idle()),
            },
            Turn::Query => match self.predict(&normalized) {
                Ok((outcome, index)) => self
                    .answer(&index, outcome)
                    .unwrap_or_else(|e| failure(&normalized, &e)),
                Err(EngineError::EmptyQuery) => {
                    reply(dialogue::EMPTY_QUERY_MESSAGE, state.clone())
                }
                Err(EngineError::EmptyCorpus | EngineError::EmptyVocabulary) => {
                    reply(dialogue::NO_DATA_MESSAGE, DialogueState::idle())
                }
                Err(e) => failure(&normalized, &e),
            },
        }
    }

    fn answer(&self, index: &VectorIndex, outcome: Outcome) -> Result<Reply, EngineError> {
        match outcome {
            Outcome::NoMatch => Ok(reply(dialogue::NO_MATCH_MESSAGE, DialogueState::idle())),
            Outcome::SingleAnswer(candidate) => {
                let entry = entry_at(index, candidate.faq_index)?;
                Ok(reply(&entry.answer, DialogueState::idle()))
            }
            Outcome::MultipleAnswers(selected) => {
                let entries = selected
                    .iter()
                    .map(|c| entry_at(index, c.faq_index))
                    .collect::<Result<Vec<_>, _>>()?;

                let ambiguous = ranking::top_two_gap(&selected)
                    .is_some_and(|gap| gap < self.settings.ambiguity_gap);

                if ambiguous {
                    let options = entries.iter().map(|e| e.id.clone()).collect();
                    Ok(Reply {
                        text: dialogue::clarification_message(&entries),
                        state: DialogueState::awaiting(options),
                    })
                } else {
                    Ok(reply(&dialogue::join_answers(&entries), DialogueState::idle()))
                }
            }
        }
    }
}

/// Responde a una afirmación con todas las opciones que sigan existiendo.
fn confirm(index: &VectorIndex, state: &DialogueState) -> Reply {
    let entries: Vec<&FaqEntry> = state
        .last_options
        .iter()
        .filter_map(|id| index.find_by_id(id))
        .collect();

    if entries.is_empty() {
        reply(dialogue::NO_MATCH_MESSAGE, DialogueState::idle())
    } else {
        reply(&dialogue::join_answers(&entries), DialogueState::idle())
    }
}

fn entry_at(index: &VectorIndex, faq_index: usize) -> Result<&FaqEntry, EngineError> {
    index.entry(faq_index).ok_or(EngineError::StaleIndex {
        expected: index.len(),
        found: faq_index + 1,
    })
}

fn failure(query: &str, e: &EngineError) -> Reply {
    error!("Error procesando la consulta '{query}': {e}");
    reply(dialogue::FAILURE_MESSAGE, DialogueState::idle())
}

fn reply(text: &str, state: DialogueState) -> Reply {
    Reply {
        text: text.to_string(),
        state,
    }
}
