//! Modelos de dominio (entradas FAQ, candidatos puntuados y estado del diálogo).

use serde::{Deserialize, Serialize};

/// Una pregunta frecuente con su respuesta literal.
/// El motor sólo guarda una copia de lectura tomada al reconstruir el índice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl FaqEntry {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        category_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            category_id,
        }
    }
}

/// Puntuación de una entrada del corpus frente a una consulta.
/// Vive sólo durante una petición.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    /// Posición de la entrada dentro del corpus indexado.
    pub faq_index: usize,
    pub base_score: f32,
    pub adjustment: f32,
    pub final_score: f32,
}

/// Resultado de la política de selección.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoMatch,
    SingleAnswer(ScoredCandidate),
    /// Ordenados por `final_score` descendente, nunca más de `max_answers`.
    MultipleAnswers(Vec<ScoredCandidate>),
}

/// Estado del diálogo. Lo guarda el cliente y lo reenvía en cada turno;
/// el servidor nunca lo almacena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueState {
    #[serde(default)]
    pub awaiting_confirmation: bool,
    /// Ids de las entradas ofrecidas en la última aclaración.
    #[serde(default)]
    pub last_options: Vec<String>,
}

impl DialogueState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn awaiting(options: Vec<String>) -> Self {
        Self {
            awaiting_confirmation: !options.is_empty(),
            last_options: options,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting_confirmation && !self.last_options.is_empty()
    }
}

/// Respuesta de un turno: texto para el usuario y el nuevo estado.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub state: DialogueState,
}

/// Vista agrupada por categoría, equivalente a la exportación de intents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub tag: String,
    pub patterns: Vec<String>,
    pub responses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn awaiting_with_no_options_is_idle() {
        let state = DialogueState::awaiting(Vec::new());
        assert!(!state.awaiting_confirmation);
        assert!(!state.is_awaiting());
    }

    #[test]
    fn dialogue_state_deserializes_with_missing_fields() {
        let state: DialogueState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, DialogueState::idle());

        let state: DialogueState =
            serde_json::from_str(r#"{"awaiting_confirmation":true,"last_options":["a","b"]}"#)
                .unwrap();
        assert!(state.is_awaiting());
        assert_eq!(state.last_options, vec!["a", "b"]);
    }

    #[test]
    fn faq_entry_without_id_or_category_parses() {
        let entry: FaqEntry =
            serde_json::from_str(r#"{"question":"cara buat ktp baru","answer":"A1"}"#).unwrap();
        assert!(entry.id.is_empty());
        assert_eq!(entry.category_id, None);
    }
}
