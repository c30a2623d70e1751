//! Política de selección: umbral, ajuste, orden y respuestas múltiples.

use crate::{
    config::EngineSettings,
    keywords::KeywordRules,
    models::{Outcome, ScoredCandidate},
};

/// Convierte las puntuaciones base en candidatos. El ajuste por palabras
/// clave sólo se calcula para los que superan el umbral.
pub fn score_candidates(
    base_scores: &[f32],
    questions: &[&str],
    query_text: &str,
    rules: &KeywordRules,
    threshold: f32,
) -> Vec<ScoredCandidate> {
    base_scores
        .iter()
        .zip(questions)
        .enumerate()
        .map(|(faq_index, (&base_score, question))| {
            let adjustment = if base_score >= threshold {
                rules.adjust(query_text, question)
            } else {
                0.0
            };
            ScoredCandidate {
                faq_index,
                base_score,
                adjustment,
                final_score: base_score + adjustment,
            }
        })
        .collect()
}

/// Elige entre ninguna, una o varias respuestas.
///
/// Los empates en `final_score` conservan el orden del corpus.
pub fn select(candidates: &[ScoredCandidate], settings: &EngineSettings) -> Outcome {
    let mut passing: Vec<ScoredCandidate> = candidates
        .iter()
        .filter(|c| c.base_score >= settings.similarity_threshold)
        .map(|c| ScoredCandidate {
            final_score: c.base_score + c.adjustment,
            ..*c
        })
        .collect();

    if passing.is_empty() {
        return Outcome::NoMatch;
    }

    // sort_by es estable
    passing.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

    let best_score = passing[0].final_score;
    let mut selected: Vec<ScoredCandidate> = passing
        .into_iter()
        .filter(|c| c.final_score >= best_score - settings.multi_intent_gap)
        .collect();
    selected.truncate(settings.max_answers.max(1));

    if selected.len() == 1 {
        Outcome::SingleAnswer(selected[0])
    } else {
        Outcome::MultipleAnswers(selected)
    }
}

/// Diferencia entre los dos mejores candidatos seleccionados.
pub fn top_two_gap(selected: &[ScoredCandidate]) -> Option<f32> {
    match selected {
        [first, second, ..] => Some(first.final_score - second.final_score),
        _ => None,
    }
}
