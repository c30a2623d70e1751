//! Máquina de estados del diálogo y textos fijos que ve el usuario.
//!
//! Estados: `Idle` y `AwaitingConfirmation` (con la lista de opciones
//! ofrecidas). El estado viaja con cada petición; aquí sólo se decide qué
//! hacer con el turno entrante.

use crate::models::{DialogueState, FaqEntry};

pub const EMPTY_QUERY_MESSAGE: &str = "Silakan ketik pertanyaan Anda.";
pub const NO_DATA_MESSAGE: &str = "Data FAQ belum tersedia.";
pub const NO_MATCH_MESSAGE: &str = "Maaf, saya belum menemukan jawaban yang sesuai.";
pub const FAILURE_MESSAGE: &str = "Maaf, terjadi kesalahan dalam memproses pertanyaan Anda.";
pub const FAREWELL_MESSAGE: &str = "Sampai jumpa lagi! 👋";

const CLARIFY_HEADER: &str = "Apakah yang Anda maksud salah satu dari berikut ini?";
const CLARIFY_FOOTER: &str =
    "Ketik \"ya\" untuk menampilkan semua jawaban, atau tulis ulang pertanyaan Anda.";

const EXIT_WORDS: &[&str] = &["keluar", "exit", "quit", "leave"];
const AFFIRMATIONS: &[&str] = &["ya", "yes", "betul", "benar", "oke", "ok"];

/// Qué hacer con un turno, antes de puntuar nada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Exit,
    /// Afirmación mientras hay una aclaración pendiente.
    Confirm,
    /// Pregunta nueva (también cualquier otra respuesta a una aclaración).
    Query,
}

/// Clasifica el turno. Espera texto ya normalizado.
pub fn classify(normalized: &str, state: &DialogueState) -> Turn {
    if EXIT_WORDS.contains(&normalized) {
        Turn::Exit
    } else if state.is_awaiting() && is_affirmation(normalized) {
        Turn::Confirm
    } else {
        Turn::Query
    }
}

pub fn is_affirmation(normalized: &str) -> bool {
    AFFIRMATIONS.contains(&normalized)
}

/// Pregunta de aclaración con una línea por opción.
pub fn clarification_message(options: &[&FaqEntry]) -> String {
    let mut lines = Vec::with_capacity(options.len() + 2);
    lines.push(CLARIFY_HEADER.to_string());
    for entry in options {
        lines.push(format!("- {}", entry.question));
    }
    lines.push(CLARIFY_FOOTER.to_string());
    lines.join("\n")
}

/// Respuestas literales separadas por una línea en blanco.
pub fn join_answers(entries: &[&FaqEntry]) -> String {
    entries
        .iter()
        .map(|e| e.answer.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> DialogueState {
        DialogueState::awaiting(vec!["1".into(), "2".into()])
    }

    #[test]
    fn affirmation_only_counts_while_awaiting() {
        assert_eq!(classify("ya", &pending()), Turn::Confirm);
        assert_eq!(classify("ok", &pending()), Turn::Confirm);
        assert_eq!(classify("ya", &DialogueState::idle()), Turn::Query);
    }

    #[test]
    fn affirmation_must_match_exactly() {
        assert_eq!(classify("ya dong", &pending()), Turn::Query);
        assert_eq!(classify("iya", &pending()), Turn::Query);
        assert!(is_affirmation("betul"));
        assert!(!is_affirmation("tidak"));
    }

    #[test]
    fn exit_wins_in_any_state() {
        for state in [DialogueState::idle(), pending()] {
            assert_eq!(classify("keluar", &state), Turn::Exit);
            assert_eq!(classify("quit", &state), Turn::Exit);
            assert_eq!(classify("", &state), Turn::Query);
        }
    }

    #[test]
    fn clarification_lists_every_option() {
        let a = FaqEntry::new("1", "jam buka kantor kelurahan", "A", None);
        let b = FaqEntry::new("2", "jam buka loket kelurahan", "B", None);
        let msg = clarification_message(&[&a, &b]);

        assert!(msg.starts_with(CLARIFY_HEADER));
        assert!(msg.contains("- jam buka kantor kelurahan\n- jam buka loket kelurahan"));
        assert!(msg.ends_with(CLARIFY_FOOTER));
        assert_eq!(join_answers(&[&a, &b]), "A\n\nB");
    }
}
