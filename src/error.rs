//! Errores del motor de recuperación.
//!
//! Ninguno llega al usuario final: `ChatEngine::respond` los convierte en
//! mensajes fijos. Sólo los fallos de recursos (almacén FAQ, configuración)
//! se propagan como `anyhow::Error`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("El corpus FAQ está vacío")]
    EmptyCorpus,

    #[error("Ninguna pregunta del corpus produjo términos indexables")]
    EmptyVocabulary,

    #[error("La consulta está vacía")]
    EmptyQuery,

    #[error("Índice desfasado: se esperaban {expected} dimensiones/filas y se encontraron {found}")]
    StaleIndex { expected: usize, found: usize },
}
