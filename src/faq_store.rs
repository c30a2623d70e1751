//! Almacén de preguntas frecuentes respaldado por un fichero JSON.
//!
//! Es el colaborador que alimenta al motor: cada mutación se persiste antes
//! de devolver, y quien la invoca debe reconstruir el índice después.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{FaqEntry, Intent};

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Pregunta y respuesta son obligatorias")]
    MissingFields,

    #[error("FAQ no encontrada: {id}")]
    NotFound { id: String },

    #[error("Id de FAQ repetido: {id}")]
    DuplicateId { id: String },

    #[error("Error de E/S guardando las FAQ: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error serializando las FAQ: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Datos de entrada para crear o editar una FAQ.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl FaqDraft {
    fn into_entry(self, id: String) -> Result<FaqEntry, StoreError> {
        let question = self.question.trim();
        let answer = self.answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(StoreError::MissingFields);
        }
        let category_id = self
            .category_id
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(FaqEntry::new(id, question, answer, category_id))
    }
}

#[derive(Debug)]
pub struct FaqStore {
    path: PathBuf,
    entries: RwLock<Vec<FaqEntry>>,
}

impl FaqStore {
    /// Carga el fichero; si no existe se empieza con un almacén vacío.
    ///
    /// Las entradas sin id o con un id ya visto reciben uno nuevo, y el
    /// fichero se reescribe para que esos ids sobrevivan a un reinicio.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (entries, reassigned) = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mut entries: Vec<FaqEntry> = serde_json::from_slice(&bytes)
                    .with_context(|| format!("JSON de FAQ inválido en {}", path.display()))?;
                let reassigned = assign_missing_ids(&mut entries);
                (entries, reassigned)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{} no existe; se empieza sin FAQ.", path.display());
                (Vec::new(), 0)
            }
            Err(e) => {
                return Err(anyhow!("No se pudo leer {}: {e}", path.display()));
            }
        };

        info!("{} FAQ cargadas desde {}", entries.len(), path.display());
        let store = Self {
            path,
            entries: RwLock::new(entries),
        };

        if reassigned > 0 {
            warn!("{reassigned} FAQ sin id único; se guardan con ids nuevos.");
            let entries = store.entries.read().await.clone();
            store
                .persist(&entries)
                .await
                .with_context(|| format!("No se pudo reescribir {}", store.path.display()))?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copia del corpus actual, en orden de inserción.
    pub async fn list(&self) -> Vec<FaqEntry> {
        self.entries.read().await.clone()
    }

    pub async fn add(&self, draft: FaqDraft) -> Result<FaqEntry, StoreError> {
        let entry = draft.into_entry(Uuid::new_v4().to_string())?;
        let mut entries = self.entries.write().await;

        let mut next = entries.clone();
        next.push(entry.clone());
        self.persist(&next).await?;
        *entries = next;

        info!("FAQ añadida: {}", entry.question);
        Ok(entry)
    }

    pub async fn update(&self, id: &str, draft: FaqDraft) -> Result<FaqEntry, StoreError> {
        let entry = draft.into_entry(id.to_string())?;
        let mut entries = self.entries.write().await;

        let position = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let mut next = entries.clone();
        next[position] = entry.clone();
        self.persist(&next).await?;
        *entries = next;

        info!("FAQ editada: {id}");
        Ok(entry)
    }

    pub async fn delete(&self, id: &str) -> Result<FaqEntry, StoreError> {
        let mut entries = self.entries.write().await;

        let position = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let mut next = entries.clone();
        let removed = next.remove(position);
        self.persist(&next).await?;
        *entries = next;

        info!("FAQ eliminada: {}", removed.question);
        Ok(removed)
    }

    /// Sustituye todo el corpus. Las entradas sin id reciben uno nuevo; un id
    /// repetido rechaza la sustitución completa.
    pub async fn replace_all(&self, drafts: Vec<FaqEntry>) -> Result<usize, StoreError> {
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(drafts.len());
        for e in drafts {
            let id = match e.id.trim() {
                "" => Uuid::new_v4().to_string(),
                id => id.to_string(),
            };
            if !seen.insert(id.clone()) {
                return Err(StoreError::DuplicateId { id });
            }
            let draft = FaqDraft {
                question: e.question,
                answer: e.answer,
                category_id: e.category_id,
            };
            next.push(draft.into_entry(id)?);
        }

        let mut entries = self.entries.write().await;
        self.persist(&next).await?;
        let count = next.len();
        *entries = next;

        info!("Corpus FAQ sustituido: {count} entradas");
        Ok(count)
    }

    /// Agrupa las FAQ por categoría, en orden de primera aparición.
    pub async fn intents(&self) -> Vec<Intent> {
        let entries = self.entries.read().await;
        let mut intents: Vec<Intent> = Vec::new();

        for entry in entries.iter() {
            let tag = entry.category_id.as_deref().unwrap_or(UNCATEGORIZED);
            match intents.iter_mut().find(|i| i.tag == tag) {
                Some(intent) => {
                    intent.patterns.push(entry.question.clone());
                    intent.responses.push(entry.answer.clone());
                }
                None => intents.push(Intent {
                    tag: tag.to_string(),
                    patterns: vec![entry.question.clone()],
                    responses: vec![entry.answer.clone()],
                }),
            }
        }

        intents
    }

    async fn persist(&self, entries: &[FaqEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Da un id nuevo a las entradas sin id o con un id repetido (se conserva
/// el primero). Devuelve cuántas cambiaron.
fn assign_missing_ids(entries: &mut [FaqEntry]) -> usize {
    let mut seen = HashSet::new();
    let mut reassigned = 0;
    for entry in entries.iter_mut() {
        if entry.id.trim().is_empty() || !seen.insert(entry.id.clone()) {
            entry.id = Uuid::new_v4().to_string();
            seen.insert(entry.id.clone());
            reassigned += 1;
        }
    }
    reassigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(question: &str, answer: &str, category: Option<&str>) -> FaqDraft {
        FaqDraft {
            question: question.to_string(),
            answer: answer.to_string(),
            category_id: category.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faq.json");
        std::fs::write(&path, "{ no es json").unwrap();
        assert!(FaqStore::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("faq.json");
        let store = FaqStore::load(&path).await.unwrap();

        let a = store.add(draft(" cara buat ktp baru ", "A1", Some("ktp"))).await.unwrap();
        let b = store.add(draft("cetak ulang ktp hilang", "A2", None)).await.unwrap();
        assert_eq!(a.question, "cara buat ktp baru");
        assert_ne!(a.id, b.id);

        store.update(&b.id, draft("cetak ulang ktp rusak", "A2b", None)).await.unwrap();
        store.delete(&a.id).await.unwrap();

        let reloaded = FaqStore::load(&path).await.unwrap();
        let entries = reloaded.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, b.id);
        assert_eq!(entries[0].answer, "A2b");
    }

    #[tokio::test]
    async fn invalid_drafts_and_unknown_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).await.unwrap();

        assert!(matches!(
            store.add(draft("  ", "A", None)).await,
            Err(StoreError::MissingFields)
        ));
        assert!(matches!(
            store.update("nope", draft("q", "a", None)).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(store.delete("nope").await, Err(StoreError::NotFound { .. })));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn replace_all_assigns_missing_ids() {
        let dir = TempDir::new().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).await.unwrap();
        store.add(draft("lama", "x", None)).await.unwrap();

        let count = store
            .replace_all(vec![
                FaqEntry::new("", "cara buat ktp baru", "A1", None),
                FaqEntry::new("keep", "cetak ulang ktp hilang", "A2", None),
            ])
            .await
            .unwrap();

        let entries = store.list().await;
        assert_eq!(count, 2);
        assert!(!entries[0].id.is_empty());
        assert_eq!(entries[1].id, "keep");
        assert!(entries.iter().all(|e| e.question != "lama"));
    }

    #[tokio::test]
    async fn intents_group_by_category() {
        let dir = TempDir::new().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).await.unwrap();
        store.add(draft("cara buat ktp baru", "A1", Some("ktp"))).await.unwrap();
        store.add(draft("jam buka kantor", "A3", None)).await.unwrap();
        store.add(draft("cetak ulang ktp hilang", "A2", Some("ktp"))).await.unwrap();

        let intents = store.intents().await;
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].tag, "ktp");
        assert_eq!(intents[0].patterns, vec!["cara buat ktp baru", "cetak ulang ktp hilang"]);
        assert_eq!(intents[0].responses, vec!["A1", "A2"]);
        assert_eq!(intents[1].tag, UNCATEGORIZED);
    }

    #[tokio::test]
    async fn generated_ids_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faq.json");
        std::fs::write(
            &path,
            r#"[{"question": "cara buat ktp baru", "answer": "A1"},
                {"question": "cetak ulang ktp hilang", "answer": "A2"}]"#,
        )
        .unwrap();

        let first = FaqStore::load(&path).await.unwrap().list().await;
        let second = FaqStore::load(&path).await.unwrap().list().await;
        assert!(first.iter().all(|e| !e.id.is_empty()));
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn load_gives_repeated_ids_a_new_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faq.json");
        std::fs::write(
            &path,
            r#"[{"id": "x", "question": "jam buka kantor kelurahan", "answer": "Kantor"},
                {"id": "x", "question": "jam buka kasir kelurahan", "answer": "Kasir"}]"#,
        )
        .unwrap();

        let store = FaqStore::load(&path).await.unwrap();
        let entries = store.list().await;
        assert_eq!(entries[0].id, "x");
        assert_ne!(entries[1].id, "x");

        store.delete(&entries[1].id).await.unwrap();
        assert_eq!(store.list().await[0].answer, "Kantor");
    }

    #[tokio::test]
    async fn replace_all_rejects_repeated_ids() {
        let dir = TempDir::new().unwrap();
        let store = FaqStore::load(dir.path().join("faq.json")).await.unwrap();
        store.add(draft("lama", "x", None)).await.unwrap();

        let result = store
            .replace_all(vec![
                FaqEntry::new("x", "jam buka kantor kelurahan", "Kantor", None),
                FaqEntry::new(" x ", "jam buka kasir kelurahan", "Kasir", None),
            ])
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateId { ref id }) if id == "x"));
        assert_eq!(store.list().await.len(), 1);
    }
}
