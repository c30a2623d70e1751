//! Ajustes de puntuación por palabras clave.
//!
//! Desempata entradas casi idénticas que sólo difieren en "documento nuevo"
//! frente a "reimpresión por pérdida o daño".

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Si la consulta contiene alguna de `query_any` y la pregunta candidata
/// contiene alguna de `candidate_any`, se suma `delta`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordRule {
    pub query_any: Vec<String>,
    pub candidate_any: Vec<String>,
    pub delta: f32,
}

impl KeywordRule {
    fn new(query_any: &[&str], candidate_any: &[&str], delta: f32) -> Self {
        Self {
            query_any: query_any.iter().map(|s| s.to_string()).collect(),
            candidate_any: candidate_any.iter().map(|s| s.to_string()).collect(),
            delta,
        }
    }

    fn applies(&self, query: &str, candidate: &str) -> bool {
        self.query_any.iter().any(|k| query.contains(k.as_str()))
            && self.candidate_any.iter().any(|k| candidate.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRules {
    rules: Vec<KeywordRule>,
}

const NEW_DOCUMENT: &[&str] = &["baru", "bikin", "pertama"];
const REPRINT: &[&str] = &["hilang", "rusak", "cetak ulang"];

impl Default for KeywordRules {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new(NEW_DOCUMENT, &["baru"], 0.05),
            KeywordRule::new(NEW_DOCUMENT, &["cetak ulang", "hilang"], -0.10),
            KeywordRule::new(REPRINT, &["cetak ulang", "hilang"], 0.05),
            KeywordRule::new(REPRINT, &["baru"], -0.10),
        ])
    }
}

impl KeywordRules {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        // las palabras clave se comparan contra texto en minúsculas
        let rules = rules
            .into_iter()
            .map(|r| KeywordRule {
                query_any: r.query_any.iter().map(|k| k.to_lowercase()).collect(),
                candidate_any: r.candidate_any.iter().map(|k| k.to_lowercase()).collect(),
                delta: r.delta,
            })
            .collect();
        Self { rules }
    }

    /// Carga una tabla de reglas desde un fichero JSON (lista de `KeywordRule`).
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer {}", path.display()))?;
        let rules: Vec<KeywordRule> = serde_json::from_str(&raw)
            .with_context(|| format!("Reglas de palabras clave inválidas en {}", path.display()))?;
        Ok(Self::new(rules))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Suma de los deltas de todas las reglas que aplican.
    pub fn adjust(&self, query_text: &str, faq_question: &str) -> f32 {
        let q = query_text.to_lowercase();
        let c = faq_question.to_lowercase();

        self.rules
            .iter()
            .filter(|r| r.applies(&q, &c))
            .map(|r| r.delta)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn new_document_query_prefers_new_entries() {
        let rules = KeywordRules::default();
        assert!(approx(rules.adjust("bagaimana bikin ktp baru", "cara buat ktp baru"), 0.05));
        assert!(approx(rules.adjust("bagaimana bikin ktp baru", "cetak ulang ktp hilang"), -0.10));
    }

    #[test]
    fn reprint_query_prefers_reprint_entries() {
        let rules = KeywordRules::default();
        assert!(approx(rules.adjust("ktp saya hilang gimana", "cetak ulang ktp hilang"), 0.05));
        assert!(approx(rules.adjust("ktp saya RUSAK", "cara buat ktp baru"), -0.10));
    }

    #[test]
    fn deltas_from_both_sets_are_summed() {
        let rules = KeywordRules::default();
        // la consulta activa ambos conjuntos y la candidata contiene ambos marcadores
        let delta = rules.adjust("ktp baru saya hilang", "ktp baru atau cetak ulang");
        assert!(approx(delta, 0.05 - 0.10 + 0.05 - 0.10));
    }

    #[test]
    fn no_keywords_means_no_adjustment() {
        let rules = KeywordRules::default();
        assert_eq!(rules.adjust("jam buka kelurahan", "cara buat ktp baru"), 0.0);
    }

    #[test]
    fn rules_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"query_any":["Akta"],"candidate_any":["kelahiran"],"delta":0.2}]"#,
        )
        .unwrap();

        let rules = KeywordRules::from_file(&path).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(approx(rules.adjust("akta anak", "akta kelahiran"), 0.2));
        assert!(KeywordRules::from_file(&dir.path().join("missing.json")).is_err());
    }
}
