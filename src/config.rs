//! Carga y gestión de configuración de la aplicación (servidor + motor FAQ).

use std::{env, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VectorizerKind {
    Tfidf,
    Hashing,
}

impl VectorizerKind {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(Self::Tfidf),
            "hashing" => Ok(Self::Hashing),
            other => Err(anyhow!("Vectorizador no soportado: {other}")),
        }
    }
}

/// Parámetros del motor de recuperación.
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub vectorizer: VectorizerKind,
    /// Puntuación base mínima para considerar una entrada.
    pub similarity_threshold: f32,
    /// Distancia máxima a la mejor puntuación para devolver varias respuestas.
    pub multi_intent_gap: f32,
    /// Por debajo de esta diferencia entre los dos primeros se pide aclaración.
    pub ambiguity_gap: f32,
    pub max_answers: usize,
    pub max_features: usize,
    pub ngram_max: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerKind::Tfidf,
            similarity_threshold: 0.38,
            multi_intent_gap: 0.08,
            ambiguity_gap: 0.1,
            max_answers: 2,
            max_features: 5000,
            ngram_max: 2,
        }
    }
}

impl EngineSettings {
    /// Rechaza valores que dejarían al motor sin responder nada.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("SIMILARITY_THRESHOLD", self.similarity_threshold),
            ("MULTI_INTENT_GAP", self.multi_intent_gap),
            ("AMBIGUITY_GAP", self.ambiguity_gap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("{name} debe ser un número finito no negativo ({value})"));
            }
        }
        if self.max_answers == 0 {
            return Err(anyhow!("MAX_ANSWERS debe ser al menos 1"));
        }
        Ok(())
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub faq_file: PathBuf,
    pub keyword_rules_file: Option<PathBuf>,
    pub engine: EngineSettings,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
        let faq_file = env::var("FAQ_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/faq.json"));
        let keyword_rules_file = env::var("KEYWORD_RULES_FILE").ok().map(PathBuf::from);

        let defaults = EngineSettings::default();
        let vectorizer = match env::var("VECTORIZER") {
            Ok(s) => VectorizerKind::from_str(&s)?,
            Err(_) => defaults.vectorizer,
        };

        let engine = EngineSettings {
            vectorizer,
            similarity_threshold: parse_var("SIMILARITY_THRESHOLD", defaults.similarity_threshold)?,
            multi_intent_gap: parse_var("MULTI_INTENT_GAP", defaults.multi_intent_gap)?,
            ambiguity_gap: parse_var("AMBIGUITY_GAP", defaults.ambiguity_gap)?,
            max_answers: parse_var("MAX_ANSWERS", defaults.max_answers)?,
            max_features: parse_var("MAX_FEATURES", defaults.max_features)?,
            ngram_max: parse_var("NGRAM_MAX", defaults.ngram_max)?,
        };

        engine.validate()?;

        Ok(Self {
            server_addr,
            faq_file,
            keyword_rules_file,
            engine,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Valor inválido para {name} ('{raw}'): {e}"))
}
