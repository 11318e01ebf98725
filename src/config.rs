//! Carga y gestión de configuración de la aplicación (almacenes, embeddings y LLM).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    Local,
    OpenAI,
}

impl EmbeddingProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAI),
            other => Err(anyhow!("Proveedor de embeddings no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub upload_dir: PathBuf,
    pub metadata_db_path: PathBuf,
    pub vector_db_path: PathBuf,
    pub vector_collection: String,

    pub embedding_provider: EmbeddingProvider,
    /// Vacío = modelo por defecto del proveedor.
    pub embedding_model: String,
    pub openai_api_key: Option<String>,

    /// Sin clave, la generación de respuestas queda deshabilitada.
    pub groq_api_key: Option<String>,
    pub llm_chat_model: String,
    pub llm_temperature: f64,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de claves.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Las cadenas vacías cuentan como ausentes.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_addr = get("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string());
        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "data/uploads".to_string()));
        let metadata_db_path =
            PathBuf::from(get("METADATA_DB_PATH").unwrap_or_else(|| "metadata.db".to_string()));
        let vector_db_path = PathBuf::from(
            get("VECTOR_DB_PATH").unwrap_or_else(|| "data/chroma_db/vectors.db".to_string()),
        );
        let vector_collection = get("VECTOR_COLLECTION").unwrap_or_else(|| "docs".to_string());

        let embedding_provider =
            EmbeddingProvider::from_str(&get("EMBEDDING_PROVIDER").unwrap_or_else(|| "local".to_string()))?;
        let embedding_model = get("EMBEDDING_MODEL").unwrap_or_default();
        let openai_api_key = get("OPENAI_API_KEY");

        let groq_api_key = get("GROQ_API_KEY");
        let llm_chat_model = get("LLM_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let llm_temperature = parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", 0.3)?;

        let chunk_size = parse_or(get("CHUNK_SIZE"), "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_or(get("CHUNK_OVERLAP"), "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        let top_k = parse_or(get("TOP_K"), "TOP_K", DEFAULT_TOP_K)?;

        if chunk_size == 0 {
            return Err(anyhow!("CHUNK_SIZE debe ser mayor que 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(anyhow!(
                "CHUNK_OVERLAP ({chunk_overlap}) debe ser menor que CHUNK_SIZE ({chunk_size})"
            ));
        }
        if top_k == 0 {
            return Err(anyhow!("TOP_K debe ser mayor que 0"));
        }
        if embedding_provider == EmbeddingProvider::OpenAI && openai_api_key.is_none() {
            return Err(anyhow!("Falta OPENAI_API_KEY en el entorno para EMBEDDING_PROVIDER=openai"));
        }

        Ok(Self {
            server_addr,
            upload_dir,
            metadata_db_path,
            vector_db_path,
            vector_collection,
            embedding_provider,
            embedding_model,
            openai_api_key,
            groq_api_key,
            llm_chat_model,
            llm_temperature,
            chunk_size,
            chunk_overlap,
            top_k,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Valor inválido para {key} ('{value}'): {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.server_addr, "127.0.0.1:8000");
        assert_eq!(cfg.upload_dir, PathBuf::from("data/uploads"));
        assert_eq!(cfg.vector_collection, "docs");
        assert_eq!(cfg.embedding_provider, EmbeddingProvider::Local);
        assert_eq!(cfg.llm_chat_model, DEFAULT_CHAT_MODEL);
        assert!(cfg.groq_api_key.is_none());
        assert_eq!(cfg.chunk_size, 500);
        assert_eq!(cfg.chunk_overlap, 100);
        assert_eq!(cfg.top_k, 3);
    }

    #[test]
    fn blank_groq_key_counts_as_missing() {
        let cfg = config_from(&[("GROQ_API_KEY", "  ")]).unwrap();
        assert!(cfg.groq_api_key.is_none());
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let cfg = config_from(&[("CHUNK_SIZE", "200"), ("CHUNK_OVERLAP", "20"), ("TOP_K", "5")]).unwrap();
        assert_eq!((cfg.chunk_size, cfg.chunk_overlap, cfg.top_k), (200, 20, 5));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[("CHUNK_SIZE", "mucho")]).is_err());
        assert!(config_from(&[("CHUNK_SIZE", "0")]).is_err());
        assert!(config_from(&[("CHUNK_SIZE", "50"), ("CHUNK_OVERLAP", "50")]).is_err());
        assert!(config_from(&[("CHUNK_SIZE", "50"), ("CHUNK_OVERLAP", "80")]).is_err());
        assert!(config_from(&[("CHUNK_SIZE", "50"), ("CHUNK_OVERLAP", "49")]).is_ok());
        assert!(config_from(&[("EMBEDDING_PROVIDER", "gemini")]).is_err());
        assert!(config_from(&[("EMBEDDING_PROVIDER", "openai")]).is_err());
        assert!(config_from(&[("EMBEDDING_PROVIDER", "OpenAI"), ("OPENAI_API_KEY", "sk-x")]).is_ok());
    }
}
