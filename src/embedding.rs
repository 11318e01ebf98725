//! Generación de embeddings: modelo local (fastembed) u OpenAI vía Rig.
//!
//! El embedder se construye una sola vez al arrancar y se comparte entre
//! peticiones como `Arc<dyn Embedder>`.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::{AppConfig, EmbeddingProvider};

pub const DEFAULT_LOCAL_MODEL: &str = "all-minilm-l6-v2";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// "Dado un texto, obtener un vector numérico de longitud fija."
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Un vector por texto, en el mismo orden.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("El modelo no devolvió ningún embedding"))
    }
}

/// Crea el embedder indicado en la configuración.
pub async fn create_embedder(cfg: &AppConfig) -> Result<Arc<dyn Embedder>> {
    match cfg.embedding_provider {
        EmbeddingProvider::Local => {
            let model = if cfg.embedding_model.is_empty() {
                DEFAULT_LOCAL_MODEL
            } else {
                cfg.embedding_model.as_str()
            };
            load_local(model).await
        }
        EmbeddingProvider::OpenAI => {
            let key = cfg
                .openai_api_key
                .as_deref()
                .ok_or_else(|| anyhow!("Falta OPENAI_API_KEY para embeddings de OpenAI"))?;
            let model = if cfg.embedding_model.is_empty() {
                DEFAULT_OPENAI_MODEL
            } else {
                cfg.embedding_model.as_str()
            };
            info!("Usando embeddings de OpenAI ({model}).");
            Ok(Arc::new(OpenAiEmbedder::new(key, model)))
        }
    }
}

#[cfg(feature = "local-embeddings")]
async fn load_local(model: &str) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(local::LocalEmbedder::load(model).await?))
}

#[cfg(not(feature = "local-embeddings"))]
async fn load_local(_model: &str) -> Result<Arc<dyn Embedder>> {
    anyhow::bail!("Los embeddings locales requieren compilar con la feature 'local-embeddings'")
}

// ---------------------------------------------------------------------
// OPENAI (Rig)
// ---------------------------------------------------------------------

pub struct OpenAiEmbedder {
    client: rig::providers::openai::Client,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: rig::providers::openai::Client::new(api_key),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Trait para client.embedding_model(...)
        use rig::client::EmbeddingsClient as _;
        use rig::embeddings::EmbeddingModel as _;

        let embedding_model = self.client.embedding_model(&self.model);
        let embeddings = embedding_model.embed_texts(texts.to_vec()).await?;

        if embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Número de embeddings ({}) distinto al número de textos ({})",
                embeddings.len(),
                texts.len()
            ));
        }

        // Rig devuelve f64; el almacén guarda f32.
        Ok(embeddings
            .into_iter()
            .map(|e| e.vec.into_iter().map(|x| x as f32).collect())
            .collect())
    }
}

// ---------------------------------------------------------------------
// LOCAL (fastembed)
// ---------------------------------------------------------------------

#[cfg(feature = "local-embeddings")]
mod local {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, bail, Result};
    use async_trait::async_trait;
    use tracing::info;

    use super::Embedder;

    /// Modelo ONNX cargado en memoria; la inferencia se serializa con un mutex
    /// y se ejecuta en el pool bloqueante.
    pub struct LocalEmbedder {
        name: String,
        model: Arc<Mutex<fastembed::TextEmbedding>>,
    }

    fn fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
        match name {
            "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
            other => bail!(
                "Modelo local de embeddings desconocido: '{other}'. Soportados: \
                 all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, multilingual-e5-small"
            ),
        }
    }

    impl LocalEmbedder {
        pub async fn load(name: &str) -> Result<Self> {
            let model_id = fastembed_model(name)?;
            info!("Cargando modelo local de embeddings '{name}'...");
            let model = tokio::task::spawn_blocking(move || {
                fastembed::TextEmbedding::try_new(
                    fastembed::InitOptions::new(model_id).with_show_download_progress(true),
                )
                .map_err(|e| anyhow!("No se pudo inicializar el modelo local de embeddings: {e}"))
            })
            .await??;
            info!("Modelo de embeddings '{name}' listo.");

            Ok(Self {
                name: name.to_string(),
                model: Arc::new(Mutex::new(model)),
            })
        }
    }

    #[async_trait]
    impl Embedder for LocalEmbedder {
        fn model_name(&self) -> &str {
            &self.name
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let texts = texts.to_vec();

            tokio::task::spawn_blocking(move || {
                let mut model = model
                    .lock()
                    .map_err(|_| anyhow!("Modelo de embeddings envenenado por un pánico previo"))?;
                model
                    .embed(texts, None)
                    .map_err(|e| anyhow!("Fallo generando embeddings locales: {e}"))
            })
            .await?
        }
    }
}
