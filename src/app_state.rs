use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{
    chunker::Chunker,
    config::AppConfig,
    embedding::{self, Embedder},
    llm::{self, AnswerGenerator},
    metadata::MetadataStore,
    vector_store::{SqliteVectorStore, VectorStore},
};

/// Colaboradores compartidos por todas las peticiones, creados una sola vez.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub chunker: Arc<Chunker>,
    pub embedder: Arc<dyn Embedder>,
    pub vectors: Arc<dyn VectorStore>,
    pub metadata: MetadataStore,
    pub generator: Arc<dyn AnswerGenerator>,
}

impl AppState {
    /// Inicializa almacenes, modelo de embeddings y LLM a partir de la configuración.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let metadata = MetadataStore::new(&config.metadata_db_path);
        metadata.ensure_schema().await?;

        let vectors =
            SqliteVectorStore::open(&config.vector_db_path, &config.vector_collection).await?;
        let embedder = embedding::create_embedder(&config).await?;
        info!(
            "Embeddings con '{}'; chunks de {} palabras con solape de {}.",
            embedder.model_name(),
            config.chunk_size,
            config.chunk_overlap
        );
        let generator = llm::create_generator(&config);

        Ok(Self::with_components(
            config,
            embedder,
            Arc::new(vectors),
            metadata,
            generator,
        ))
    }

    /// Ensambla el estado con colaboradores ya construidos.
    pub fn with_components(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        metadata: MetadataStore,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        let chunker = Arc::new(Chunker::new(config.chunk_size, config.chunk_overlap));
        Self {
            config,
            chunker,
            embedder,
            vectors,
            metadata,
            generator,
        }
    }
}
