//! Ingesta de un documento subido: validación, guardado en disco, extracción
//! de texto, troceado, embeddings y persistencia en el almacén vectorial y en
//! la tabla de metadatos.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::RagError,
    extract::{self, DocumentKind},
    models::{Chunk, Document},
};

/// Resumen de una ingesta correcta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub filename: String,
    pub chunks_created: usize,
}

impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ingerido '{}' con {} chunks.",
            self.filename, self.chunks_created
        )
    }
}

/// Marca temporal ISO-8601 en UTC con microsegundos y sin zona.
pub fn upload_timestamp() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Procesa un fichero subido de principio a fin.
pub async fn ingest_document(
    state: &AppState,
    filename: &str,
    content: Vec<u8>,
) -> Result<IngestionSummary, RagError> {
    let kind = DocumentKind::from_filename(filename).ok_or_else(|| {
        info!("Rechazado '{filename}': extensión no soportada.");
        RagError::UnsupportedFileType
    })?;

    if content.is_empty() {
        info!("Rechazado '{filename}': fichero vacío.");
        return Err(RagError::EmptyFile);
    }

    let document = Document {
        filename: filename.to_string(),
        content,
        uploaded_at: upload_timestamp(),
    };

    match ingest_file(state, kind, document).await {
        Ok(summary) => {
            info!("{summary}");
            Ok(summary)
        }
        Err(err) => {
            if let RagError::Upload(e) = &err {
                error!("Error ingiriendo '{filename}': {e:#}");
            }
            Err(err)
        }
    }
}

async fn ingest_file(
    state: &AppState,
    kind: DocumentKind,
    document: Document,
) -> Result<IngestionSummary, RagError> {
    let path = save_upload(&state.config.upload_dir, &document.filename, &document.content)
        .await
        .map_err(RagError::Upload)?;
    info!("Fichero guardado en {}", path.display());

    let text = extract::extract_text_blocking(kind, document.content.clone())
        .await
        .map_err(RagError::Upload)?;

    if text.trim().is_empty() {
        warn!("Sin texto extraíble: {}", document.filename);
        return Err(RagError::NoExtractableText);
    }

    let raw_chunks = state.chunker.chunk(&text);
    if raw_chunks.is_empty() {
        warn!("Texto sin frases útiles: {}", document.filename);
        return Err(RagError::NoChunks);
    }

    let chunks = embed_chunks(state, &document.filename, raw_chunks)
        .await
        .map_err(RagError::Upload)?;

    persist_chunks(state, &document, &chunks)
        .await
        .map_err(RagError::Upload)?;

    Ok(IngestionSummary {
        filename: document.filename,
        chunks_created: chunks.len(),
    })
}

async fn embed_chunks(state: &AppState, filename: &str, texts: Vec<String>) -> Result<Vec<Chunk>> {
    let embeddings = state.embedder.embed(&texts).await?;

    if embeddings.len() != texts.len() {
        return Err(anyhow!(
            "Número de embeddings ({}) distinto al número de chunks ({})",
            embeddings.len(),
            texts.len()
        ));
    }

    Ok(texts
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(position, (text, embedding))| Chunk {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            position,
            text,
            embedding,
        })
        .collect())
}

async fn persist_chunks(state: &AppState, document: &Document, chunks: &[Chunk]) -> Result<()> {
    for chunk in chunks {
        state
            .vectors
            .add(&chunk.id, &chunk.text, &chunk.embedding)
            .await?;
        state
            .metadata
            .insert(&chunk.filename, &chunk.id, &document.uploaded_at)
            .await?;
        debug!("Chunk #{} de '{}' almacenado como {}.", chunk.position, chunk.filename, chunk.id);
    }
    Ok(())
}

/// Guarda el contenido en `<upload_dir>/<nombre base>`, sobrescribiendo si ya existe.
async fn save_upload(upload_dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let base = Path::new(filename)
        .file_name()
        .ok_or_else(|| anyhow!("Nombre de fichero inválido: '{filename}'"))?;

    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(base);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}
