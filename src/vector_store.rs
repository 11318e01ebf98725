//! Almacén vectorial sobre SQLite para los chunks.
//!
//! Cada registro guarda (id, texto del chunk, embedding) dentro de una
//! colección. La búsqueda es por fuerza bruta con similitud coseno.
//!
//! API pública:
//!   - `SqliteVectorStore::open(path, collection)`
//!   - `VectorStore::{add, query, count}`.

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

/// Chunk recuperado por similitud.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub id: String,
    pub document: String,
    pub score: f32,
}

/// "Dado un vector de consulta, devolver los k vectores más cercanos con su texto."
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, id: &str, document: &str, embedding: &[f32]) -> Result<()>;

    /// Los `k` registros más similares, de mayor a menor similitud.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedChunk>>;

    async fn count(&self) -> Result<usize>;
}

pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteVectorStore {
    /// Abre (o crea) la base de datos y garantiza que la colección exista.
    pub async fn open(path: &Path, collection: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            collection: collection.to_string(),
        };
        store.ensure_collection().await?;
        Ok(store)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn ensure_collection(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS embeddings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL REFERENCES collections(name),
                document TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_embeddings_collection ON embeddings(collection)",
        )
        .execute(&self.pool)
        .await?;

        let created = sqlx::query("INSERT OR IGNORE INTO collections (name, created_at) VALUES (?, ?)")
            .bind(&self.collection)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        if created.rows_affected() > 0 {
            info!("Colección vectorial '{}' creada.", self.collection);
        } else {
            info!("Colección vectorial '{}' ya existe.", self.collection);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add(&self, id: &str, document: &str, embedding: &[f32]) -> Result<()> {
        sqlx::query(
            "INSERT INTO embeddings (id, collection, document, embedding) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&self.collection)
        .bind(document)
        .bind(vec_to_blob(embedding))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let rows = sqlx::query(
            "SELECT id, document, embedding FROM embeddings WHERE collection = ? ORDER BY seq",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                RetrievedChunk {
                    id: row.get("id"),
                    document: row.get("document"),
                    score: cosine_similarity(embedding, &blob_to_vec(&blob)),
                }
            })
            .collect();

        // Orden estable: a igual similitud se respeta el orden de inserción.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        debug!(
            "Búsqueda vectorial en '{}': {} candidatos, {} devueltos.",
            self.collection,
            rows.len(),
            scored.len()
        );
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM embeddings WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as usize)
    }
}

/// Codifica un vector como bytes little-endian para un BLOB de SQLite.
pub fn vec_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Similitud coseno en `[-1, 1]`; 0 para vectores vacíos, nulos o de distinta longitud.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}
