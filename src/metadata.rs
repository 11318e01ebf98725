//! Tabla relacional `documents` con los metadatos de cada chunk ingerido.
//!
//! Cada operación abre su propia conexión SQLite y la cierra al terminar.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::info;

#[derive(Debug, Clone)]
pub struct MetadataStore {
    db_path: PathBuf,
}

impl MetadataStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", self.db_path.display()))?
            .create_if_missing(true);
        Ok(options.connect().await?)
    }

    /// Crea el directorio y la tabla si no existen. Idempotente.
    pub async fn ensure_schema(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut conn = self.connect().await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT,
                chunk_id TEXT,
                uploaded_at TEXT
            )",
        )
        .execute(&mut conn)
        .await?;
        conn.close().await?;

        info!("Esquema de metadatos asegurado en {}.", self.db_path.display());
        Ok(())
    }

    pub async fn insert(&self, filename: &str, chunk_id: &str, uploaded_at: &str) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query("INSERT INTO documents (filename, chunk_id, uploaded_at) VALUES (?, ?, ?)")
            .bind(filename)
            .bind(chunk_id)
            .bind(uploaded_at)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }
}
