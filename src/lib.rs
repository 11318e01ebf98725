//! Servicio RAG mínimo de preguntas y respuestas sobre documentos PDF/TXT.

pub mod api;
pub mod app_state;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod metadata;
pub mod models;
pub mod rag;
pub mod vector_store;
