//! Modelos de dominio (documentos y chunks) y respuestas de la API.

use serde::{Deserialize, Serialize};

use crate::error::RagError;

pub const NO_RESULTS_MESSAGE: &str =
    "No relevant documents found in the database. Please upload documents first.";

/// Fichero subido por el usuario.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content: Vec<u8>,
    /// ISO-8601 en UTC, común a todos los chunks del documento.
    pub uploaded_at: String,
}

/// Trozo de texto de un documento con su embedding.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub filename: String,
    pub position: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Respuesta uniforme de la API; `status` actúa de discriminante.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse {
    Uploaded {
        filename: String,
        chunks: usize,
    },
    Answered {
        question: String,
        answer: String,
    },
    NoResults {
        answer: String,
        context: Vec<String>,
    },
    LlmDisabled {
        question: String,
        answer: String,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        question: Option<String>,
    },
}

impl ApiResponse {
    pub fn no_results() -> Self {
        ApiResponse::NoResults {
            answer: NO_RESULTS_MESSAGE.to_string(),
            context: Vec::new(),
        }
    }
}

impl From<RagError> for ApiResponse {
    fn from(err: RagError) -> Self {
        ApiResponse::Error {
            question: err.question().map(str::to_string),
            message: err.to_string(),
        }
    }
}
