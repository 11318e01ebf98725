//! Consulta RAG: embedding de la pregunta, búsqueda de los chunks más
//! similares y generación de la respuesta con el LLM.

use anyhow::Result;
use tracing::{debug, error, info};

use crate::{
    app_state::AppState,
    error::RagError,
    llm::Generation,
    vector_store::RetrievedChunk,
};

/// Resultado de una consulta que no terminó en error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered { question: String, answer: String },
    /// El almacén no devolvió ningún chunk; no se llamó al LLM.
    NoResults,
    /// Hay contexto pero el LLM no está configurado.
    LlmDisabled { question: String, answer: String },
}

/// Une los textos recuperados, en el orden devuelto, separados por una línea en blanco.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.document.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lanza una consulta RAG sobre los `top_k` chunks más relevantes.
pub async fn answer_query(state: &AppState, question: &str) -> Result<QueryOutcome, RagError> {
    if question.trim().is_empty() {
        return Err(RagError::EmptyQuestion);
    }

    let retrieved = retrieve(state, question).await.map_err(|e| {
        error!("Error en la consulta '{question}': {e:#}");
        RagError::Query {
            question: question.to_string(),
            source: e,
        }
    })?;

    if retrieved.is_empty() {
        info!("Sin documentos relevantes para '{question}'.");
        return Ok(QueryOutcome::NoResults);
    }

    let context = build_context(&retrieved);
    debug!(
        "Contexto de {} chunks ({} caracteres) para '{question}'.",
        retrieved.len(),
        context.len()
    );

    match state.generator.generate(&context, question).await {
        Generation::Answered(answer) => Ok(QueryOutcome::Answered {
            question: question.to_string(),
            answer,
        }),
        generation @ Generation::Disabled => Ok(QueryOutcome::LlmDisabled {
            question: question.to_string(),
            answer: generation.into_text(),
        }),
        Generation::Failed(message) => Err(RagError::Llm {
            question: question.to_string(),
            message,
        }),
    }
}

async fn retrieve(state: &AppState, question: &str) -> Result<Vec<RetrievedChunk>> {
    let query_vec = state.embedder.embed_one(question).await?;
    state.vectors.query(&query_vec, state.config.top_k).await
}
