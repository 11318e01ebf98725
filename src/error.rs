//! Errores de dominio devueltos por los flujos de ingesta y consulta.
//!
//! Los mensajes de `Display` son los que ve el cliente HTTP.

use std::fmt;

#[derive(Debug)]
pub enum RagError {
    UnsupportedFileType,
    EmptyFile,
    NoExtractableText,
    NoChunks,
    EmptyQuestion,
    /// Fallo inesperado durante la ingesta (E/S, embeddings, almacenamiento...).
    Upload(anyhow::Error),
    /// Fallo inesperado durante una consulta.
    Query {
        question: String,
        source: anyhow::Error,
    },
    /// La llamada al LLM falló; contiene la descripción del proveedor.
    Llm { question: String, message: String },
}

impl RagError {
    /// Pregunta asociada al error, si la hay.
    pub fn question(&self) -> Option<&str> {
        match self {
            RagError::Query { question, .. } | RagError::Llm { question, .. } => Some(question),
            _ => None,
        }
    }
}

impl fmt::Display for RagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RagError::UnsupportedFileType => write!(f, "Only PDF and TXT files are supported"),
            RagError::EmptyFile => write!(f, "Empty file uploaded"),
            RagError::NoExtractableText => {
                write!(f, "No text could be extracted from the document")
            }
            RagError::NoChunks => write!(f, "No valid chunks created from document"),
            RagError::EmptyQuestion => write!(f, "Question cannot be empty"),
            RagError::Upload(e) => write!(f, "Upload failed: {e}"),
            RagError::Query { source, .. } => write!(f, "Query failed: {source}"),
            RagError::Llm { message, .. } => write!(f, "LLM error: {message}"),
        }
    }
}

impl std::error::Error for RagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RagError::Upload(e) | RagError::Query { source: e, .. } => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn validation_messages_are_stable() {
        assert_eq!(
            RagError::UnsupportedFileType.to_string(),
            "Only PDF and TXT files are supported"
        );
        assert_eq!(RagError::EmptyFile.to_string(), "Empty file uploaded");
        assert_eq!(RagError::EmptyQuestion.to_string(), "Question cannot be empty");
    }

    #[test]
    fn wrapped_failures_carry_the_cause() {
        let err = RagError::Upload(anyhow!("disk full"));
        assert_eq!(err.to_string(), "Upload failed: disk full");
        assert!(err.question().is_none());

        let err = RagError::Query {
            question: "¿qué?".to_string(),
            source: anyhow!("store offline"),
        };
        assert_eq!(err.to_string(), "Query failed: store offline");
        assert_eq!(err.question(), Some("¿qué?"));
    }
}
