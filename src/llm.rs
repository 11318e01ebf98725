//! Generación de respuestas con un LLM de Groq a través de Rig.
//!
//! El generador nunca devuelve un error de Rust: el resultado de la llamada
//! se expresa con [`Generation`], que distingue respuesta, generador
//! deshabilitado y fallo del proveedor.

use std::sync::Arc;

use async_trait::async_trait;
use rig::completion::Prompt;
use tracing::{info, warn};

use crate::config::AppConfig;

pub const DISABLED_MESSAGE: &str = "LLM disabled. Set GROQ_API_KEY environment variable.";

/// Resultado de una generación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Answered(String),
    Disabled,
    Failed(String),
}

impl Generation {
    /// Representación textual equivalente a la respuesta del LLM.
    pub fn into_text(self) -> String {
        match self {
            Generation::Answered(answer) => answer,
            Generation::Disabled => DISABLED_MESSAGE.to_string(),
            Generation::Failed(message) => format!("LLM error: {message}"),
        }
    }
}

/// "Dado un contexto y una pregunta, obtener una respuesta generada."
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, context: &str, question: &str) -> Generation;
}

/// Construye el prompt enviado al modelo como único mensaje de usuario.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based on the context below.\n\nContext:\n{context}\n\nQuestion:\n{question}\n\nAnswer:"
    )
}

/// Crea el generador según la configuración: Groq si hay clave, deshabilitado si no.
pub fn create_generator(cfg: &AppConfig) -> Arc<dyn AnswerGenerator> {
    match cfg.groq_api_key.as_deref() {
        Some(key) => {
            info!("Generación de respuestas con Groq ({}).", cfg.llm_chat_model);
            Arc::new(GroqGenerator::new(key, &cfg.llm_chat_model, cfg.llm_temperature))
        }
        None => {
            warn!("GROQ_API_KEY no definida: la generación de respuestas queda deshabilitada.");
            Arc::new(DisabledGenerator)
        }
    }
}

/// Generador sin credenciales.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl AnswerGenerator for DisabledGenerator {
    async fn generate(&self, _context: &str, _question: &str) -> Generation {
        Generation::Disabled
    }
}

#[derive(Clone)]
pub struct GroqGenerator {
    client: rig::providers::groq::Client,
    model: String,
    temperature: f64,
}

impl GroqGenerator {
    pub fn new(api_key: &str, model: &str, temperature: f64) -> Self {
        Self {
            client: rig::providers::groq::Client::new(api_key),
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl AnswerGenerator for GroqGenerator {
    async fn generate(&self, context: &str, question: &str) -> Generation {
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        let agent = self
            .client
            .agent(&self.model)
            .temperature(self.temperature)
            .build();

        match agent.prompt(build_prompt(context, question)).await {
            Ok(answer) => Generation::Answered(answer),
            Err(e) => {
                warn!("La llamada al LLM falló: {e}");
                Generation::Failed(e.to_string())
            }
        }
    }
}
