use anyhow::Result;
use docqa_rag::{api, app_state::AppState, config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env()?;

    // 3. Inicializar almacenes, modelo de embeddings y LLM (una sola vez)
    let app_state = AppState::from_config(cfg).await?;

    // 4. Configurar el router de la API
    let server_addr = app_state.config.server_addr.clone();
    let app = api::create_router(app_state);

    // 5. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&server_addr).await?;
    info!("🚀 Servidor escuchando en http://{}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
