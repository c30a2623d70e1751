// Módulos de la aplicación
mod api;
mod app_state;
mod config;
mod dialogue;
mod engine;
mod error;
mod faq_store;
mod keywords;
mod models;
mod ranking;
mod text;
mod vector_store;
mod vectorizer;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{app_state::AppState, engine::ChatEngine, faq_store::FaqStore, keywords::KeywordRules};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().context("Error al cargar la configuración")?;
    info!("Configuración del motor: {:?}", cfg.engine);

    // 3. Reglas de palabras clave y motor de recuperación
    let rules = match &cfg.keyword_rules_file {
        Some(path) => KeywordRules::from_file(path)?,
        None => KeywordRules::default(),
    };
    info!("{} reglas de palabras clave activas", rules.len());
    let engine = ChatEngine::new(cfg.engine.clone(), rules);

    // 4. Cargar el almacén de FAQ
    let faq_store = FaqStore::load(&cfg.faq_file)
        .await
        .with_context(|| format!("Error cargando FAQ desde {}", cfg.faq_file.display()))?;
    info!("Almacén FAQ en {}", faq_store.path().display());

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 5. Crear estado compartido y construir el índice inicial
    let app_state = AppState::new(engine, faq_store, Some(shutdown_tx));
    let message = app_state.rebuild_index().await?;
    info!("{message}");

    // 6. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state))
        .fallback_service(ServeDir::new("frontend"))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 7. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", cfg.server_addr))?;
    info!("🚀 Servidor escuchando en http://{}", cfg.server_addr);

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .context("Error en el servidor HTTP")?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
