use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};
use tokio::sync::oneshot;
use tracing::error;

use crate::{engine::ChatEngine, faq_store::FaqStore};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ChatEngine>,
    pub faq_store: Arc<FaqStore>,
    pub status: Arc<Mutex<Status>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    /// Toma de la copia del corpus y reconstrucción van juntas: una copia
    /// antigua nunca puede terminar después de una más reciente.
    rebuild_guard: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub message: String,
    pub faq_count: usize,
    /// Fecha RFC 3339 de la última reconstrucción correcta.
    pub built_at: Option<String>,
}

impl AppState {
    pub fn new(
        engine: ChatEngine,
        faq_store: FaqStore,
        shutdown_sender: Option<oneshot::Sender<()>>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            faq_store: Arc::new(faq_store),
            status: Arc::new(Mutex::new(Status {
                is_busy: false,
                message: "Servidor listo.".to_string(),
                faq_count: 0,
                built_at: None,
            })),
            shutdown_sender: Arc::new(Mutex::new(shutdown_sender)),
            rebuild_guard: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn status(&self) -> Status {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_status(&self, f: impl FnOnce(&mut Status)) {
        f(&mut self.status.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Reconstruye el índice con la copia actual del almacén.
    ///
    /// Un corpus vacío no es un error para quien llama: el motor queda sin
    /// datos y así lo refleja el estado. Sólo falla si la tarea de
    /// reconstrucción no llega a terminar.
    pub async fn rebuild_index(&self) -> Result<String> {
        let _guard = self.rebuild_guard.lock().await;
        self.update_status(|s| {
            s.is_busy = true;
            s.message = "Reconstruyendo índice FAQ...".to_string();
        });

        let corpus = self.faq_store.list().await;
        let engine = Arc::clone(&self.engine);
        let result = tokio::task::spawn_blocking(move || engine.rebuild(corpus)).await;

        match result {
            Ok(Ok(summary)) => {
                let message = format!("Índice listo. {summary}");
                self.update_status(|s| {
                    s.is_busy = false;
                    s.message = message.clone();
                    s.faq_count = summary.entries;
                    s.built_at = Some(summary.built_at.to_rfc3339());
                });
                Ok(message)
            }
            Ok(Err(e)) => {
                let message = format!("Índice no disponible: {e}");
                self.update_status(|s| {
                    s.is_busy = false;
                    s.message = message.clone();
                    s.faq_count = 0;
                    s.built_at = None;
                });
                Ok(message)
            }
            Err(e) => {
                error!("La reconstrucción del índice terminó de forma inesperada: {e}");
                self.update_status(|s| {
                    s.is_busy = false;
                    s.message = format!("Error reconstruyendo el índice: {e}");
                });
                Err(anyhow!("La reconstrucción del índice falló: {e}"))
            }
        }
    }
}
