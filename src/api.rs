use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::{
    app_state::{AppState, Status},
    dialogue,
    faq_store::{FaqDraft, StoreError},
    models::{DialogueState, FaqEntry, Intent, Reply},
};

type ApiError = (StatusCode, Json<serde_json::Value>);

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct ChatPayload {
    message: Option<String>,
    /// Estado devuelto en la respuesta anterior; ausente en el primer turno.
    #[serde(default)]
    state: Option<DialogueState>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    response: String,
    state: DialogueState,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route(
            "/api/faq",
            get(list_faq_handler)
                .post(add_faq_handler)
                .put(replace_faq_handler),
        )
        .route(
            "/api/faq/:id",
            put(update_faq_handler).delete(delete_faq_handler),
        )
        .route("/api/intents", get(intents_handler))
        .route("/api/rebuild", post(rebuild_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| bad_request(&format!("JSON inválido: {e}")))?;
    let message = payload
        .message
        .ok_or_else(|| bad_request("Message kosong"))?;
    let dialogue_state = payload.state.unwrap_or_default();

    // Un pánico al puntuar sólo afecta a esta petición.
    let engine = state.engine.clone();
    let reply = tokio::task::spawn_blocking(move || engine.respond(&message, &dialogue_state)).await;

    Ok(Json(chat_response(reply)))
}

/// Un turno que no llega a terminar se contesta con la disculpa fija.
fn chat_response(reply: Result<Reply, JoinError>) -> ChatResponse {
    match reply {
        Ok(reply) => ChatResponse {
            response: reply.text,
            state: reply.state,
        },
        Err(e) => {
            error!("Error del chatbot: {}", e);
            ChatResponse {
                response: dialogue::FAILURE_MESSAGE.to_string(),
                state: DialogueState::idle(),
            }
        }
    }
}

#[axum::debug_handler]
async fn list_faq_handler(State(state): State<AppState>) -> Json<Vec<FaqEntry>> {
    Json(state.faq_store.list().await)
}

#[axum::debug_handler]
async fn add_faq_handler(
    State(state): State<AppState>,
    Json(draft): Json<FaqDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.faq_store.add(draft).await.map_err(store_error)?;
    rebuild_after_write(&state).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[axum::debug_handler]
async fn update_faq_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<FaqDraft>,
) -> Result<Json<FaqEntry>, ApiError> {
    let entry = state.faq_store.update(&id, draft).await.map_err(store_error)?;
    rebuild_after_write(&state).await?;
    Ok(Json(entry))
}

#[axum::debug_handler]
async fn delete_faq_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.faq_store.delete(&id).await.map_err(store_error)?;
    rebuild_after_write(&state).await?;
    Ok(Json(json!({ "success": true, "id": removed.id })))
}

#[axum::debug_handler]
async fn replace_faq_handler(
    State(state): State<AppState>,
    Json(entries): Json<Vec<FaqEntry>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state
        .faq_store
        .replace_all(entries)
        .await
        .map_err(store_error)?;
    let message = rebuild_after_write(&state).await?;
    Ok(Json(json!({ "success": true, "count": count, "message": message })))
}

#[axum::debug_handler]
async fn intents_handler(State(state): State<AppState>) -> Json<Vec<Intent>> {
    Json(state.faq_store.intents().await)
}

#[axum::debug_handler]
async fn rebuild_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let message = rebuild_after_write(&state).await?;
    Ok(Json(json!({ "message": message })))
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<Status> {
    Json(state.status())
}

// --- Handler de Apagado y Utilidades ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    let sender = state
        .shutdown_sender
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    if let Some(sender) = sender {
        let _ = sender.send(());
    }
    StatusCode::OK
}

async fn rebuild_after_write(state: &AppState) -> Result<String, ApiError> {
    state.rebuild_index().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
    })
}

fn store_error(e: StoreError) -> ApiError {
    let status = match e {
        StoreError::MissingFields | StoreError::DuplicateId { .. } => StatusCode::BAD_REQUEST,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Io(_) | StoreError::Serialization(_) => {
            error!("Error del almacén FAQ: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({"error": e.to_string()})))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}
