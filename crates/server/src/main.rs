use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{create_event, delete_event, list_events, toggle_archive, update_event, ApiContext};
use shared::{
    domain::{Event, EventId},
    error::{ApiError, ErrorCode},
    protocol::{CreateEventData, EventListResponse, UpdateEventData},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

/// Events carry at most a few hundred characters of text.
const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), &settings.api_prefix);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, prefix = %settings.api_prefix, "event service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let events = Router::new()
        .route("/events", get(http_list_events).post(http_create_event))
        .route(
            "/events/:id",
            get(http_get_event)
                .patch(http_update_event)
                .put(http_toggle_archive)
                .delete(http_delete_event),
        );

    let api_prefix = api_prefix.trim_end_matches('/');
    let api = if api_prefix.is_empty() {
        events
    } else {
        Router::new().nest(api_prefix, events)
    };

    Router::new()
        .route("/healthz", get(healthz))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

async fn http_list_events(State(state): State<Arc<AppState>>) -> ApiResult<Json<EventListResponse>> {
    list_events(&state.api).await.map(Json).map_err(failure)
}

async fn http_create_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEventData>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = create_event(&state.api, req).await.map_err(failure)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn http_get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let id = EventId(id);
    state
        .api
        .storage
        .get_event(&id)
        .await
        .map_err(|e| failure(ApiError::new(ErrorCode::Internal, e.to_string())))?
        .map(Json)
        .ok_or_else(|| failure(ApiError::not_found(&id)))
}

async fn http_update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventData>,
) -> ApiResult<Json<Event>> {
    update_event(&state.api, &EventId(id), req)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_toggle_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    toggle_archive(&state.api, &EventId(id))
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_event(&state.api, &EventId(id))
        .await
        .map_err(failure)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
