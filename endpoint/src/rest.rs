use crate::db::ReadingStore;
use crate::errors::Result;
use crate::metrics::{READINGS_INSERTED_TOTAL, REQUESTS_TOTAL};
use crate::response;
use crate::validate::RequestValidator;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::info;

#[derive(Clone)]
struct AppState<S> {
    store: S,
    validator: RequestValidator,
}

pub fn create_router<S: ReadingStore>(store: S, validator: RequestValidator) -> Router {
    let state = AppState { store, validator };

    Router::new()
        .route(
            "/",
            get(list_readings::<S>)
                .post(record_temperature::<S>)
                .head(head_not_allowed),
        )
        .route("/health", get(health))
        .with_state(state)
}

async fn record_temperature<S: ReadingStore>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Response {
    REQUESTS_TOTAL.inc();

    match record(&state, &body).await {
        Ok(rows) => {
            READINGS_INSERTED_TOTAL.inc_by(rows as f64);
            info!("Recorded temperature ({} rows)", rows);
            response::inserted(rows)
        }
        Err(e) => e.into_response(),
    }
}

async fn record<S: ReadingStore>(state: &AppState<S>, body: &[u8]) -> Result<u64> {
    let temperature = state.validator.validate(body)?;
    state.store.insert(temperature).await
}

async fn list_readings<S: ReadingStore>(State(state): State<AppState<S>>) -> Response {
    REQUESTS_TOTAL.inc();

    match state.store.select_all().await {
        Ok(rows) => response::readings(&rows),
        Err(e) => e.into_response(),
    }
}

// `get` would otherwise answer HEAD by running the full read.
async fn head_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST")],
    )
}

async fn health() -> &'static str {
    "ok"
}
