use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::AppState;

// GET /api/bookings
pub async fn get_bookings(State(state): State<Arc<AppState>>) -> Response {
    match state.availability.list_booked().await {
        Ok(slots) => Json(slots).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
