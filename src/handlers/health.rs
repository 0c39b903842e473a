use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub status: String,
}

/// Liveness check that also pings the user store
#[utoipa::path(
    get,
    path = "/ping",
    responses(
        (status = 200, description = "Service and store are reachable", body = PingResponse),
        (status = 500, description = "Store is unreachable")
    ),
    tag = "Health"
)]
pub async fn ping(State(state): State<AppState>) -> AppResult<Json<PingResponse>> {
    state.users.ping().await?;
    Ok(Json(PingResponse {
        status: "ok".to_string(),
    }))
}
