use axum::extract::State;
use axum::Json;

use crate::response::health::HealthStatus;
use crate::AppState;

/// GET relay liveness and connection counts
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Relay is up and responding to requests", body = HealthStatus),
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthStatus> {
    let registry = app_state.relay_ref().registry();

    Json(HealthStatus::healthy(
        registry.count(),
        registry.distinct_subscribers().len(),
    ))
}
