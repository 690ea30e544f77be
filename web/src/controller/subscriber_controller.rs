use axum::extract::{Path, State};
use axum::Json;
use log::*;

use crate::response::notification::SubscriberStatus;
use crate::AppState;

/// GET presence of a single subscriber
#[utoipa::path(
    get,
    path = "/api/subscribers/{subscriber_id}/status",
    params(
        ("subscriber_id" = String, Path, description = "Subscriber id to look up"),
    ),
    responses(
        (status = 200, description = "Current presence of the subscriber", body = SubscriberStatus),
        (status = 401, description = "Missing or invalid API key"),
    ),
    security(
        ("api_key" = [])
    )
)]
pub async fn status(
    State(app_state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Json<SubscriberStatus> {
    trace!("GET status of subscriber {subscriber_id}");
    let connections = app_state
        .relay_ref()
        .registry()
        .connections_of(&subscriber_id)
        .len();

    Json(SubscriberStatus {
        subscriber_id,
        online: connections > 0,
        connections,
    })
}
