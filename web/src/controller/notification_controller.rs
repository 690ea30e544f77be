//! Producer ingress: accepts notifications and hands them to the delivery engine.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use log::*;
use sse::notification::normalize;

use crate::params::notification::CreateParams;
use crate::response::notification::NotificationResponse;
use crate::{AppState, Error};

/// POST submit a notification for delivery
///
/// Without `targetUsers` the notification is broadcast to every open connection.
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = CreateParams,
    responses(
        (status = 200, description = "Notification processed, see deliveryInfo for per-connection results", body = NotificationResponse),
        (status = 400, description = "Invalid body or empty targetUsers"),
        (status = 401, description = "Missing or invalid API key"),
    ),
    security(
        ("api_key" = [])
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    params: Result<Json<CreateParams>, JsonRejection>,
) -> Result<Json<NotificationResponse>, Error> {
    let Json(params) = params?;
    params.validate()?;

    let (payload, target_users) = params.into_parts();
    let notification = normalize(payload);
    debug!(
        "POST notification {} of type {:?}",
        notification.id(),
        notification.kind()
    );

    let relay = app_state.relay_ref();
    let outcome = match target_users {
        Some(target_users) => {
            relay
                .send_to_users(&notification, Some(target_users.as_slice()))
                .await?
        }
        None => relay.broadcast(&notification).await,
    };

    trace!(
        "Notification {} ({}) attempted on {} connection(s)",
        notification.id(),
        outcome.target_type,
        outcome.attempted()
    );

    Ok(Json(NotificationResponse::new(&notification, outcome)))
}
