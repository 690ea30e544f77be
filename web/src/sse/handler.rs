use crate::extractors::authenticated_subscriber::AuthenticatedSubscriber;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::{SecondsFormat, Utc};
use futures::Stream;
use log::*;
use service::AppState;
use sse::manager::ConnectionGuard;
use sse::message::{Connected, EventType};
use std::convert::Infallible;

/// GET open a subscriber event stream
///
/// The first event is always `connected`; notifications follow as `notification`
/// events until either side closes the stream.
#[utoipa::path(
    get,
    path = "/sse",
    params(
        ("token" = Option<String>, Query, description = "Subscriber JWT, for clients that cannot set headers"),
    ),
    responses(
        (status = 200, description = "text/event-stream of connected and notification events"),
        (status = 401, description = "Missing or invalid subscriber token"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub(crate) async fn sse_handler(
    AuthenticatedSubscriber(subscriber_id): AuthenticatedSubscriber,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing SSE connection for subscriber {subscriber_id}");

    let (connection_id, mut rx) = app_state
        .relay
        .register_connection(subscriber_id.clone());
    let guard = ConnectionGuard::new(app_state.relay.clone(), connection_id.clone());

    let connected = Connected {
        connection_id: connection_id.to_string(),
        subscriber_id,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let greeting = match serde_json::to_string(&connected) {
        Ok(data) => Some(Event::default().event(connected.event_type()).data(data)),
        Err(e) => {
            warn!("Failed to encode connected event for {connection_id}: {e}");
            None
        }
    };

    // The guard lives inside the stream, so however the response ends
    // (client gone, server shutdown, eviction) the connection is unregistered
    let stream = stream! {
        let _guard = guard;

        if let Some(greeting) = greeting {
            yield Ok(greeting);
        }
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    let keep_alive = KeepAlive::new().interval(app_state.config.keep_alive_interval());
    Sse::new(stream).keep_alive(keep_alive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::authenticated_subscriber::tests::{token_for, JWT_SECRET};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use futures::StreamExt;
    use service::config::Config;
    use tower::ServiceExt;

    fn app_state() -> AppState {
        AppState::new(
            Config::from_args(["notification_relay"]).set_jwt_secret(JWT_SECRET.to_string()),
        )
    }

    fn app(app_state: AppState) -> Router {
        Router::new()
            .route("/sse", get(sse_handler))
            .with_state(app_state)
    }

    fn request(subscriber_id: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/sse?token={}", token_for(subscriber_id, JWT_SECRET)))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_sse_requires_token() {
        let app_state = app_state();
        let request = Request::builder().uri("/sse").body(Body::empty()).unwrap();

        let response = app(app_state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app_state.relay_ref().registry().count(), 0);
    }

    #[tokio::test]
    async fn test_sse_first_event_is_connected() {
        let app_state = app_state();

        let response = app(app_state.clone()).oneshot(request("alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        let mut body = response.into_body().into_data_stream();
        let chunk = body.next().await.unwrap().unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();

        assert!(text.starts_with("event: connected\n"));
        assert!(text.contains("\"subscriberId\":\"alice\""));
        let connection_id = &app_state.relay_ref().registry().connections_of("alice")[0];
        assert!(text.contains(&format!("\"connectionId\":\"{connection_id}\"")));
    }

    #[tokio::test]
    async fn test_sse_connection_is_unregistered_when_response_dropped() {
        let app_state = app_state();

        let response = app(app_state.clone()).oneshot(request("alice")).await.unwrap();
        assert_eq!(app_state.relay_ref().registry().count(), 1);
        assert!(app_state.relay_ref().registry().is_online("alice"));

        drop(response);

        assert_eq!(app_state.relay_ref().registry().count(), 0);
        assert!(!app_state.relay_ref().registry().is_online("alice"));
    }
}
