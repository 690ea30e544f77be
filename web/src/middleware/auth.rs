use crate::{AppState, Error};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::*;
use secrecy::ExposeSecret;

pub(crate) const API_KEY_HEADER: &str = "x-api-key";

/// Producer authentication middleware for the ingress routes.
///
/// Accepts the configured API key as `Authorization: Bearer <key>` or as an
/// `X-API-Key` header. Without a configured key every request is rejected.
pub async fn require_api_key(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = app_state.config.webhook_api_key() else {
        error!("Rejecting producer request: no webhook API key is configured");
        return Error::unauthenticated("Producer authentication unavailable").into_response();
    };

    match presented_key(request.headers()) {
        Some(key) if constant_time_eq(key.as_bytes(), expected.expose_secret().as_bytes()) => {
            next.run(request).await
        }
        Some(_) => {
            warn!("Rejecting producer request with invalid API key");
            Error::unauthenticated("Invalid API key").into_response()
        }
        None => {
            warn!("Rejecting producer request without API key");
            Error::unauthenticated("Missing API key").into_response()
        }
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    bearer.or(api_key).map(str::trim).filter(|key| !key.is_empty())
}

/// Compares two keys in time independent of where they first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use service::config::Config;
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "authenticated"
    }

    fn app(config: Config) -> Router {
        let app_state = AppState::new(config);
        Router::new()
            .route("/test", get(test_handler))
            .route_layer(from_fn_with_state(app_state.clone(), require_api_key))
            .with_state(app_state)
    }

    fn configured() -> Config {
        Config::from_args(["notification_relay"]).set_webhook_api_key("secret-key".to_string())
    }

    #[tokio::test]
    async fn test_require_api_key_returns_401_without_key() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app(configured()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_api_key_returns_401_with_wrong_key() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();
        let response = app(configured()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_api_key_accepts_bearer_token() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer secret-key")
            .body(Body::empty())
            .unwrap();
        let response = app(configured()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_require_api_key_accepts_api_key_header() {
        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "secret-key")
            .body(Body::empty())
            .unwrap();
        let response = app(configured()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret-key", b"secret-key"));
        assert!(!constant_time_eq(b"secret-key", b"secret-kez"));
        assert!(!constant_time_eq(b"secret-key", b"secret"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_require_api_key_rejects_key_with_matching_prefix() {
        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "secret-key-extra")
            .body(Body::empty())
            .unwrap();
        let response = app(configured()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_api_key_rejects_everything_when_unconfigured() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer anything")
            .body(Body::empty())
            .unwrap();
        let response = app(Config::from_args(["notification_relay"]))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
