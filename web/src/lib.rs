use axum::http::{header, HeaderValue, Method};
use log::*;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use self::error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod response;
pub(crate) mod router;
mod sse;

/// Binds the configured address and serves the relay until the process ends.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let bind_address = app_state.config.bind_address();
    let cors_layer = cors_layer(&app_state.config.allowed_origins);

    let app = router::define_routes(app_state).layer(cors_layer);

    info!("Server starting... listening for connections on http://{bind_address}");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        warn!("No allowed origins configured, cross-origin requests will be refused");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(middleware::auth::API_KEY_HEADER),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use service::config::Config;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let app_state = AppState::new(Config::from_args([
            "notification_relay",
            "--allowed-origins",
            "https://app.example.com",
        ]));
        let app = router::define_routes(app_state.clone())
            .layer(cors_layer(&app_state.config.allowed_origins));

        let request = Request::builder()
            .uri("/health")
            .header("Origin", "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn test_cors_omits_header_for_unknown_origin() {
        let app_state = AppState::new(Config::from_args([
            "notification_relay",
            "--allowed-origins",
            "https://app.example.com",
        ]));
        let app = router::define_routes(app_state.clone())
            .layer(cors_layer(&app_state.config.allowed_origins));

        let request = Request::builder()
            .uri("/health")
            .header("Origin", "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
