use crate::{
    controller::{health_check_controller, notification_controller, subscriber_controller},
    middleware::auth::require_api_key,
    params, response, sse, AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// Global definition of the OpenAPI document. A path or schema must be listed
// here to show up in the rendered docs.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Notification Relay API"
        ),
        paths(
            health_check_controller::health_check,
            notification_controller::create,
            subscriber_controller::status,
            sse::handler::sse_handler,
        ),
        components(
            schemas(
                params::notification::CreateParams,
                response::health::HealthStatus,
                response::notification::DeliveryInfo,
                response::notification::DeliveryStatus,
                response::notification::NotificationResponse,
                response::notification::SubscriberStatus,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "notification_relay", description = "Real-time notification relay")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Producers authenticate with a shared API key, subscribers with a signed JWT.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-API-Key",
                    "Producer API key, also accepted as an Authorization bearer token",
                ))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes(app_state.clone()))
        .merge(notification_routes(app_state.clone()))
        .merge(subscriber_routes(app_state.clone()))
        .merge(sse_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/notifications", post(notification_controller::create))
        .route_layer(from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

fn subscriber_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/subscribers/{subscriber_id}/status",
            get(subscriber_controller::status),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse::handler::sse_handler))
        .with_state(app_state)
}
