use log::{error, info, warn};
use service::{config::Config, logging::Logger, AppState};

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting notification relay [{}] on {}",
        config.runtime_env(),
        config.bind_address()
    );

    if config.webhook_api_key().is_none() {
        warn!("WEBHOOK_API_KEY is not set, every notification submission will be rejected");
    }
    if config.jwt_secret().is_none() && !config.allow_anonymous_connections {
        warn!("JWT_SECRET is not set and anonymous connections are disabled, no subscriber can connect");
    }

    if config.is_production() && config.allow_anonymous_connections {
        warn!("Anonymous event stream connections are enabled in production");
    }

    let app_state = AppState::new(config);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
