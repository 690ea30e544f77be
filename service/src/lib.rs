use config::Config;
use log::info;
use sse::Manager;
use std::sync::Arc;

pub mod config;
pub mod logging;

// Service-level state shared by every request handler
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Manager>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config) -> Self {
        info!(
            "Relay config: delivery_timeout={}ms, connection_buffer_size={}, \
             keep_alive={}s, allow_anonymous_connections={}",
            app_config.delivery_timeout_ms,
            app_config.connection_buffer_size,
            app_config.keep_alive_secs,
            app_config.allow_anonymous_connections,
        );

        let relay = Manager::new(
            app_config.delivery_timeout(),
            app_config.connection_buffer_size,
        );

        Self {
            relay: Arc::new(relay),
            config: app_config,
        }
    }

    pub fn relay_ref(&self) -> &Manager {
        self.relay.as_ref()
    }
}
