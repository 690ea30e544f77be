use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthStatus {
    #[schema(example = "healthy")]
    pub(crate) status: &'static str,
    /// Open event stream connections
    pub(crate) connections: usize,
    /// Distinct subscribers holding at least one connection
    pub(crate) subscribers: usize,
}

impl HealthStatus {
    pub(crate) fn healthy(connections: usize, subscribers: usize) -> Self {
        Self {
            status: "healthy",
            connections,
            subscribers,
        }
    }
}
