/// Core configuration and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("split horizon and poison reverse cannot both be enabled")]
    ConflictingLoopSuppression,

    #[error("invalid router configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid latency: {0}")]
    InvalidLatency(String),
}
