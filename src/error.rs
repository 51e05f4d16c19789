//! Error types for the sensor cache

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failures returned by the cache accessors.
///
/// All of them are recoverable: the caller decides whether to retry, keep
/// using its previous reading, or fault the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No destination for the reading
    #[error("Invalid parameter: no output destination")]
    InvalidParameter,

    /// `initialize()` has not been called yet
    #[error("Sensor cache not initialized")]
    NotInitialized,

    /// The cache lock could not be taken within the caller's timeout
    #[error("Timed out waiting for the sensor cache lock")]
    Timeout,

    /// The cache lock could not be created
    #[error("Failed to allocate the sensor cache lock")]
    LockAllocationFailure,
}
