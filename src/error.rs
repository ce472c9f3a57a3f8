use thiserror::Error;

/// Failures a caller has to tell apart from ordinary request errors.
///
/// They travel inside `color_eyre::Report` like every other error and are
/// recovered with `downcast_ref::<SyncError>()`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Login to one of the services failed, the run cannot continue
    #[error("authentication with {service} failed: {reason}")]
    Authentication {
        service: &'static str,
        reason: String,
    },

    /// A value required by the requested operation was not provided
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SyncError {
    pub fn auth(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Authentication {
            service,
            reason: reason.into(),
        }
    }
}
