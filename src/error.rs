use thiserror::Error;

/// Symbolic kind carried to the host's error-to-response translation.
pub const ERROR_INVALID_TOKEN: &str = "invalidFormToken";

/// Submitted form token rejected.
///
/// Raised only by [`TokenRegistry::enforce_request`][crate::TokenRegistry::enforce_request].
/// The error deliberately does not say *why* validation failed: a missing,
/// unknown and already-consumed token must be indistinguishable to an
/// external observer.
#[derive(Debug, Error)]
#[error("invalid form token")]
pub struct InvalidToken {
    domain: Option<String>,
}

impl InvalidToken {
    pub(crate) fn new(domain: Option<String>) -> Self {
        Self { domain }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        ERROR_INVALID_TOKEN
    }

    /// Caller-supplied categorization domain, if any.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
}
