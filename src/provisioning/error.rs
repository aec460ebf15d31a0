//! Error types for provisioning steps.

use thiserror::Error;

use crate::ocs::DecodeError;
use crate::session::UrlError;
use crate::transport::{Method, TransportError};

/// Errors raised by step executors.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProvisioningError {
    /// No response could be obtained from the server.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response body did not match the OCS envelope.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// An action request answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}")]
    HttpStatus {
        /// Method of the failed request.
        method: Method,
        /// URL of the failed request.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },
    /// Expected and actual data differ.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// An assertion step ran before any request recorded a response.
    #[error("no response has been recorded yet")]
    MissingResponse,
    /// A request URL could not be built for the active server.
    #[error(transparent)]
    Url(#[from] UrlError),
    /// Some tracked entities could not be removed during cleanup.
    #[error("cleanup left entities behind: {}", failures.join("; "))]
    CleanupIncomplete {
        /// One description per failed deletion.
        failures: Vec<String>,
    },
}

impl ProvisioningError {
    pub(crate) fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}
