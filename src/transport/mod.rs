//! Request/response types and the transport abstraction used to reach the
//! OCS API.
//!
//! Every step executor goes through [`Transport::send`], which lets tests swap
//! the reqwest-backed [`HttpTransport`] for an in-memory server.

use std::fmt;

use thiserror::Error;

mod http;

pub use http::HttpTransport;

/// HTTP methods used by the provisioning API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP basic-auth credentials.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Password sent alongside the login name.
    pub password: String,
}

impl Credentials {
    /// Builds a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A single request against the OCS API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully qualified URL, including any query string.
    pub url: String,
    /// Basic-auth credentials, if any.
    pub credentials: Option<Credentials>,
    /// URL-encoded form fields sent as the request body.
    pub form: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a request without credentials or body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            credentials: None,
            form: Vec::new(),
        }
    }

    /// Attaches basic-auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Appends a form field to the body.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Returns the value of a form field, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of an OCS API response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns `true` for 5xx statuses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }
}

/// Errors raised before an HTTP status could be obtained.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// Raised when the blocking runtime cannot be created.
    #[error("failed to start HTTP runtime: {message}")]
    Runtime {
        /// Underlying I/O error message.
        message: String,
    },
    /// Raised when the request could not be sent or its body not read.
    #[error("{method} {url} failed: {message}")]
    Request {
        /// Method of the failed request.
        method: Method,
        /// URL of the failed request.
        url: String,
        /// Error reported by the HTTP client.
        message: String,
    },
}

/// Abstraction over request execution to support fakes in tests.
pub trait Transport {
    /// Sends `request` and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request)
    }
}
