//! reqwest-backed transport that blocks on a private tokio runtime.

use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{ApiRequest, ApiResponse, Method, Transport, TransportError};

/// Sends requests with reqwest, one at a time.
///
/// The transport owns a current-thread runtime so callers stay synchronous.
/// It must not be used from inside another tokio runtime.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpTransport {
    /// Creates a transport with reqwest's default client settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Runtime`] when the runtime cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_client(reqwest::Client::new())
    }

    /// Creates a transport around an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Runtime`] when the runtime cannot be built.
    pub fn with_client(client: reqwest::Client) -> Result<Self, TransportError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| TransportError::Runtime {
                message: err.to_string(),
            })?;
        Ok(Self { client, runtime })
    }

    fn build(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        builder
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let failure = |err: reqwest::Error| TransportError::Request {
            method: request.method,
            url: request.url.clone(),
            message: err.to_string(),
        };
        let builder = self.build(request);
        let (status, body) = self.runtime.block_on(async {
            let response = builder.send().await.map_err(failure)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(failure)?;
            Ok::<_, TransportError>((status, body))
        })?;
        debug!(method = %request.method, url = %request.url, status, "received response");
        Ok(ApiResponse { status, body })
    }
}
