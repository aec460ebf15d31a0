//! Step executors for the OCS provisioning API.
//!
//! [`Provisioning`] owns the scenario state (session, password book, created
//! entity registry and the last response) and exposes one method per
//! behaviour phrase. Action steps raise [`ProvisioningError`] on any failure;
//! assertion steps raise [`ProvisioningError::Assertion`] when expected and
//! actual data differ.
//!
//! Identity and server switches only happen through [`Provisioning::as_admin`]
//! and [`Provisioning::on_server`], which restore the previous value on every
//! exit path.

use reqwest::Url;
use tracing::{debug, warn};

use crate::config::ProvisioningConfig;
use crate::registry::{CreatedEntityRegistry, EntityKind};
use crate::session::{Accounts, ServerContext, Session, UrlError};
use crate::transport::{ApiRequest, ApiResponse, Credentials, HttpTransport, Method, Transport};

mod apps;
mod assertions;
mod cleanup;
mod error;
mod groups;
mod listing;
mod subadmins;
mod users;

pub use apps::AppFilter;
pub use error::ProvisioningError;
pub use users::UNLIMITED_QUOTA;

/// API version used by the lookups that the server only answers on v2.
pub const PINNED_API_VERSION: u8 = 2;

/// Whose credentials accompany a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Auth {
    /// Always the administrator.
    Admin,
    /// Whoever the session currently acts as.
    Active,
}

/// Scenario state plus the transport used to reach the server under test.
#[derive(Debug)]
pub struct Provisioning<T: Transport> {
    transport: T,
    session: Session,
    accounts: Accounts,
    registry: CreatedEntityRegistry,
    last_response: Option<ApiResponse>,
}

impl Provisioning<HttpTransport> {
    /// Connects to the servers described by `config` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Transport`] when the HTTP runtime cannot
    /// be started.
    pub fn connect(config: &ProvisioningConfig) -> Result<Self, ProvisioningError> {
        let transport = HttpTransport::new()?;
        Ok(Self::from_config(config, transport))
    }
}

impl<T: Transport> Provisioning<T> {
    /// Creates step state around an arbitrary transport.
    #[must_use]
    pub fn new(transport: T, session: Session, accounts: Accounts) -> Self {
        Self {
            transport,
            session,
            accounts,
            registry: CreatedEntityRegistry::new(),
            last_response: None,
        }
    }

    /// Creates step state for `config`, acting as the administrator.
    #[must_use]
    pub fn from_config(config: &ProvisioningConfig, transport: T) -> Self {
        Self::new(transport, Session::from_config(config), config.accounts())
    }

    /// Returns the session context.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the password book.
    #[must_use]
    pub const fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Returns the created-entity registry.
    #[must_use]
    pub const fn registry(&self) -> &CreatedEntityRegistry {
        &self.registry
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the most recent response recorded by a step.
    #[must_use]
    pub const fn last_response(&self) -> Option<&ApiResponse> {
        self.last_response.as_ref()
    }

    /// Makes `user` the active identity for subsequent steps.
    pub fn act_as(&mut self, user: &str) {
        self.session.swap_identity(user.to_owned());
    }

    /// Records the password `user` logs in with.
    pub fn set_password(&mut self, user: &str, password: &str) {
        self.accounts.set_password(user, password);
    }

    /// Directs subsequent steps at `server`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Url`] when `server` has no base URL.
    pub fn use_server(&mut self, server: ServerContext) -> Result<(), ProvisioningError> {
        self.ensure_configured(server)?;
        self.session.swap_server(server);
        Ok(())
    }

    /// Runs `op` as the administrator and restores the previous identity
    /// afterwards, whether `op` succeeds or fails.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `op`.
    pub fn as_admin<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, ProvisioningError>,
    ) -> Result<R, ProvisioningError> {
        let admin = self.accounts.admin_username().to_owned();
        let previous = self.session.swap_identity(admin);
        let outcome = op(self);
        self.session.swap_identity(previous);
        outcome
    }

    /// Runs `op` against `server` and restores the previous server
    /// afterwards, whether `op` succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Url`] when `server` has no base URL, or
    /// propagates the error returned by `op`.
    pub fn on_server<R>(
        &mut self,
        server: ServerContext,
        op: impl FnOnce(&mut Self) -> Result<R, ProvisioningError>,
    ) -> Result<R, ProvisioningError> {
        self.ensure_configured(server)?;
        let previous = self.session.swap_server(server);
        let outcome = op(self);
        self.session.swap_server(previous);
        outcome
    }

    /// Returns `true` when `user` exists. Any error status counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn user_exists(&mut self, user: &str) -> Result<bool, ProvisioningError> {
        self.entity_exists(EntityKind::User, user)
    }

    /// Returns `true` when `group` exists. Any error status counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn group_exists(&mut self, group: &str) -> Result<bool, ProvisioningError> {
        self.entity_exists(EntityKind::Group, group)
    }

    fn entity_exists(&mut self, kind: EntityKind, name: &str) -> Result<bool, ProvisioningError> {
        let request = self.request(
            Method::Get,
            PINNED_API_VERSION,
            &[kind.collection(), name],
            Auth::Admin,
        )?;
        let response = self.send(&request)?;
        if response.is_server_error() {
            warn!(
                %kind,
                name,
                status = response.status,
                "existence check got a server error; treating the entity as absent"
            );
        }
        Ok(response.is_success())
    }

    fn ensure_configured(&self, server: ServerContext) -> Result<(), ProvisioningError> {
        if server == ServerContext::Remote && !self.session.has_remote() {
            return Err(UrlError::MissingBaseUrl(server).into());
        }
        Ok(())
    }

    const fn configured_version(&self) -> u8 {
        self.session.api_version()
    }

    fn url(&self, version: u8, segments: &[&str]) -> Result<Url, ProvisioningError> {
        Ok(self.session.cloud_url(version, segments)?)
    }

    fn credentials(&self, auth: Auth) -> Credentials {
        match auth {
            Auth::Admin => self.accounts.admin_credentials(),
            Auth::Active => self.accounts.credentials_for(self.session.identity()),
        }
    }

    fn request_to(&self, method: Method, url: &Url, auth: Auth) -> ApiRequest {
        ApiRequest::new(method, url.as_str()).with_credentials(self.credentials(auth))
    }

    fn request(
        &self,
        method: Method,
        version: u8,
        segments: &[&str],
        auth: Auth,
    ) -> Result<ApiRequest, ProvisioningError> {
        let url = self.url(version, segments)?;
        Ok(self.request_to(method, &url, auth))
    }

    /// Sends `request` and records the response whatever its status.
    fn send(&mut self, request: &ApiRequest) -> Result<ApiResponse, ProvisioningError> {
        debug!(
            method = %request.method,
            url = %request.url,
            identity = self.session.identity(),
            server = %self.session.server(),
            "sending request"
        );
        let response = self.transport.send(request)?;
        self.last_response = Some(response.clone());
        Ok(response)
    }

    /// Sends `request`, records the response, and fails on a non-2xx status.
    fn send_checked(&mut self, request: &ApiRequest) -> Result<ApiResponse, ProvisioningError> {
        let response = self.send(request)?;
        ensure_success(request, &response)?;
        Ok(response)
    }

    fn last(&self) -> Result<&ApiResponse, ProvisioningError> {
        self.last_response
            .as_ref()
            .ok_or(ProvisioningError::MissingResponse)
    }

    fn remember(&mut self, kind: EntityKind, name: &str) {
        self.registry.remember(kind, self.session.server(), name);
    }
}

fn ensure_success(request: &ApiRequest, response: &ApiResponse) -> Result<(), ProvisioningError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ProvisioningError::HttpStatus {
        method: request.method,
        url: request.url.clone(),
        status: response.status,
    })
}

/// Sorts `items` so membership can be checked with a binary search.
fn sorted(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items
}
