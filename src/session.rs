//! Session context for a scenario: who is acting, against which server, and
//! which API version.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Url;
use thiserror::Error;

use crate::config::ProvisioningConfig;
use crate::transport::Credentials;

/// Selects which of the two federated servers a step applies to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ServerContext {
    /// The primary server under test.
    #[default]
    Local,
    /// The federated peer server.
    Remote,
}

impl ServerContext {
    /// Both contexts in cleanup order.
    pub const ALL: [Self; 2] = [Self::Local, Self::Remote];
}

impl fmt::Display for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("LOCAL"),
            Self::Remote => f.write_str("REMOTE"),
        }
    }
}

/// Password book for the accounts a scenario touches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Accounts {
    admin_username: String,
    admin_password: String,
    regular_user_password: String,
    overrides: BTreeMap<String, String>,
}

impl Accounts {
    /// Creates a password book.
    #[must_use]
    pub fn new(
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
        regular_user_password: impl Into<String>,
    ) -> Self {
        Self {
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
            regular_user_password: regular_user_password.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Returns the administrator's login name.
    #[must_use]
    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    /// Returns `true` when `user` is the administrator.
    #[must_use]
    pub fn is_admin(&self, user: &str) -> bool {
        user == self.admin_username
    }

    /// Records a specific password for `user`.
    pub fn set_password(&mut self, user: &str, password: &str) {
        self.overrides.insert(user.to_owned(), password.to_owned());
    }

    /// Returns the password `user` logs in with.
    #[must_use]
    pub fn password_for(&self, user: &str) -> &str {
        if self.is_admin(user) {
            return &self.admin_password;
        }
        self.overrides
            .get(user)
            .map_or(self.regular_user_password.as_str(), String::as_str)
    }

    /// Returns basic-auth credentials for `user`.
    #[must_use]
    pub fn credentials_for(&self, user: &str) -> Credentials {
        Credentials::new(user, self.password_for(user))
    }

    /// Returns the administrator's credentials.
    #[must_use]
    pub fn admin_credentials(&self) -> Credentials {
        self.credentials_for(&self.admin_username)
    }
}

/// Mutable per-scenario session state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    identity: String,
    server: ServerContext,
    local_base_url: String,
    remote_base_url: Option<String>,
    api_version: u8,
}

impl Session {
    /// Creates a session acting as `identity` against the local server.
    #[must_use]
    pub fn new(
        identity: impl Into<String>,
        local_base_url: impl Into<String>,
        remote_base_url: Option<String>,
        api_version: u8,
    ) -> Self {
        Self {
            identity: identity.into(),
            server: ServerContext::Local,
            local_base_url: local_base_url.into(),
            remote_base_url,
            api_version,
        }
    }

    /// Builds the session described by `config`, acting as the admin.
    #[must_use]
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self::new(
            config.admin_username.clone(),
            config.base_url.clone(),
            config.remote_base_url.clone(),
            config.api_version,
        )
    }

    /// Returns the active identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the active server context.
    #[must_use]
    pub const fn server(&self) -> ServerContext {
        self.server
    }

    /// Returns the configured API version.
    #[must_use]
    pub const fn api_version(&self) -> u8 {
        self.api_version
    }

    /// Returns `true` when a remote server is configured.
    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote_base_url.is_some()
    }

    /// Replaces the active identity and returns the previous one.
    pub(crate) const fn swap_identity(&mut self, identity: String) -> String {
        std::mem::replace(&mut self.identity, identity)
    }

    /// Replaces the active server and returns the previous one.
    pub(crate) const fn swap_server(&mut self, server: ServerContext) -> ServerContext {
        std::mem::replace(&mut self.server, server)
    }

    /// Returns the base URL of the active server, if configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        match self.server {
            ServerContext::Local => Some(self.local_base_url.as_str()),
            ServerContext::Remote => self.remote_base_url.as_deref(),
        }
    }

    /// Builds `{base}/v{version}.php/cloud/{segments…}` for the active
    /// server. Each segment is percent-encoded, so user and group names may
    /// contain reserved characters.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::MissingBaseUrl`] when the active server has no base
    /// URL and [`UrlError::Invalid`] when the base URL cannot be parsed.
    pub fn cloud_url(&self, version: u8, segments: &[&str]) -> Result<Url, UrlError> {
        let base = self
            .base_url()
            .ok_or(UrlError::MissingBaseUrl(self.server))?
            .trim_end_matches('/');
        let root = format!("{base}/v{version}.php/cloud");
        let mut url = Url::parse(&root).map_err(|err| UrlError::Invalid {
            url: root.clone(),
            message: err.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| UrlError::Invalid {
                url: root.clone(),
                message: String::from("URL cannot carry a path"),
            })?
            .extend(segments);
        Ok(url)
    }
}

/// Errors raised while building request URLs.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum UrlError {
    /// The active server has no base URL configured.
    #[error("no base URL is configured for the {0} server")]
    MissingBaseUrl(ServerContext),
    /// The configured base URL is not a valid absolute URL.
    #[error("invalid base URL '{url}': {message}")]
    Invalid {
        /// URL that failed to parse.
        url: String,
        /// Parser error message.
        message: String,
    },
}
