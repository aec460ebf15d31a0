//! App enablement checks.

use std::fmt;

use super::{Auth, PINNED_API_VERSION, Provisioning, ProvisioningError};
use crate::ocs;
use crate::transport::{ApiRequest, Method, Transport};

/// Filter accepted by the app listing endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppFilter {
    /// Only enabled apps.
    Enabled,
    /// Only disabled apps.
    Disabled,
}

impl AppFilter {
    /// Returns the query value for this filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for AppFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T: Transport> Provisioning<T> {
    /// `app "A" should be enabled`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the app is not listed as
    /// enabled or the status is not 200.
    pub fn app_should_be_enabled(&mut self, app: &str) -> Result<(), ProvisioningError> {
        self.expect_app_listed(app, AppFilter::Enabled)
    }

    /// `app "A" should be disabled`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the app is not listed as
    /// disabled or the status is not 200.
    pub fn app_should_be_disabled(&mut self, app: &str) -> Result<(), ProvisioningError> {
        self.expect_app_listed(app, AppFilter::Disabled)
    }

    fn expect_app_listed(&mut self, app: &str, filter: AppFilter) -> Result<(), ProvisioningError> {
        let request = self.apps_request(Some(filter), Auth::Active)?;
        let response = self.send_checked(&request)?;
        let apps = ocs::parse_apps(&response.body)?;
        if !apps.iter().any(|candidate| candidate == app) {
            return Err(ProvisioningError::assertion(format!(
                "app '{app}' is not {filter}; {filter} apps: {apps:?}"
            )));
        }
        self.the_http_status_code_should_be(200)
    }

    /// Builds `GET v2 apps`, optionally filtered by state.
    pub(super) fn apps_request(
        &self,
        filter: Option<AppFilter>,
        auth: Auth,
    ) -> Result<ApiRequest, ProvisioningError> {
        let mut url = self.url(PINNED_API_VERSION, &["apps"])?;
        if let Some(value) = filter {
            url.query_pairs_mut().append_pair("filter", value.as_str());
        }
        Ok(self.request_to(Method::Get, &url, auth))
    }
}
