//! User lifecycle steps: creation, deletion, enablement and quota.

use tracing::{debug, info};

use super::{Auth, Provisioning, ProvisioningError, ensure_success};
use crate::ocs;
use crate::registry::EntityKind;
use crate::transport::{ApiRequest, Method, Transport};

/// Quota value that lifts the storage limit.
pub const UNLIMITED_QUOTA: &str = "none";

impl<T: Transport> Provisioning<T> {
    /// `user "X" has been created`: creates the user as admin unless it
    /// already exists, then asserts it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when creation fails or the user is still
    /// absent afterwards.
    pub fn user_has_been_created(&mut self, user: &str) -> Result<(), ProvisioningError> {
        if !self.user_exists(user)? {
            self.as_admin(|this| this.create_user_request(user))?;
        }
        self.expect_user_present(user)
    }

    /// `user "X" has been created with password "P"`.
    ///
    /// # Errors
    ///
    /// See [`Provisioning::user_has_been_created`].
    pub fn user_has_been_created_with_password(
        &mut self,
        user: &str,
        password: &str,
    ) -> Result<(), ProvisioningError> {
        self.set_password(user, password);
        self.user_has_been_created(user)
    }

    /// `the administrator creates the user "X" using the API`: always sends
    /// the creation request, then asserts the user exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the user is
    /// absent afterwards.
    pub fn admin_creates_user(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.as_admin(|this| this.create_user_request(user))?;
        self.expect_user_present(user)
    }

    /// `user "X" has been deleted`: deletes the user as admin if it exists,
    /// then asserts it is gone.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when deletion fails or the user still
    /// exists afterwards.
    pub fn user_has_been_deleted(&mut self, user: &str) -> Result<(), ProvisioningError> {
        if self.user_exists(user)? {
            self.as_admin(|this| this.delete_user_request(user))?;
        }
        self.expect_user_absent(user)
    }

    /// `the administrator deletes user "X" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the user still
    /// exists afterwards.
    pub fn admin_deletes_user(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.as_admin(|this| this.delete_user_request(user))?;
        self.expect_user_absent(user)
    }

    /// `user "X" should exist`. The user is tracked for cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the user is absent.
    pub fn user_should_exist(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.expect_user_present(user)?;
        self.remember(EntityKind::User, user);
        Ok(())
    }

    /// `user "X" should not exist`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the user exists.
    pub fn user_should_not_exist(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.expect_user_absent(user)
    }

    /// Sends the creation request with the active identity's credentials,
    /// tracks the user, then logs in once as the new user so the server sets
    /// up its home.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] when either request answers
    /// with an error status.
    pub fn create_user_request(&mut self, user: &str) -> Result<(), ProvisioningError> {
        let version = self.configured_version();
        let password = self.accounts.password_for(user).to_owned();
        let request = self
            .request(Method::Post, version, &["users"], Auth::Active)?
            .with_field("userid", user)
            .with_field("password", password);
        self.send_checked(&request)?;
        self.remember(EntityKind::User, user);
        info!(user, server = %self.session.server(), "created user");

        let url = self.url(version, &["users", user])?;
        let login = ApiRequest::new(Method::Get, url.as_str())
            .with_credentials(self.accounts.credentials_for(user));
        debug!(
            method = %login.method,
            url = %login.url,
            identity = user,
            server = %self.session.server(),
            "sending first login"
        );
        // Leaves `last_response` untouched.
        let response = self.transport.send(&login)?;
        ensure_success(&login, &response)
    }

    /// Sends the deletion request with the active identity's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] on an error status.
    pub fn delete_user_request(&mut self, user: &str) -> Result<(), ProvisioningError> {
        let request = self.request(
            Method::Delete,
            self.configured_version(),
            &["users", user],
            Auth::Active,
        )?;
        self.send_checked(&request)?;
        info!(user, server = %self.session.server(), "deleted user");
        Ok(())
    }

    /// `the administrator disables user "X" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] on an error status.
    pub fn admin_disables_user(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.toggle_user(user, "disable")
    }

    /// `the administrator enables user "X" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] on an error status.
    pub fn admin_enables_user(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.toggle_user(user, "enable")
    }

    fn toggle_user(&mut self, user: &str, action: &str) -> Result<(), ProvisioningError> {
        let request = self.request(
            Method::Put,
            self.configured_version(),
            &["users", user, action],
            Auth::Admin,
        )?;
        self.send_checked(&request)?;
        Ok(())
    }

    /// `user "X" should be disabled`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] unless `enabled` is `false`.
    pub fn user_should_be_disabled(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.expect_enabled_flag(user, "false")
    }

    /// `user "X" should be enabled`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] unless `enabled` is `true`.
    pub fn user_should_be_enabled(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.expect_enabled_flag(user, "true")
    }

    fn expect_enabled_flag(&mut self, user: &str, expected: &str) -> Result<(), ProvisioningError> {
        let attributes = self.fetch_user_attributes(user)?;
        let actual = attributes.require("enabled")?;
        if actual == expected {
            return Ok(());
        }
        Err(ProvisioningError::assertion(format!(
            "user '{user}' has enabled = '{actual}', expected '{expected}'"
        )))
    }

    /// `the administrator sets the quota of user "X" to "Q" using the API`.
    /// An error status is recorded rather than raised, then the status is
    /// asserted to be 200.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the server does not
    /// answer 200.
    pub fn admin_sets_user_quota(
        &mut self,
        user: &str,
        quota: &str,
    ) -> Result<(), ProvisioningError> {
        self.as_admin(|this| {
            let request = this
                .request(
                    Method::Put,
                    this.configured_version(),
                    &["users", user],
                    Auth::Active,
                )?
                .with_field("key", "quota")
                .with_field("value", quota);
            this.send(&request)?;
            Ok(())
        })?;
        self.the_http_status_code_should_be(200)
    }

    /// `the administrator gives unlimited quota to user "X" using the API`.
    ///
    /// # Errors
    ///
    /// See [`Provisioning::admin_sets_user_quota`].
    pub fn admin_gives_unlimited_quota(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.admin_sets_user_quota(user, UNLIMITED_QUOTA)
    }

    /// Returns the home directory the server reports for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the lookup fails or has no `home`.
    pub fn get_user_home(&mut self, user: &str) -> Result<String, ProvisioningError> {
        let attributes = self.fetch_user_attributes(user)?;
        Ok(attributes.require("home")?.to_owned())
    }

    fn fetch_user_attributes(
        &mut self,
        user: &str,
    ) -> Result<ocs::UserAttributes, ProvisioningError> {
        let request = self.request(
            Method::Get,
            self.configured_version(),
            &["users", user],
            Auth::Admin,
        )?;
        let response = self.send_checked(&request)?;
        Ok(ocs::parse_user_attributes(&response.body)?)
    }

    fn expect_user_present(&mut self, user: &str) -> Result<(), ProvisioningError> {
        if self.user_exists(user)? {
            return Ok(());
        }
        Err(ProvisioningError::assertion(format!(
            "user '{user}' does not exist"
        )))
    }

    fn expect_user_absent(&mut self, user: &str) -> Result<(), ProvisioningError> {
        if self.user_exists(user)? {
            return Err(ProvisioningError::assertion(format!(
                "user '{user}' still exists"
            )));
        }
        Ok(())
    }
}
