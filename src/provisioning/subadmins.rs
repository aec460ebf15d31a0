//! Subadmin promotion, demotion and checks.

use super::{Auth, PINNED_API_VERSION, Provisioning, ProvisioningError, sorted};
use crate::ocs;
use crate::transport::{Method, Transport};

impl<T: Transport> Provisioning<T> {
    /// `the administrator makes user "X" a subadmin of group "G" using the
    /// API`. Asserts the server answers 200.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the status is not 200.
    pub fn admin_makes_user_subadmin_of_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        self.subadmin_request(Method::Post, user, group)?;
        self.the_http_status_code_should_be(200)
    }

    /// `the administrator makes user "X" not a subadmin of group "G" using
    /// the API`. Revokes the right, then checks the group's subadmin list no
    /// longer contains the user.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when revocation does not
    /// answer 200 or the user is still listed.
    pub fn admin_makes_user_not_subadmin_of_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        self.subadmin_request(Method::Delete, user, group)?;
        self.the_http_status_code_should_be(200)?;
        self.as_admin(|this| this.user_should_not_be_subadmin_of_group(user, group))
    }

    fn subadmin_request(
        &mut self,
        method: Method,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        let request = self
            .request(
                method,
                self.configured_version(),
                &["users", user, "subadmins"],
                Auth::Admin,
            )?
            .with_field("groupid", group);
        self.send(&request)?;
        Ok(())
    }

    /// `user "X" should be a subadmin of group "G"`, asking with the active
    /// identity's credentials. The server's order does not matter.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the user is not listed
    /// or the status is not 200.
    pub fn user_should_be_subadmin_of_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        let subadmins = sorted(self.subadmins_of(group)?);
        if subadmins.binary_search_by(|candidate| candidate.as_str().cmp(user)).is_err() {
            return Err(ProvisioningError::assertion(format!(
                "user '{user}' is not a subadmin of group '{group}'; subadmins: {subadmins:?}"
            )));
        }
        self.the_http_status_code_should_be(200)
    }

    /// `user "X" should not be a subadmin of group "G"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the user is listed or
    /// the status is not 200.
    pub fn user_should_not_be_subadmin_of_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        let subadmins = sorted(self.subadmins_of(group)?);
        if subadmins.binary_search_by(|candidate| candidate.as_str().cmp(user)).is_ok() {
            return Err(ProvisioningError::assertion(format!(
                "user '{user}' is unexpectedly a subadmin of group '{group}'"
            )));
        }
        self.the_http_status_code_should_be(200)
    }

    fn subadmins_of(&mut self, group: &str) -> Result<Vec<String>, ProvisioningError> {
        let request = self.request(
            Method::Get,
            PINNED_API_VERSION,
            &["groups", group, "subadmins"],
            Auth::Active,
        )?;
        let response = self.send_checked(&request)?;
        Ok(ocs::parse_subadmins(&response.body)?)
    }
}
