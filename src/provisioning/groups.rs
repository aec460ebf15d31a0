//! Group lifecycle and membership steps.

use tracing::info;

use super::{Auth, PINNED_API_VERSION, Provisioning, ProvisioningError, sorted};
use crate::ocs;
use crate::registry::EntityKind;
use crate::transport::{Method, Transport};

impl<T: Transport> Provisioning<T> {
    /// `group "G" has been created`: creates the group as admin unless it
    /// already exists, then asserts it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when creation fails or the group is
    /// still absent afterwards.
    pub fn group_has_been_created(&mut self, group: &str) -> Result<(), ProvisioningError> {
        if !self.group_exists(group)? {
            self.as_admin(|this| this.create_group_request(group))?;
        }
        self.expect_group_present(group)
    }

    /// `the administrator creates group "G" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the group is
    /// absent afterwards.
    pub fn admin_creates_group(&mut self, group: &str) -> Result<(), ProvisioningError> {
        self.as_admin(|this| this.create_group_request(group))?;
        self.expect_group_present(group)
    }

    /// `group "G" has been deleted`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when deletion fails or the group still
    /// exists afterwards.
    pub fn group_has_been_deleted(&mut self, group: &str) -> Result<(), ProvisioningError> {
        if self.group_exists(group)? {
            self.as_admin(|this| this.delete_group_request(group))?;
        }
        self.expect_group_absent(group)
    }

    /// `the administrator deletes group "G" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the group
    /// still exists afterwards.
    pub fn admin_deletes_group(&mut self, group: &str) -> Result<(), ProvisioningError> {
        self.as_admin(|this| this.delete_group_request(group))?;
        self.expect_group_absent(group)
    }

    /// `group "G" should exist`. The group is tracked for cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the group is absent.
    pub fn group_should_exist(&mut self, group: &str) -> Result<(), ProvisioningError> {
        self.expect_group_present(group)?;
        self.remember(EntityKind::Group, group);
        Ok(())
    }

    /// `group "G" should not exist`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the group exists.
    pub fn group_should_not_exist(&mut self, group: &str) -> Result<(), ProvisioningError> {
        self.expect_group_absent(group)
    }

    /// Sends the group creation request and tracks the group.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] on an error status.
    pub fn create_group_request(&mut self, group: &str) -> Result<(), ProvisioningError> {
        let request = self
            .request(
                Method::Post,
                self.configured_version(),
                &["groups"],
                Auth::Active,
            )?
            .with_field("groupid", group);
        self.send_checked(&request)?;
        self.remember(EntityKind::Group, group);
        info!(group, server = %self.session.server(), "created group");
        Ok(())
    }

    /// Sends the group deletion request.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] on an error status.
    pub fn delete_group_request(&mut self, group: &str) -> Result<(), ProvisioningError> {
        let request = self.request(
            Method::Delete,
            self.configured_version(),
            &["groups", group],
            Auth::Active,
        )?;
        self.send_checked(&request)?;
        info!(group, server = %self.session.server(), "deleted group");
        Ok(())
    }

    /// `user "X" has been added to group "G"`: adds the membership as admin
    /// unless it already exists, then asserts it.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the membership
    /// is missing afterwards.
    pub fn user_has_been_added_to_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        self.as_admin(|this| {
            if !this.user_belongs_to_group(user, group)? {
                this.add_user_to_group_request(user, group)?;
            }
            this.user_should_belong_to_group(user, group)
        })
    }

    /// `the administrator adds user "X" to group "G" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the membership
    /// is missing afterwards.
    pub fn admin_adds_user_to_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        self.as_admin(|this| {
            this.add_user_to_group_request(user, group)?;
            this.user_should_belong_to_group(user, group)
        })
    }

    /// `the administrator removes user "X" from group "G" using the API`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the request fails or the membership
    /// remains afterwards.
    pub fn admin_removes_user_from_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        self.as_admin(|this| {
            this.membership_request(Method::Delete, user, group)?;
            this.user_should_not_belong_to_group(user, group)
        })
    }

    /// Sends the add-to-group request with the active identity's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::HttpStatus`] on an error status.
    pub fn add_user_to_group_request(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        self.membership_request(Method::Post, user, group)
    }

    fn membership_request(
        &mut self,
        method: Method,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        let request = self
            .request(
                method,
                self.configured_version(),
                &["users", user, "groups"],
                Auth::Active,
            )?
            .with_field("groupid", group);
        self.send_checked(&request)?;
        Ok(())
    }

    /// Returns `true` when the server lists `group` among `user`'s groups,
    /// asking with the active identity's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when the lookup fails or cannot be
    /// decoded.
    pub fn user_belongs_to_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<bool, ProvisioningError> {
        let groups = self.groups_of(user, Auth::Active)?;
        Ok(groups.iter().any(|candidate| candidate == group))
    }

    /// `user "X" should belong to group "G"`. The server's order does not
    /// matter.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the membership is
    /// missing or the status is not 200.
    pub fn user_should_belong_to_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        let groups = sorted(self.groups_of(user, Auth::Admin)?);
        if groups.binary_search_by(|candidate| candidate.as_str().cmp(group)).is_err() {
            return Err(ProvisioningError::assertion(format!(
                "user '{user}' is not in group '{group}'; groups: {groups:?}"
            )));
        }
        self.the_http_status_code_should_be(200)
    }

    /// `user "X" should not belong to group "G"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the membership exists or
    /// the status is not 200.
    pub fn user_should_not_belong_to_group(
        &mut self,
        user: &str,
        group: &str,
    ) -> Result<(), ProvisioningError> {
        let groups = sorted(self.groups_of(user, Auth::Admin)?);
        if groups.binary_search_by(|candidate| candidate.as_str().cmp(group)).is_ok() {
            return Err(ProvisioningError::assertion(format!(
                "user '{user}' is unexpectedly in group '{group}'"
            )));
        }
        self.the_http_status_code_should_be(200)
    }

    fn groups_of(&mut self, user: &str, auth: Auth) -> Result<Vec<String>, ProvisioningError> {
        let request = self.request(
            Method::Get,
            PINNED_API_VERSION,
            &["users", user, "groups"],
            auth,
        )?;
        let response = self.send_checked(&request)?;
        Ok(ocs::parse_groups(&response.body)?)
    }

    fn expect_group_present(&mut self, group: &str) -> Result<(), ProvisioningError> {
        if self.group_exists(group)? {
            return Ok(());
        }
        Err(ProvisioningError::assertion(format!(
            "group '{group}' does not exist"
        )))
    }

    fn expect_group_absent(&mut self, group: &str) -> Result<(), ProvisioningError> {
        if self.group_exists(group)? {
            return Err(ProvisioningError::assertion(format!(
                "group '{group}' still exists"
            )));
        }
        Ok(())
    }
}
