//! Listing requests whose responses feed the table assertions. Each one
//! records the response whatever its status.

use super::{AppFilter, Auth, Provisioning, ProvisioningError};
use crate::transport::{Method, Transport};

impl<T: Transport> Provisioning<T> {
    /// Lists all users (`GET users`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_users(&mut self) -> Result<(), ProvisioningError> {
        self.admin_get(&["users"])
    }

    /// Lists all groups (`GET groups`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_groups(&mut self) -> Result<(), ProvisioningError> {
        self.admin_get(&["groups"])
    }

    /// Lists the groups of `user` (`GET users/{user}/groups`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_groups_of_user(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.admin_get(&["users", user, "groups"])
    }

    /// Lists the members of `group` (`GET groups/{group}`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_users_of_group(&mut self, group: &str) -> Result<(), ProvisioningError> {
        self.admin_get(&["groups", group])
    }

    /// Lists the subadmins of `group` (`GET groups/{group}/subadmins`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_subadmins_of_group(&mut self, group: &str) -> Result<(), ProvisioningError> {
        self.admin_get(&["groups", group, "subadmins"])
    }

    /// Lists the groups `user` administers (`GET users/{user}/subadmins`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_subadmin_groups_of_user(
        &mut self,
        user: &str,
    ) -> Result<(), ProvisioningError> {
        self.admin_get(&["users", user, "subadmins"])
    }

    /// Fetches the attributes of `user` (`GET users/{user}`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_gets_user_info(&mut self, user: &str) -> Result<(), ProvisioningError> {
        self.admin_get(&["users", user])
    }

    /// Lists apps, optionally filtered (`GET v2 apps[?filter=…]`).
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when no response could be obtained.
    pub fn admin_lists_apps(&mut self, filter: Option<AppFilter>) -> Result<(), ProvisioningError> {
        let request = self.apps_request(filter, Auth::Admin)?;
        self.send(&request)?;
        Ok(())
    }

    fn admin_get(&mut self, segments: &[&str]) -> Result<(), ProvisioningError> {
        let request = self.request(
            Method::Get,
            self.configured_version(),
            segments,
            Auth::Admin,
        )?;
        self.send(&request)?;
        Ok(())
    }
}
