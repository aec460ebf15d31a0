//! Assertions against the last recorded response.
//!
//! List equality here is order-sensitive: the server's order must match the
//! table's row order exactly. Membership checks elsewhere sort first.

use super::{Provisioning, ProvisioningError};
use crate::ocs::{self, DecodeError};
use crate::transport::Transport;

/// Takes the first cell of every row, skipping empty rows.
fn first_column(rows: &[Vec<String>]) -> Vec<String> {
    rows.iter().filter_map(|row| row.first().cloned()).collect()
}

fn expect_same_list(
    kind: &str,
    expected: &[String],
    actual: &[String],
) -> Result<(), ProvisioningError> {
    if expected == actual {
        return Ok(());
    }
    Err(ProvisioningError::assertion(format!(
        "{kind} returned by the API differ: expected {expected:?}, got {actual:?}"
    )))
}

impl<T: Transport> Provisioning<T> {
    /// `the users returned by the API should be`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the lists differ in
    /// content or order.
    pub fn the_users_should_be(&self, rows: &[Vec<String>]) -> Result<(), ProvisioningError> {
        self.expect_last_list("users", ocs::parse_users, rows)
    }

    /// `the groups returned by the API should be`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the lists differ in
    /// content or order.
    pub fn the_groups_should_be(&self, rows: &[Vec<String>]) -> Result<(), ProvisioningError> {
        self.expect_last_list("groups", ocs::parse_groups, rows)
    }

    /// `the subadmin groups returned by the API should be`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the lists differ in
    /// content or order.
    pub fn the_subadmin_groups_should_be(
        &self,
        rows: &[Vec<String>],
    ) -> Result<(), ProvisioningError> {
        self.expect_last_list("subadmin groups", ocs::parse_subadmins, rows)
    }

    /// `the subadmin users returned by the API should be`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the lists differ in
    /// content or order.
    pub fn the_subadmin_users_should_be(
        &self,
        rows: &[Vec<String>],
    ) -> Result<(), ProvisioningError> {
        self.expect_last_list("subadmin users", ocs::parse_subadmins, rows)
    }

    fn expect_last_list(
        &self,
        kind: &str,
        parse: fn(&str) -> Result<Vec<String>, DecodeError>,
        rows: &[Vec<String>],
    ) -> Result<(), ProvisioningError> {
        let actual = parse(&self.last()?.body)?;
        expect_same_list(kind, &first_column(rows), &actual)
    }

    /// `the apps returned by the API should include`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] naming the first listed app
    /// that is missing.
    pub fn the_apps_should_include(&self, rows: &[Vec<String>]) -> Result<(), ProvisioningError> {
        let apps = ocs::parse_apps(&self.last()?.body)?;
        for app in first_column(rows) {
            if !apps.contains(&app) {
                return Err(ProvisioningError::assertion(format!(
                    "app '{app}' missing from {apps:?}"
                )));
            }
        }
        Ok(())
    }

    /// `the user attributes returned by the API should include`: each row is
    /// a field name and its expected value.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] as `"{field} has value
    /// {actual}"` for the first mismatching field.
    pub fn check_user_attributes(&self, rows: &[Vec<String>]) -> Result<(), ProvisioningError> {
        let attributes = ocs::parse_user_attributes(&self.last()?.body)?;
        for row in rows {
            let [field, expected, ..] = row.as_slice() else {
                return Err(ProvisioningError::assertion(format!(
                    "attribute row {row:?} needs a field and a value"
                )));
            };
            match attributes.get(field) {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(ProvisioningError::assertion(format!(
                        "{field} has value {actual}"
                    )));
                }
                None => {
                    return Err(ProvisioningError::assertion(format!(
                        "{field} is missing from the response"
                    )));
                }
            }
        }
        Ok(())
    }

    /// `the HTTP status code should be "N"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the last status differs.
    pub fn the_http_status_code_should_be(&self, expected: u16) -> Result<(), ProvisioningError> {
        let actual = self.last()?.status;
        if actual == expected {
            return Ok(());
        }
        Err(ProvisioningError::assertion(format!(
            "expected HTTP status {expected}, got {actual}"
        )))
    }

    /// `the OCS status code should be "N"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Assertion`] when the `meta/statuscode` of
    /// the last response differs.
    pub fn the_ocs_status_code_should_be(&self, expected: u16) -> Result<(), ProvisioningError> {
        let meta = ocs::parse_meta(&self.last()?.body)?;
        if meta.statuscode == expected {
            return Ok(());
        }
        Err(ProvisioningError::assertion(format!(
            "expected OCS status {expected}, got {} ({})",
            meta.statuscode,
            meta.message.unwrap_or_default()
        )))
    }
}
