//! Teardown of the users and groups a scenario created.
//!
//! Cleanup is best-effort: every tracked entity gets a deletion attempt even
//! when earlier ones fail, and the registry ends up empty either way.

use tracing::{info, warn};

use super::{Provisioning, ProvisioningError};
use crate::registry::EntityKind;
use crate::session::ServerContext;
use crate::transport::Transport;

impl<T: Transport> Provisioning<T> {
    /// Deletes every tracked user on the local, then the remote server.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::CleanupIncomplete`] listing each user
    /// that could not be removed.
    pub fn cleanup_users(&mut self) -> Result<(), ProvisioningError> {
        into_result(self.sweep(EntityKind::User))
    }

    /// Deletes every tracked group on the local, then the remote server.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::CleanupIncomplete`] listing each group
    /// that could not be removed.
    pub fn cleanup_groups(&mut self) -> Result<(), ProvisioningError> {
        into_result(self.sweep(EntityKind::Group))
    }

    /// Runs the user cleanup, then the group cleanup. Intended to run before
    /// and after every scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::CleanupIncomplete`] with the failures of
    /// both passes.
    pub fn cleanup(&mut self) -> Result<(), ProvisioningError> {
        let mut failures = self.sweep(EntityKind::User);
        failures.extend(self.sweep(EntityKind::Group));
        into_result(failures)
    }

    fn sweep(&mut self, kind: EntityKind) -> Vec<String> {
        let mut failures = Vec::new();
        for server in ServerContext::ALL {
            let names = self.registry.drain(kind, server);
            if names.is_empty() {
                continue;
            }
            let outcome = self.on_server(server, |this| {
                for name in &names {
                    if let Err(err) = this.as_admin(|admin| admin.remove_tracked(kind, name)) {
                        warn!(%kind, name = name.as_str(), %server, error = %err, "cleanup failed");
                        failures.push(format!("{kind} '{name}' on {server}: {err}"));
                    }
                }
                Ok(())
            });
            if let Err(err) = outcome {
                warn!(%kind, %server, error = %err, "cleanup skipped server");
                failures.push(format!("{kind}s {names:?} on {server}: {err}"));
            }
        }
        failures
    }

    fn remove_tracked(&mut self, kind: EntityKind, name: &str) -> Result<(), ProvisioningError> {
        match kind {
            EntityKind::User => self.user_has_been_deleted(name),
            EntityKind::Group => self.group_has_been_deleted(name),
        }?;
        info!(%kind, name, "cleaned up");
        Ok(())
    }
}

fn into_result(failures: Vec<String>) -> Result<(), ProvisioningError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ProvisioningError::CleanupIncomplete { failures })
    }
}
