//! Shared fixtures for provisioning BDD scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use ocs_provisioning::test_support::FakeOcsServer;
use ocs_provisioning::{Provisioning, ProvisioningError, ServerContext};
use rstest::fixture;

/// Scenario state: the fake server pair plus the step executors talking to
/// it. Clones share state, so steps may take the world by reference.
#[derive(Clone, Debug)]
pub struct ProvisioningWorld {
    pub server: FakeOcsServer,
    pub steps: Rc<RefCell<Provisioning<FakeOcsServer>>>,
    pub cleanup_outcome: Rc<RefCell<Option<Result<(), ProvisioningError>>>>,
}

impl ProvisioningWorld {
    /// Runs `op` against the step executors.
    pub fn run<R>(
        &self,
        op: impl FnOnce(&mut Provisioning<FakeOcsServer>) -> Result<R, ProvisioningError>,
    ) -> Result<R, ProvisioningError> {
        op(&mut self.steps.borrow_mut())
    }

    /// Removes whatever the scenario left behind and fails the scenario when
    /// that is impossible.
    pub fn finish(&self) {
        self.run(Provisioning::cleanup)
            .unwrap_or_else(|err| panic!("scenario cleanup failed: {err}"));
        assert!(self.steps.borrow().registry().is_empty());
    }
}

#[fixture]
pub fn provisioning_world() -> ProvisioningWorld {
    let server = FakeOcsServer::new();
    let steps = Rc::new(RefCell::new(server.federated_provisioning()));
    ProvisioningWorld {
        server,
        steps,
        cleanup_outcome: Rc::new(RefCell::new(None)),
    }
}

/// Parses the server name used in step text.
pub fn server_named(name: &str) -> Option<ServerContext> {
    match name {
        "local" => Some(ServerContext::Local),
        "remote" => Some(ServerContext::Remote),
        _ => None,
    }
}
