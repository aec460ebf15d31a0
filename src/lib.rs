//! Step executors for acceptance tests of the OCS user, group, and app
//! provisioning API.
//!
//! The crate keeps per-scenario state (who is acting, against which of two
//! federated servers, and which users and groups were created) and drives the
//! server through a [`Transport`]. Scenarios create fixtures idempotently,
//! assert on the server's answers, and remove everything they created during
//! [`Provisioning::cleanup`].

pub mod config;
pub mod ocs;
pub mod provisioning;
pub mod registry;
pub mod session;
pub mod test_support;
pub mod transport;

pub use config::{ConfigError, ProvisioningConfig};
pub use ocs::{DecodeError, OcsMeta, UserAttributes};
pub use provisioning::{AppFilter, Provisioning, ProvisioningError, UNLIMITED_QUOTA};
pub use registry::{CreatedEntityRegistry, EntityKind};
pub use session::{Accounts, ServerContext, Session, UrlError};
pub use transport::{
    ApiRequest, ApiResponse, Credentials, HttpTransport, Method, Transport, TransportError,
};
