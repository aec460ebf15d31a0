//! Bookkeeping of users and groups created during a scenario so cleanup can
//! remove them again.

use std::collections::BTreeSet;
use std::fmt;

use crate::session::ServerContext;

/// Kind of entity tracked for cleanup.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
    /// A user account.
    User,
    /// A group.
    Group,
}

impl EntityKind {
    /// Returns the API collection the entity lives under.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// Created users and groups, partitioned by server context.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreatedEntityRegistry {
    users_local: BTreeSet<String>,
    users_remote: BTreeSet<String>,
    groups_local: BTreeSet<String>,
    groups_remote: BTreeSet<String>,
}

impl CreatedEntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn partition(&self, kind: EntityKind, server: ServerContext) -> &BTreeSet<String> {
        match (kind, server) {
            (EntityKind::User, ServerContext::Local) => &self.users_local,
            (EntityKind::User, ServerContext::Remote) => &self.users_remote,
            (EntityKind::Group, ServerContext::Local) => &self.groups_local,
            (EntityKind::Group, ServerContext::Remote) => &self.groups_remote,
        }
    }

    const fn partition_mut(
        &mut self,
        kind: EntityKind,
        server: ServerContext,
    ) -> &mut BTreeSet<String> {
        match (kind, server) {
            (EntityKind::User, ServerContext::Local) => &mut self.users_local,
            (EntityKind::User, ServerContext::Remote) => &mut self.users_remote,
            (EntityKind::Group, ServerContext::Local) => &mut self.groups_local,
            (EntityKind::Group, ServerContext::Remote) => &mut self.groups_remote,
        }
    }

    /// Records `name` as created on `server`. Remembering twice is a no-op.
    pub fn remember(&mut self, kind: EntityKind, server: ServerContext, name: &str) {
        self.partition_mut(kind, server).insert(name.to_owned());
    }

    /// Returns `true` when `name` is tracked for `server`.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, server: ServerContext, name: &str) -> bool {
        self.partition(kind, server).contains(name)
    }

    /// Returns the tracked names for `server`, in name order.
    #[must_use]
    pub fn names(&self, kind: EntityKind, server: ServerContext) -> Vec<String> {
        self.partition(kind, server).iter().cloned().collect()
    }

    /// Removes and returns every tracked name for `server`.
    pub fn drain(&mut self, kind: EntityKind, server: ServerContext) -> Vec<String> {
        std::mem::take(self.partition_mut(kind, server))
            .into_iter()
            .collect()
    }

    /// Returns `true` when all four partitions are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users_local.is_empty()
            && self.users_remote.is_empty()
            && self.groups_local.is_empty()
            && self.groups_remote.is_empty()
    }
}
