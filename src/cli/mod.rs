//! Command-line interface definitions for the `ocs-provision` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI for the `ocs-provision` binary.
#[derive(Debug, Parser)]
#[command(
    name = "ocs-provision",
    about = "Create, inspect, and remove users, groups, and apps on an OCS server",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Log every request and response at debug level.
    #[arg(long, global = true)]
    pub(crate) debug: bool,
    /// Operation to run against the configured server.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Operations exposed by `ocs-provision`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Create a user unless it already exists.
    CreateUser {
        /// Login name of the user.
        user: String,
        /// Password to create the user with instead of the default.
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user if it exists.
    DeleteUser {
        /// Login name of the user.
        user: String,
    },
    /// Create a group unless it already exists.
    CreateGroup {
        /// Name of the group.
        group: String,
    },
    /// Delete a group if it exists.
    DeleteGroup {
        /// Name of the group.
        group: String,
    },
    /// Add a user to a group unless already a member.
    AddToGroup {
        /// Login name of the user.
        user: String,
        /// Name of the group.
        group: String,
    },
    /// Remove a user from a group.
    RemoveFromGroup {
        /// Login name of the user.
        user: String,
        /// Name of the group.
        group: String,
    },
    /// Grant a user subadmin rights over a group.
    MakeSubadmin {
        /// Login name of the user.
        user: String,
        /// Name of the group.
        group: String,
    },
    /// Disable a user.
    DisableUser {
        /// Login name of the user.
        user: String,
    },
    /// Enable a user.
    EnableUser {
        /// Login name of the user.
        user: String,
    },
    /// Set a user's quota; `none` lifts the limit.
    SetQuota {
        /// Login name of the user.
        user: String,
        /// Quota such as `1 GB` or `none`.
        quota: String,
    },
    /// Print a user's attributes as JSON.
    UserInfo {
        /// Login name of the user.
        user: String,
    },
    /// Print all users as JSON.
    ListUsers,
    /// Print all groups as JSON.
    ListGroups,
    /// Print apps as JSON.
    ListApps {
        /// Restrict the listing to enabled or disabled apps.
        #[arg(long, value_enum)]
        filter: Option<AppState>,
    },
}

/// App state accepted by `list-apps --filter`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum AppState {
    /// Enabled apps only.
    Enabled,
    /// Disabled apps only.
    Disabled,
}
