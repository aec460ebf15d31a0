//! BDD scenarios for provisioning steps against the in-memory server.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisioningWorld, provisioning_world};

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Add a new user to a group"
)]
fn scenario_add_user_to_group(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Fixture steps tolerate entities that already exist"
)]
fn scenario_tolerate_existing(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Users created with a password log in with it"
)]
fn scenario_login_with_password(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Delete a user through the administrator"
)]
fn scenario_delete_user(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Disable and enable a user"
)]
fn scenario_disable_and_enable(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Grant and revoke subadmin rights"
)]
fn scenario_subadmin_rights(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Quota and attributes of a user"
)]
fn scenario_quota_and_attributes(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Check app state"
)]
fn scenario_app_state(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Listed users must match the table order"
)]
fn scenario_listing_order(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Cleanup removes fixtures from both servers"
)]
fn scenario_cleanup_both_servers(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Cleanup keeps going when a deletion fails"
)]
fn scenario_cleanup_best_effort(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Administrator manages a group and its members"
)]
fn scenario_admin_manages_group(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Fixture steps configure an existing user"
)]
fn scenario_fixture_configures_user(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Fixture deletions tolerate entities that are already gone"
)]
fn scenario_fixture_deletions_idempotent(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Administrator creates entities unconditionally"
)]
fn scenario_admin_creates_unconditionally(provisioning_world: ProvisioningWorld) {
    provisioning_world.finish();
}
