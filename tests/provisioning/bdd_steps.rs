//! BDD step definitions for provisioning behaviour.

use ocs_provisioning::{AppFilter, ProvisioningError, ServerContext};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{ProvisioningWorld, server_named};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("user \"{user}\" has been created")]
fn user_has_been_created(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_has_been_created(&user))?)
}

#[given("user \"{user}\" has been created with password \"{password}\"")]
fn user_has_been_created_with_password(
    provisioning_world: &ProvisioningWorld,
    user: String,
    password: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_has_been_created_with_password(&user, &password))?)
}

#[given("group \"{group}\" has been created")]
fn group_has_been_created(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.group_has_been_created(&group))?)
}

#[given("user \"{user}\" has been added to group \"{group}\"")]
fn user_has_been_added_to_group(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_has_been_added_to_group(&user, &group))?)
}

#[given("user \"{user}\" has been deleted")]
fn user_has_been_deleted(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_has_been_deleted(&user))?)
}

#[given("group \"{group}\" has been deleted")]
fn group_has_been_deleted(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.group_has_been_deleted(&group))?)
}

#[given("user \"{user}\" has been made a subadmin of group \"{group}\"")]
fn user_has_been_made_subadmin(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_makes_user_subadmin_of_group(&user, &group))?)
}

#[given("user \"{user}\" has been disabled")]
fn user_has_been_disabled(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_disables_user(&user))?)
}

#[given("the quota of user \"{user}\" has been set to \"{quota}\"")]
fn quota_has_been_set(
    provisioning_world: &ProvisioningWorld,
    user: String,
    quota: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_sets_user_quota(&user, &quota))?)
}

#[given("user \"{user}\" has been given unlimited quota")]
fn user_has_been_given_unlimited_quota(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_gives_unlimited_quota(&user))?)
}

#[given("the server already has user \"{user}\"")]
fn server_already_has_user(provisioning_world: &ProvisioningWorld, user: String) {
    provisioning_world
        .server
        .seed_user(ServerContext::Local, &user, "123456");
}

#[given("the server already has group \"{group}\"")]
fn server_already_has_group(provisioning_world: &ProvisioningWorld, group: String) {
    provisioning_world
        .server
        .seed_group(ServerContext::Local, &group);
}

#[given("using the remote server")]
fn using_remote_server(provisioning_world: &ProvisioningWorld) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.use_server(ServerContext::Remote))?)
}

#[given("the server refuses to delete \"{name}\"")]
fn server_refuses_delete(provisioning_world: &ProvisioningWorld, name: String) {
    provisioning_world.server.fail_deletes_of(&name);
}

#[when("the administrator creates the user \"{user}\" using the API")]
fn admin_creates_user(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_creates_user(&user))?)
}

#[when("the administrator creates group \"{group}\" using the API")]
fn admin_creates_group(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_creates_group(&group))?)
}

#[when("the administrator deletes group \"{group}\" using the API")]
fn admin_deletes_group(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_deletes_group(&group))?)
}

#[when("the administrator adds user \"{user}\" to group \"{group}\" using the API")]
fn admin_adds_user_to_group(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_adds_user_to_group(&user, &group))?)
}

#[when("the administrator removes user \"{user}\" from group \"{group}\" using the API")]
fn admin_removes_user_from_group(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_removes_user_from_group(&user, &group))?)
}

#[when("the administrator sets the quota of user \"{user}\" to \"{quota}\" using the API")]
fn admin_sets_user_quota(
    provisioning_world: &ProvisioningWorld,
    user: String,
    quota: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_sets_user_quota(&user, &quota))?)
}

#[when("the administrator deletes user \"{user}\" using the API")]
fn admin_deletes_user(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_deletes_user(&user))?)
}

#[when("the administrator disables user \"{user}\" using the API")]
fn admin_disables_user(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_disables_user(&user))?)
}

#[when("the administrator enables user \"{user}\" using the API")]
fn admin_enables_user(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_enables_user(&user))?)
}

#[when("the administrator makes user \"{user}\" a subadmin of group \"{group}\" using the API")]
fn admin_makes_subadmin(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_makes_user_subadmin_of_group(&user, &group))?)
}

#[when("the administrator makes user \"{user}\" not a subadmin of group \"{group}\" using the API")]
fn admin_revokes_subadmin(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world
        .run(|steps| steps.admin_makes_user_not_subadmin_of_group(&user, &group))?)
}

#[when("the administrator gives unlimited quota to user \"{user}\" using the API")]
fn admin_gives_unlimited_quota(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_gives_unlimited_quota(&user))?)
}

#[when("the administrator gets the info of user \"{user}\" using the API")]
fn admin_gets_user_info(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_gets_user_info(&user))?)
}

#[when("the administrator lists the users using the API")]
fn admin_lists_users(provisioning_world: &ProvisioningWorld) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_users())?)
}

#[when("the administrator lists the groups using the API")]
fn admin_lists_groups(provisioning_world: &ProvisioningWorld) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_groups())?)
}

#[when("the administrator lists the users of group \"{group}\" using the API")]
fn admin_lists_users_of_group(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_users_of_group(&group))?)
}

#[when("the administrator lists the subadmin groups of user \"{user}\" using the API")]
fn admin_lists_subadmin_groups_of_user(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_subadmin_groups_of_user(&user))?)
}

#[when("the administrator lists the groups of user \"{user}\" using the API")]
fn admin_lists_groups_of_user(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_groups_of_user(&user))?)
}

#[when("the administrator lists the subadmins of group \"{group}\" using the API")]
fn admin_lists_subadmins_of_group(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_subadmins_of_group(&group))?)
}

#[when("the administrator lists the apps using the API")]
fn admin_lists_apps(provisioning_world: &ProvisioningWorld) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.admin_lists_apps(None::<AppFilter>))?)
}

#[when("the scenario cleanup runs")]
fn scenario_cleanup_runs(provisioning_world: &ProvisioningWorld) {
    let outcome = provisioning_world.run(|steps| steps.cleanup());
    *provisioning_world.cleanup_outcome.borrow_mut() = Some(outcome);
}

#[then("user \"{user}\" should exist")]
fn user_should_exist(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_exist(&user))?)
}

#[then("user \"{user}\" should not exist")]
fn user_should_not_exist(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_not_exist(&user))?)
}

#[then("group \"{group}\" should exist")]
fn group_should_exist(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.group_should_exist(&group))?)
}

#[then("group \"{group}\" should not exist")]
fn group_should_not_exist(
    provisioning_world: &ProvisioningWorld,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.group_should_not_exist(&group))?)
}

#[then("user \"{user}\" should belong to group \"{group}\"")]
fn user_should_belong_to_group(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_belong_to_group(&user, &group))?)
}

#[then("user \"{user}\" should not belong to group \"{group}\"")]
fn user_should_not_belong_to_group(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_not_belong_to_group(&user, &group))?)
}

#[then("user \"{user}\" should be disabled")]
fn user_should_be_disabled(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_be_disabled(&user))?)
}

#[then("user \"{user}\" should be enabled")]
fn user_should_be_enabled(
    provisioning_world: &ProvisioningWorld,
    user: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_be_enabled(&user))?)
}

#[then("user \"{user}\" should be a subadmin of group \"{group}\"")]
fn user_should_be_subadmin(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.user_should_be_subadmin_of_group(&user, &group))?)
}

#[then("user \"{user}\" should not be a subadmin of group \"{group}\"")]
fn user_should_not_be_subadmin(
    provisioning_world: &ProvisioningWorld,
    user: String,
    group: String,
) -> Result<(), StepError> {
    Ok(provisioning_world
        .run(|steps| steps.user_should_not_be_subadmin_of_group(&user, &group))?)
}

#[then("app \"{app}\" should be enabled")]
fn app_should_be_enabled(
    provisioning_world: &ProvisioningWorld,
    app: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.app_should_be_enabled(&app))?)
}

#[then("app \"{app}\" should be disabled")]
fn app_should_be_disabled(
    provisioning_world: &ProvisioningWorld,
    app: String,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.app_should_be_disabled(&app))?)
}

#[then("the users returned by the API should be")]
fn users_should_be(
    provisioning_world: &ProvisioningWorld,
    datatable: Vec<Vec<String>>,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_users_should_be(&datatable))?)
}

#[then("the groups returned by the API should be")]
fn groups_should_be(
    provisioning_world: &ProvisioningWorld,
    datatable: Vec<Vec<String>>,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_groups_should_be(&datatable))?)
}

#[then("the subadmin groups returned by the API should be")]
fn subadmin_groups_should_be(
    provisioning_world: &ProvisioningWorld,
    datatable: Vec<Vec<String>>,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_subadmin_groups_should_be(&datatable))?)
}

#[then("the subadmin users returned by the API should be")]
fn subadmin_users_should_be(
    provisioning_world: &ProvisioningWorld,
    datatable: Vec<Vec<String>>,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_subadmin_users_should_be(&datatable))?)
}

#[then("the apps returned by the API should include")]
fn apps_should_include(
    provisioning_world: &ProvisioningWorld,
    datatable: Vec<Vec<String>>,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_apps_should_include(&datatable))?)
}

#[then("the user attributes returned by the API should include")]
fn user_attributes_should_include(
    provisioning_world: &ProvisioningWorld,
    datatable: Vec<Vec<String>>,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.check_user_attributes(&datatable))?)
}

#[then("the HTTP status code should be \"{code}\"")]
fn http_status_code_should_be(
    provisioning_world: &ProvisioningWorld,
    code: u16,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_http_status_code_should_be(code))?)
}

#[then("the OCS status code should be \"{code}\"")]
fn ocs_status_code_should_be(
    provisioning_world: &ProvisioningWorld,
    code: u16,
) -> Result<(), StepError> {
    Ok(provisioning_world.run(|steps| steps.the_ocs_status_code_should_be(code))?)
}

#[then("listing the users as \"{first}\", \"{second}\" fails")]
fn listing_in_other_order_fails(
    provisioning_world: &ProvisioningWorld,
    first: String,
    second: String,
) -> Result<(), StepError> {
    let table = vec![vec![first], vec![second]];
    match provisioning_world.run(|steps| steps.the_users_should_be(&table)) {
        Err(ProvisioningError::Assertion(_)) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an order mismatch, got {other:?}"
        ))),
    }
}

#[then("the last login used password \"{password}\"")]
fn last_login_used_password(
    provisioning_world: &ProvisioningWorld,
    password: String,
) -> Result<(), StepError> {
    let admin = provisioning_world.run(|steps| Ok(steps.accounts().admin_username().to_owned()))?;
    let login = provisioning_world
        .server
        .requests()
        .into_iter()
        .rev()
        .filter_map(|request| request.credentials)
        .find(|credentials| credentials.username != admin)
        .ok_or_else(|| StepError::Assertion(String::from("no request from a regular user")))?;
    if login.password == password {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "user {} logged in with a different password",
            login.username
        )))
    }
}

#[then("cleanup succeeds")]
fn cleanup_succeeds(provisioning_world: &ProvisioningWorld) -> Result<(), StepError> {
    match provisioning_world.cleanup_outcome.borrow().as_ref() {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(StepError::Assertion(format!("cleanup failed: {err}"))),
        None => Err(StepError::Assertion(String::from("cleanup did not run"))),
    }
}

#[then("cleanup reports a failure for \"{name}\"")]
fn cleanup_reports_failure(
    provisioning_world: &ProvisioningWorld,
    name: String,
) -> Result<(), StepError> {
    match provisioning_world.cleanup_outcome.borrow().as_ref() {
        Some(Err(ProvisioningError::CleanupIncomplete { failures }))
            if failures.len() == 1 && failures.iter().all(|failure| failure.contains(&name)) =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected one cleanup failure for {name}, got {other:?}"
        ))),
    }
}

#[then("the {server} server has no user \"{user}\"")]
fn server_has_no_user(
    provisioning_world: &ProvisioningWorld,
    server: String,
    user: String,
) -> Result<(), StepError> {
    let context = server_named(&server)
        .ok_or_else(|| StepError::Assertion(format!("unknown server {server}")))?;
    if provisioning_world.server.has_user(context, &user) {
        return Err(StepError::Assertion(format!("{server} server still has user {user}")));
    }
    Ok(())
}

#[then("the {server} server has no group \"{group}\"")]
fn server_has_no_group(
    provisioning_world: &ProvisioningWorld,
    server: String,
    group: String,
) -> Result<(), StepError> {
    let context = server_named(&server)
        .ok_or_else(|| StepError::Assertion(format!("unknown server {server}")))?;
    if provisioning_world.server.has_group(context, &group) {
        return Err(StepError::Assertion(format!("{server} server still has group {group}")));
    }
    Ok(())
}
