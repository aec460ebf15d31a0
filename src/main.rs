//! Binary entry point for the `ocs-provision` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use ocs_provisioning::{
    AppFilter, ConfigError, DecodeError, Provisioning, ProvisioningConfig, ProvisioningError,
    Transport, ocs,
};

mod cli;

use cli::{AppState, Cli, Command};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let exit_code = match run(cli.command) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing(debug: bool) {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(io::stderr)
        .with_max_level(if debug { Level::DEBUG } else { Level::WARN })
        .finish();
    // A subscriber installed by an embedding test harness takes precedence.
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run(command: Command) -> Result<(), CliError> {
    let config = ProvisioningConfig::load_without_cli_args()?;
    config.validate()?;
    let mut steps = Provisioning::connect(&config)?;
    execute(&mut steps, command, &mut io::stdout())
}

fn execute<T: Transport>(
    steps: &mut Provisioning<T>,
    command: Command,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::CreateUser { user, password } => {
            match password {
                Some(secret) => steps.user_has_been_created_with_password(&user, &secret)?,
                None => steps.user_has_been_created(&user)?,
            }
            writeln!(out, "user {user} exists")?;
        }
        Command::DeleteUser { user } => {
            steps.user_has_been_deleted(&user)?;
            writeln!(out, "user {user} does not exist")?;
        }
        Command::CreateGroup { group } => {
            steps.group_has_been_created(&group)?;
            writeln!(out, "group {group} exists")?;
        }
        Command::DeleteGroup { group } => {
            steps.group_has_been_deleted(&group)?;
            writeln!(out, "group {group} does not exist")?;
        }
        Command::AddToGroup { user, group } => {
            steps.user_has_been_added_to_group(&user, &group)?;
            writeln!(out, "user {user} belongs to group {group}")?;
        }
        Command::RemoveFromGroup { user, group } => {
            steps.admin_removes_user_from_group(&user, &group)?;
            writeln!(out, "user {user} does not belong to group {group}")?;
        }
        Command::MakeSubadmin { user, group } => {
            steps.admin_makes_user_subadmin_of_group(&user, &group)?;
            writeln!(out, "user {user} is a subadmin of group {group}")?;
        }
        Command::DisableUser { user } => {
            steps.admin_disables_user(&user)?;
            writeln!(out, "user {user} is disabled")?;
        }
        Command::EnableUser { user } => {
            steps.admin_enables_user(&user)?;
            writeln!(out, "user {user} is enabled")?;
        }
        Command::SetQuota { user, quota } => {
            steps.admin_sets_user_quota(&user, &quota)?;
            writeln!(out, "user {user} has quota {quota}")?;
        }
        Command::UserInfo { user } => {
            steps.admin_gets_user_info(&user)?;
            let attributes = ocs::parse_user_attributes(successful_body(steps)?)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&attributes)?)?;
        }
        Command::ListUsers => {
            steps.admin_lists_users()?;
            print_list(out, &ocs::parse_users(successful_body(steps)?)?)?;
        }
        Command::ListGroups => {
            steps.admin_lists_groups()?;
            print_list(out, &ocs::parse_groups(successful_body(steps)?)?)?;
        }
        Command::ListApps { filter } => {
            steps.admin_lists_apps(filter.map(app_filter))?;
            print_list(out, &ocs::parse_apps(successful_body(steps)?)?)?;
        }
    }
    Ok(())
}

const fn app_filter(state: AppState) -> AppFilter {
    match state {
        AppState::Enabled => AppFilter::Enabled,
        AppState::Disabled => AppFilter::Disabled,
    }
}

fn successful_body<T: Transport>(steps: &Provisioning<T>) -> Result<&str, CliError> {
    steps.the_http_status_code_should_be(200)?;
    Ok(steps
        .last_response()
        .map_or("", |response| response.body.as_str()))
}

fn print_list(out: &mut impl Write, items: &[String]) -> Result<(), CliError> {
    writeln!(out, "{}", serde_json::to_string_pretty(items)?)?;
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
