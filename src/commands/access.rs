use clap::ArgMatches;

use super::{print_json, CommandStatus, GlobalArgs};
use crate::client::HttpRelay;
use crate::config::{load_config, OutputFormat};
use crate::controller::{suggest_grant_mode, ActionController, ActionReport, Intent, Mode};
use crate::error::{ConsoleError, ConsoleResult};
use crate::formatting::{print_action_report, print_inspect_report};
use crate::logging::log_warn;
use crate::orchestrator::OperationStatus;
use crate::session::Session;

pub async fn handle_inspect(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let email = required(matches, "email")?;
    let mut controller = ActionController::new(globals.session()?);

    let report = controller.inspect(&email, false).await?;
    if globals.output_format()? == OutputFormat::Json {
        print_json(&report)?;
    } else {
        load_labels(controller.session_mut()).await;
        print_inspect_report(&report, controller.session());
    }
    Ok(CommandStatus::Done)
}

pub async fn handle_grant(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let email = required(matches, "email")?;
    let team = required(matches, "team")?;
    let role = matches
        .get_one::<String>("role")
        .cloned()
        .or(load_config()?.default_role_id);
    let expires = matches
        .get_one::<String>("expires-in-hours")
        .map(|h| {
            h.parse::<u32>()
                .map_err(|_| ConsoleError::InvalidInput(format!("'{}' is not a number of hours", h)))
        })
        .transpose()?;

    let mut controller = ActionController::new(globals.session()?);

    let mode = match matches.get_one::<String>("mode").map(String::as_str) {
        None | Some("auto") => suggest_grant_mode(&controller.inspect(&email, role.is_some()).await?),
        Some(other) => other.parse::<Mode>()?,
    };
    if mode != Mode::Primary && mode != Mode::Secondary {
        return Err(ConsoleError::InvalidInput("grant --mode must be primary, secondary or auto".to_string()));
    }

    let intent = Intent::new(email, mode)
        .team(team)
        .role(role)
        .expires_in_hours(expires);
    run(&mut controller, intent, globals).await
}

pub async fn handle_assign_role(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let email = required(matches, "email")?;
    let role = required(matches, "role")?;

    let mut controller = ActionController::new(globals.session()?);
    run(&mut controller, Intent::new(email, Mode::RoleOnly).role(Some(role)), globals).await
}

pub async fn handle_revoke(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let email = required(matches, "email")?;
    let team = required(matches, "team")?;

    let mut controller = ActionController::new(globals.session()?);
    run(&mut controller, Intent::new(email, Mode::Revoke).team(team), globals).await
}

async fn run(
    controller: &mut ActionController<HttpRelay>,
    intent: Intent,
    globals: &GlobalArgs,
) -> ConsoleResult<CommandStatus> {
    // The role catalog also decides the super-admin flag sent with role writes.
    load_labels(controller.session_mut()).await;
    let report = controller.execute(intent).await?;
    render(controller, &report, globals)?;

    Ok(match report.status() {
        OperationStatus::Success => CommandStatus::Done,
        _ => CommandStatus::Incomplete,
    })
}

fn render(
    controller: &ActionController<HttpRelay>,
    report: &ActionReport,
    globals: &GlobalArgs,
) -> ConsoleResult<()> {
    if globals.output_format()? == OutputFormat::Json {
        return print_json(report);
    }
    print_action_report(report, controller.session());
    Ok(())
}

// Names are nice to have; ids are shown when the catalogs cannot be loaded.
async fn load_labels(session: &mut Session<HttpRelay>) {
    if let Err(e) = session.teams().await {
        log_warn(&format!("team labels unavailable: {}", e));
    }
    if let Err(e) = session.roles().await {
        log_warn(&format!("role labels unavailable: {}", e));
    }
}

fn required(matches: &ArgMatches, name: &str) -> ConsoleResult<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| ConsoleError::InvalidInput(format!("--{} is required", name)))
}
