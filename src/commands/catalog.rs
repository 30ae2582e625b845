use clap::ArgMatches;

use super::{print_json, CommandStatus, GlobalArgs};
use crate::config::OutputFormat;
use crate::error::ConsoleResult;
use crate::formatting::{print_roles, print_teams};

pub async fn handle_teams(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let mut session = globals.session()?;
    if matches.get_flag("refresh") {
        session.invalidate_catalogs();
    }

    let teams = session.teams().await?;
    if globals.output_format()? == OutputFormat::Json {
        print_json(&teams)?;
    } else if teams.is_empty() {
        println!("No teams found.");
    } else {
        println!("Found {} teams:", teams.len());
        print_teams(teams);
    }
    Ok(CommandStatus::Done)
}

pub async fn handle_roles(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let mut session = globals.session()?;
    if matches.get_flag("refresh") {
        session.invalidate_catalogs();
    }

    let roles = session.roles().await?;
    if globals.output_format()? == OutputFormat::Json {
        print_json(&roles)?;
    } else if roles.is_empty() {
        println!("No roles found.");
    } else {
        println!("Found {} roles:", roles.len());
        print_roles(roles);
    }
    Ok(CommandStatus::Done)
}
