use clap::ArgMatches;
use colored::*;

use super::{CommandStatus, GlobalArgs};
use crate::error::ConsoleResult;

pub async fn handle_unlock(_matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let session = globals.session()?;
    session.unlock().await?;
    println!("{}", "✅ Admin unlocked".green());
    Ok(CommandStatus::Done)
}

pub async fn handle_ping(_matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let session = globals.session()?;
    let result = session.client().ping().await?;
    println!("Gateway reachable at {}", session.client().gateway_url());
    if !result.is_null() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(CommandStatus::Done)
}
