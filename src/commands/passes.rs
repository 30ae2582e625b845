use clap::ArgMatches;
use colored::*;

use super::{print_json, CommandStatus, GlobalArgs};
use crate::config::OutputFormat;
use crate::error::ConsoleResult;
use crate::formatting::print_passes;

pub async fn handle_list_passes(_matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let session = globals.session()?;
    let passes = session.client().list_passes().await?;

    if globals.output_format()? == OutputFormat::Json {
        print_json(&passes)?;
    } else {
        print_passes(&passes);
    }
    Ok(CommandStatus::Done)
}

pub async fn handle_revoke_expired(_matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let session = globals.session()?;
    let result = session.client().revoke_expired_passes().await?;

    if globals.output_format()? == OutputFormat::Json {
        print_json(&result)?;
    } else {
        println!("{}", "Expired passes revoked.".green());
        if !result.is_null() {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(CommandStatus::Done)
}
