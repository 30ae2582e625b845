use clap::ArgMatches;
use colored::*;

use super::{CommandStatus, GlobalArgs};
use crate::config::{config_path, load_config, save_config};
use crate::error::{ConsoleError, ConsoleResult};

pub fn handle_set_gateway(matches: &ArgMatches, _globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let url = matches
        .get_one::<String>("url")
        .ok_or_else(|| ConsoleError::InvalidInput("Gateway URL is required".to_string()))?;

    let mut config = load_config()?;
    config.set_gateway_url(url)?;
    save_config(&config)?;

    println!("{} {}", "Saved gateway URL:".green(), config.gateway_url.unwrap_or_default());
    Ok(CommandStatus::Done)
}

pub fn handle_show(_matches: &ArgMatches, _globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    let config = load_config()?.with_env_overrides();

    println!("{} {}", "Config file:".bold(), config_path()?.display());
    println!(
        "  {:<16} {}",
        "Gateway URL:",
        config.gateway_url.as_deref().unwrap_or("(not set)")
    );
    println!("  {:<16} {}", "Relay URL:", config.relay_url);
    println!(
        "  {:<16} {}",
        "Default role:",
        config.default_role_id.as_deref().unwrap_or("(none)")
    );
    println!("  {:<16} {}s", "Timeout:", config.timeout_secs);
    Ok(CommandStatus::Done)
}
