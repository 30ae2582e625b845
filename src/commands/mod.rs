pub mod access;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod passes;

use clap::ArgMatches;
use serde::Serialize;

use crate::client::HttpRelay;
use crate::config::{load_config, OutputFormat};
use crate::error::ConsoleResult;
use crate::session::{Session, SessionBuilder};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub admin_code: Option<String>,
    pub gateway_url: Option<String>,
    pub relay_url: Option<String>,
    pub format: Option<OutputFormat>,
}

impl GlobalArgs {
    pub fn from_matches(matches: &ArgMatches) -> ConsoleResult<Self> {
        let format = matches
            .get_one::<String>("format")
            .map(|f| f.parse::<OutputFormat>())
            .transpose()?;

        Ok(GlobalArgs {
            admin_code: matches.get_one::<String>("admin-code").cloned(),
            gateway_url: matches.get_one::<String>("gateway").cloned(),
            relay_url: matches.get_one::<String>("relay").cloned(),
            format,
        })
    }

    pub fn session(&self) -> ConsoleResult<Session<HttpRelay>> {
        let config = load_config()?.with_env_overrides();
        SessionBuilder::new()
            .with_config(config)
            .with_gateway_url(self.gateway_url.clone())
            .with_relay_url(self.relay_url.clone())
            .with_admin_code(self.admin_code.clone())
            .build()
    }

    pub fn output_format(&self) -> ConsoleResult<OutputFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => Ok(load_config()?.output_format),
        }
    }
}

/// Whether the command finished cleanly or left something for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Done,
    Incomplete,
}

pub fn print_json<S: Serialize>(value: &S) -> ConsoleResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
