use std::process;

use clap::{Arg, ArgAction, ArgMatches, Command};

use revops_cli::commands::{access, auth, catalog, config, passes, CommandStatus, GlobalArgs};
use revops_cli::error::ConsoleResult;
use revops_cli::logging::{init_logging, install_panic_hook, log_error};

fn email_arg() -> Arg {
    Arg::new("email")
        .value_name("EMAIL")
        .help("User email")
        .required(true)
        .index(1)
}

fn team_arg() -> Arg {
    Arg::new("team")
        .long("team")
        .short('t')
        .value_name("TEAM_ID")
        .help("Team ID")
        .required(true)
}

fn refresh_arg() -> Arg {
    Arg::new("refresh")
        .long("refresh")
        .help("Ignore the cached catalog and reload it")
        .action(ArgAction::SetTrue)
}

fn build_cli() -> Command {
    Command::new("revops")
        .about("RevOps access console - grant, inspect and revoke team access through the settings gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("admin-code")
                .long("admin-code")
                .value_name("CODE")
                .help("Admin code forwarded with every call (or REVOPS_ADMIN_CODE)")
                .global(true),
        )
        .arg(
            Arg::new("gateway")
                .long("gateway")
                .value_name("URL")
                .help("Gateway web app URL for this run (overrides saved config)")
                .global(true),
        )
        .arg(
            Arg::new("relay")
                .long("relay")
                .value_name("URL")
                .help("Forwarding relay endpoint")
                .global(true),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("FORMAT")
                .help("Output format: text, json")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Echo log lines to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("unlock").about("Check the admin code against the gateway"))
        .subcommand(Command::new("ping").about("Check that the gateway answers"))
        .subcommand(
            Command::new("config")
                .about("Manage saved settings")
                .subcommand_required(true)
                .subcommand(
                    Command::new("set-gateway")
                        .about("Validate and save the gateway web app URL")
                        .arg(
                            Arg::new("url")
                                .value_name("URL")
                                .help("https://script.google.com/macros/s/.../exec")
                                .required(true)
                                .index(1),
                        ),
                )
                .subcommand(Command::new("show").about("Show saved settings")),
        )
        .subcommand(Command::new("teams").about("List teams").arg(refresh_arg()))
        .subcommand(Command::new("roles").about("List roles").arg(refresh_arg()))
        .subcommand(
            Command::new("inspect")
                .about("Show a user's reconciled membership and the actions it allows")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new("grant")
                .about("Grant a team to a user")
                .arg(email_arg())
                .arg(team_arg())
                .arg(
                    Arg::new("role")
                        .long("role")
                        .short('r')
                        .value_name("ROLE_ID")
                        .help("Role to assign with the team"),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .value_name("MODE")
                        .help("primary, secondary or auto (primary when the user has none)")
                        .default_value("auto"),
                )
                .arg(
                    Arg::new("expires-in-hours")
                        .long("expires-in-hours")
                        .value_name("HOURS")
                        .help("Make a secondary grant temporary"),
                ),
        )
        .subcommand(
            Command::new("assign-role")
                .about("Assign a role without changing teams")
                .arg(email_arg())
                .arg(
                    Arg::new("role")
                        .long("role")
                        .short('r')
                        .value_name("ROLE_ID")
                        .help("Role ID")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("revoke")
                .about("Remove a team from a user, restoring roles the removal drops")
                .arg(email_arg())
                .arg(team_arg()),
        )
        .subcommand(
            Command::new("passes")
                .about("Temporary access passes")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List passes"))
                .subcommand(Command::new("revoke-expired").about("Revoke every expired pass")),
        )
}

async fn dispatch(matches: &ArgMatches, globals: &GlobalArgs) -> ConsoleResult<CommandStatus> {
    match matches.subcommand() {
        Some(("unlock", sub)) => auth::handle_unlock(sub, globals).await,
        Some(("ping", sub)) => auth::handle_ping(sub, globals).await,
        Some(("config", sub)) => match sub.subcommand() {
            Some(("set-gateway", m)) => config::handle_set_gateway(m, globals),
            Some(("show", m)) => config::handle_show(m, globals),
            _ => {
                eprintln!("Unknown config subcommand. Use 'revops config --help' for available options.");
                process::exit(1);
            }
        },
        Some(("teams", sub)) => catalog::handle_teams(sub, globals).await,
        Some(("roles", sub)) => catalog::handle_roles(sub, globals).await,
        Some(("inspect", sub)) => access::handle_inspect(sub, globals).await,
        Some(("grant", sub)) => access::handle_grant(sub, globals).await,
        Some(("assign-role", sub)) => access::handle_assign_role(sub, globals).await,
        Some(("revoke", sub)) => access::handle_revoke(sub, globals).await,
        Some(("passes", sub)) => match sub.subcommand() {
            Some(("list", m)) => passes::handle_list_passes(m, globals).await,
            Some(("revoke-expired", m)) => passes::handle_revoke_expired(m, globals).await,
            _ => {
                eprintln!("Unknown passes subcommand. Use 'revops passes --help' for available options.");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Unknown command. Use 'revops --help' for available commands.");
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = init_logging(matches.get_flag("verbose")) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    install_panic_hook();

    let result = match GlobalArgs::from_matches(&matches) {
        Ok(globals) => dispatch(&matches, &globals).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(CommandStatus::Done) => {}
        Ok(CommandStatus::Incomplete) => process::exit(2),
        Err(e) => {
            log_error(&e.to_string());
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_globals_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["revops", "grant", "a@x.com", "--team", "T1", "--admin-code", "c", "-f", "json"])
            .unwrap();
        let globals = GlobalArgs::from_matches(&matches).unwrap();
        assert_eq!(globals.admin_code.as_deref(), Some("c"));
        assert_eq!(globals.format, Some(revops_cli::config::OutputFormat::Json));

        let (_, grant) = matches.subcommand().unwrap();
        assert_eq!(grant.get_one::<String>("mode").map(String::as_str), Some("auto"));
    }
}
