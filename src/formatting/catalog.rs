use colored::*;
use serde_json::Value;

use crate::models::{Role, Team};
use super::utils::truncate;

pub fn print_teams(teams: &[Team]) {
    for team in teams {
        let name = if team.name.is_empty() { "(no name)" } else { team.name.as_str() };
        println!("  {:<36} {}", team.id.cyan(), truncate(name, 60));
    }
}

pub fn print_roles(roles: &[Role]) {
    for role in roles {
        let name = if role.name.is_empty() { "(no name)" } else { role.name.as_str() };
        let marker = if role.requires_super_admin {
            " [super admin]".red().to_string()
        } else {
            String::new()
        };
        println!("  {:<36} {}{}", role.id.cyan(), truncate(name, 60), marker);
    }
}

/// Passes are shown as returned; only the common fields get columns.
pub fn print_passes(result: &Value) {
    let passes: &[Value] = match result {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("passes") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
                return;
            }
        },
        _ => &[],
    };

    if passes.is_empty() {
        println!("{}", "No active passes.".dimmed());
        return;
    }

    println!("Found {} passes:", passes.len());
    println!(
        "  {:<32} {:<24} {:<24}",
        "Email".bold(),
        "Team".bold(),
        "Expires".bold()
    );
    for pass in passes {
        let field = |key: &str| pass.get(key).and_then(Value::as_str).unwrap_or("-").to_string();
        let expires = pass
            .get("expiresAt")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "permanent".to_string());
        println!(
            "  {:<32} {:<24} {:<24}",
            truncate(&field("email"), 32),
            truncate(&field("teamId"), 24).cyan(),
            expires
        );
    }
}
