use colored::*;

use crate::client::RelayTransport;
use crate::controller::{ActionReport, AllowedActions, InspectReport};
use crate::orchestrator::{Attempt, MutationOutcome, OperationStatus, WorkflowOutcome};
use crate::reconcile::{MembershipDiff, MembershipRecord, VerificationResult};
use crate::session::Session;

use super::utils::{format_id_set, format_status, yes_no};

const NOT_REPORTED: &str = "not reported";

pub fn print_membership<T: RelayTransport>(record: &MembershipRecord, session: &Session<T>) {
    println!("{} {}", "User:".bold(), record.email);
    if let Some(id) = &record.user_id {
        println!("  {} {}", "ID:".dimmed(), id);
    }

    let primary = record
        .primary_team_id
        .as_deref()
        .map(|id| session.team_label(id).cyan())
        .unwrap_or_else(|| empty_label(record.observed.primary_team));
    println!("  {:<16} {}", "Primary team:", primary);

    if record.secondary_team_ids.is_empty() {
        println!("  {:<16} {}", "Secondary teams:", empty_label(record.observed.secondary_teams));
    } else {
        println!("  {:<16}", "Secondary teams:");
        for team in &record.secondary_team_ids {
            println!("    - {}", session.team_label(team).cyan());
        }
    }

    if record.role_ids.is_empty() {
        println!("  {:<16} {}", "Roles:", empty_label(record.observed.roles));
    } else {
        println!("  {:<16}", "Roles:");
        for role in &record.role_ids {
            println!("    - {}", session.role_label(role).magenta());
        }
    }
}

fn empty_label(observed: bool) -> ColoredString {
    if observed {
        "none".dimmed()
    } else {
        NOT_REPORTED.yellow()
    }
}

pub fn print_inspect_report<T: RelayTransport>(report: &InspectReport, session: &Session<T>) {
    print_membership(&report.record, session);
    println!(
        "  {:<16} primary {}  secondary {}  roles {}",
        "Flags:",
        yes_no(report.flags.has_primary),
        yes_no(report.flags.has_secondary),
        yes_no(report.flags.has_roles)
    );
    print_allowed(&report.allowed);
}

fn print_allowed(allowed: &AllowedActions) {
    let mut actions = Vec::new();
    if allowed.grant_primary {
        actions.push("grant --mode primary");
    }
    if allowed.grant_secondary {
        actions.push("grant --mode secondary");
    }
    if allowed.revoke {
        actions.push("revoke");
    }
    if allowed.assign_role_only {
        actions.push("assign-role");
    }
    let text = if actions.is_empty() {
        "none".dimmed().to_string()
    } else {
        actions.join(", ").green().to_string()
    };
    println!("  {:<16} {}", "Available:", text);
}

pub fn print_action_report<T: RelayTransport>(report: &ActionReport, session: &Session<T>) {
    let status = report.status();
    println!("{} {:?} for {}", format_status(&status), report.mode, report.before.email);

    match &report.outcome {
        WorkflowOutcome::GrantSecondary(outcome) => {
            print_mutation("Team grant", &outcome.team);
            if let Some(persisted) = outcome.role_persisted {
                println!("  {:<20} {}", "Role persisted:", yes_no(persisted));
            }
        }
        WorkflowOutcome::GrantPrimary(outcome) => {
            print_mutation("Primary team", &outcome.team);
            if let Some(role) = &outcome.role_assignment {
                print_mutation("Role assignment", role);
            }
        }
        WorkflowOutcome::AssignRole(outcome) => print_mutation("Role assignment", outcome),
        WorkflowOutcome::Revoke(outcome) => {
            print_mutation("Team removal", &outcome.removal);
            println!(
                "  {:<20} {} -> {}",
                "Roles:",
                format_id_set(&outcome.roles_before),
                format_id_set(&outcome.roles_after_removal)
            );
            match &outcome.restore {
                Some(restore) => print_mutation("Role restore", restore),
                None => println!("  {:<20} {}", "Role restore:", "not needed".dimmed()),
            }
        }
    }

    if let Some(diff) = &report.diff {
        print_diff(diff);
    }

    match &status {
        OperationStatus::PartialSuccess { remediation } => {
            println!("{} {}", "Manual step required:".yellow().bold(), remediation);
        }
        OperationStatus::Failure => {
            println!("{}", "Nothing was confirmed. Check the attempts above.".red());
        }
        OperationStatus::Success => {}
    }

    if let Some(refreshed) = &report.refreshed {
        println!();
        print_inspect_report(refreshed, session);
    }
}

fn print_mutation(label: &str, outcome: &MutationOutcome) {
    let result = if outcome.succeeded { "verified".green() } else { "not verified".red() };
    println!("  {:<20} {}", format!("{}:", label), result);

    if outcome.attempts.is_empty() && outcome.succeeded {
        println!("    {}", "already in place, nothing sent".dimmed());
    }
    for (i, attempt) in outcome.attempts.iter().enumerate() {
        print_attempt(i + 1, attempt);
    }
    if let Some(verification) = &outcome.verification {
        print_verification(verification);
    }
}

fn print_attempt(n: usize, attempt: &Attempt) {
    let mark = if attempt.verified { "✓".green() } else { "✗".red() };
    match &attempt.error {
        Some(error) => println!("    {} {}. {} - {}", mark, n, attempt.approach, error.dimmed()),
        None => println!("    {} {}. {}", mark, n, attempt.approach),
    }
}

fn print_verification(verification: &VerificationResult) {
    println!(
        "    {} primary {}, secondary [{}], roles [{}]",
        "read back:".dimmed(),
        verification.actual_primary_team_id.as_deref().unwrap_or("none"),
        format_id_set(&verification.actual_secondary_team_ids),
        format_id_set(&verification.actual_role_ids)
    );
}

fn print_diff(diff: &MembershipDiff) {
    if diff.is_empty() {
        println!("  {:<20} {}", "Changes:", "none".dimmed());
        return;
    }
    println!("  {:<20}", "Changes:");
    for team in &diff.teams_added {
        println!("    {} team {}", "+".green(), team);
    }
    for team in &diff.teams_removed {
        println!("    {} team {}", "-".red(), team);
    }
    for role in &diff.roles_added {
        println!("    {} role {}", "+".green(), role);
    }
    for role in &diff.roles_removed {
        println!("    {} role {}", "-".red(), role);
    }
}
