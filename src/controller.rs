use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::client::RelayTransport;
use crate::error::{ConsoleError, ConsoleResult};
use crate::logging::{log_info, log_warn};
use crate::orchestrator::{GrantRequest, OperationStatus, Orchestrator, WorkflowOutcome};
use crate::reconcile::{DerivedFlags, MembershipDiff, MembershipRecord};
use crate::session::Session;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Primary,
    Secondary,
    RoleOnly,
    Revoke,
}

impl FromStr for Mode {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Mode::Primary),
            "secondary" => Ok(Mode::Secondary),
            "role" | "role-only" => Ok(Mode::RoleOnly),
            "revoke" => Ok(Mode::Revoke),
            other => Err(ConsoleError::InvalidInput(format!("Unknown mode '{}'", other))),
        }
    }
}

/// Which actions the current membership permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedActions {
    pub grant_primary: bool,
    pub grant_secondary: bool,
    pub revoke: bool,
    pub assign_role_only: bool,
}

impl AllowedActions {
    pub fn from_record(record: &MembershipRecord, role_selected: bool) -> Self {
        let has_primary = record.flags().has_primary;
        AllowedActions {
            grant_primary: !has_primary,
            grant_secondary: has_primary,
            revoke: has_primary,
            assign_role_only: role_selected,
        }
    }

    pub fn permits(&self, mode: Mode) -> bool {
        match mode {
            Mode::Primary => self.grant_primary,
            Mode::Secondary => self.grant_secondary,
            Mode::RoleOnly => self.assign_role_only,
            Mode::Revoke => self.revoke,
        }
    }
}

/// What the operator asked for.
#[derive(Debug, Clone)]
pub struct Intent {
    pub email: String,
    pub team_id: Option<String>,
    pub role_id: Option<String>,
    pub mode: Mode,
    pub expires_in_hours: Option<u32>,
}

impl Intent {
    pub fn new(email: impl Into<String>, mode: Mode) -> Self {
        Intent {
            email: email.into(),
            team_id: None,
            role_id: None,
            mode,
            expires_in_hours: None,
        }
    }

    pub fn team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn role(mut self, role_id: Option<String>) -> Self {
        self.role_id = role_id;
        self
    }

    pub fn expires_in_hours(mut self, hours: Option<u32>) -> Self {
        self.expires_in_hours = hours;
        self
    }

    /// Trims fields and checks required ones for the mode.
    pub fn validated(self) -> ConsoleResult<Intent> {
        let email = validate_email(&self.email)?;
        let team_id = non_empty(self.team_id);
        let role_id = non_empty(self.role_id);

        if self.mode != Mode::RoleOnly && team_id.is_none() {
            return Err(ConsoleError::InvalidInput("Select a team.".to_string()));
        }
        if self.mode == Mode::RoleOnly && role_id.is_none() {
            return Err(ConsoleError::InvalidInput("Select a role.".to_string()));
        }
        match self.expires_in_hours {
            Some(_) if self.mode != Mode::Secondary => {
                return Err(ConsoleError::InvalidInput(
                    "Expiry only applies to secondary grants.".to_string(),
                ))
            }
            Some(0) => {
                return Err(ConsoleError::InvalidInput(
                    "Expiry must be at least one hour.".to_string(),
                ))
            }
            _ => {}
        }

        Ok(Intent {
            email,
            team_id,
            role_id,
            mode: self.mode,
            expires_in_hours: self.expires_in_hours,
        })
    }
}

pub fn validate_email(email: &str) -> ConsoleResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ConsoleError::InvalidInput("Enter a user email.".to_string()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ConsoleError::InvalidInput(format!("'{}' is not an email address", email)));
    }
    Ok(email.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub record: MembershipRecord,
    pub flags: DerivedFlags,
    pub allowed: AllowedActions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReport {
    pub mode: Mode,
    pub before: MembershipRecord,
    pub outcome: WorkflowOutcome,
    /// The single re-read taken after a mutation that changed something.
    pub refreshed: Option<InspectReport>,
    pub diff: Option<MembershipDiff>,
}

impl ActionReport {
    pub fn status(&self) -> OperationStatus {
        self.outcome.status()
    }
}

/// Turns operator intents into workflows. `execute` takes `&mut self`, so a
/// controller runs at most one workflow at a time.
pub struct ActionController<T: RelayTransport> {
    session: Session<T>,
    orchestrator: Orchestrator,
}

impl<T: RelayTransport> ActionController<T> {
    pub fn new(session: Session<T>) -> Self {
        Self::with_orchestrator(session, Orchestrator::default())
    }

    pub fn with_orchestrator(session: Session<T>, orchestrator: Orchestrator) -> Self {
        Self { session, orchestrator }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub async fn inspect(&self, email: &str, role_selected: bool) -> ConsoleResult<InspectReport> {
        let email = validate_email(email)?;
        let record = self.orchestrator.inspect(&self.session, &email).await?;
        Ok(InspectReport {
            flags: record.flags(),
            allowed: AllowedActions::from_record(&record, role_selected),
            record,
        })
    }

    pub async fn execute(&mut self, intent: Intent) -> ConsoleResult<ActionReport> {
        let intent = intent.validated()?;
        let role_selected = intent.role_id.is_some();

        let before = self.inspect(&intent.email, role_selected).await?;
        if !before.allowed.permits(intent.mode) {
            return Err(ConsoleError::Policy(refusal(intent.mode, &before.record)));
        }

        log_info(&format!("{:?} for {}", intent.mode, intent.email));
        let outcome = self.dispatch(&intent).await?;

        let refreshed = match outcome.status() {
            OperationStatus::Failure => None,
            _ => match self.inspect(&intent.email, role_selected).await {
                Ok(report) => Some(report),
                Err(e) => {
                    log_warn(&format!("refresh after {:?} failed: {}", intent.mode, e));
                    None
                }
            },
        };
        let diff = refreshed.as_ref().map(|r| before.record.diff(&r.record));

        Ok(ActionReport {
            mode: intent.mode,
            before: before.record,
            outcome,
            refreshed,
            diff,
        })
    }

    async fn dispatch(&self, intent: &Intent) -> ConsoleResult<WorkflowOutcome> {
        let team_id = intent.team_id.clone().unwrap_or_default();
        let request = GrantRequest {
            email: intent.email.clone(),
            team_id: team_id.clone(),
            role_id: intent.role_id.clone(),
            expires_in_hours: intent.expires_in_hours,
        };

        let outcome = match intent.mode {
            Mode::Primary => {
                WorkflowOutcome::GrantPrimary(self.orchestrator.grant_primary(&self.session, &request).await?)
            }
            Mode::Secondary => {
                WorkflowOutcome::GrantSecondary(self.orchestrator.grant_secondary(&self.session, &request).await?)
            }
            Mode::RoleOnly => {
                let role = intent.role_id.as_deref().unwrap_or_default();
                WorkflowOutcome::AssignRole(
                    self.orchestrator
                        .assign_role_only(&self.session, &intent.email, role)
                        .await?,
                )
            }
            Mode::Revoke => WorkflowOutcome::Revoke(
                self.orchestrator
                    .revoke_access(&self.session, &intent.email, &team_id)
                    .await?,
            ),
        };
        Ok(outcome)
    }
}

/// Grant mode implied by the current state: primary when the user has none.
pub fn suggest_grant_mode(report: &InspectReport) -> Mode {
    if report.allowed.grant_primary {
        Mode::Primary
    } else {
        Mode::Secondary
    }
}

fn refusal(mode: Mode, record: &MembershipRecord) -> String {
    match mode {
        Mode::Primary => format!(
            "{} already has primary team {}",
            record.email,
            record.primary_team_id.as_deref().unwrap_or("?")
        ),
        Mode::Secondary => "no primary team - grant primary first".to_string(),
        Mode::Revoke => format!("{} has no primary team to revoke from", record.email),
        Mode::RoleOnly => "Select a role.".to_string(),
    }
}
