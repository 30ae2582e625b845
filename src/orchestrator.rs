//! Write workflows against a user's membership.
//!
//! Every write is followed by a verification read; an attempt only counts as
//! successful when that read shows the intended state. Attempts run one after
//! another and stop at the first verified success.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::client::RelayTransport;
use crate::constants::ROLE_LOST_HINT;
use crate::error::{ConsoleError, ConsoleResult};
use crate::logging::{log_info, log_warn};
use crate::models::{MembershipPatch, RoleShape};
use crate::reconcile::{reconcile_views, MembershipRecord, VerificationResult};
use crate::session::Session;

const ROLE_NOT_PERSISTED_HINT: &str = "team granted but the role was not saved - use assign-role";
const ROLES_UNCONFIRMED_HINT: &str = "team removed but the re-read did not include roles - inspect the user and use assign-role if needed";
const UNVERIFIED: &str = "request sent, verification failed";

/// How a logical operation ended. Partial success is its own state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OperationStatus {
    Success,
    PartialSuccess { remediation: String },
    Failure,
}

impl OperationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationStatus::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "shape", rename_all = "camelCase")]
pub enum Approach {
    SetPrimaryTeam,
    AddSecondaryTeam,
    RemoveTeam,
    AssignRole(RoleShape),
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Approach::SetPrimaryTeam => f.write_str("set primary team"),
            Approach::AddSecondaryTeam => f.write_str("add secondary team"),
            Approach::RemoveTeam => f.write_str("remove team"),
            Approach::AssignRole(shape) => write!(f, "assign role ({})", shape),
        }
    }
}

/// One write plus its verification read. `error` may be set even when
/// `verified` is true if the upstream complained but persisted the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub approach: Approach,
    pub verified: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub succeeded: bool,
    /// Last successful verification read, if any read succeeded.
    pub verification: Option<VerificationResult>,
    pub attempts: Vec<Attempt>,
}

impl MutationOutcome {
    /// Target state already held; nothing was written.
    fn already_satisfied(record: &MembershipRecord) -> Self {
        MutationOutcome {
            succeeded: true,
            verification: Some(record.verification()),
            attempts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantSecondaryOutcome {
    pub status: OperationStatus,
    pub team: MutationOutcome,
    /// `None` when no role was requested.
    pub role_persisted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPrimaryOutcome {
    pub status: OperationStatus,
    pub team: MutationOutcome,
    pub role_assignment: Option<MutationOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeOutcome {
    pub status: OperationStatus,
    pub removal: MutationOutcome,
    /// Only present when the removal also dropped the user's roles.
    pub restore: Option<MutationOutcome>,
    pub roles_before: BTreeSet<String>,
    pub roles_after_removal: BTreeSet<String>,
    pub needs_manual_role_restore: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum WorkflowOutcome {
    GrantSecondary(GrantSecondaryOutcome),
    GrantPrimary(GrantPrimaryOutcome),
    AssignRole(MutationOutcome),
    Revoke(RevokeOutcome),
}

impl WorkflowOutcome {
    pub fn status(&self) -> OperationStatus {
        match self {
            WorkflowOutcome::GrantSecondary(o) => o.status.clone(),
            WorkflowOutcome::GrantPrimary(o) => o.status.clone(),
            WorkflowOutcome::AssignRole(o) if o.succeeded => OperationStatus::Success,
            WorkflowOutcome::AssignRole(_) => OperationStatus::Failure,
            WorkflowOutcome::Revoke(o) => o.status.clone(),
        }
    }
}

/// State an attempt is trying to reach.
#[derive(Debug, Clone)]
enum Goal {
    PrimaryTeam(String),
    SecondaryTeam(String),
    TeamAbsent(String),
    RolesPresent(Vec<String>),
}

impl Goal {
    fn is_met(&self, record: &MembershipRecord) -> bool {
        match self {
            Goal::PrimaryTeam(team) => record.is_primary(team),
            // Landing in either slot gives the user the access that was asked for.
            Goal::SecondaryTeam(team) => record.is_member_of(team),
            Goal::TeamAbsent(team) => !record.is_member_of(team),
            Goal::RolesPresent(roles) => record.has_all_roles(roles),
        }
    }

    /// The field this goal needs that the read did not carry, if any.
    fn unobserved(&self, record: &MembershipRecord) -> Option<&'static str> {
        let seen = record.observed;
        match self {
            Goal::PrimaryTeam(_) if !seen.primary_team => Some("the primary team"),
            Goal::SecondaryTeam(team) if !record.is_member_of(team) && !seen.teams() => Some("team membership"),
            Goal::TeamAbsent(_) if !seen.primary_team => Some("the primary team"),
            Goal::TeamAbsent(_) if !seen.secondary_teams => Some("secondary teams"),
            Goal::RolesPresent(_) if !seen.roles => Some("roles"),
            _ => None,
        }
    }
}

/// One entry in an ordered fallback list.
#[derive(Debug, Clone)]
struct Strategy {
    approach: Approach,
    patch: MembershipPatch,
    goal: Goal,
}

struct ChainResult {
    outcome: MutationOutcome,
    last_record: Option<MembershipRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct GrantRequest {
    pub email: String,
    pub team_id: String,
    pub role_id: Option<String>,
    pub expires_in_hours: Option<u32>,
}

pub struct Orchestrator {
    role_strategies: Vec<RoleShape>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self {
            role_strategies: RoleShape::PRIORITY.to_vec(),
        }
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the order in which role request shapes are tried.
    pub fn with_role_strategies(mut self, shapes: Vec<RoleShape>) -> Self {
        self.role_strategies = shapes;
        self
    }

    /// Fresh read of both views, reconciled.
    pub async fn inspect<T: RelayTransport>(
        &self,
        session: &Session<T>,
        email: &str,
    ) -> ConsoleResult<MembershipRecord> {
        let views = session.client().fetch_user(email).await?;
        let mut record = reconcile_views(&views);
        if record.email.is_empty() {
            record.email = email.to_string();
        }
        Ok(record)
    }

    pub async fn grant_secondary<T: RelayTransport>(
        &self,
        session: &Session<T>,
        request: &GrantRequest,
    ) -> ConsoleResult<GrantSecondaryOutcome> {
        let before = self.inspect(session, &request.email).await?;

        if !before.flags().has_primary {
            return Err(ConsoleError::Policy("no primary team - grant primary first".to_string()));
        }
        if before.is_primary(&request.team_id) {
            return Err(ConsoleError::Policy(format!(
                "{} is already the primary team of {}",
                request.team_id, request.email
            )));
        }

        let role_held = request.role_id.as_deref().map_or(true, |role| before.has_role(role));
        if before.secondary_team_ids.contains(&request.team_id) && role_held {
            log_info(&format!("{} already has {}; nothing to write", request.email, request.team_id));
            return Ok(GrantSecondaryOutcome {
                status: OperationStatus::Success,
                team: MutationOutcome::already_satisfied(&before),
                role_persisted: request.role_id.as_ref().map(|_| true),
            });
        }

        let strategy = Strategy {
            approach: Approach::AddSecondaryTeam,
            patch: MembershipPatch::AddSecondaryTeam {
                team_id: request.team_id.clone(),
                role_id: request.role_id.clone(),
                expires_in_hours: request.expires_in_hours,
            },
            goal: Goal::SecondaryTeam(request.team_id.clone()),
        };
        let result = self.run_chain(session, &request.email, vec![strategy]).await;

        // Judged separately: the upstream may keep the team and drop the role.
        let role_persisted = request.role_id.as_deref().map(|role| {
            result
                .last_record
                .as_ref()
                .map_or(false, |record| record.has_role(role))
        });

        let status = match (result.outcome.succeeded, role_persisted) {
            (false, _) => OperationStatus::Failure,
            (true, Some(false)) => OperationStatus::PartialSuccess {
                remediation: ROLE_NOT_PERSISTED_HINT.to_string(),
            },
            (true, _) => OperationStatus::Success,
        };

        Ok(GrantSecondaryOutcome {
            status,
            team: result.outcome,
            role_persisted,
        })
    }

    pub async fn grant_primary<T: RelayTransport>(
        &self,
        session: &Session<T>,
        request: &GrantRequest,
    ) -> ConsoleResult<GrantPrimaryOutcome> {
        let before = self.inspect(session, &request.email).await?;

        if let Some(current) = &before.primary_team_id {
            return Err(ConsoleError::Policy(format!(
                "{} already has primary team {} - grant a secondary team instead",
                request.email, current
            )));
        }

        let strategy = Strategy {
            approach: Approach::SetPrimaryTeam,
            patch: MembershipPatch::SetPrimaryTeam {
                team_id: request.team_id.clone(),
                default_role_id: request.role_id.clone(),
            },
            goal: Goal::PrimaryTeam(request.team_id.clone()),
        };
        let team = self.run_chain(session, &request.email, vec![strategy]).await;

        // Role assignment is layered on top regardless of how the team write went.
        let role_assignment = match &request.role_id {
            None => None,
            Some(role) => {
                let roles = vec![role.clone()];
                match &team.last_record {
                    Some(record) if record.has_role(role) => Some(MutationOutcome::already_satisfied(record)),
                    _ => Some(self.assign_roles(session, &request.email, &roles).await.outcome),
                }
            }
        };

        let role_ok = role_assignment.as_ref().map_or(true, |o| o.succeeded);
        let status = match (team.outcome.succeeded, role_ok) {
            (true, true) => OperationStatus::Success,
            (true, false) => OperationStatus::PartialSuccess {
                remediation: ROLE_NOT_PERSISTED_HINT.to_string(),
            },
            (false, _) => OperationStatus::Failure,
        };

        Ok(GrantPrimaryOutcome {
            status,
            team: team.outcome,
            role_assignment,
        })
    }

    pub async fn assign_role_only<T: RelayTransport>(
        &self,
        session: &Session<T>,
        email: &str,
        role_id: &str,
    ) -> ConsoleResult<MutationOutcome> {
        let before = self.inspect(session, email).await?;
        if before.has_role(role_id) {
            log_info(&format!("{} already holds role {}", email, role_id));
            return Ok(MutationOutcome::already_satisfied(&before));
        }

        Ok(self.assign_roles(session, email, &[role_id.to_string()]).await.outcome)
    }

    /// Removes the team, then restores the user's roles if the removal took
    /// them away too. The two steps never run in the other order, and nothing
    /// is rolled back when the restore fails.
    pub async fn revoke_access<T: RelayTransport>(
        &self,
        session: &Session<T>,
        email: &str,
        team_id: &str,
    ) -> ConsoleResult<RevokeOutcome> {
        let before = self.inspect(session, email).await?;
        if !before.is_member_of(team_id) {
            if !before.observed.teams() {
                return Err(ConsoleError::Policy(format!(
                    "could not confirm that {} is a member of team {}: the read did not include team membership",
                    email, team_id
                )));
            }
            return Err(ConsoleError::Policy(format!("{} is not a member of team {}", email, team_id)));
        }
        let roles_before = before.role_ids.clone();

        let strategy = Strategy {
            approach: Approach::RemoveTeam,
            patch: MembershipPatch::RemoveTeam {
                team_id: team_id.to_string(),
            },
            goal: Goal::TeamAbsent(team_id.to_string()),
        };
        let removal = self.run_chain(session, email, vec![strategy]).await;

        let verified_after = if removal.outcome.succeeded {
            removal.last_record.clone()
        } else {
            None
        };
        let after = match verified_after {
            Some(record) => record,
            None => {
                log_warn(&format!("revoke of {} from {} failed; role restore not attempted", team_id, email));
                return Ok(RevokeOutcome {
                    status: OperationStatus::Failure,
                    removal: removal.outcome,
                    restore: None,
                    roles_after_removal: removal.last_record.map(|r| r.role_ids).unwrap_or_default(),
                    roles_before,
                    needs_manual_role_restore: false,
                });
            }
        };

        // Without roles in the re-read, a collapse can be neither ruled out nor restored safely.
        if !roles_before.is_empty() && !after.observed.roles {
            log_warn(&format!("roles of {} not observed after removing {}; restore skipped", email, team_id));
            return Ok(RevokeOutcome {
                status: OperationStatus::PartialSuccess {
                    remediation: ROLES_UNCONFIRMED_HINT.to_string(),
                },
                removal: removal.outcome,
                restore: None,
                roles_before,
                roles_after_removal: after.role_ids,
                needs_manual_role_restore: false,
            });
        }

        let roles_lost: Vec<&String> = roles_before.difference(&after.role_ids).collect();
        if roles_lost.is_empty() {
            return Ok(RevokeOutcome {
                status: OperationStatus::Success,
                removal: removal.outcome,
                restore: None,
                roles_before,
                roles_after_removal: after.role_ids,
                needs_manual_role_restore: false,
            });
        }

        log_warn(&format!(
            "removing {} also dropped roles [{}] for {}; restoring",
            team_id,
            roles_lost.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
            email
        ));

        let to_restore: Vec<String> = roles_before.iter().cloned().collect();
        let restore = self.assign_roles(session, email, &to_restore).await.outcome;

        let (status, needs_manual_role_restore) = if restore.succeeded {
            (OperationStatus::Success, false)
        } else {
            (
                OperationStatus::PartialSuccess {
                    remediation: ROLE_LOST_HINT.to_string(),
                },
                true,
            )
        };

        Ok(RevokeOutcome {
            status,
            removal: removal.outcome,
            restore: Some(restore),
            roles_before,
            roles_after_removal: after.role_ids,
            needs_manual_role_restore,
        })
    }

    async fn assign_roles<T: RelayTransport>(
        &self,
        session: &Session<T>,
        email: &str,
        role_ids: &[String],
    ) -> ChainResult {
        let super_admin = session.requires_super_admin(role_ids);
        let strategies = self
            .role_strategies
            .iter()
            .map(|shape| Strategy {
                approach: Approach::AssignRole(*shape),
                patch: MembershipPatch::SetRoles {
                    role_ids: role_ids.to_vec(),
                    shape: *shape,
                    super_admin,
                },
                goal: Goal::RolesPresent(role_ids.to_vec()),
            })
            .collect();

        self.run_chain(session, email, strategies).await
    }

    /// Runs strategies in order, stopping at the first one whose verification
    /// read meets its goal. Every attempt is kept.
    async fn run_chain<T: RelayTransport>(
        &self,
        session: &Session<T>,
        email: &str,
        strategies: Vec<Strategy>,
    ) -> ChainResult {
        let mut attempts = Vec::with_capacity(strategies.len());
        let mut last_record = None;

        for strategy in strategies {
            let (attempt, record) = self.attempt(session, email, &strategy).await;
            let verified = attempt.verified;
            attempts.push(attempt);
            if record.is_some() {
                last_record = record;
            }
            if verified {
                break;
            }
        }

        let succeeded = attempts.last().map_or(false, |a| a.verified);
        ChainResult {
            outcome: MutationOutcome {
                succeeded,
                verification: last_record.as_ref().map(MembershipRecord::verification),
                attempts,
            },
            last_record,
        }
    }

    async fn attempt<T: RelayTransport>(
        &self,
        session: &Session<T>,
        email: &str,
        strategy: &Strategy,
    ) -> (Attempt, Option<MembershipRecord>) {
        let write_error = session
            .client()
            .mutate_user(email, &strategy.patch)
            .await
            .err()
            .map(|e| e.to_string());

        // The write's own reply is not trusted either way; the read decides.
        let (verified, record, error) = match self.inspect(session, email).await {
            Ok(record) => match strategy.goal.unobserved(&record) {
                Some(field) => {
                    let gap = format!("verification read did not include {}", field);
                    let message = match &write_error {
                        Some(e) => format!("{}; {}", e, gap),
                        None => gap,
                    };
                    (false, Some(record), Some(message))
                }
                None => {
                    let met = strategy.goal.is_met(&record);
                    let error = match (&write_error, met) {
                        (Some(e), _) => Some(e.clone()),
                        (None, true) => None,
                        (None, false) => Some(UNVERIFIED.to_string()),
                    };
                    (met, Some(record), error)
                }
            },
            Err(read_error) => {
                let message = match &write_error {
                    Some(e) => format!("{}; verification read failed: {}", e, read_error),
                    None => format!("verification read failed: {}", read_error),
                };
                (false, None, Some(message))
            }
        };

        if verified {
            log_info(&format!("{} for {}: verified", strategy.approach, email));
        } else {
            log_warn(&format!(
                "{} for {}: {}",
                strategy.approach,
                email,
                error.as_deref().unwrap_or(UNVERIFIED)
            ));
        }

        (
            Attempt {
                approach: strategy.approach.clone(),
                verified,
                error,
            },
            record,
        )
    }
}
