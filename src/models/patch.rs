use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::constants::{ACTION_ASSIGN_ROLE, ACTION_GRANT_ACCESS, ACTION_REVOKE_ACCESS};

/// Request shapes the gateway has been seen to accept for a role change.
/// The order of `RoleShape::PRIORITY` is the order they are tried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleShape {
    PartialUpdate,
    ReplaceRolesOnly,
    ReplaceWithAdminFlag,
    ReplaceSingularRole,
}

impl RoleShape {
    pub const PRIORITY: [RoleShape; 4] = [
        RoleShape::PartialUpdate,
        RoleShape::ReplaceRolesOnly,
        RoleShape::ReplaceWithAdminFlag,
        RoleShape::ReplaceSingularRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleShape::PartialUpdate => "patch",
            RoleShape::ReplaceRolesOnly => "replace",
            RoleShape::ReplaceWithAdminFlag => "replaceWithAdminFlag",
            RoleShape::ReplaceSingularRole => "replaceSingular",
        }
    }
}

impl fmt::Display for RoleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single write against a user's membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipPatch {
    SetPrimaryTeam {
        team_id: String,
        default_role_id: Option<String>,
    },
    AddSecondaryTeam {
        team_id: String,
        role_id: Option<String>,
        expires_in_hours: Option<u32>,
    },
    SetRoles {
        role_ids: Vec<String>,
        shape: RoleShape,
        super_admin: bool,
    },
    RemoveTeam {
        team_id: String,
    },
}

impl MembershipPatch {
    pub fn action(&self) -> &'static str {
        match self {
            MembershipPatch::SetPrimaryTeam { .. } | MembershipPatch::AddSecondaryTeam { .. } => {
                ACTION_GRANT_ACCESS
            }
            MembershipPatch::SetRoles { .. } => ACTION_ASSIGN_ROLE,
            MembershipPatch::RemoveTeam { .. } => ACTION_REVOKE_ACCESS,
        }
    }

    /// Action arguments, not including `action`, `email` or `adminCode`.
    pub fn args(&self) -> Map<String, Value> {
        let mut args = Map::new();
        match self {
            MembershipPatch::SetPrimaryTeam { team_id, default_role_id } => {
                args.insert("teamId".into(), json!(team_id));
                args.insert("mode".into(), json!("primary"));
                if let Some(role) = default_role_id {
                    args.insert("defaultRoleId".into(), json!(role));
                }
            }
            MembershipPatch::AddSecondaryTeam { team_id, role_id, expires_in_hours } => {
                args.insert("teamId".into(), json!(team_id));
                args.insert("mode".into(), json!("secondary"));
                if let Some(role) = role_id {
                    args.insert("roleId".into(), json!(role));
                }
                if let Some(hours) = expires_in_hours {
                    args.insert("expiresInHours".into(), json!(hours));
                }
            }
            MembershipPatch::SetRoles { role_ids, shape, super_admin } => {
                args.insert("strategy".into(), json!(shape.as_str()));
                match shape {
                    RoleShape::ReplaceSingularRole => {
                        // This shape can only carry one role.
                        args.insert("roleId".into(), json!(role_ids.first()));
                    }
                    RoleShape::ReplaceWithAdminFlag => {
                        args.insert("roleIds".into(), json!(role_ids));
                        args.insert("isSuperAdmin".into(), json!(super_admin));
                    }
                    RoleShape::PartialUpdate | RoleShape::ReplaceRolesOnly => {
                        args.insert("roleIds".into(), json!(role_ids));
                    }
                }
            }
            MembershipPatch::RemoveTeam { team_id } => {
                args.insert("teamId".into(), json!(team_id));
            }
        }
        args
    }

    pub fn describe(&self) -> String {
        match self {
            MembershipPatch::SetPrimaryTeam { team_id, .. } => format!("set primary team {}", team_id),
            MembershipPatch::AddSecondaryTeam { team_id, .. } => format!("add secondary team {}", team_id),
            MembershipPatch::SetRoles { role_ids, shape, .. } => {
                format!("set roles [{}] via {}", role_ids.join(", "), shape)
            }
            MembershipPatch::RemoveTeam { team_id } => format!("remove team {}", team_id),
        }
    }
}
