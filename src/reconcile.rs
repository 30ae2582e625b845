//! Merges the summary and detailed views of a user into one canonical record.
//!
//! For every field the detailed view wins when it carries the key, even if the
//! value is empty; otherwise the summary view is used. Null counts as absent.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{PartialMembership, UserViews};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    pub user_id: Option<String>,
    pub email: String,
    pub role_ids: BTreeSet<String>,
    pub primary_team_id: Option<String>,
    pub secondary_team_ids: BTreeSet<String>,
    /// Which fields at least one view carried. An empty set that was not
    /// observed is unknown, not empty.
    pub observed: ObservedFields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedFields {
    pub roles: bool,
    pub primary_team: bool,
    pub secondary_teams: bool,
}

impl ObservedFields {
    pub const ALL: ObservedFields = ObservedFields {
        roles: true,
        primary_team: true,
        secondary_teams: true,
    };

    pub fn teams(&self) -> bool {
        self.primary_team && self.secondary_teams
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFlags {
    pub has_roles: bool,
    pub has_primary: bool,
    pub has_secondary: bool,
}

/// Membership as re-read right after a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub actual_role_ids: BTreeSet<String>,
    pub actual_primary_team_id: Option<String>,
    pub actual_secondary_team_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDiff {
    pub roles_added: BTreeSet<String>,
    pub roles_removed: BTreeSet<String>,
    pub teams_added: BTreeSet<String>,
    pub teams_removed: BTreeSet<String>,
    pub primary_changed: bool,
}

impl MembershipRecord {
    pub fn flags(&self) -> DerivedFlags {
        DerivedFlags {
            has_roles: !self.role_ids.is_empty(),
            has_primary: self.primary_team_id.as_deref().map_or(false, |id| !id.is_empty()),
            has_secondary: !self.secondary_team_ids.is_empty(),
        }
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.contains(role_id)
    }

    pub fn has_all_roles<'a, I>(&self, role_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        role_ids.into_iter().all(|id| self.role_ids.contains(id))
    }

    pub fn is_primary(&self, team_id: &str) -> bool {
        self.primary_team_id.as_deref() == Some(team_id)
    }

    /// Member of the team in either slot.
    pub fn is_member_of(&self, team_id: &str) -> bool {
        self.is_primary(team_id) || self.secondary_team_ids.contains(team_id)
    }

    /// All team ids, primary first.
    pub fn team_ids(&self) -> Vec<&str> {
        self.primary_team_id
            .iter()
            .map(String::as_str)
            .chain(self.secondary_team_ids.iter().map(String::as_str))
            .collect()
    }

    pub fn verification(&self) -> VerificationResult {
        VerificationResult {
            actual_role_ids: self.role_ids.clone(),
            actual_primary_team_id: self.primary_team_id.clone(),
            actual_secondary_team_ids: self.secondary_team_ids.clone(),
        }
    }

    /// What changed going from `self` to `after`. Fields missing from either
    /// read are left out rather than reported as removed.
    pub fn diff(&self, after: &MembershipRecord) -> MembershipDiff {
        let mut diff = MembershipDiff::default();

        if self.observed.roles && after.observed.roles {
            diff.roles_added = after.role_ids.difference(&self.role_ids).cloned().collect();
            diff.roles_removed = self.role_ids.difference(&after.role_ids).cloned().collect();
        }
        if self.observed.teams() && after.observed.teams() {
            let before_teams: BTreeSet<&str> = self.team_ids().into_iter().collect();
            let after_teams: BTreeSet<&str> = after.team_ids().into_iter().collect();
            diff.teams_added = after_teams.difference(&before_teams).map(|s| s.to_string()).collect();
            diff.teams_removed = before_teams.difference(&after_teams).map(|s| s.to_string()).collect();
        }
        if self.observed.primary_team && after.observed.primary_team {
            diff.primary_changed = self.primary_team_id != after.primary_team_id;
        }
        diff
    }
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.roles_added.is_empty()
            && self.roles_removed.is_empty()
            && self.teams_added.is_empty()
            && self.teams_removed.is_empty()
            && !self.primary_changed
    }
}

/// Total and deterministic for any pair of partial views.
pub fn reconcile(list_view: &PartialMembership, full_view: &PartialMembership) -> MembershipRecord {
    let user_id = pick(&full_view.user_id, &list_view.user_id).filter(|id| !id.is_empty());
    let email = pick(&full_view.email, &list_view.email).unwrap_or_default();

    let role_ids = to_set(pick(&full_view.role_ids, &list_view.role_ids));

    // An explicit empty string is an authoritative "no primary team".
    let primary_team_id = pick(&full_view.primary_team_id, &list_view.primary_team_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let mut secondary_team_ids = to_set(pick(&full_view.secondary_team_ids, &list_view.secondary_team_ids));
    if let Some(primary) = &primary_team_id {
        secondary_team_ids.remove(primary);
    }

    let observed = ObservedFields {
        roles: full_view.role_ids.is_some() || list_view.role_ids.is_some(),
        primary_team: full_view.primary_team_id.is_some() || list_view.primary_team_id.is_some(),
        secondary_teams: full_view.secondary_team_ids.is_some() || list_view.secondary_team_ids.is_some(),
    };

    MembershipRecord {
        user_id,
        email: email.trim().to_string(),
        role_ids,
        primary_team_id,
        secondary_team_ids,
        observed,
    }
}

pub fn reconcile_views(views: &UserViews) -> MembershipRecord {
    let empty = PartialMembership::default();
    reconcile(
        views.list_view.as_ref().unwrap_or(&empty),
        views.full_view.as_ref().unwrap_or(&empty),
    )
}

fn pick<T: Clone>(preferred: &Option<T>, fallback: &Option<T>) -> Option<T> {
    preferred.clone().or_else(|| fallback.clone())
}

fn to_set(ids: Option<Vec<String>>) -> BTreeSet<String> {
    ids.unwrap_or_default()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|s| s.to_string()).collect())
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_both_empty_is_total() {
        let record = reconcile(&PartialMembership::default(), &PartialMembership::default());
        assert_eq!(record, MembershipRecord::default());
        let flags = record.flags();
        assert!(!flags.has_roles && !flags.has_primary && !flags.has_secondary);
    }

    #[test]
    fn test_full_view_wins_when_present() {
        let list = PartialMembership {
            email: Some("a@x.com".into()),
            role_ids: ids(&["R1"]),
            primary_team_id: Some("T1".into()),
            ..Default::default()
        };
        let full = PartialMembership {
            role_ids: ids(&["R2"]),
            primary_team_id: Some("T2".into()),
            ..Default::default()
        };

        let record = reconcile(&list, &full);
        assert_eq!(record.email, "a@x.com");
        assert_eq!(record.role_ids, set(&["R2"]));
        assert_eq!(record.primary_team_id.as_deref(), Some("T2"));
    }

    #[test]
    fn test_explicit_empty_array_is_authoritative() {
        let list = PartialMembership {
            role_ids: ids(&["R1"]),
            ..Default::default()
        };
        let full = PartialMembership {
            role_ids: Some(vec![]),
            ..Default::default()
        };

        let record = reconcile(&list, &full);
        assert!(record.role_ids.is_empty());
        assert!(!record.flags().has_roles);
    }

    #[test]
    fn test_absent_field_falls_back_to_list_view() {
        let list = PartialMembership {
            secondary_team_ids: ids(&["T3"]),
            ..Default::default()
        };
        let full = PartialMembership {
            role_ids: ids(&["R1"]),
            ..Default::default()
        };

        let record = reconcile(&list, &full);
        assert_eq!(record.secondary_team_ids, set(&["T3"]));
        assert!(record.flags().has_secondary);
    }

    #[test]
    fn test_empty_primary_string_means_no_primary() {
        let list = PartialMembership {
            primary_team_id: Some("T1".into()),
            ..Default::default()
        };
        let full = PartialMembership {
            primary_team_id: Some("".into()),
            ..Default::default()
        };

        let record = reconcile(&list, &full);
        assert_eq!(record.primary_team_id, None);
        assert!(!record.flags().has_primary);
    }

    #[test]
    fn test_primary_removed_from_secondaries() {
        let full = PartialMembership {
            primary_team_id: Some("T1".into()),
            secondary_team_ids: ids(&["T1", "T2", "T2", " "]),
            ..Default::default()
        };

        let record = reconcile(&PartialMembership::default(), &full);
        assert_eq!(record.secondary_team_ids, set(&["T2"]));
        assert_eq!(record.team_ids(), vec!["T1", "T2"]);
    }

    #[test]
    fn test_deterministic() {
        let list = PartialMembership {
            role_ids: ids(&["R2", "R1"]),
            ..Default::default()
        };
        let full = PartialMembership {
            secondary_team_ids: ids(&["T9", "T3"]),
            ..Default::default()
        };
        assert_eq!(reconcile(&list, &full), reconcile(&list, &full));
    }

    #[test]
    fn test_diff_reports_lost_roles_and_teams() {
        let before = MembershipRecord {
            role_ids: set(&["R1"]),
            primary_team_id: Some("T1".into()),
            observed: ObservedFields::ALL,
            ..Default::default()
        };
        let after = MembershipRecord {
            observed: ObservedFields::ALL,
            ..Default::default()
        };

        let diff = before.diff(&after);
        assert_eq!(diff.roles_removed, set(&["R1"]));
        assert_eq!(diff.teams_removed, set(&["T1"]));
        assert!(diff.primary_changed);
        assert!(before.diff(&before).is_empty());
    }

    #[test]
    fn test_observed_fields_follow_key_presence() {
        let list = PartialMembership {
            role_ids: ids(&["R1"]),
            primary_team_id: Some("T1".into()),
            ..Default::default()
        };

        let record = reconcile(&list, &PartialMembership::default());
        assert!(record.observed.roles);
        assert!(record.observed.primary_team);
        assert!(!record.observed.secondary_teams);
        assert!(!record.observed.teams());

        let none = reconcile(&PartialMembership::default(), &PartialMembership::default());
        assert_eq!(none.observed, ObservedFields::default());
    }

    #[test]
    fn test_diff_skips_unobserved_fields() {
        let before = MembershipRecord {
            role_ids: set(&["R1"]),
            primary_team_id: Some("T1".into()),
            secondary_team_ids: set(&["T2"]),
            observed: ObservedFields::ALL,
            ..Default::default()
        };
        // Summary-only re-read: no roles key, no secondary teams.
        let after = MembershipRecord {
            primary_team_id: Some("T1".into()),
            observed: ObservedFields {
                primary_team: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let diff = before.diff(&after);
        assert!(diff.roles_removed.is_empty());
        assert!(diff.teams_removed.is_empty());
        assert!(!diff.primary_changed);
    }
}
