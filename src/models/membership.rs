use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream view of a user's membership. `None` means the view did not
/// carry the field (missing key or `null`); `Some` means the key was present,
/// even when the value is empty.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartialMembership {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role_ids: Option<Vec<String>>,
    pub primary_team_id: Option<String>,
    pub secondary_team_ids: Option<Vec<String>>,
}

/// Both reads taken for one user. Either side may be missing if its read failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserViews {
    pub list_view: Option<PartialMembership>,
    pub full_view: Option<PartialMembership>,
}

const USER_ID_KEYS: &[&str] = &["userId", "id"];
const ROLE_KEYS: &[&str] = &["roleIds", "roles"];
const PRIMARY_KEYS: &[&str] = &["primaryTeamId", "teamId"];
const SECONDARY_KEYS: &[&str] = &["secondaryTeamIds", "additionalTeamIds"];

impl PartialMembership {
    /// Lenient extraction from whatever JSON the gateway returned. Never fails:
    /// anything unrecognised is treated as absent.
    pub fn from_value(value: &Value) -> Self {
        let obj = match value {
            Value::Object(obj) => match obj.get("user") {
                Some(Value::Object(inner)) => inner,
                // `{"user": null}`: the gateway looked and found no membership.
                Some(Value::Null) => return PartialMembership::no_membership(),
                _ => obj,
            },
            _ => return PartialMembership::default(),
        };

        PartialMembership {
            user_id: first_present(obj, USER_ID_KEYS).and_then(as_id),
            email: first_present(obj, &["email"]).and_then(|v| v.as_str().map(str::to_string)),
            role_ids: first_present(obj, ROLE_KEYS).and_then(as_id_list),
            primary_team_id: first_present(obj, PRIMARY_KEYS).and_then(as_id),
            secondary_team_ids: first_present(obj, SECONDARY_KEYS).and_then(as_id_list),
        }
    }

    fn no_membership() -> Self {
        PartialMembership {
            role_ids: Some(Vec::new()),
            primary_team_id: Some(String::new()),
            secondary_team_ids: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PartialMembership::default()
    }
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj.get("id").and_then(as_id),
        _ => None,
    }
}

// Accepts `["R1"]`, `[{"id":"R1"}]` and a bare `"R1"`.
fn as_id_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(as_id)
                .filter(|id| !id.is_empty())
                .collect(),
        ),
        Value::String(s) if s.trim().is_empty() => Some(Vec::new()),
        other => as_id(other).map(|id| vec![id]),
    }
}
