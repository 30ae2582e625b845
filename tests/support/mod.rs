#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use revops_cli::client::{RelayResponse, RelayTransport, ResourceClient};
use revops_cli::error::ConsoleResult;
use revops_cli::models::{Envelope, RoleShape};
use revops_cli::session::Session;

pub const GATEWAY: &str = "https://script.google.com/macros/s/test/exec";
pub const ADMIN_CODE: &str = "letmein";

const WRITE_ACTIONS: &[&str] = &["grantAccess", "assignRole", "revokeAccess"];

#[derive(Debug, Clone, Default)]
pub struct FakeUser {
    pub user_id: String,
    pub primary: Option<String>,
    pub secondary: BTreeSet<String>,
    pub roles: BTreeSet<String>,
}

/// How the fake settings API misbehaves.
#[derive(Debug, Clone)]
pub struct Behavior {
    /// Role request shapes that are actually persisted; others are acknowledged and dropped.
    pub accepted_role_shapes: HashSet<RoleShape>,
    pub persist_default_role_on_primary: bool,
    pub persist_role_on_secondary: bool,
    pub revoke_drops_roles: bool,
    /// Actions answered with `{ok:false}` without touching state.
    pub rejected_actions: HashSet<String>,
    /// Actions that apply their change but still answer `{ok:false}`.
    pub apply_then_reject: HashSet<String>,
    pub detail_view_fails: bool,
    /// The behaviors below only kick in once any write has been sent.
    pub detail_view_fails_after_write: bool,
    pub all_reads_fail_after_write: bool,
    /// Both views leave out their role keys.
    pub roles_hidden_after_write: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior {
            accepted_role_shapes: RoleShape::PRIORITY.iter().copied().collect(),
            persist_default_role_on_primary: true,
            persist_role_on_secondary: true,
            revoke_drops_roles: false,
            rejected_actions: HashSet::new(),
            apply_then_reject: HashSet::new(),
            detail_view_fails: false,
            detail_view_fails_after_write: false,
            all_reads_fail_after_write: false,
            roles_hidden_after_write: false,
        }
    }
}

#[derive(Default)]
struct FakeState {
    users: HashMap<String, FakeUser>,
    behavior: Behavior,
    calls: Vec<Value>,
}

/// In-memory stand-in for relay + settings API.
#[derive(Default)]
pub struct FakeSettingsApi {
    state: Mutex<FakeState>,
}

impl FakeSettingsApi {
    pub fn new(behavior: Behavior) -> Self {
        let api = FakeSettingsApi::default();
        api.state.lock().unwrap().behavior = behavior;
        api
    }

    pub fn with_user(self, email: &str, primary: Option<&str>, secondary: &[&str], roles: &[&str]) -> Self {
        self.state.lock().unwrap().users.insert(
            email.to_string(),
            FakeUser {
                user_id: format!("u-{}", email),
                primary: primary.map(str::to_string),
                secondary: secondary.iter().map(|s| s.to_string()).collect(),
                roles: roles.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn user(&self, email: &str) -> Option<FakeUser> {
        self.state.lock().unwrap().users.get(email).cloned()
    }

    pub fn calls(&self) -> Vec<Value> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn writes(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|c| WRITE_ACTIONS.contains(&c["action"].as_str().unwrap_or_default()))
            .collect()
    }

    fn handle(&self, payload: &Value) -> Envelope {
        let mut state = self.state.lock().unwrap();
        let wrote = state
            .calls
            .iter()
            .any(|c| WRITE_ACTIONS.contains(&c["action"].as_str().unwrap_or_default()));
        state.calls.push(payload.clone());

        let action = payload["action"].as_str().unwrap_or_default().to_string();
        if payload["adminCode"].as_str() != Some(ADMIN_CODE) {
            return Envelope::failure("Unauthorized");
        }
        if state.behavior.rejected_actions.contains(&action) {
            return Envelope::failure(format!("{} failed upstream", action));
        }

        let email = payload["email"].as_str().unwrap_or_default().to_string();
        let behavior = state.behavior.clone();
        let is_read = action == "inspectUser" || action == "decipherTeams";
        if is_read && wrote && behavior.all_reads_fail_after_write {
            return Envelope::failure(format!("{} timed out", action));
        }
        let hide_roles = wrote && behavior.roles_hidden_after_write;

        let envelope = match action.as_str() {
            "ping" => Envelope::success(json!("pong")),
            "listTeams" => Envelope::success(json!([
                { "id": "T1", "name": "Sales" },
                { "id": "T2", "name": "Support" },
                { "id": "T3" }
            ])),
            "listRoles" => Envelope::success(json!({ "roles": [
                { "id": "R1", "name": "Editor" },
                { "id": "R2", "name": "Viewer" },
                { "id": "R9", "name": "Owner", "requiresSuperAdmin": true }
            ]})),
            "inspectUser" => match state.users.get(&email) {
                // The summary view has no secondary team coverage.
                Some(user) => {
                    let mut view = json!({
                        "userId": user.user_id,
                        "email": email,
                        "roleIds": user.roles,
                        "primaryTeamId": user.primary,
                    });
                    if hide_roles {
                        view["roleIds"] = Value::Null;
                    }
                    Envelope::success(view)
                }
                None => Envelope::success(json!({ "email": email })),
            },
            "decipherTeams" => {
                if behavior.detail_view_fails || (wrote && behavior.detail_view_fails_after_write) {
                    return Envelope::failure("detail endpoint timed out");
                }
                match state.users.get(&email) {
                    Some(user) => {
                        let mut detail = json!({
                            "id": user.user_id,
                            "primaryTeamId": user.primary.clone().unwrap_or_default(),
                            "secondaryTeamIds": user.secondary,
                            "roles": user.roles.iter().map(|r| json!({ "id": r })).collect::<Vec<_>>(),
                        });
                        if hide_roles {
                            if let Some(obj) = detail.as_object_mut() {
                                obj.remove("roles");
                            }
                        }
                        Envelope::success(json!({ "user": detail }))
                    }
                    None => Envelope::success(json!({ "user": null })),
                }
            }
            "grantAccess" => {
                let team = payload["teamId"].as_str().unwrap_or_default().to_string();
                let user = state.users.entry(email.clone()).or_insert_with(|| FakeUser {
                    user_id: format!("u-{}", email),
                    ..Default::default()
                });
                if payload["mode"] == "primary" {
                    user.secondary.remove(&team);
                    user.primary = Some(team);
                    if let (true, Some(role)) = (behavior.persist_default_role_on_primary, payload["defaultRoleId"].as_str()) {
                        user.roles = [role.to_string()].into_iter().collect();
                    }
                } else {
                    if user.primary.as_deref() != Some(team.as_str()) {
                        user.secondary.insert(team);
                    }
                    if let (true, Some(role)) = (behavior.persist_role_on_secondary, payload["roleId"].as_str()) {
                        user.roles = [role.to_string()].into_iter().collect();
                    }
                }
                Envelope::success(json!({ "granted": true }))
            }
            "assignRole" => {
                let shape = RoleShape::PRIORITY
                    .iter()
                    .copied()
                    .find(|s| payload["strategy"] == s.as_str());
                let roles: BTreeSet<String> = match payload.get("roleIds") {
                    Some(Value::Array(ids)) => ids.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
                    _ => payload["roleId"].as_str().map(str::to_string).into_iter().collect(),
                };
                if let (Some(shape), Some(user)) = (shape, state.users.get_mut(&email)) {
                    if behavior.accepted_role_shapes.contains(&shape) {
                        user.roles = roles;
                    }
                }
                // Acknowledged either way: the upstream does not say it ignored the request.
                Envelope::success(json!({ "updated": true }))
            }
            "revokeAccess" => {
                let team = payload["teamId"].as_str().unwrap_or_default();
                if let Some(user) = state.users.get_mut(&email) {
                    if user.primary.as_deref() == Some(team) {
                        user.primary = None;
                    }
                    user.secondary.remove(team);
                    if behavior.revoke_drops_roles {
                        user.roles.clear();
                    }
                }
                Envelope::success(json!({ "revoked": true }))
            }
            "listPasses" => Envelope::success(json!([
                { "email": "a@x.com", "teamId": "T2", "expiresAt": "2026-10-15T10:00:00Z" }
            ])),
            "revokeExpiredPasses" => Envelope::success(json!({ "revoked": 1 })),
            other => Envelope::failure(format!("Unknown action: {}", other)),
        };

        if envelope.ok && behavior.apply_then_reject.contains(&action) {
            return Envelope::failure(format!("{} timed out", action));
        }
        envelope
    }
}

#[async_trait]
impl RelayTransport for FakeSettingsApi {
    async fn forward(&self, target_url: &str, payload: Value) -> ConsoleResult<RelayResponse> {
        assert_eq!(target_url, GATEWAY);
        Ok(RelayResponse {
            status: 200,
            envelope: self.handle(&payload),
        })
    }
}

pub fn session(api: FakeSettingsApi) -> Session<FakeSettingsApi> {
    Session::new(ResourceClient::new(api, GATEWAY).with_admin_code(Some(ADMIN_CODE.to_string())))
}

pub fn api(session: &Session<FakeSettingsApi>) -> &FakeSettingsApi {
    session.client().transport()
}

pub fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}
