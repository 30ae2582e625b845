use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::client::relay::RelayTransport;
use crate::constants::*;
use crate::error::{ConsoleError, ConsoleResult, ErrorContext};
use crate::logging::{log_debug, log_info, log_warn};
use crate::models::{MembershipPatch, PartialMembership, Role, Team, UserViews};

/// Whatever the gateway put in `result` for a write. Not trusted as proof of
/// success; callers verify with a fresh read.
pub type UpstreamRawResponse = Value;

/// Typed calls against the settings gateway.
pub struct ResourceClient<T: RelayTransport> {
    transport: T,
    gateway_url: String,
    admin_code: Option<String>,
}

impl<T: RelayTransport> ResourceClient<T> {
    pub fn new(transport: T, gateway_url: impl Into<String>) -> Self {
        Self {
            transport,
            gateway_url: gateway_url.into(),
            admin_code: None,
        }
    }

    pub fn with_admin_code(mut self, admin_code: Option<String>) -> Self {
        self.set_admin_code(admin_code);
        self
    }

    pub fn set_admin_code(&mut self, admin_code: Option<String>) {
        self.admin_code = admin_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());
    }

    pub fn has_admin_code(&self) -> bool {
        self.admin_code.is_some()
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `{action, adminCode?, ...args}` and unwraps the envelope.
    pub async fn call(&self, action: &str, args: Map<String, Value>) -> ConsoleResult<Value> {
        let mut payload = Map::new();
        payload.insert("action".into(), json!(action));
        if let Some(code) = &self.admin_code {
            payload.insert("adminCode".into(), json!(code));
        }
        payload.extend(args);

        log_info(&format!("-> {}", action));

        let response = self
            .transport
            .forward(&self.gateway_url, Value::Object(payload))
            .await?;

        let envelope = response.envelope;
        let is_2xx = (200..300).contains(&response.status);

        if !envelope.ok || !is_2xx {
            let message = envelope
                .error
                .unwrap_or_else(|| format!("{} failed with status {}", action, response.status));
            log_warn(&format!("<- {} rejected ({}): {}", action, response.status, message));
            return Err(ConsoleError::UpstreamRejection {
                status: Some(envelope.status.unwrap_or(response.status)),
                message,
            });
        }

        log_debug(&format!("<- {} ok", action));
        Ok(envelope.result.unwrap_or(Value::Null))
    }

    pub async fn ping(&self) -> ConsoleResult<Value> {
        self.call(ACTION_PING, Map::new()).await
    }

    pub async fn list_teams(&self) -> ConsoleResult<Vec<Team>> {
        let result = self
            .call(ACTION_LIST_TEAMS, Map::new())
            .await
            .context("Failed to load teams")?;
        list_from(result, "teams")
    }

    pub async fn list_roles(&self) -> ConsoleResult<Vec<Role>> {
        let result = self
            .call(ACTION_LIST_ROLES, Map::new())
            .await
            .context("Failed to load roles")?;
        list_from(result, "roles")
    }

    /// Reads the summary and the detailed view. Either may fail on its own;
    /// only when both fail is an error returned.
    pub async fn fetch_user(&self, email: &str) -> ConsoleResult<UserViews> {
        let list = self.call(ACTION_INSPECT_USER, email_args(email)).await;
        let full = self.call(ACTION_DECIPHER_TEAMS, email_args(email)).await;

        match (list, full) {
            (Err(list_err), Err(full_err)) => {
                log_warn(&format!("both user reads failed for {}: {}", email, full_err));
                Err(list_err)
            }
            (list, full) => Ok(UserViews {
                list_view: view_or_log(list, ACTION_INSPECT_USER),
                full_view: view_or_log(full, ACTION_DECIPHER_TEAMS),
            }),
        }
    }

    pub async fn mutate_user(&self, email: &str, patch: &MembershipPatch) -> ConsoleResult<UpstreamRawResponse> {
        log_info(&format!("mutate {}: {}", email, patch.describe()));
        let mut args = email_args(email);
        args.extend(patch.args());
        self.call(patch.action(), args).await
    }

    pub async fn list_passes(&self) -> ConsoleResult<Value> {
        self.call(ACTION_LIST_PASSES, Map::new()).await
    }

    pub async fn revoke_expired_passes(&self) -> ConsoleResult<Value> {
        self.call(ACTION_REVOKE_EXPIRED_PASSES, Map::new()).await
    }
}

fn email_args(email: &str) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("email".into(), json!(email));
    args
}

fn view_or_log(result: ConsoleResult<Value>, action: &str) -> Option<PartialMembership> {
    match result {
        Ok(value) => Some(PartialMembership::from_value(&value)),
        Err(e) => {
            log_warn(&format!("{} failed, using the other view: {}", action, e));
            None
        }
    }
}

// Catalog results come back either as a bare array or wrapped under `key`.
fn list_from<I: DeserializeOwned>(result: Value, key: &str) -> ConsoleResult<Vec<I>> {
    let items = match result {
        Value::Array(_) => result,
        Value::Object(mut obj) => obj.remove(key).unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => {
            return Err(ConsoleError::Parse(format!("Expected a list of {}, got {}", key, other)));
        }
    };
    Ok(serde_json::from_value(items)?)
}
