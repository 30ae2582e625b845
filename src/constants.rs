pub const CONFIG_FILE: &str = ".revops-cli-config.json";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000/api/gateway";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_GATEWAY_URL: &str = "REVOPS_GATEWAY_URL";
pub const ENV_RELAY_URL: &str = "REVOPS_RELAY_URL";
pub const ENV_ADMIN_CODE: &str = "REVOPS_ADMIN_CODE";

pub const GATEWAY_URL_PREFIX: &str = "https://script.google.com/";

// Length of the body excerpt kept when the upstream answers with HTML.
pub const PREVIEW_LEN: usize = 200;

// Action names understood by the gateway
pub const ACTION_PING: &str = "ping";
pub const ACTION_LIST_TEAMS: &str = "listTeams";
pub const ACTION_LIST_ROLES: &str = "listRoles";
pub const ACTION_INSPECT_USER: &str = "inspectUser";
pub const ACTION_DECIPHER_TEAMS: &str = "decipherTeams";
pub const ACTION_GRANT_ACCESS: &str = "grantAccess";
pub const ACTION_ASSIGN_ROLE: &str = "assignRole";
pub const ACTION_REVOKE_ACCESS: &str = "revokeAccess";
pub const ACTION_LIST_PASSES: &str = "listPasses";
pub const ACTION_REVOKE_EXPIRED_PASSES: &str = "revokeExpiredPasses";

pub const ROLE_LOST_HINT: &str = "role lost during team removal - use assign-role to restore it";
