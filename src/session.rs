use std::time::Duration;

use chrono::{DateTime, Local};

use crate::client::{HttpRelay, RelayTransport, ResourceClient};
use crate::config::{get_admin_code, load_config, Config};
use crate::error::{ConsoleError, ConsoleResult};
use crate::logging::log_info;
use crate::models::{Role, Team};

/// Read-through cache for a catalog listing. Only used to label ids.
#[derive(Debug, Clone)]
pub struct Catalog<I> {
    items: Option<Vec<I>>,
    loaded_at: Option<DateTime<Local>>,
}

impl<I> Default for Catalog<I> {
    fn default() -> Self {
        Self {
            items: None,
            loaded_at: None,
        }
    }
}

impl<I> Catalog<I> {
    pub fn is_loaded(&self) -> bool {
        self.items.is_some()
    }

    pub fn items(&self) -> &[I] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn fill(&mut self, items: Vec<I>) {
        self.items = Some(items);
        self.loaded_at = Some(Local::now());
    }

    pub fn invalidate(&mut self) {
        self.items = None;
        self.loaded_at = None;
    }

    pub fn loaded_at(&self) -> Option<DateTime<Local>> {
        self.loaded_at
    }
}

/// Everything one operator session needs: the client (with its admin code)
/// and the cached catalogs.
pub struct Session<T: RelayTransport> {
    client: ResourceClient<T>,
    teams: Catalog<Team>,
    roles: Catalog<Role>,
}

impl<T: RelayTransport> Session<T> {
    pub fn new(client: ResourceClient<T>) -> Self {
        Self {
            client,
            teams: Catalog::default(),
            roles: Catalog::default(),
        }
    }

    pub fn client(&self) -> &ResourceClient<T> {
        &self.client
    }

    pub fn set_admin_code(&mut self, admin_code: Option<String>) {
        self.client.set_admin_code(admin_code);
    }

    /// Checks the admin code with a `ping`.
    pub async fn unlock(&self) -> ConsoleResult<()> {
        if !self.client.has_admin_code() {
            return Err(ConsoleError::InvalidInput(
                "Enter an admin code (--admin-code or REVOPS_ADMIN_CODE).".to_string(),
            ));
        }

        match self.client.ping().await {
            Ok(_) => {
                log_info("admin code accepted");
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(ConsoleError::UpstreamRejection {
                status: Some(401),
                message: "Unauthorized: wrong admin code.".to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn teams(&mut self) -> ConsoleResult<&[Team]> {
        if !self.teams.is_loaded() {
            let teams = self.client.list_teams().await?;
            log_info(&format!("team catalog loaded ({} teams)", teams.len()));
            self.teams.fill(teams);
        }
        Ok(self.teams.items())
    }

    pub async fn roles(&mut self) -> ConsoleResult<&[Role]> {
        if !self.roles.is_loaded() {
            let roles = self.client.list_roles().await?;
            log_info(&format!("role catalog loaded ({} roles)", roles.len()));
            self.roles.fill(roles);
        }
        Ok(self.roles.items())
    }

    pub fn invalidate_catalogs(&mut self) {
        self.teams.invalidate();
        self.roles.invalidate();
    }

    pub fn team_label(&self, team_id: &str) -> String {
        self.teams
            .items()
            .iter()
            .find(|t| t.id == team_id)
            .map(Team::label)
            .unwrap_or_else(|| team_id.to_string())
    }

    pub fn role_label(&self, role_id: &str) -> String {
        self.roles
            .items()
            .iter()
            .find(|r| r.id == role_id)
            .map(Role::label)
            .unwrap_or_else(|| role_id.to_string())
    }

    /// Based on the cached role catalog only; unknown roles count as `false`.
    pub fn requires_super_admin(&self, role_ids: &[String]) -> bool {
        self.roles
            .items()
            .iter()
            .any(|r| r.requires_super_admin && role_ids.contains(&r.id))
    }
}

/// Builds an HTTP-backed session from explicit values, falling back to the
/// saved config and environment.
#[derive(Default)]
pub struct SessionBuilder {
    gateway_url: Option<String>,
    relay_url: Option<String>,
    admin_code: Option<String>,
    config: Option<Config>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gateway_url(mut self, url: Option<String>) -> Self {
        self.gateway_url = url;
        self
    }

    pub fn with_relay_url(mut self, url: Option<String>) -> Self {
        self.relay_url = url;
        self
    }

    pub fn with_admin_code(mut self, code: Option<String>) -> Self {
        self.admin_code = code;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> ConsoleResult<Session<HttpRelay>> {
        let mut config = match self.config {
            Some(config) => config,
            None => load_config()?.with_env_overrides(),
        };
        if let Some(url) = self.gateway_url {
            config.set_gateway_url(&url)?;
        }
        if let Some(url) = self.relay_url {
            config.relay_url = url;
        }

        let gateway_url = config.require_gateway_url()?;
        let relay = HttpRelay::new(config.relay_url.clone(), Duration::from_secs(config.timeout_secs))?;
        let client =
            ResourceClient::new(relay, gateway_url).with_admin_code(self.admin_code.or_else(get_admin_code));

        Ok(Session::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_RELAY_URL;

    #[test]
    fn test_catalog_invalidate() {
        let mut catalog: Catalog<Team> = Catalog::default();
        assert!(!catalog.is_loaded());

        catalog.fill(vec![Team {
            id: "T1".into(),
            name: "Sales".into(),
        }]);
        assert!(catalog.is_loaded());
        assert!(catalog.loaded_at().is_some());
        assert_eq!(catalog.items().len(), 1);

        catalog.invalidate();
        assert!(!catalog.is_loaded());
        assert!(catalog.items().is_empty());
    }

    #[test]
    fn test_builder_requires_gateway() {
        let result = SessionBuilder::new().with_config(Config::default()).build();
        assert!(matches!(result, Err(ConsoleError::Config(_))));
    }

    #[test]
    fn test_builder_with_explicit_values() {
        let session = SessionBuilder::new()
            .with_config(Config::default())
            .with_gateway_url(Some("https://script.google.com/macros/s/abc/exec".into()))
            .with_admin_code(Some("  secret ".into()))
            .build()
            .unwrap();

        assert!(session.client().has_admin_code());
        assert_eq!(session.client().transport().relay_url(), DEFAULT_RELAY_URL);
        assert_eq!(session.team_label("T1"), "T1");
    }
}
