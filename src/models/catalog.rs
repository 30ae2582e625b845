use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "requiresSuperAdmin", default)]
    pub requires_super_admin: bool,
}

impl Team {
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("(no name) ({})", self.id)
        } else {
            format!("{} ({})", self.name, self.id)
        }
    }
}

impl Role {
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("(no name) ({})", self.id)
        } else {
            format!("{} ({})", self.name, self.id)
        }
    }
}
