use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Manager,
    Support,
    Warehouse,
}

impl StaffRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            StaffRole::Admin => "Admin",
            StaffRole::Manager => "Manager",
            StaffRole::Support => "Support",
            StaffRole::Warehouse => "Warehouse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: StaffRole,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
