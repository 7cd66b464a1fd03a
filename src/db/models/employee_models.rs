use serde::{Deserialize, Serialize};

/// Roster entry. The roster is fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub department: String,
    pub avatar_url: String,
    /// Plaintext demo credential, never sent to clients
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub id: String,
    pub password: String,
}
