use crate::db::models::employee_models::Employee;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod auth;

pub use auth::AuthService;

/// User-facing text shown when a login does not match the roster
pub const INVALID_LOGIN_HINT: &str = "Invalid ID or Password. (Try ID: E001, Pass: 1234)";

/// The single authenticated identity of the kiosk
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Authenticated employee
    pub employee: Employee,
    /// When the login succeeded
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Open a session for an employee, stamped now
    pub fn new(employee: Employee) -> Self {
        Self {
            employee,
            started_at: Utc::now(),
        }
    }

    /// Roster id of the session holder
    pub fn employee_id(&self) -> &str {
        &self.employee.id
    }
}
