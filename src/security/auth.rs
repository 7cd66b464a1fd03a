use crate::db::models::employee_models::{Employee, LoginCredentials};
use crate::db::repositories::employees::EmployeesRepository;
use crate::error::Error;
use crate::security::Session;
use tracing::info;

/// Authentication service holding the kiosk's single session slot.
///
/// Credentials are compared in plaintext against the static roster; this is a
/// demo gate, not a security boundary.
#[derive(Debug, Default)]
pub struct AuthService {
    employees_repo: EmployeesRepository,
    session: Option<Session>,
}

impl AuthService {
    /// Create a new authentication service with no active session
    pub fn new() -> Self {
        Self {
            employees_repo: EmployeesRepository::new(),
            session: None,
        }
    }

    /// Login with id/password. A successful login replaces any current session.
    pub fn login(&mut self, credentials: &LoginCredentials) -> Result<Employee, Error> {
        let employee = self
            .employees_repo
            .find_by_credentials(&credentials.id, &credentials.password)
            .ok_or(Error::InvalidCredentials)?
            .clone();

        if let Some(previous) = &self.session {
            info!("Replacing session for {}", previous.employee_id());
        }

        self.session = Some(Session::new(employee.clone()));
        info!("Employee logged in: {}", employee.id);

        Ok(employee)
    }

    /// Clear the session. Calling it with no session is a no-op.
    pub fn logout(&mut self) -> Option<Session> {
        let previous = self.session.take();
        if let Some(session) = &previous {
            info!("Employee logged out: {}", session.employee_id());
        }
        previous
    }

    /// Current session, if any
    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Roster access for the rest of the kiosk
    pub fn employees(&self) -> &EmployeesRepository {
        &self.employees_repo
    }
}
