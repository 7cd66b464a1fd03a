//! Application state shared by the terminal, the employee view, and the
//! manager dashboard.
//!
//! All mutation goes through the transition methods on [`KioskState`]; the
//! API and the scan pipeline hold it behind one `RwLock`, so each transition
//! is applied atomically and derived views are computed from the state as it
//! stands after the last transition.

use crate::db::models::employee_models::{Employee, LoginCredentials};
use crate::db::models::record_models::AttendanceRecord;
use crate::db::repositories::RecordsRepository;
use crate::error::Error;
use crate::security::{AuthService, Session};
use crate::services::classifier::{project_for_manager, summarize, ManagerFilter, ManagerSummary};
use crate::services::history::{history_for, EmployeeDashboard};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type SharedKioskState = Arc<RwLock<KioskState>>;

/// Top-level screen of the kiosk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewState {
    #[default]
    Terminal,
    Employee,
    Manager,
}

/// Manager dashboard display state
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "mode", content = "record", rename_all = "UPPERCASE")]
pub enum ManagerDisplay {
    #[default]
    List,
    Detail(AttendanceRecord),
}

/// Filter plus display state of the manager dashboard
#[derive(Debug, Clone, Serialize, Default)]
pub struct ManagerView {
    pub filter: ManagerFilter,
    pub display: ManagerDisplay,
}

#[derive(Debug, Default)]
pub struct KioskState {
    records: RecordsRepository,
    auth: AuthService,
    manager: ManagerView,
    view: ViewState,
}

impl KioskState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State pre-loaded with the demo records
    pub fn with_demo_records() -> Self {
        let mut state = Self::new();
        state.records.seed_demo_records(Utc::now());
        state
    }

    pub fn into_shared(self) -> SharedKioskState {
        Arc::new(RwLock::new(self))
    }

    // Transitions

    pub fn login(&mut self, credentials: &LoginCredentials) -> Result<Employee, Error> {
        self.auth.login(credentials)
    }

    /// Returns the session that was closed, if any
    pub fn logout(&mut self) -> Option<Session> {
        self.auth.logout()
    }

    pub fn append_record(&mut self, record: AttendanceRecord) {
        self.records.append(record);
    }

    pub fn set_filter(&mut self, filter: ManagerFilter) {
        if self.manager.filter != filter {
            info!("Manager filter set to {:?}", filter);
        }
        self.manager.filter = filter;
    }

    /// LIST -> DETAIL for a stored record
    pub fn select_record(&mut self, record_id: &Uuid) -> Result<&AttendanceRecord, Error> {
        let record = self
            .records
            .get_by_id(record_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Record not found: {}", record_id)))?;

        self.manager.display = ManagerDisplay::Detail(record);
        match &self.manager.display {
            ManagerDisplay::Detail(record) => Ok(record),
            ManagerDisplay::List => Err(Error::Internal("detail view not set".to_string())),
        }
    }

    /// DETAIL -> LIST; no-op when already listing
    pub fn back(&mut self) {
        self.manager.display = ManagerDisplay::List;
    }

    /// Switch top-level view, returning the previous one. Leaving the
    /// manager view drops any open detail.
    pub fn navigate(&mut self, view: ViewState) -> ViewState {
        let previous = self.view;
        if previous == ViewState::Manager && view != ViewState::Manager {
            self.back();
        }
        self.view = view;
        previous
    }

    // Reads and derived views

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn session(&self) -> Option<&Session> {
        self.auth.current()
    }

    pub fn employees(&self) -> &[Employee] {
        self.auth.employees().get_all()
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.auth.employees().get_by_id(id)
    }

    pub fn all_records(&self) -> Vec<AttendanceRecord> {
        self.records.all()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// History of the logged-in employee, oldest first; empty without a session
    pub fn employee_history(&self) -> Vec<AttendanceRecord> {
        match self.auth.current() {
            Some(session) => history_for(session.employee_id(), self.records.iter()),
            None => Vec::new(),
        }
    }

    pub fn latest_employee_record(&self) -> Option<AttendanceRecord> {
        self.employee_history().pop()
    }

    pub fn employee_dashboard(&self) -> Option<EmployeeDashboard> {
        self.auth
            .current()
            .map(|session| EmployeeDashboard::build(&session.employee, self.records.iter()))
    }

    pub fn manager_view(&self) -> &ManagerView {
        &self.manager
    }

    /// Records under the stored filter, in manager order
    pub fn manager_records(&self) -> Vec<AttendanceRecord> {
        self.manager_records_with(self.manager.filter)
    }

    pub fn manager_records_with(&self, filter: ManagerFilter) -> Vec<AttendanceRecord> {
        project_for_manager(self.records.iter(), filter)
    }

    pub fn manager_summary(&self) -> ManagerSummary {
        summarize(self.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::record_models::{HealthStatus, VitalsReading};
    use chrono::{Duration, TimeZone};

    fn creds(id: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            id: id.to_string(),
            password: password.to_string(),
        }
    }

    fn add(state: &mut KioskState, employee_id: &str, minute: i64, status: HealthStatus) -> Uuid {
        let employee = state.employee(employee_id).unwrap().clone();
        let base = Utc.with_ymd_and_hms(2026, 1, 15, 7, 0, 0).unwrap();
        let record = AttendanceRecord::with_timestamp(
            &employee,
            base + Duration::minutes(minute),
            String::new(),
            VitalsReading {
                heart_rate: 75,
                respiration_rate: 14,
                spo2: 98,
                blood_pressure_sys: 118,
                blood_pressure_dia: 78,
                stress_level: 22,
            },
            status,
            None,
        );
        let id = record.id;
        state.append_record(record);
        id
    }

    #[test]
    fn test_initial_state() {
        let state = KioskState::new();
        assert_eq!(state.view(), ViewState::Terminal);
        assert_eq!(state.manager_view().display, ManagerDisplay::List);
        assert_eq!(state.manager_view().filter, ManagerFilter::All);
        assert!(state.session().is_none());
        assert_eq!(state.record_count(), 0);
    }

    #[test]
    fn test_demo_seed() {
        let state = KioskState::with_demo_records();
        assert_eq!(state.record_count(), 1);
        assert_eq!(state.manager_summary().risk_count, 1);
    }

    #[test]
    fn test_history_follows_session() {
        let mut state = KioskState::new();
        for minute in [3, 1, 2] {
            add(&mut state, "E001", minute, HealthStatus::Good);
        }
        add(&mut state, "E002", 4, HealthStatus::Risk);

        assert!(state.employee_history().is_empty());

        state.login(&creds("E001", "1234")).unwrap();
        let history = state.employee_history();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(
            state.latest_employee_record().unwrap().timestamp,
            history.last().unwrap().timestamp
        );

        state.logout();
        assert!(state.employee_history().is_empty());
        assert!(state.latest_employee_record().is_none());
        assert!(state.employee_dashboard().is_none());
    }

    #[test]
    fn test_failed_login_leaves_no_session() {
        let mut state = KioskState::new();
        assert_eq!(state.login(&creds("E001", "wrong")).unwrap_err(), Error::InvalidCredentials);
        assert!(state.session().is_none());
    }

    #[test]
    fn test_manager_state_machine() {
        let mut state = KioskState::new();
        let id = add(&mut state, "E003", 1, HealthStatus::Risk);

        assert!(state.select_record(&Uuid::new_v4()).is_err());
        assert_eq!(state.manager_view().display, ManagerDisplay::List);

        let selected = state.select_record(&id).unwrap();
        assert_eq!(selected.id, id);
        assert!(matches!(state.manager_view().display, ManagerDisplay::Detail(ref r) if r.id == id));

        state.back();
        assert_eq!(state.manager_view().display, ManagerDisplay::List);
        state.back();
        assert_eq!(state.manager_view().display, ManagerDisplay::List);
    }

    #[test]
    fn test_manager_records_follow_filter() {
        let mut state = KioskState::new();
        add(&mut state, "E001", 1, HealthStatus::Good);
        add(&mut state, "E002", 2, HealthStatus::Risk);
        add(&mut state, "E003", 3, HealthStatus::Good);

        let all = state.manager_records();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].status, HealthStatus::Risk);
        assert_eq!(all[1].employee_id, "E003");

        state.set_filter(ManagerFilter::RiskOnly);
        let risk = state.manager_records();
        assert_eq!(risk.len(), 1);
        assert_eq!(risk[0].employee_id, "E002");

        // Summary ignores the filter
        assert_eq!(state.manager_summary().total, 3);
    }

    #[test]
    fn test_navigate_returns_previous() {
        let mut state = KioskState::new();
        assert_eq!(state.navigate(ViewState::Manager), ViewState::Terminal);
        assert_eq!(state.navigate(ViewState::Employee), ViewState::Manager);
        assert_eq!(state.view(), ViewState::Employee);
    }

    #[test]
    fn test_leaving_manager_view_closes_detail() {
        let mut state = KioskState::new();
        let id = add(&mut state, "E002", 1, HealthStatus::Good);
        state.navigate(ViewState::Manager);
        state.select_record(&id).unwrap();

        state.navigate(ViewState::Terminal);
        assert_eq!(state.manager_view().display, ManagerDisplay::List);
    }

    #[test]
    fn test_display_serialization() {
        let value = serde_json::to_value(ManagerDisplay::List).unwrap();
        assert_eq!(value["mode"], "LIST");
        let value = serde_json::to_value(ViewState::Manager).unwrap();
        assert_eq!(value, "MANAGER");
    }
}
