use crate::db::models::record_models::{AttendanceRecord, HealthStatus, VitalsReading};
use crate::db::repositories::employees::EmployeesRepository;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use std::collections::VecDeque;
use uuid::Uuid;

const DEMO_RISK_ANALYSIS: &str = "CRITICAL: Subject displays extreme physiological distress. \
Heart rate and stress levels indicate imminent risk of burnout or cardiac event. \
Immediate removal from high-stress environment recommended.";

/// Append-only, in-memory attendance store, newest record first.
///
/// Volatile: lives as long as the process.
#[derive(Debug, Default)]
pub struct RecordsRepository {
    records: VecDeque<AttendanceRecord>,
}

impl RecordsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a record. Ids are trusted to be unique.
    pub fn append(&mut self, record: AttendanceRecord) {
        debug!(
            "Appending record {} for {} ({})",
            record.id, record.employee_id, record.status
        );
        self.records.push_front(record);
    }

    /// Snapshot of every record in store order
    pub fn all(&self) -> Vec<AttendanceRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter()
    }

    pub fn get_by_id(&self, id: &Uuid) -> Option<&AttendanceRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add the sample high-risk scan for Bruce Banner, 45 minutes before `now`
    pub fn seed_demo_records(&mut self, now: DateTime<Utc>) {
        let Some(employee) = EmployeesRepository::new().get_by_id("E006") else {
            warn!("Demo employee E006 missing from roster, skipping seed");
            return;
        };

        let metrics = VitalsReading {
            heart_rate: 145,
            respiration_rate: 28,
            spo2: 92,
            blood_pressure_sys: 155,
            blood_pressure_dia: 95,
            stress_level: 98,
        };

        self.append(AttendanceRecord::with_timestamp(
            employee,
            now - Duration::minutes(45),
            employee.avatar_url.clone(),
            metrics,
            HealthStatus::Risk,
            Some(DEMO_RISK_ANALYSIS.to_string()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::employee_models::Employee;

    fn record(name: &str) -> AttendanceRecord {
        let employee = Employee {
            id: "E001".to_string(),
            name: name.to_string(),
            department: "Engineering Lead".to_string(),
            avatar_url: String::new(),
            password: String::new(),
        };
        let reading = VitalsReading {
            heart_rate: 70,
            respiration_rate: 14,
            spo2: 98,
            blood_pressure_sys: 120,
            blood_pressure_dia: 80,
            stress_level: 15,
        };
        AttendanceRecord::new(&employee, String::new(), reading, HealthStatus::Good, None)
    }

    #[test]
    fn test_append_is_newest_first() {
        let mut repo = RecordsRepository::new();
        let first = record("first");
        let second = record("second");
        repo.append(first.clone());
        repo.append(second.clone());

        let all = repo.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn test_no_deduplication() {
        let mut repo = RecordsRepository::new();
        let rec = record("twice");
        repo.append(rec.clone());
        repo.append(rec.clone());
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get_by_id(&rec.id).unwrap().employee_name, "twice");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut repo = RecordsRepository::new();
        repo.append(record("a"));
        let snapshot = repo.all();
        repo.append(record("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_seed_demo_records() {
        let mut repo = RecordsRepository::new();
        let now = Utc::now();
        repo.seed_demo_records(now);

        let all = repo.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].employee_id, "E006");
        assert_eq!(all[0].status, HealthStatus::Risk);
        assert_eq!(all[0].timestamp, now - Duration::minutes(45));
        assert!(all[0].ai_analysis.as_deref().unwrap().starts_with("CRITICAL"));
    }
}
