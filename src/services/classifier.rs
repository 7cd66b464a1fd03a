use crate::db::models::record_models::{AttendanceRecord, HealthStatus, Thresholds, VitalsReading};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// RISK when any single threshold is breached, GOOD otherwise
pub fn classify(reading: &VitalsReading, thresholds: &Thresholds) -> HealthStatus {
    let breached = reading.heart_rate > thresholds.heart_rate_high
        || reading.spo2 < thresholds.spo2_low
        || reading.stress_level > thresholds.stress_high;

    if breached {
        HealthStatus::Risk
    } else {
        HealthStatus::Good
    }
}

/// Manager table filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerFilter {
    #[default]
    All,
    #[serde(alias = "RISK")]
    RiskOnly,
}

impl FromStr for ManagerFilter {
    type Err = Error;

    /// Accepts `all`, `risk` and `risk_only` in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ManagerFilter::All),
            "risk" | "risk_only" => Ok(ManagerFilter::RiskOnly),
            other => Err(Error::Api(format!("Unknown filter: {}", other))),
        }
    }
}

/// Ordering used by the manager table: RISK before GOOD, then newest first
pub fn manager_order(a: &AttendanceRecord, b: &AttendanceRecord) -> Ordering {
    b.status
        .is_risk()
        .cmp(&a.status.is_risk())
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

/// Filter and sort records for the manager dashboard
pub fn project_for_manager<'a, I>(records: I, filter: ManagerFilter) -> Vec<AttendanceRecord>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut projected: Vec<AttendanceRecord> = records
        .into_iter()
        .filter(|record| match filter {
            ManagerFilter::All => true,
            ManagerFilter::RiskOnly => record.status.is_risk(),
        })
        .cloned()
        .collect();

    projected.sort_by(manager_order);
    projected
}

/// Header counters, always over the unfiltered store
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSummary {
    pub total: usize,
    pub risk_count: usize,
    pub good_count: usize,
}

pub fn summarize<'a, I>(records: I) -> ManagerSummary
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    records
        .into_iter()
        .fold(ManagerSummary::default(), |mut summary, record| {
            summary.total += 1;
            match record.status {
                HealthStatus::Risk => summary.risk_count += 1,
                HealthStatus::Good => summary.good_count += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::employee_models::Employee;
    use crate::db::models::record_models::THRESHOLDS;
    use chrono::{Duration, TimeZone, Utc};

    fn reading(heart_rate: u32, spo2: u32, stress_level: u32) -> VitalsReading {
        VitalsReading {
            heart_rate,
            respiration_rate: 15,
            spo2,
            blood_pressure_sys: 120,
            blood_pressure_dia: 80,
            stress_level,
        }
    }

    fn record(minute: i64, status: HealthStatus) -> AttendanceRecord {
        let employee = Employee {
            id: "E003".to_string(),
            name: "Alex Murphy".to_string(),
            department: "Operations".to_string(),
            avatar_url: String::new(),
            password: String::new(),
        };
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        AttendanceRecord::with_timestamp(
            &employee,
            base + Duration::minutes(minute),
            String::new(),
            reading(80, 98, 10),
            status,
            None,
        )
    }

    #[test]
    fn test_heart_rate_breach() {
        assert_eq!(classify(&reading(101, 98, 10), &THRESHOLDS), HealthStatus::Risk);
    }

    #[test]
    fn test_spo2_breach() {
        assert_eq!(classify(&reading(80, 94, 10), &THRESHOLDS), HealthStatus::Risk);
    }

    #[test]
    fn test_stress_breach() {
        assert_eq!(classify(&reading(80, 98, 81), &THRESHOLDS), HealthStatus::Risk);
    }

    #[test]
    fn test_all_within_limits() {
        assert_eq!(classify(&reading(80, 98, 10), &THRESHOLDS), HealthStatus::Good);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        // Exactly at a threshold is not a breach
        assert_eq!(classify(&reading(100, 95, 80), &THRESHOLDS), HealthStatus::Good);
        // Low heart rate is not part of the rule
        assert_eq!(classify(&reading(40, 98, 10), &THRESHOLDS), HealthStatus::Good);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let r = reading(99, 96, 79);
        let first = classify(&r, &THRESHOLDS);
        for _ in 0..100 {
            assert_eq!(classify(&r, &THRESHOLDS), first);
        }
    }

    #[test]
    fn test_manager_projection_all() {
        let records = vec![
            record(1, HealthStatus::Good),
            record(5, HealthStatus::Risk),
            record(3, HealthStatus::Good),
            record(2, HealthStatus::Risk),
            record(9, HealthStatus::Good),
        ];

        let projected = project_for_manager(&records, ManagerFilter::All);
        let order: Vec<(HealthStatus, i64)> = projected
            .iter()
            .map(|r| (r.status, r.timestamp.timestamp()))
            .collect();

        let first_good = projected.iter().position(|r| !r.status.is_risk()).unwrap();
        assert!(projected[..first_good].iter().all(|r| r.status.is_risk()));
        assert!(projected[first_good..].iter().all(|r| !r.status.is_risk()));

        for pair in projected[..first_good].windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        for pair in projected[first_good..].windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        assert_eq!(order.len(), 5);
        assert_eq!(projected[0].id, records[1].id);
        assert_eq!(projected[2].id, records[4].id);
    }

    #[test]
    fn test_manager_projection_risk_only() {
        let records = vec![
            record(1, HealthStatus::Risk),
            record(4, HealthStatus::Good),
            record(7, HealthStatus::Risk),
        ];

        let all = project_for_manager(&records, ManagerFilter::All);
        let risk = project_for_manager(&records, ManagerFilter::RiskOnly);

        assert_eq!(risk.len(), 2);
        assert!(risk.iter().all(|r| r.status.is_risk()));
        let all_risk_ids: Vec<_> = all.iter().filter(|r| r.status.is_risk()).map(|r| r.id).collect();
        let risk_ids: Vec<_> = risk.iter().map(|r| r.id).collect();
        assert_eq!(all_risk_ids, risk_ids);
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record(1, HealthStatus::Risk),
            record(2, HealthStatus::Good),
            record(3, HealthStatus::Good),
        ];
        let summary = summarize(&records);
        assert_eq!(
            summary,
            ManagerSummary {
                total: 3,
                risk_count: 1,
                good_count: 2
            }
        );
    }

    #[test]
    fn test_filter_accepts_legacy_name() {
        let filter: ManagerFilter = serde_json::from_str("\"RISK\"").unwrap();
        assert_eq!(filter, ManagerFilter::RiskOnly);
        let filter: ManagerFilter = serde_json::from_str("\"RISK_ONLY\"").unwrap();
        assert_eq!(filter, ManagerFilter::RiskOnly);
    }

    #[test]
    fn test_filter_from_query_value() {
        assert_eq!("all".parse::<ManagerFilter>().unwrap(), ManagerFilter::All);
        assert_eq!("risk".parse::<ManagerFilter>().unwrap(), ManagerFilter::RiskOnly);
        assert_eq!("RISK_ONLY".parse::<ManagerFilter>().unwrap(), ManagerFilter::RiskOnly);
        assert!(matches!("good".parse::<ManagerFilter>(), Err(Error::Api(_))));
    }
}
