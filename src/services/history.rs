//! Per-employee views over the record store.
//!
//! History is ascending by timestamp (oldest first) so it can be charted
//! directly; the store itself is newest first.

use crate::db::models::employee_models::Employee;
use crate::db::models::record_models::{AttendanceRecord, HealthStatus, VitalsReading, THRESHOLDS};
use serde::Serialize;

/// Systolic pressure above this is shown as elevated
pub const SYSTOLIC_ELEVATED: u32 = 130;

/// Records belonging to `employee_id`, oldest first
pub fn history_for<'a, I>(employee_id: &str, records: I) -> Vec<AttendanceRecord>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut history: Vec<AttendanceRecord> = records
        .into_iter()
        .filter(|record| record.employee_id == employee_id)
        .cloned()
        .collect();

    history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    history
}

/// Most recent record of an ascending history
pub fn latest_of(history: &[AttendanceRecord]) -> Option<&AttendanceRecord> {
    history.last()
}

/// One point of the trend chart
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Local wall-clock label, HH:MM
    pub time: String,
    pub heart_rate: u32,
    pub stress: u32,
    pub spo2: u32,
}

pub fn trend_points(history: &[AttendanceRecord]) -> Vec<TrendPoint> {
    history
        .iter()
        .map(|record| TrendPoint {
            time: record.timestamp.format("%H:%M").to_string(),
            heart_rate: record.metrics.heart_rate,
            stress: record.metrics.stress_level,
            spo2: record.metrics.spo2,
        })
        .collect()
}

/// Gauge value with its full-scale maximum
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VitalGauge {
    pub name: &'static str,
    pub value: u32,
    pub full: u32,
}

pub fn vital_gauges(reading: &VitalsReading) -> Vec<VitalGauge> {
    vec![
        VitalGauge {
            name: "HR",
            value: reading.heart_rate,
            full: 200,
        },
        VitalGauge {
            name: "SpO2",
            value: reading.spo2,
            full: 100,
        },
        VitalGauge {
            name: "Resp",
            value: reading.respiration_rate,
            full: 40,
        },
        VitalGauge {
            name: "Stress",
            value: reading.stress_level,
            full: 100,
        },
    ]
}

/// Per-metric flag shown on the dashboard cards
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum MetricStatus {
    Normal,
    High,
    Low,
    Elevated,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricCard {
    pub title: &'static str,
    /// Display value; blood pressure is `sys/dia`
    pub value: String,
    pub unit: &'static str,
    pub status: MetricStatus,
}

fn flag(condition: bool, status: MetricStatus) -> MetricStatus {
    if condition {
        status
    } else {
        MetricStatus::Normal
    }
}

pub fn metric_cards(reading: &VitalsReading) -> Vec<MetricCard> {
    vec![
        MetricCard {
            title: "Heart Rate",
            value: reading.heart_rate.to_string(),
            unit: "BPM",
            status: flag(reading.heart_rate > THRESHOLDS.heart_rate_high, MetricStatus::High),
        },
        MetricCard {
            title: "SpO2",
            value: reading.spo2.to_string(),
            unit: "%",
            status: flag(reading.spo2 < THRESHOLDS.spo2_low, MetricStatus::Low),
        },
        MetricCard {
            title: "Blood Pressure",
            value: format!("{}/{}", reading.blood_pressure_sys, reading.blood_pressure_dia),
            unit: "",
            status: flag(reading.blood_pressure_sys > SYSTOLIC_ELEVATED, MetricStatus::Elevated),
        },
        MetricCard {
            title: "Stress Index",
            value: reading.stress_level.to_string(),
            unit: "/100",
            status: flag(reading.stress_level > THRESHOLDS.stress_high, MetricStatus::High),
        },
    ]
}

/// Headline for the current status
pub fn duty_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Good => "FIT FOR DUTY",
        HealthStatus::Risk => "ATTENTION REQUIRED",
    }
}

/// Everything the personal dashboard renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDashboard {
    pub employee: Employee,
    pub latest: Option<AttendanceRecord>,
    /// Oldest first
    pub history: Vec<AttendanceRecord>,
    /// Newest first, for the list view
    pub recent: Vec<AttendanceRecord>,
    pub trend: Vec<TrendPoint>,
    pub gauges: Vec<VitalGauge>,
    /// Empty without a latest record
    pub metrics: Vec<MetricCard>,
    pub duty_status: Option<&'static str>,
}

impl EmployeeDashboard {
    pub fn build<'a, I>(employee: &Employee, records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let history = history_for(&employee.id, records);
        let latest = latest_of(&history).cloned();
        let gauges = latest
            .as_ref()
            .map(|record| vital_gauges(&record.metrics))
            .unwrap_or_default();
        let metrics = latest
            .as_ref()
            .map(|record| metric_cards(&record.metrics))
            .unwrap_or_default();
        let duty_status = latest.as_ref().map(|record| duty_label(record.status));
        let recent = history.iter().rev().cloned().collect();
        let trend = trend_points(&history);

        Self {
            employee: employee.clone(),
            latest,
            history,
            recent,
            trend,
            gauges,
            metrics,
            duty_status,
        }
    }
}
