use crate::db::models::employee_models::Employee;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Fixed classification thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub heart_rate_high: u32,
    pub heart_rate_low: u32,
    pub spo2_low: u32,
    pub stress_high: u32,
}

pub const THRESHOLDS: Thresholds = Thresholds {
    heart_rate_high: 100,
    heart_rate_low: 50,
    spo2_low: 95,
    stress_high: 80,
};

/// One set of vital signs produced by a scan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct VitalsReading {
    /// Beats per minute
    pub heart_rate: u32,
    /// Breaths per minute
    pub respiration_rate: u32,
    /// Blood oxygen saturation, percent
    pub spo2: u32,
    /// mmHg
    pub blood_pressure_sys: u32,
    /// mmHg
    pub blood_pressure_dia: u32,
    /// 0-100
    pub stress_level: u32,
}

/// Health status derived from a reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Good,
    Risk,
}

impl HealthStatus {
    pub fn is_risk(&self) -> bool {
        matches!(self, HealthStatus::Risk)
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Good => write!(f, "GOOD"),
            HealthStatus::Risk => write!(f, "RISK"),
        }
    }
}

/// Attendance record. Created once at scan completion and never mutated.
///
/// `employee_name` and `department` are a snapshot of the roster entry at
/// creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub timestamp: DateTime<Utc>,
    /// Captured image reference (data URL), empty when no frame was captured
    pub photo_url: String,
    pub metrics: VitalsReading,
    pub status: HealthStatus,
    pub ai_analysis: Option<String>,
}

impl AttendanceRecord {
    /// Create a record stamped with the current time
    pub fn new(
        employee: &Employee,
        photo_url: String,
        metrics: VitalsReading,
        status: HealthStatus,
        ai_analysis: Option<String>,
    ) -> Self {
        Self::with_timestamp(employee, Utc::now(), photo_url, metrics, status, ai_analysis)
    }

    pub fn with_timestamp(
        employee: &Employee,
        timestamp: DateTime<Utc>,
        photo_url: String,
        metrics: VitalsReading,
        status: HealthStatus,
        ai_analysis: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            department: employee.department.clone(),
            timestamp,
            photo_url,
            metrics,
            status,
            ai_analysis,
        }
    }
}
