use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Event types published by the kiosk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    // Capture device events
    CaptureAcquired,
    CaptureReleased,
    CaptureFailed,

    // Scan events
    ScanStarted,
    ScanIgnored,
    ScanCompleted,
    ScanFailed,

    // Record store events
    RecordAppended,

    // Session events
    SessionOpened,
    SessionClosed,

    // View events
    ViewChanged,
    ManagerFilterChanged,

    // System events
    SystemStartup,
    SystemShutdown,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CaptureAcquired => write!(f, "capture.acquired"),
            Self::CaptureReleased => write!(f, "capture.released"),
            Self::CaptureFailed => write!(f, "capture.failed"),
            Self::ScanStarted => write!(f, "scan.started"),
            Self::ScanIgnored => write!(f, "scan.ignored"),
            Self::ScanCompleted => write!(f, "scan.completed"),
            Self::ScanFailed => write!(f, "scan.failed"),
            Self::RecordAppended => write!(f, "record.appended"),
            Self::SessionOpened => write!(f, "session.opened"),
            Self::SessionClosed => write!(f, "session.closed"),
            Self::ViewChanged => write!(f, "view.changed"),
            Self::ManagerFilterChanged => write!(f, "manager.filter_changed"),
            Self::SystemStartup => write!(f, "system.startup"),
            Self::SystemShutdown => write!(f, "system.shutdown"),
        }
    }
}

/// Event message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Unique event ID
    pub id: Uuid,
    /// Event type
    pub event_type: EventType,
    /// Event source ID (e.g., record or capture handle ID)
    pub source_id: Option<Uuid>,
    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event data payload
    pub payload: serde_json::Value,
}

impl EventMessage {
    /// Create a new event message
    pub fn new<T: Serialize>(
        event_type: EventType,
        source_id: Option<Uuid>,
        payload: T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            event_type,
            source_id,
            timestamp: chrono::Utc::now(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Dotted routing key, suffixed with the source when present
    pub fn routing_key(&self) -> String {
        match &self.source_id {
            Some(id) => format!("{}.{}", self.event_type, id),
            None => self.event_type.to_string(),
        }
    }
}
