use crate::db::models::employee_models::Employee;
use crate::db::models::record_models::AttendanceRecord;
use crate::error::Error;
use crate::messaging::{
    broker::{MessageBroker, MessageBrokerTrait},
    EventType,
};
use crate::services::classifier::ManagerFilter;
use crate::state::ViewState;
use log::warn;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Helper for publishing kiosk events. Publishing never fails the caller.
#[derive(Clone)]
pub struct KioskEvents {
    message_broker: Arc<MessageBroker>,
}

impl KioskEvents {
    /// Create a new kiosk events helper
    pub fn new(message_broker: Arc<MessageBroker>) -> Self {
        Self { message_broker }
    }

    pub fn broker(&self) -> &Arc<MessageBroker> {
        &self.message_broker
    }

    async fn emit<T: Serialize + Send>(&self, event_type: EventType, source_id: Option<Uuid>, payload: T) {
        let name = event_type.to_string();
        if let Err(e) = self.message_broker.publish(event_type, source_id, payload).await {
            warn!("Failed to publish {} event: {}", name, e);
        }
    }

    pub async fn capture_acquired(&self, handle_id: Uuid) {
        self.emit(EventType::CaptureAcquired, Some(handle_id), serde_json::Value::Null)
            .await;
    }

    pub async fn capture_released(&self) {
        self.emit(EventType::CaptureReleased, None, serde_json::Value::Null)
            .await;
    }

    pub async fn capture_failed(&self, error: &Error) {
        let payload = serde_json::json!({
            "permission_denied": matches!(error, Error::PermissionDenied(_)),
            "message": error.to_string(),
        });
        self.emit(EventType::CaptureFailed, None, payload).await;
    }

    pub async fn scan_started(&self) {
        self.emit(EventType::ScanStarted, None, serde_json::Value::Null)
            .await;
    }

    pub async fn scan_ignored(&self, reason: &str) {
        self.emit(EventType::ScanIgnored, None, serde_json::json!({ "reason": reason }))
            .await;
    }

    /// Published once the record is committed
    pub async fn scan_completed(&self, record: &AttendanceRecord) {
        self.emit(EventType::RecordAppended, Some(record.id), record).await;
        let payload = serde_json::json!({
            "employee_id": record.employee_id,
            "employee_name": record.employee_name,
            "status": record.status,
        });
        self.emit(EventType::ScanCompleted, Some(record.id), payload)
            .await;
    }

    pub async fn scan_failed(&self, error: &Error) {
        self.emit(
            EventType::ScanFailed,
            None,
            serde_json::json!({ "message": error.to_string() }),
        )
        .await;
    }

    pub async fn session_opened(&self, employee: &Employee) {
        let payload = serde_json::json!({ "employee_id": employee.id, "name": employee.name });
        self.emit(EventType::SessionOpened, None, payload).await;
    }

    pub async fn session_closed(&self, employee_id: &str) {
        self.emit(
            EventType::SessionClosed,
            None,
            serde_json::json!({ "employee_id": employee_id }),
        )
        .await;
    }

    pub async fn view_changed(&self, view: ViewState) {
        self.emit(EventType::ViewChanged, None, serde_json::json!({ "view": view }))
            .await;
    }

    pub async fn filter_changed(&self, filter: ManagerFilter) {
        self.emit(
            EventType::ManagerFilterChanged,
            None,
            serde_json::json!({ "filter": filter }),
        )
        .await;
    }
}
