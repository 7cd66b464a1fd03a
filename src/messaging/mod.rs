pub mod broker;
pub mod event;
pub mod kiosk_events;

pub use broker::{MessageBroker, MessageBrokerTrait};
pub use event::{EventMessage, EventType};
pub use kiosk_events::KioskEvents;
