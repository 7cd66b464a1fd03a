pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod messaging;
pub mod security;
pub mod services;
pub mod state;

// Re-export main components for easier use
pub use error::Error;
pub use services::scan::{ScanOutcome, ScanTerminal};
pub use state::{KioskState, SharedKioskState, ViewState};
