//! In-memory data layer: domain models plus the roster and record repositories.
//! Nothing here is persisted; all state lives for the process lifetime.

pub mod models;
pub mod repositories;
