pub mod employee_models;
pub mod record_models;
