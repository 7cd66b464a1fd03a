pub mod employees;
pub mod records;

pub use employees::EmployeesRepository;
pub use records::RecordsRepository;
