use crate::db::models::employee_models::Employee;
use once_cell::sync::Lazy;

static ROSTER: Lazy<Vec<Employee>> = Lazy::new(|| {
    [
        ("E001", "Tony Stark", "Engineering Lead", 5),
        ("E002", "Sarah Connor", "Security", 2),
        ("E003", "Alex Murphy", "Operations", 3),
        ("E004", "Ellen Ripley", "Logistics", 4),
        ("E005", "Diana Prince", "Management", 1),
        ("E006", "Bruce Banner", "R&D Lab", 6),
    ]
    .into_iter()
    .map(|(id, name, department, avatar)| Employee {
        id: id.to_string(),
        name: name.to_string(),
        department: department.to_string(),
        avatar_url: format!("https://picsum.photos/200/200?random={}", avatar),
        password: "1234".to_string(),
    })
    .collect()
});

/// Read-only access to the static demo roster
#[derive(Debug, Clone, Copy, Default)]
pub struct EmployeesRepository;

impl EmployeesRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn get_all(&self) -> &'static [Employee] {
        &ROSTER
    }

    pub fn get_by_id(&self, id: &str) -> Option<&'static Employee> {
        ROSTER.iter().find(|employee| employee.id == id)
    }

    /// Exact, case-sensitive match on both fields
    pub fn find_by_credentials(&self, id: &str, password: &str) -> Option<&'static Employee> {
        ROSTER
            .iter()
            .find(|employee| employee.id == id && employee.password == password)
    }
}
