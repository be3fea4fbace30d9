use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "employee_code": "EMP-007",
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane.doe@company.com",
        "department": "Engineering",
        "position": "Backend Engineer",
        "manager_id": 2,
        "is_active": true,
        "hire_date": "2024-01-01"
    })
)]
pub struct Employee {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "EMP-007")]
    pub employee_code: String,

    #[schema(example = "Jane")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "jane.doe@company.com")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Backend Engineer")]
    pub position: String,

    /// Non-owning reference to the direct manager; `None` at the top of the hierarchy.
    #[schema(example = 2, nullable = true)]
    pub manager_id: Option<u64>,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload for a new employee.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "EMP-008")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Smith")]
    pub last_name: String,
    #[schema(example = "john.smith@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "QA Engineer")]
    pub position: String,
    #[schema(example = 2, nullable = true)]
    pub manager_id: Option<u64>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
}
