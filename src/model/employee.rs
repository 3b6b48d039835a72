use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The slice of an `employees` row needed to resolve biometric identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "7",
        "first_name": "John",
        "last_name": "Doe"
    })
)]
pub struct DirectoryEmployee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "7")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,
}

impl DirectoryEmployee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}
