use crate::api::attendance::ImportQuery;
use crate::import::{ImportSummary, StatusTag};
use crate::model::employee::DirectoryEmployee;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance Import API",
        version = "1.0.0",
        description = r#"
## Biometric attendance import

Upload the daily attendance report exported by the biometric terminals and
turn it into attendance records.

### Key Features
- **Preview**
  - Parse the workbook and show which rows match an active employee
- **Import**
  - Insert new attendance, update existing days, skip weekly offs

### Accepted files
xls, xlsx, xlsm, xlsb, ods and csv. Only the first sheet is read.

### Security
Both endpoints require a **JWT Bearer** access token with the **Admin** or
**HR** role.
"#,
    ),
    paths(
        crate::api::attendance::preview_import,
        crate::api::attendance::import_attendance,
    ),
    components(
        schemas(
            ImportQuery,
            ImportSummary,
            DirectoryEmployee,
            StatusTag
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance import APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_both_import_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/import"));
        assert!(doc.paths.paths.contains_key("/api/attendance/import/preview"));
    }
}
