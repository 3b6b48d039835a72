use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::import::{
    self, ImportError, ParsedAttendanceRow, SourceFormat,
    store::{MySqlAttendanceStore, load_active_directory},
};
use crate::model::employee::DirectoryEmployee;
use actix_web::{HttpResponse, Responder, error::InternalError, http::StatusCode, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::Instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ImportQuery {
    #[schema(example = "attendance-january.xlsx")]
    /// Original file name; its extension selects the decoder
    pub file_name: String,
}

/* =========================
Preview an attendance workbook
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/import/preview",
    params(ImportQuery),
    request_body(
        content = String,
        description = "Raw workbook bytes (xls, xlsx, xlsm, xlsb, ods or csv)",
        content_type = "application/octet-stream"
    ),
    responses(
        (status = 200, description = "Parsed and matched rows, nothing written", body = Object,
         example = json!({
            "rows": [{
                "employee_code": "7",
                "employee_name": "JOHN DOE",
                "date": "2026-01-01",
                "check_in": "09:05:00",
                "check_out": "18:10:00",
                "shift": "General",
                "total_duration": "09:05",
                "status": "present",
                "raw_status": "Present",
                "remarks": "",
                "employee_id": 1,
                "matched_name": "John Doe"
            }]
        })),
        (status = 400, description = "Unsupported file type", body = Object, example = json!({
            "message": "Unsupported file type 'pdf'. Allowed: xls, xlsx, xlsm, xlsb, ods, csv"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Unreadable workbook or no attendance records", body = Object,
         example = json!({
            "message": "No attendance records found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn preview_import(
    auth: AuthUser,
    query: web::Query<ImportQuery>,
    body: web::Bytes,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let span = tracing::info_span!(
        "attendance_preview",
        import_id = %Uuid::new_v4(),
        user = %auth.username
    );
    async move {
        let parsed = parse_upload(&query.file_name, body).await?;
        let directory = load_directory(&pool).await?;
        let rows = import::preview(parsed, &directory);

        Ok::<_, actix_web::Error>(HttpResponse::Ok().json(serde_json::json!({ "rows": rows })))
    }
    .instrument(span)
    .await
}

/* =========================
Import an attendance workbook
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/import",
    params(ImportQuery),
    request_body(
        content = String,
        description = "Raw workbook bytes (xls, xlsx, xlsm, xlsb, ods or csv)",
        content_type = "application/octet-stream"
    ),
    responses(
        (status = 200, description = "Rows reconciled into attendance", body = Object,
         example = json!({
            "summary": { "inserted": 21, "updated": 3, "skipped": 0, "unmatched": 2 },
            "rows": []
        })),
        (status = 400, description = "Unsupported file type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Unreadable workbook or no attendance records", body = Object,
         example = json!({
            "message": "No attendance records found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn import_attendance(
    auth: AuthUser,
    query: web::Query<ImportQuery>,
    body: web::Bytes,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let span = tracing::info_span!(
        "attendance_import",
        import_id = %Uuid::new_v4(),
        user = %auth.username
    );
    async move {
        let parsed = parse_upload(&query.file_name, body).await?;
        let directory = load_directory(&pool).await?;

        let store = MySqlAttendanceStore::new(pool.get_ref().clone());
        let report = import::persist(parsed, &directory, &store, &config.reconcile_options()).await;

        Ok::<_, actix_web::Error>(HttpResponse::Ok().json(report))
    }
    .instrument(span)
    .await
}

/// Checks the extension, then decodes and scans on the blocking pool.
async fn parse_upload(
    file_name: &str,
    body: web::Bytes,
) -> actix_web::Result<Vec<ParsedAttendanceRow>> {
    let format = SourceFormat::from_file_name(file_name).map_err(import_error)?;

    web::block(move || import::parse_workbook(&body, format))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Workbook parsing task failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .map_err(import_error)
}

async fn load_directory(pool: &MySqlPool) -> actix_web::Result<Vec<DirectoryEmployee>> {
    load_active_directory(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Loading employee directory failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

fn import_error(e: ImportError) -> actix_web::Error {
    let status = match &e {
        ImportError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
        ImportError::Decode(_) | ImportError::NoRecords => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::warn!(error = %e, %status, "Attendance upload rejected");

    let response = HttpResponse::build(status).json(serde_json::json!({
        "message": e.to_string()
    }));
    InternalError::from_response(e, response).into()
}
