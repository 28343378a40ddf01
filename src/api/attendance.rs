use crate::{
    error::ApiError,
    recorder::{self, DocumentId, MSG_CHECKED_IN, MSG_CHECKED_OUT},
    store::AttendanceRepository,
};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

/// Kiosk request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckPayload {
    /// JSON number or numeric string.
    #[schema(value_type = Option<String>, example = "1023456789")]
    pub document_id: Option<DocumentId>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/attendance/checkin/",
    request_body = CheckPayload,
    responses(
        (status = 200, description = "Check-in recorded", body = MessageResponse, example = json!({
            "message": "Entrada registrada correctamente"
        })),
        (status = 400, description = "document_id missing", body = Object, example = json!({
            "error": "document_id requerido"
        })),
        (status = 404, description = "No employee with this document", body = Object, example = json!({
            "error": "Empleado no existe"
        })),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "Este empleado ya tiene asistencia hoy"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_in", skip(repo, payload), fields(document_id = ?payload.document_id))]
pub async fn check_in(
    repo: web::Data<dyn AttendanceRepository>,
    payload: web::Json<CheckPayload>,
) -> Result<HttpResponse, ApiError> {
    let now = Local::now().naive_local();

    recorder::check_in(repo.get_ref(), payload.document_id.as_ref(), now).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(MSG_CHECKED_IN)))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/attendance/checkout/",
    request_body = CheckPayload,
    responses(
        (status = 200, description = "Check-out recorded", body = MessageResponse, example = json!({
            "message": "Salida registrada correctamente"
        })),
        (status = 400, description = "document_id missing", body = Object, example = json!({
            "error": "document_id requerido"
        })),
        (status = 404, description = "No employee with this document", body = Object, example = json!({
            "error": "Empleado no existe"
        })),
        (status = 409, description = "No check-in today, or already checked out", body = Object, example = json!({
            "error": "No hay check-in registrado hoy"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_out", skip(repo, payload), fields(document_id = ?payload.document_id))]
pub async fn check_out(
    repo: web::Data<dyn AttendanceRepository>,
    payload: web::Json<CheckPayload>,
) -> Result<HttpResponse, ApiError> {
    let now = Local::now().naive_local();

    recorder::check_out(repo.get_ref(), payload.document_id.as_ref(), now).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(MSG_CHECKED_OUT)))
}

/// All attendance records (staff only)
#[utoipa::path(
    get,
    path = "/attendance/all/",
    responses(
        (status = 200, description = "Every attendance record", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not staff"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_all(repo: web::Data<dyn AttendanceRepository>) -> Result<HttpResponse, ApiError> {
    let records = recorder::list_all(repo.get_ref()).await?;
    Ok(HttpResponse::Ok().json(records))
}
