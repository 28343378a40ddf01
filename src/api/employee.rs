use crate::{
    auth::auth::AuthAdmin,
    error::{ApiError, FieldErrors, StoreError},
    model::employee::{DUPLICATE_DOCUMENT, DUPLICATE_ID_EMPLOYEE, EmployeePayload, NewEmployee},
    store::EmployeeRepository,
};
use actix_web::{HttpResponse, web};
use chrono::Local;
use tracing::{debug, info, instrument};

const NOT_FOUND: &str = "Empleado no encontrado";

fn invalid(fields: FieldErrors) -> ApiError {
    debug!(?fields, "Employee payload rejected");
    ApiError::Validation { fields }
}

/// Unique-key violations are reported against the field, like any other validation error.
fn write_error(err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate { field: "document_id" } => {
            ApiError::invalid_field("document_id", DUPLICATE_DOCUMENT)
        }
        StoreError::Duplicate { field: "id_employee" } => {
            ApiError::invalid_field("id_employee", DUPLICATE_ID_EMPLOYEE)
        }
        other => other.into(),
    }
}

async fn replace(
    repo: &dyn EmployeeRepository,
    id: u64,
    employee: NewEmployee,
) -> Result<HttpResponse, ApiError> {
    match repo.update_employee(id, employee).await.map_err(write_error)? {
        Some(updated) => {
            info!(employee_id = id, "Employee updated");
            Ok(HttpResponse::Ok().json(updated))
        }
        None => Err(ApiError::not_found(NOT_FOUND)),
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/employees/",
    responses(
        (status = 200, description = "Every employee", body = [Employee]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    _auth: AuthAdmin,
    repo: web::Data<dyn EmployeeRepository>,
) -> Result<HttpResponse, ApiError> {
    let employees = repo.list_employees().await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/employees/",
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid or duplicate fields", body = Object, example = json!({
            "error": "Datos inválidos",
            "fields": { "phone_number": ["No es un número de teléfono válido"] }
        })),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "employee_create", skip_all, fields(admin_id = auth.admin_id))]
pub async fn create_employee(
    auth: AuthAdmin,
    repo: web::Data<dyn EmployeeRepository>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner().into_new().map_err(invalid)?;

    let employee = repo
        .insert_employee(new, Local::now().naive_local())
        .await
        .map_err(write_error)?;

    info!(employee_id = employee.id, id_employee = %employee.id_employee, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/employees/{id}/",
    params(
        ("id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Empleado no encontrado"
        })),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    _auth: AuthAdmin,
    repo: web::Data<dyn EmployeeRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee = repo
        .find_employee(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Replace Employee
#[utoipa::path(
    put,
    path = "/employees/{id}/",
    params(
        ("id", Path, description = "Employee ID")
    ),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid or duplicate fields"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "employee_update", skip_all, fields(admin_id = auth.admin_id))]
pub async fn update_employee(
    auth: AuthAdmin,
    repo: web::Data<dyn EmployeeRepository>,
    path: web::Path<u64>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner().into_new().map_err(invalid)?;
    replace(repo.get_ref(), path.into_inner(), new).await
}

/// Partially update Employee
#[utoipa::path(
    patch,
    path = "/employees/{id}/",
    params(
        ("id", Path, description = "Employee ID")
    ),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid or duplicate fields"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "employee_patch", skip_all, fields(admin_id = auth.admin_id))]
pub async fn patch_employee(
    auth: AuthAdmin,
    repo: web::Data<dyn EmployeeRepository>,
    path: web::Path<u64>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let current = repo
        .find_employee(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    let new = payload.into_inner().apply_to(&current).map_err(invalid)?;
    replace(repo.get_ref(), id, new).await
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/employees/{id}/",
    params(
        ("id", Path, description = "Employee ID")
    ),
    responses(
        (status = 204, description = "Employee and their attendance deleted"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "employee_delete", skip_all, fields(admin_id = auth.admin_id))]
pub async fn delete_employee(
    auth: AuthAdmin,
    repo: web::Data<dyn EmployeeRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    if !repo.delete_employee(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    info!(employee_id = id, "Employee deleted");
    Ok(HttpResponse::NoContent().finish())
}
