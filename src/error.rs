use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};
use serde_json::json;
use std::collections::BTreeMap;

/// Field name → list of messages, serialized as-is under `"fields"`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failures raised by a storage backend.
#[derive(Debug, Display, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write; `field` names the offending column.
    #[display(fmt = "duplicate value for {}", field)]
    Duplicate { field: &'static str },

    #[display(fmt = "database error: {}", source)]
    Database { source: sqlx::Error },
}

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &source {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate {
                    field: duplicate_field(db_err.message()),
                };
            }
        }
        StoreError::Database { source }
    }
}

// MySQL reports the violated key by name: "Duplicate entry '..' for key 'employees.uq_employees_document_id'".
// The entry itself is user data, so only the key name is inspected.
fn duplicate_field(message: &str) -> &'static str {
    const KNOWN: [&str; 8] = [
        "document_id",
        "id_employee",
        "id_attendance",
        "employee_date",
        "id_administrator",
        "username",
        "email",
        "phone_number",
    ];
    const MARKER: &str = "for key '";

    let Some(at) = message.rfind(MARKER) else {
        return "unknown";
    };
    let key = message[at + MARKER.len()..].trim_end_matches('\'');
    // MySQL 8.0.19+ prefixes the table name
    let key = key.rsplit('.').next().unwrap_or(key);

    KNOWN
        .into_iter()
        .find(|field| key.strip_suffix(field).is_some_and(|rest| rest.ends_with('_')))
        .unwrap_or("unknown")
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display(fmt = "{}", message)]
    MissingInput { message: String },

    #[display(fmt = "{}", message)]
    NotFound { message: String },

    #[display(fmt = "{}", message)]
    Conflict { message: String },

    #[display(fmt = "{}", detail)]
    Unauthorized { detail: String },

    #[display(fmt = "{}", detail)]
    Forbidden { detail: String },

    #[display(fmt = "validation failed")]
    Validation { fields: FieldErrors },

    #[display(fmt = "{}", message)]
    BadRequest { message: String },

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn missing_input(message: impl Into<String>) -> Self {
        ApiError::MissingInput { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict { message: message.into() }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        ApiError::Unauthorized { detail: detail.into() }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        ApiError::Forbidden { detail: detail.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into() }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation { fields }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInput { .. }
            | ApiError::Validation { .. }
            | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Unauthorized { detail } | ApiError::Forbidden { detail } => {
                json!({ "detail": detail })
            }
            ApiError::Validation { fields } => json!({
                "error": "Datos inválidos",
                "fields": fields,
            }),
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Storage failure");
        ApiError::Internal
    }
}
