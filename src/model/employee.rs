use crate::error::FieldErrors;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

pub const REQUIRED: &str = "Este campo es requerido.";
pub const INVALID_PHONE: &str = "No es un número de teléfono válido";
pub const INVALID_DOCUMENT: &str = "No es un número de documento válido";
pub const DUPLICATE_DOCUMENT: &str = "Ya existe un empleado con este documento.";
pub const DUPLICATE_ID_EMPLOYEE: &str = "Ya existe un empleado con este ID.";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeState {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "id_employee": "EMP-001",
        "document_id": 1023456789,
        "name": "Laura",
        "lastname": "Gómez",
        "phone_number": 3001234567u64,
        "role": "Cashier",
        "contract_date": "2024-01-15",
        "state": "active",
        "created_at": "2024-01-15T08:00:00"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub id_employee: String,

    pub document_id: u64,

    #[schema(example = "Laura")]
    pub name: String,

    #[schema(example = "Gómez")]
    pub lastname: String,

    pub phone_number: u64,

    #[schema(example = "Cashier")]
    pub role: String,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub contract_date: NaiveDate,

    pub state: EmployeeState,

    #[schema(example = "2024-01-15T08:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Validated employee values ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub id_employee: String,
    pub document_id: u64,
    pub name: String,
    pub lastname: String,
    pub phone_number: u64,
    pub role: String,
    pub contract_date: NaiveDate,
    pub state: EmployeeState,
}

impl NewEmployee {
    pub fn into_employee(self, id: u64, created_at: NaiveDateTime) -> Employee {
        Employee {
            id,
            id_employee: self.id_employee,
            document_id: self.document_id,
            name: self.name,
            lastname: self.lastname,
            phone_number: self.phone_number,
            role: self.role,
            contract_date: self.contract_date,
            state: self.state,
            created_at,
        }
    }
}

/// Request body for create, full update and partial update.
///
/// Every field is optional at the wire level so that missing fields are reported
/// per field instead of as a JSON decoding failure.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct EmployeePayload {
    #[schema(example = "EMP-001")]
    pub id_employee: Option<String>,
    pub document_id: Option<u64>,
    #[schema(example = "Laura")]
    pub name: Option<String>,
    #[schema(example = "Gómez")]
    pub lastname: Option<String>,
    pub phone_number: Option<u64>,
    #[schema(example = "Cashier")]
    pub role: Option<String>,
    #[schema(example = "2024-01-15", value_type = Option<String>, format = "date")]
    pub contract_date: Option<NaiveDate>,
    pub state: Option<EmployeeState>,
}

impl EmployeePayload {
    /// Create / PUT: every field except `state` must be present.
    pub fn into_new(self) -> Result<NewEmployee, FieldErrors> {
        let mut errors = FieldErrors::new();

        let id_employee = require(&mut errors, "id_employee", self.id_employee);
        let document_id = require(&mut errors, "document_id", self.document_id);
        let name = require(&mut errors, "name", self.name);
        let lastname = require(&mut errors, "lastname", self.lastname);
        let phone_number = require(&mut errors, "phone_number", self.phone_number);
        let role = require(&mut errors, "role", self.role);
        let contract_date = require(&mut errors, "contract_date", self.contract_date);

        match (id_employee, document_id, name, lastname, phone_number, role, contract_date) {
            (
                Some(id_employee),
                Some(document_id),
                Some(name),
                Some(lastname),
                Some(phone_number),
                Some(role),
                Some(contract_date),
            ) if errors.is_empty() => {
                let employee = NewEmployee {
                    id_employee,
                    document_id,
                    name,
                    lastname,
                    phone_number,
                    role,
                    contract_date,
                    state: self.state.unwrap_or_default(),
                };
                employee.validate().map(|_| employee)
            }
            _ => Err(errors),
        }
    }

    /// PATCH: overlays the provided fields on `current` and validates the result.
    pub fn apply_to(self, current: &Employee) -> Result<NewEmployee, FieldErrors> {
        let employee = NewEmployee {
            id_employee: self.id_employee.unwrap_or_else(|| current.id_employee.clone()),
            document_id: self.document_id.unwrap_or(current.document_id),
            name: self.name.unwrap_or_else(|| current.name.clone()),
            lastname: self.lastname.unwrap_or_else(|| current.lastname.clone()),
            phone_number: self.phone_number.unwrap_or(current.phone_number),
            role: self.role.unwrap_or_else(|| current.role.clone()),
            contract_date: self.contract_date.unwrap_or(current.contract_date),
            state: self.state.unwrap_or(current.state),
        };
        employee.validate().map(|_| employee)
    }
}

fn require<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.insert(field.to_string(), vec![REQUIRED.to_string()]);
    }
    value
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        check_text(&mut errors, "id_employee", &self.id_employee, 50);
        check_text(&mut errors, "name", &self.name, 150);
        check_text(&mut errors, "lastname", &self.lastname, 150);
        check_text(&mut errors, "role", &self.role, 50);

        if !is_valid_document(self.document_id) {
            push(&mut errors, "document_id", INVALID_DOCUMENT);
        }
        if !is_valid_phone(self.phone_number) {
            push(&mut errors, "phone_number", INVALID_PHONE);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        push(errors, field, "Este campo no puede estar en blanco.");
    } else if value.chars().count() > max {
        push(
            errors,
            field,
            &format!("Asegúrese de que este campo no tenga más de {max} caracteres."),
        );
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Document numbers have 7 to 10 digits.
pub fn is_valid_document(document_id: u64) -> bool {
    (1_000_000..=9_999_999_999).contains(&document_id)
}

/// Mobile numbers have 10 digits and start with 3 or 6.
pub fn is_valid_phone(phone_number: u64) -> bool {
    (3_000_000_000..=3_999_999_999).contains(&phone_number)
        || (6_000_000_000..=6_999_999_999).contains(&phone_number)
}

/// Comma separated list of accepted `state` values, for error messages.
pub fn allowed_states() -> String {
    EmployeeState::iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
