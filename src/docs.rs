use crate::api::attendance::{CheckPayload, MessageResponse};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, EmployeePayload, EmployeeState};
use crate::models::{LoginReqDto, RefreshReqDto, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Right On Time API",
        version = "0.1.0",
        description = r#"
## Employee attendance service

### 🔹 Key Features
- **Attendance**
  - Kiosk check-in and check-out by document number, once per day
  - Full attendance listing for staff
- **Employee Management**
  - Create, update, list, view and delete employee records
- **Authentication**
  - Administrator login with JWT access/refresh tokens

### 🔐 Security
Employee endpoints require a **JWT Bearer** access token.
The attendance listing additionally requires a staff account.

### 📦 Errors
- Attendance errors: `{"error": "..."}`
- Authentication errors: `{"detail": "..."}`
- Validation errors: `{"error": "Datos inválidos", "fields": {...}}`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_all,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::patch_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            LoginReqDto,
            RefreshReqDto,
            TokenPair,
            CheckPayload,
            MessageResponse,
            AttendanceRecord,
            Employee,
            EmployeePayload,
            EmployeeState
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Administrator authentication APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
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
