//! Storage seams. Handlers and the attendance recorder only talk to these traits;
//! `MySqlRepository` backs production and `InMemoryRepository` backs tests and
//! the `memory` storage backend.

pub mod memory;
pub mod mysql;

use crate::error::StoreResult;
use crate::model::{
    administrator::{Administrator, NewAdministrator},
    attendance::{AttendanceRecord, NewAttendance},
    employee::{Employee, NewEmployee},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>>;

    async fn find_employee_by_document(&self, document_id: u64) -> StoreResult<Option<Employee>>;

    /// Ordered by id.
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Fails with `StoreError::Duplicate` when `id_employee` or `document_id` is taken.
    async fn insert_employee(
        &self,
        employee: NewEmployee,
        now: NaiveDateTime,
    ) -> StoreResult<Employee>;

    /// Returns `None` when no employee has this id.
    async fn update_employee(&self, id: u64, employee: NewEmployee)
    -> StoreResult<Option<Employee>>;

    /// Removes the employee and their attendance records.
    async fn delete_employee(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait AttendanceRepository: EmployeeRepository {
    async fn find_attendance_for_employee_on_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Fails with `StoreError::Duplicate { field: "employee_date" }` when the employee
    /// already has a record for that date.
    async fn insert_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord>;

    /// Persists the check-out of `record`. Returns `false` if the stored row was already
    /// checked out, in which case nothing is written.
    async fn update_checkout(&self, record: &AttendanceRecord) -> StoreResult<bool>;

    /// Insertion order.
    async fn list_attendance(&self) -> StoreResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_admin(&self, id: u64) -> StoreResult<Option<Administrator>>;

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Administrator>>;

    async fn insert_admin(
        &self,
        admin: NewAdministrator,
        now: NaiveDateTime,
    ) -> StoreResult<Administrator>;

    /// Records a freshly issued token and drops tokens that expired before `issued_at`
    /// or were already revoked.
    async fn store_refresh_token(
        &self,
        admin_id: u64,
        jti: &str,
        issued_at: NaiveDateTime,
        expires_at: NaiveDateTime,
    ) -> StoreResult<()>;

    /// Marks the token revoked. Returns `true` only if it existed and was still active,
    /// so concurrent refreshes with the same token cannot both succeed.
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool>;
}
