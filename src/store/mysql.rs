use super::{AdminRepository, AttendanceRepository, EmployeeRepository};
use crate::error::StoreResult;
use crate::model::{
    administrator::{Administrator, NewAdministrator},
    attendance::{AttendanceRecord, NewAttendance},
    employee::{Employee, EmployeeState, NewEmployee, allowed_states},
};
use crate::utils::db_utils::{SqlValue, UpdateBuilder, execute_update};
use crate::utils::document_cache::DocumentCache;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

pub const EMPLOYEE_COLUMNS: &str = "id, id_employee, document_id, name, lastname, phone_number, role, contract_date, state, created_at";

const ATTENDANCE_COLUMNS: &str = "id, id_attendance, employee_id, date, check_in_time, check_out_time, status, created_at, updated_at";

const ADMIN_COLUMNS: &str = "id, id_administrator, username, email, phone_number, password, is_staff, is_active, created_at";

#[derive(FromRow)]
pub struct EmployeeRow {
    pub id: u64,
    pub id_employee: String,
    pub document_id: u64,
    pub name: String,
    pub lastname: String,
    pub phone_number: u64,
    pub role: String,
    pub contract_date: NaiveDate,
    pub state: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = sqlx::Error;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let state: EmployeeState = row.state.parse().map_err(|_| {
            sqlx::Error::Decode(
                format!(
                    "employee {} has state '{}', expected one of {}",
                    row.id,
                    row.state,
                    allowed_states()
                )
                .into(),
            )
        })?;

        Ok(Employee {
            id: row.id,
            id_employee: row.id_employee,
            document_id: row.document_id,
            name: row.name,
            lastname: row.lastname,
            phone_number: row.phone_number,
            role: row.role,
            contract_date: row.contract_date,
            state,
            created_at: row.created_at,
        })
    }
}

pub struct MySqlRepository {
    pool: MySqlPool,
    documents: DocumentCache,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool, documents: DocumentCache) -> Self {
        Self { pool, documents }
    }

    async fn fetch_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::try_from).transpose()?)
    }
}

#[async_trait]
impl EmployeeRepository for MySqlRepository {
    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        self.fetch_employee(id).await
    }

    async fn find_employee_by_document(&self, document_id: u64) -> StoreResult<Option<Employee>> {
        if let Some(employee) = self.documents.get(document_id).await {
            return Ok(Some(employee));
        }

        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE document_id = ?");
        let employee = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()?;

        if let Some(employee) = &employee {
            self.documents.insert(employee.clone()).await;
        }
        Ok(employee)
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(Employee::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn insert_employee(
        &self,
        employee: NewEmployee,
        now: NaiveDateTime,
    ) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (id_employee, document_id, name, lastname, phone_number, role, contract_date, state, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.id_employee)
        .bind(employee.document_id)
        .bind(&employee.name)
        .bind(&employee.lastname)
        .bind(employee.phone_number)
        .bind(&employee.role)
        .bind(employee.contract_date)
        .bind(employee.state.as_ref())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(employee.into_employee(result.last_insert_id(), now))
    }

    async fn update_employee(
        &self,
        id: u64,
        employee: NewEmployee,
    ) -> StoreResult<Option<Employee>> {
        let Some(current) = self.fetch_employee(id).await? else {
            return Ok(None);
        };

        let update = UpdateBuilder::new("employees")
            .set_if_changed("id_employee", &current.id_employee, &employee.id_employee, |v| {
                SqlValue::String(v.clone())
            })
            .set_if_changed("document_id", &current.document_id, &employee.document_id, |v| {
                SqlValue::U64(*v)
            })
            .set_if_changed("name", &current.name, &employee.name, |v| SqlValue::String(v.clone()))
            .set_if_changed("lastname", &current.lastname, &employee.lastname, |v| {
                SqlValue::String(v.clone())
            })
            .set_if_changed("phone_number", &current.phone_number, &employee.phone_number, |v| {
                SqlValue::U64(*v)
            })
            .set_if_changed("role", &current.role, &employee.role, |v| SqlValue::String(v.clone()))
            .set_if_changed("contract_date", &current.contract_date, &employee.contract_date, |v| {
                SqlValue::Date(*v)
            })
            .set_if_changed("state", &current.state, &employee.state, |v| {
                SqlValue::String(v.to_string())
            })
            .build("id", id);

        if let Some(update) = update {
            debug!(sql = %update.sql, employee_id = id, "Updating employee");
            let affected = execute_update(&self.pool, update).await?;
            // MySQL counts changed rows, so 0 is also a concurrent write of the same values
            if affected == 0 && self.fetch_employee(id).await?.is_none() {
                self.documents.invalidate(current.document_id).await;
                return Ok(None);
            }
        }

        self.documents.invalidate(current.document_id).await;
        self.documents.invalidate(employee.document_id).await;

        Ok(Some(employee.into_employee(id, current.created_at)))
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let Some(current) = self.fetch_employee(id).await? else {
            return Ok(false);
        };

        // attendance rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.documents.invalidate(current.document_id).await;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttendanceRepository for MySqlRepository {
    async fn find_attendance_for_employee_on_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord> {
        // uq_attendance_employee_date turns a concurrent double check-in into a duplicate-key error
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (id_attendance, employee_id, date, check_in_time, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attendance.id_attendance)
        .bind(attendance.employee_id)
        .bind(attendance.date)
        .bind(attendance.check_in_time)
        .bind(&attendance.status)
        .bind(attendance.created_at)
        .bind(attendance.created_at)
        .execute(&self.pool)
        .await?;

        Ok(attendance.into_record(result.last_insert_id()))
    }

    async fn update_checkout(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, updated_at = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(record.check_out_time)
        .bind(record.updated_at)
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_attendance(&self) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY id");
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl AdminRepository for MySqlRepository {
    async fn find_admin(&self, id: u64) -> StoreResult<Option<Administrator>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM administrators WHERE id = ?");
        Ok(sqlx::query_as::<_, Administrator>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Administrator>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM administrators WHERE username = ?");
        Ok(sqlx::query_as::<_, Administrator>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_admin(
        &self,
        admin: NewAdministrator,
        now: NaiveDateTime,
    ) -> StoreResult<Administrator> {
        let result = sqlx::query(
            r#"
            INSERT INTO administrators
            (id_administrator, username, email, phone_number, password, is_staff, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(&admin.id_administrator)
        .bind(&admin.username)
        .bind(&admin.email)
        .bind(admin.phone_number)
        .bind(&admin.password_hash)
        .bind(admin.is_staff)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(admin.into_administrator(result.last_insert_id(), now))
    }

    async fn store_refresh_token(
        &self,
        admin_id: u64,
        jti: &str,
        issued_at: NaiveDateTime,
        expires_at: NaiveDateTime,
    ) -> StoreResult<()> {
        let pruned = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE revoked = TRUE
            OR expires_at < ?
            "#,
        )
        .bind(issued_at)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if pruned > 0 {
            debug!(pruned, "Pruned stale refresh tokens");
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (admin_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(admin_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ?
            AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
