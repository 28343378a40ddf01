use super::{AdminRepository, AttendanceRepository, EmployeeRepository};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    administrator::{Administrator, NewAdministrator},
    attendance::{AttendanceRecord, NewAttendance},
    employee::{Employee, NewEmployee},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

struct RefreshEntry {
    expires_at: NaiveDateTime,
    revoked: bool,
}

#[derive(Default)]
struct Tables {
    employees: BTreeMap<u64, Employee>,
    attendance: Vec<AttendanceRecord>,
    admins: BTreeMap<u64, Administrator>,
    refresh_tokens: HashMap<String, RefreshEntry>,
    next_employee_id: u64,
    next_attendance_id: u64,
    next_admin_id: u64,
}

impl Tables {
    fn employee_conflict(&self, employee: &NewEmployee, except: Option<u64>) -> Option<&'static str> {
        self.employees
            .values()
            .filter(|e| Some(e.id) != except)
            .find_map(|e| {
                if e.document_id == employee.document_id {
                    Some("document_id")
                } else if e.id_employee == employee.id_employee {
                    Some("id_employee")
                } else {
                    None
                }
            })
    }
}

/// Process-local storage. Every operation runs under a single lock, so the
/// check-then-insert in `insert_attendance` is atomic.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // every mutation is a single push/insert, so a poisoned lock still guards consistent tables
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryRepository {
    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.tables().employees.get(&id).cloned())
    }

    async fn find_employee_by_document(&self, document_id: u64) -> StoreResult<Option<Employee>> {
        Ok(self
            .tables()
            .employees
            .values()
            .find(|e| e.document_id == document_id)
            .cloned())
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.tables().employees.values().cloned().collect())
    }

    async fn insert_employee(
        &self,
        employee: NewEmployee,
        now: NaiveDateTime,
    ) -> StoreResult<Employee> {
        let mut tables = self.tables();
        if let Some(field) = tables.employee_conflict(&employee, None) {
            return Err(StoreError::Duplicate { field });
        }
        tables.next_employee_id += 1;
        let stored = employee.into_employee(tables.next_employee_id, now);
        tables.employees.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_employee(
        &self,
        id: u64,
        employee: NewEmployee,
    ) -> StoreResult<Option<Employee>> {
        let mut tables = self.tables();
        let created_at = match tables.employees.get(&id) {
            Some(current) => current.created_at,
            None => return Ok(None),
        };
        if let Some(field) = tables.employee_conflict(&employee, Some(id)) {
            return Err(StoreError::Duplicate { field });
        }
        let stored = employee.into_employee(id, created_at);
        tables.employees.insert(id, stored.clone());
        Ok(Some(stored))
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let mut tables = self.tables();
        if tables.employees.remove(&id).is_none() {
            return Ok(false);
        }
        tables.attendance.retain(|a| a.employee_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryRepository {
    async fn find_attendance_for_employee_on_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self
            .tables()
            .attendance
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .cloned())
    }

    async fn insert_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord> {
        let mut tables = self.tables();
        let taken = tables
            .attendance
            .iter()
            .any(|a| a.employee_id == attendance.employee_id && a.date == attendance.date);
        if taken {
            return Err(StoreError::Duplicate { field: "employee_date" });
        }
        if tables
            .attendance
            .iter()
            .any(|a| a.id_attendance == attendance.id_attendance)
        {
            return Err(StoreError::Duplicate { field: "id_attendance" });
        }
        tables.next_attendance_id += 1;
        let record = attendance.into_record(tables.next_attendance_id);
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn update_checkout(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        let mut tables = self.tables();
        match tables.attendance.iter_mut().find(|a| a.id == record.id) {
            Some(stored) if stored.check_out_time.is_none() => {
                stored.check_out_time = record.check_out_time;
                stored.updated_at = record.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_attendance(&self) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self.tables().attendance.clone())
    }
}

#[async_trait]
impl AdminRepository for InMemoryRepository {
    async fn find_admin(&self, id: u64) -> StoreResult<Option<Administrator>> {
        Ok(self.tables().admins.get(&id).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Administrator>> {
        Ok(self
            .tables()
            .admins
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn insert_admin(
        &self,
        admin: NewAdministrator,
        now: NaiveDateTime,
    ) -> StoreResult<Administrator> {
        let mut tables = self.tables();
        let conflict = tables.admins.values().find_map(|a| {
            if a.username == admin.username {
                Some("username")
            } else if a.email == admin.email {
                Some("email")
            } else if a.id_administrator == admin.id_administrator {
                Some("id_administrator")
            } else if a.phone_number == admin.phone_number {
                Some("phone_number")
            } else {
                None
            }
        });
        if let Some(field) = conflict {
            return Err(StoreError::Duplicate { field });
        }
        tables.next_admin_id += 1;
        let stored = admin.into_administrator(tables.next_admin_id, now);
        tables.admins.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn store_refresh_token(
        &self,
        _admin_id: u64,
        jti: &str,
        issued_at: NaiveDateTime,
        expires_at: NaiveDateTime,
    ) -> StoreResult<()> {
        let mut tables = self.tables();
        tables
            .refresh_tokens
            .retain(|_, entry| !entry.revoked && entry.expires_at >= issued_at);
        tables.refresh_tokens.insert(
            jti.to_string(),
            RefreshEntry {
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let mut tables = self.tables();
        match tables.refresh_tokens.get_mut(jti) {
            Some(entry) if !entry.revoked => {
                entry.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
