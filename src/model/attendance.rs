use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const STATUS_PRESENT: &str = "Present";

/// Where a day's record sits in `NoRecord → CheckedIn → CheckedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    CheckedIn,
    CheckedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "id_attendance": "A-5f0c7f0e-8d2a-4f0e-9a57-3f7b1c1e9d11",
    "employee_id": 1,
    "date": "2026-01-05",
    "check_in_time": "08:01:12",
    "check_out_time": null,
    "status": "Present",
    "created_at": "2026-01-05T08:01:12",
    "updated_at": "2026-01-05T08:01:12"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub id_attendance: String,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub check_in_time: NaiveTime,
    #[schema(value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn state(&self) -> AttendanceState {
        match self.check_out_time {
            Some(_) => AttendanceState::CheckedOut,
            None => AttendanceState::CheckedIn,
        }
    }

    /// Returns the checked-out copy of this record, or `None` when it is already closed.
    pub fn checked_out(&self, now: NaiveDateTime) -> Option<AttendanceRecord> {
        match self.state() {
            AttendanceState::CheckedOut => None,
            AttendanceState::CheckedIn => Some(AttendanceRecord {
                check_out_time: Some(now.time()),
                updated_at: now,
                ..self.clone()
            }),
        }
    }
}

/// A check-in that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub id_attendance: String,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl NewAttendance {
    pub fn check_in(employee_id: u64, now: NaiveDateTime) -> Self {
        Self {
            id_attendance: format!("A-{}", Uuid::new_v4()),
            employee_id,
            date: now.date(),
            check_in_time: now.time(),
            status: STATUS_PRESENT.to_string(),
            created_at: now,
        }
    }

    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            id_attendance: self.id_attendance,
            employee_id: self.employee_id,
            date: self.date,
            check_in_time: self.check_in_time,
            check_out_time: None,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
