//! Daily check-in / check-out.
//!
//! Per (employee, date) a record moves `NoRecord → CheckedIn → CheckedOut` and stops
//! there. Both transitions are computed as new record values and then persisted; the
//! storage layer has the final word on the once-per-day rule (unique key on
//! `(employee_id, date)`, conditional check-out update), so two concurrent requests
//! cannot both win.

use crate::error::{ApiError, StoreError};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::employee::Employee;
use crate::store::AttendanceRepository;
use chrono::NaiveDateTime;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const MSG_MISSING_DOCUMENT: &str = "document_id requerido";
pub const MSG_UNKNOWN_EMPLOYEE: &str = "Empleado no existe";
pub const MSG_ALREADY_CHECKED_IN: &str = "Este empleado ya tiene asistencia hoy";
pub const MSG_NO_CHECK_IN: &str = "No hay check-in registrado hoy";
pub const MSG_ALREADY_CHECKED_OUT: &str = "Ya has registrado salida hoy";
pub const MSG_CHECKED_IN: &str = "Entrada registrada correctamente";
pub const MSG_CHECKED_OUT: &str = "Salida registrada correctamente";

/// A document number as sent by the kiosk: JSON number or numeric string.
///
/// Anything else that is valid JSON (negative or fractional numbers, booleans,
/// objects) lands in `Other` and can never match an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(u64),
    Text(String),
    Other(serde_json::Value),
}

impl DocumentId {
    /// `None` for the values treated as "not provided": empty text and zero.
    fn provided(&self) -> Option<&Self> {
        match self {
            DocumentId::Number(0) => None,
            DocumentId::Text(s) if s.trim().is_empty() => None,
            other => Some(other),
        }
    }

    /// Non-numeric text cannot match any stored document number.
    fn as_number(&self) -> Option<u64> {
        match self {
            DocumentId::Number(n) => Some(*n),
            DocumentId::Text(s) => s.trim().parse().ok(),
            DocumentId::Other(_) => None,
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum RecorderError {
    #[display(fmt = "{}", MSG_MISSING_DOCUMENT)]
    MissingInput,

    #[display(fmt = "{}", MSG_UNKNOWN_EMPLOYEE)]
    NotFound,

    #[display(fmt = "{}", MSG_ALREADY_CHECKED_IN)]
    AlreadyCheckedIn,

    #[display(fmt = "{}", MSG_NO_CHECK_IN)]
    NoCheckIn,

    #[display(fmt = "{}", MSG_ALREADY_CHECKED_OUT)]
    AlreadyCheckedOut,

    #[display(fmt = "{}", source)]
    Store { source: StoreError },
}

impl From<StoreError> for RecorderError {
    fn from(source: StoreError) -> Self {
        RecorderError::Store { source }
    }
}

impl From<RecorderError> for ApiError {
    fn from(err: RecorderError) -> Self {
        match err {
            RecorderError::MissingInput => ApiError::missing_input(MSG_MISSING_DOCUMENT),
            RecorderError::NotFound => ApiError::not_found(MSG_UNKNOWN_EMPLOYEE),
            RecorderError::AlreadyCheckedIn => ApiError::conflict(MSG_ALREADY_CHECKED_IN),
            RecorderError::NoCheckIn => ApiError::conflict(MSG_NO_CHECK_IN),
            RecorderError::AlreadyCheckedOut => ApiError::conflict(MSG_ALREADY_CHECKED_OUT),
            RecorderError::Store { source } => source.into(),
        }
    }
}

async fn resolve_employee(
    repo: &dyn AttendanceRepository,
    document: Option<&DocumentId>,
) -> Result<Employee, RecorderError> {
    let document = document
        .and_then(DocumentId::provided)
        .ok_or(RecorderError::MissingInput)?;

    let Some(document_id) = document.as_number() else {
        return Err(RecorderError::NotFound);
    };

    repo.find_employee_by_document(document_id)
        .await?
        .ok_or(RecorderError::NotFound)
}

/// Opens today's record for the employee owning `document`.
pub async fn check_in(
    repo: &dyn AttendanceRepository,
    document: Option<&DocumentId>,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, RecorderError> {
    let employee = resolve_employee(repo, document).await?;

    if repo
        .find_attendance_for_employee_on_date(employee.id, now.date())
        .await?
        .is_some()
    {
        return Err(RecorderError::AlreadyCheckedIn);
    }

    let record = match repo
        .insert_attendance(NewAttendance::check_in(employee.id, now))
        .await
    {
        Ok(record) => record,
        // lost the race against a concurrent check-in for the same day
        Err(StoreError::Duplicate { field: "employee_date" }) => {
            return Err(RecorderError::AlreadyCheckedIn);
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        employee_id = employee.id,
        id_attendance = %record.id_attendance,
        "Check-in recorded"
    );
    Ok(record)
}

/// Closes today's record for the employee owning `document`.
pub async fn check_out(
    repo: &dyn AttendanceRepository,
    document: Option<&DocumentId>,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, RecorderError> {
    let employee = resolve_employee(repo, document).await?;

    let open = repo
        .find_attendance_for_employee_on_date(employee.id, now.date())
        .await?
        .ok_or(RecorderError::NoCheckIn)?;

    let closed = open
        .checked_out(now)
        .ok_or(RecorderError::AlreadyCheckedOut)?;

    if !repo.update_checkout(&closed).await? {
        debug!(attendance_id = closed.id, "Concurrent check-out already applied");
        return Err(RecorderError::AlreadyCheckedOut);
    }

    info!(
        employee_id = employee.id,
        id_attendance = %closed.id_attendance,
        "Check-out recorded"
    );
    Ok(closed)
}

pub async fn list_all(repo: &dyn AttendanceRepository) -> Result<Vec<AttendanceRecord>, RecorderError> {
    Ok(repo.list_attendance().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::model::attendance::AttendanceState;
    use crate::model::employee::{EmployeeState, NewEmployee};
    use crate::store::{EmployeeRepository, InMemoryRepository};
    use async_trait::async_trait;
    use chrono::{Duration, Local, NaiveDate};
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;

    const DOC: u64 = 1_023_456_789;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn new_employee(code: &str, document_id: u64) -> NewEmployee {
        NewEmployee {
            id_employee: code.to_string(),
            document_id,
            name: "Laura".into(),
            lastname: "Gómez".into(),
            phone_number: 3_001_234_567,
            role: "Cashier".into(),
            contract_date: at(1, 0, 0).date(),
            state: EmployeeState::Active,
        }
    }

    async fn repo_with_employee() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.insert_employee(new_employee("EMP-001", DOC), at(1, 0, 0))
            .await
            .unwrap();
        repo
    }

    fn doc(n: u64) -> DocumentId {
        DocumentId::Number(n)
    }

    #[actix_web::test]
    async fn check_in_creates_present_record() {
        let repo = repo_with_employee().await;

        let record = check_in(&repo, Some(&doc(DOC)), at(5, 8, 0)).await.unwrap();

        assert_eq!(record.date, at(5, 8, 0).date());
        assert_eq!(record.check_in_time, at(5, 8, 0).time());
        assert_eq!(record.check_out_time, None);
        assert_eq!(record.status, "Present");
        assert_eq!(repo.list_attendance().await.unwrap(), vec![record]);
    }

    #[actix_web::test]
    async fn document_may_arrive_as_text() {
        let repo = repo_with_employee().await;
        let text = DocumentId::Text(format!(" {DOC} "));
        assert!(check_in(&repo, Some(&text), at(5, 8, 0)).await.is_ok());
    }

    #[actix_web::test]
    async fn missing_document_is_rejected_before_lookup() {
        let repo = repo_with_employee().await;
        for input in [None, Some(doc(0)), Some(DocumentId::Text("  ".into()))] {
            let err = check_in(&repo, input.as_ref(), at(5, 8, 0)).await.unwrap_err();
            assert!(matches!(err, RecorderError::MissingInput));
            let err = check_out(&repo, input.as_ref(), at(5, 8, 0)).await.unwrap_err();
            assert!(matches!(err, RecorderError::MissingInput));
        }
    }

    #[actix_web::test]
    async fn unknown_document_is_not_found() {
        let repo = repo_with_employee().await;
        let err = check_in(&repo, Some(&doc(9_999_999)), at(5, 8, 0)).await.unwrap_err();
        assert!(matches!(err, RecorderError::NotFound));

        let err = check_out(&repo, Some(&DocumentId::Text("abc".into())), at(5, 8, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RecorderError::NotFound));
    }

    #[actix_web::test]
    async fn second_check_in_same_day_conflicts() {
        let repo = repo_with_employee().await;
        check_in(&repo, Some(&doc(DOC)), at(5, 8, 0)).await.unwrap();

        let err = check_in(&repo, Some(&doc(DOC)), at(5, 9, 0)).await.unwrap_err();
        assert!(matches!(err, RecorderError::AlreadyCheckedIn));
        assert_eq!(err.to_string(), MSG_ALREADY_CHECKED_IN);
        assert_eq!(repo.list_attendance().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn next_day_opens_a_new_record() {
        let repo = repo_with_employee().await;
        check_in(&repo, Some(&doc(DOC)), at(5, 8, 0)).await.unwrap();
        check_in(&repo, Some(&doc(DOC)), at(6, 8, 0)).await.unwrap();
        assert_eq!(repo.list_attendance().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn check_out_without_check_in_conflicts() {
        let repo = repo_with_employee().await;
        let err = check_out(&repo, Some(&doc(DOC)), at(5, 17, 0)).await.unwrap_err();
        assert!(matches!(err, RecorderError::NoCheckIn));
    }

    #[actix_web::test]
    async fn check_out_sets_time_and_keeps_check_in() {
        let repo = repo_with_employee().await;
        let opened = check_in(&repo, Some(&doc(DOC)), at(5, 8, 0)).await.unwrap();

        let closed = check_out(&repo, Some(&doc(DOC)), at(5, 17, 30)).await.unwrap();

        assert_eq!(closed.state(), AttendanceState::CheckedOut);
        assert_eq!(closed.check_in_time, opened.check_in_time);
        assert_eq!(closed.status, opened.status);
        assert_eq!(closed.check_out_time, Some(at(5, 17, 30).time()));

        let stored = repo.list_attendance().await.unwrap();
        assert_eq!(stored, vec![closed]);
    }

    #[actix_web::test]
    async fn check_out_uses_the_wall_clock_window() {
        let repo = repo_with_employee().await;
        let before = Local::now().naive_local();
        let now = Local::now().naive_local();
        // opened at the start of the check-out's own date, so midnight cannot split the pair
        let opened_at = now.date().and_hms_opt(0, 0, 0).unwrap();
        check_in(&repo, Some(&doc(DOC)), opened_at).await.unwrap();
        let closed = check_out(&repo, Some(&doc(DOC)), now).await.unwrap();
        let after = Local::now().naive_local();

        assert_eq!(closed.date, now.date());
        let out = closed.date.and_time(closed.check_out_time.unwrap());
        assert!(before <= out && out <= after);
    }

    #[actix_web::test]
    async fn unusable_json_documents_are_not_found() {
        let repo = repo_with_employee().await;
        for raw in [json!(-5), json!(1_023_456_789.0), json!(true), json!({"n": DOC})] {
            let document: DocumentId = serde_json::from_value(raw).unwrap();
            assert!(matches!(document, DocumentId::Other(_)));

            let err = check_in(&repo, Some(&document), at(5, 8, 0)).await.unwrap_err();
            assert!(matches!(err, RecorderError::NotFound));
        }
        assert!(repo.list_attendance().await.unwrap().is_empty());
    }

    /// Answers like the in-memory store, except that a concurrent request has just
    /// won the race: the pre-check misses today's record or the check-out already landed.
    struct RacingRepository {
        inner: InMemoryRepository,
        stale_lookup: bool,
        checkout_taken: bool,
    }

    #[async_trait]
    impl EmployeeRepository for RacingRepository {
        async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
            self.inner.find_employee(id).await
        }

        async fn find_employee_by_document(&self, document_id: u64) -> StoreResult<Option<Employee>> {
            self.inner.find_employee_by_document(document_id).await
        }

        async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
            self.inner.list_employees().await
        }

        async fn insert_employee(&self, employee: NewEmployee, now: NaiveDateTime) -> StoreResult<Employee> {
            self.inner.insert_employee(employee, now).await
        }

        async fn update_employee(&self, id: u64, employee: NewEmployee) -> StoreResult<Option<Employee>> {
            self.inner.update_employee(id, employee).await
        }

        async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
            self.inner.delete_employee(id).await
        }
    }

    #[async_trait]
    impl AttendanceRepository for RacingRepository {
        async fn find_attendance_for_employee_on_date(
            &self,
            employee_id: u64,
            date: NaiveDate,
        ) -> StoreResult<Option<AttendanceRecord>> {
            if self.stale_lookup {
                return Ok(None);
            }
            self.inner.find_attendance_for_employee_on_date(employee_id, date).await
        }

        async fn insert_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord> {
            self.inner.insert_attendance(attendance).await
        }

        async fn update_checkout(&self, record: &AttendanceRecord) -> StoreResult<bool> {
            if self.checkout_taken {
                return Ok(false);
            }
            self.inner.update_checkout(record).await
        }

        async fn list_attendance(&self) -> StoreResult<Vec<AttendanceRecord>> {
            self.inner.list_attendance().await
        }
    }

    async fn racing(stale_lookup: bool, checkout_taken: bool) -> RacingRepository {
        let inner = repo_with_employee().await;
        check_in(&inner, Some(&doc(DOC)), at(5, 8, 0)).await.unwrap();
        RacingRepository {
            inner,
            stale_lookup,
            checkout_taken,
        }
    }

    #[actix_web::test]
    async fn check_in_losing_the_insert_race_conflicts() {
        let repo = racing(true, false).await;

        let err = check_in(&repo, Some(&doc(DOC)), at(5, 8, 1)).await.unwrap_err();

        assert!(matches!(err, RecorderError::AlreadyCheckedIn));
        let stored = repo.list_attendance().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].check_in_time, at(5, 8, 0).time());
    }

    #[actix_web::test]
    async fn check_out_losing_the_update_race_conflicts() {
        let repo = racing(false, true).await;

        let err = check_out(&repo, Some(&doc(DOC)), at(5, 17, 0)).await.unwrap_err();

        assert!(matches!(err, RecorderError::AlreadyCheckedOut));
        assert_eq!(err.to_string(), MSG_ALREADY_CHECKED_OUT);
        assert_eq!(repo.list_attendance().await.unwrap()[0].check_out_time, None);
    }

    #[actix_web::test]
    async fn second_check_out_is_rejected_and_keeps_first_time() {
        let repo = repo_with_employee().await;
        check_in(&repo, Some(&doc(DOC)), at(5, 8, 0)).await.unwrap();
        check_out(&repo, Some(&doc(DOC)), at(5, 17, 0)).await.unwrap();

        let err = check_out(&repo, Some(&doc(DOC)), at(5, 18, 0)).await.unwrap_err();
        assert!(matches!(err, RecorderError::AlreadyCheckedOut));

        let stored = repo.list_attendance().await.unwrap();
        assert_eq!(stored[0].check_out_time, Some(at(5, 17, 0).time()));
    }

    #[test]
    fn recorder_errors_map_to_http_statuses() {
        use actix_web::ResponseError;
        use actix_web::http::StatusCode;

        let status = |e: RecorderError| ApiError::from(e).status_code();
        assert_eq!(status(RecorderError::MissingInput), StatusCode::BAD_REQUEST);
        assert_eq!(status(RecorderError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(RecorderError::AlreadyCheckedIn), StatusCode::CONFLICT);
        assert_eq!(status(RecorderError::NoCheckIn), StatusCode::CONFLICT);
        assert_eq!(status(RecorderError::AlreadyCheckedOut), StatusCode::CONFLICT);
    }

    #[derive(Debug, Clone)]
    enum Op {
        CheckIn { employee: usize, day: u32, minute: u32 },
        CheckOut { employee: usize, day: u32, minute: u32 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3, 1u32..4, 0u32..1440)
                .prop_map(|(employee, day, minute)| Op::CheckIn { employee, day, minute }),
            (0usize..3, 1u32..4, 0u32..1440)
                .prop_map(|(employee, day, minute)| Op::CheckOut { employee, day, minute }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        #[test]
        fn at_most_one_record_per_employee_per_day(ops in proptest::collection::vec(op(), 0..40)) {
            let records = futures::executor::block_on(async {
                let repo = InMemoryRepository::new();
                let documents = [1_111_111u64, 2_222_222, 3_333_333];
                for (i, document_id) in documents.iter().enumerate() {
                    repo.insert_employee(new_employee(&format!("E{i}"), *document_id), at(1, 0, 0))
                        .await
                        .unwrap();
                }

                for op in ops {
                    let (employee, day, minute, is_check_in) = match op {
                        Op::CheckIn { employee, day, minute } => (employee, day, minute, true),
                        Op::CheckOut { employee, day, minute } => (employee, day, minute, false),
                    };
                    let now = at(day, 0, 0) + Duration::minutes(minute as i64);
                    let document = doc(documents[employee]);
                    let _ = if is_check_in {
                        check_in(&repo, Some(&document), now).await
                    } else {
                        check_out(&repo, Some(&document), now).await
                    };
                }

                repo.list_attendance().await.unwrap()
            });

            let mut seen = HashSet::new();
            for record in &records {
                prop_assert!(seen.insert((record.employee_id, record.date)));
            }
        }
    }
}
