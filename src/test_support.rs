//! Helpers shared by the HTTP-level tests.

use crate::{
    app::{AppState, build_app},
    auth::{jwt::generate_access_token, password::hash_password},
    config::{Config, StorageBackend},
    model::{
        administrator::{Administrator, NewAdministrator},
        employee::{Employee, EmployeeState, NewEmployee},
    },
    store::{AdminRepository, EmployeeRepository, InMemoryRepository},
};
use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
    test::{self, TestRequest},
};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        storage_backend: StorageBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        jwt_secret: TEST_SECRET.into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 10_000,
        rate_refresh_per_min: 10_000,
        rate_attendance_per_min: 10_000,
        rate_protected_per_min: 10_000,
        document_cache_ttl: 60,
        log_dir: "logs".into(),
        log_level: tracing::Level::DEBUG,
        bootstrap_admin: None,
    }
}

/// The governor limiters key on the peer IP, so every test request needs one.
pub fn request(method: Method, uri: &str) -> TestRequest {
    let peer: SocketAddr = ([127, 0, 0, 1], 40_000).into();
    TestRequest::default().method(method).uri(uri).peer_addr(peer)
}

pub fn authed(method: Method, uri: &str, token: &str) -> TestRequest {
    request(method, uri).insert_header(("Authorization", format!("Bearer {token}")))
}

/// Status plus JSON body; empty or non-JSON bodies come back as `Value::Null`.
pub async fn call_json<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// In-memory backend wired exactly like production.
pub struct TestContext {
    pub repo: Arc<InMemoryRepository>,
    pub state: AppState,
    seq: AtomicU64,
}

impl TestContext {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let state = AppState::new(test_config(), repo.clone()).unwrap();
        Self {
            repo,
            state,
            seq: AtomicU64::new(1),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = Error,
            InitError = (),
        > + use<>,
    > {
        build_app(self.state.clone())
    }

    fn next(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn create_admin(&self, username: &str, password: &str, is_staff: bool) -> Administrator {
        self.insert_admin(username, hash_password(password).unwrap(), is_staff)
            .await
    }

    async fn insert_admin(&self, username: &str, password_hash: String, is_staff: bool) -> Administrator {
        let n = self.next();
        self.repo
            .insert_admin(
                NewAdministrator {
                    id_administrator: format!("ADM-{n}"),
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    phone_number: 3_000_000_000 + n,
                    password_hash,
                    is_staff,
                },
                Local::now().naive_local(),
            )
            .await
            .unwrap()
    }

    /// Access token for a fresh account, skipping password hashing.
    pub async fn token(&self, is_staff: bool) -> String {
        let username = format!("user{}", self.next());
        let admin = self.insert_admin(&username, String::new(), is_staff).await;
        generate_access_token(&admin, TEST_SECRET, 900).unwrap()
    }

    pub async fn create_employee(&self, id_employee: &str, document_id: u64) -> Employee {
        self.repo
            .insert_employee(
                new_employee(id_employee, document_id),
                Local::now().naive_local(),
            )
            .await
            .unwrap()
    }
}

pub fn new_employee(id_employee: &str, document_id: u64) -> NewEmployee {
    NewEmployee {
        id_employee: id_employee.to_string(),
        document_id,
        name: "Laura".into(),
        lastname: "Gómez".into(),
        phone_number: 3_001_234_567,
        role: "Cashier".into(),
        contract_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        state: EmployeeState::Active,
    }
}
