use crate::{
    config::Config,
    docs::ApiDoc,
    error::ApiError,
    routes,
    store::{AdminRepository, AttendanceRepository, EmployeeRepository},
};
use actix_governor::{
    GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{Logger, NormalizePath},
    web::{self, Data},
};
use anyhow::anyhow;
use std::sync::Arc;
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub type Limiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-client-IP limiters. Built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct RateLimits {
    pub login: Limiter,
    pub refresh: Limiter,
    pub attendance: Limiter,
    pub protected: Limiter,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            refresh: build_limiter(config.rate_refresh_per_min)?,
            attendance: build_limiter(config.rate_attendance_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))
}

/// Everything the HTTP layer needs, shared by all workers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limits: RateLimits,
    pub employees: Arc<dyn EmployeeRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub admins: Arc<dyn AdminRepository>,
}

impl AppState {
    /// One backend serves every repository seam.
    pub fn new<R>(config: Config, repo: Arc<R>) -> anyhow::Result<Self>
    where
        R: AttendanceRepository + AdminRepository + 'static,
    {
        let limits = RateLimits::from_config(&config)?;
        Ok(Self {
            config,
            limits,
            employees: repo.clone(),
            attendance: repo.clone(),
            admins: repo,
        })
    }
}

pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    // malformed JSON bodies get the same `{"error": ...}` shape as everything else
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected request body");
        ApiError::bad_request(err.to_string()).into()
    });

    App::new()
        .wrap(Logger::default())
        .wrap(NormalizePath::trim())
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .app_data(json_config)
        .app_data(Data::new(state.config.clone()))
        .app_data(Data::from(state.employees.clone()))
        .app_data(Data::from(state.attendance.clone()))
        .app_data(Data::from(state.admins.clone()))
        .configure(|cfg| routes::configure(cfg, &state.limits))
}
