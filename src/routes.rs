use crate::{
    api::{attendance, employee},
    app::RateLimits,
    auth::{
        handlers,
        middleware::{auth_middleware, staff_only},
    },
};
use actix_governor::Governor;
use actix_web::{middleware::from_fn, web};

// Paths are registered without the trailing slash; `NormalizePath::trim` strips it
// from incoming requests.
pub fn configure(cfg: &mut web::ServiceConfig, limits: &RateLimits) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&limits.refresh))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&limits.refresh))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Kiosk endpoints are unauthenticated, the listing is staff only
    cfg.service(
        web::scope("/attendance")
            .wrap(Governor::new(&limits.attendance))
            .service(web::resource("/checkin").route(web::post().to(attendance::check_in)))
            .service(web::resource("/checkout").route(web::post().to(attendance::check_out)))
            .service(
                web::resource("/all")
                    .wrap(from_fn(staff_only))
                    .wrap(from_fn(auth_middleware)) // runs first
                    .route(web::get().to(attendance::list_all)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope("/employees")
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limits.protected)) // rate limiting
            // /employees
            .service(
                web::resource("")
                    .route(web::get().to(employee::list_employees))
                    .route(web::post().to(employee::create_employee)),
            )
            // /employees/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(employee::get_employee))
                    .route(web::put().to(employee::update_employee))
                    .route(web::patch().to(employee::patch_employee))
                    .route(web::delete().to(employee::delete_employee)),
            ),
    );
}

// LOGIN
//  ├─ access token (ACCESS_TOKEN_TTL, 15 min default)
//  └─ refresh token (REFRESH_TOKEN_TTL, 1 day default, jti stored)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh token
//       └─ old jti revoked, new pair returned
