use crate::{
    api::{employee, leave_admin, leave_balance, leave_request, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-route rate limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    protected: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: RateLimiters) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(limiters.login.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
            )
            .service(
                web::scope("/leave")
                    // static segments before /{id} so they are not taken for ids
                    .service(
                        web::resource("/requests")
                            .route(web::post().to(leave_request::submit_leave)),
                    )
                    .service(
                        web::resource("/requests/validate")
                            .route(web::post().to(leave_request::validate_leave)),
                    )
                    .service(
                        web::resource("/requests/pending")
                            .route(web::get().to(leave_request::pending_requests)),
                    )
                    .service(
                        web::resource("/requests/employee/{employee_id}")
                            .route(web::get().to(leave_request::employee_requests)),
                    )
                    .service(
                        web::resource("/requests/{id}")
                            .route(web::get().to(leave_request::get_request))
                            .route(web::put().to(leave_request::update_leave)),
                    )
                    .service(
                        web::resource("/requests/{id}/decision")
                            .route(web::put().to(leave_request::decide_leave)),
                    )
                    .service(
                        web::resource("/requests/{id}/cancel")
                            .route(web::put().to(leave_request::cancel_leave)),
                    )
                    .service(
                        web::resource("/conflicts")
                            .route(web::get().to(leave_request::check_conflicts)),
                    )
                    .service(
                        web::resource("/approver/{employee_id}")
                            .route(web::get().to(leave_request::current_approver)),
                    )
                    // /leave/balances
                    .service(
                        web::resource("/balances/rollover")
                            .route(web::post().to(leave_balance::rollover)),
                    )
                    .service(
                        web::resource("/balances/{employee_id}")
                            .route(web::get().to(leave_balance::get_balances)),
                    )
                    .service(
                        web::resource("/balances/{employee_id}/initialize")
                            .route(web::post().to(leave_balance::initialize_balances)),
                    )
                    // /leave/types
                    .service(
                        web::resource("/types")
                            .route(web::get().to(leave_admin::list_leave_types))
                            .route(web::post().to(leave_admin::create_leave_type)),
                    )
                    .service(
                        web::resource("/types/{id}")
                            .route(web::put().to(leave_admin::update_leave_type)),
                    )
                    // /leave/holidays
                    .service(
                        web::resource("/holidays")
                            .route(web::get().to(leave_admin::list_holidays))
                            .route(web::post().to(leave_admin::create_holiday)),
                    )
                    .service(
                        web::resource("/holidays/{id}")
                            .route(web::put().to(leave_admin::update_holiday))
                            .route(web::delete().to(leave_admin::delete_holiday)),
                    )
                    // /leave/delegations
                    .service(
                        web::resource("/delegations")
                            .route(web::get().to(leave_admin::list_delegations))
                            .route(web::post().to(leave_admin::create_delegation)),
                    )
                    .service(
                        web::resource("/delegations/{id}")
                            .route(web::put().to(leave_admin::update_delegation)),
                    )
                    // reporting
                    .service(
                        web::resource("/summary/{employee_id}")
                            .route(web::get().to(report::employee_summary)),
                    )
                    .service(
                        web::resource("/reports").route(web::post().to(report::leave_report)),
                    )
                    .service(
                        web::resource("/reports/department/{department}")
                            .route(web::get().to(report::department_report)),
                    ),
            ),
    );
}
