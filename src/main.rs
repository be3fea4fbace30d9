use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod leave;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::leave::mysql_store::MySqlLeaveStore;
use crate::leave::notify::LogNotifier;
use crate::leave::workflow::LeaveService;
use crate::routes::RateLimiters;
use crate::utils::policy_cache;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    policy_cache::init(config.policy_cache_ttl);
    let pool_for_cache_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = policy_cache::warmup_policy_cache(&pool_for_cache_warmup).await {
            warn!(error = %e, "Failed to warmup policy cache");
        }
    });

    let service = Data::new(LeaveService::new(
        MySqlLeaveStore::new(pool.clone()),
        Arc::new(LogNotifier),
        config.leave_settings(),
    ));
    let limiters = RateLimiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();

    info!(
        addr = %server_addr,
        holiday_policy = config.holiday_policy.as_ref(),
        fallback_approver_id = ?config.fallback_approver_id,
        "Leave service configured"
    );

    HttpServer::new(move || {
        let config = config.clone();
        let limiters = limiters.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(service.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(move |cfg| routes::configure(cfg, &config, limiters))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
