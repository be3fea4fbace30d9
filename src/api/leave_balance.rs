use crate::api::{Service, YearQuery};
use crate::auth::auth::AuthUser;
use crate::leave::ledger::RolloverSummary;
use crate::model::leave_balance::{BalanceView, LeaveBalance};
use actix_web::{HttpResponse, Responder, web};

/// Balances of one employee for a year
#[utoipa::path(
    get,
    path = "/api/leave/balances/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "One row per leave type", body = [BalanceView]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn get_balances(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let balances = service
        .balances(employee_id, query.year_or_current())
        .await?;
    Ok(HttpResponse::Ok().json(balances))
}

/// Create the year's balances of one employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/leave/balances/{employee_id}/initialize",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Balances of the year after initialization", body = [LeaveBalance]),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn initialize_balances(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let balances = service
        .initialize_year(path.into_inner(), query.year_or_current())
        .await?;
    Ok(HttpResponse::Ok().json(balances))
}

/// Year-boundary run over every active employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/leave/balances/rollover",
    params(YearQuery),
    responses(
        (status = 200, description = "Rows created and carried", body = RolloverSummary),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn rollover(
    auth: AuthUser,
    service: web::Data<Service>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let summary = service.rollover(query.year_or_current()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
