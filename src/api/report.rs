use crate::api::{Service, YearQuery};
use crate::auth::auth::AuthUser;
use crate::leave::report::{EmployeeSummary, LeaveReport, ReportQuery};
use actix_web::{HttpResponse, Responder, web};

/// Balances and request statistics of one employee for a year
#[utoipa::path(
    get,
    path = "/api/leave/summary/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Employee leave summary", body = EmployeeSummary),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn employee_summary(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let summary = service
        .employee_summary(employee_id, query.year_or_current())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Filtered request report with aggregate statistics
#[utoipa::path(
    post,
    path = "/api/leave/reports",
    request_body = ReportQuery,
    responses(
        (status = 200, description = "Matching requests and their statistics", body = LeaveReport),
        (status = 400, description = "end_date before start_date"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn leave_report(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    // Managers may report on their own organisation; everything else is HR/Admin.
    match (payload.manager_id, payload.employee_id) {
        (Some(manager_id), _) => auth.require_self_or_hr(manager_id)?,
        (None, Some(employee_id)) => auth.require_self_or_hr(employee_id)?,
        (None, None) => auth.require_hr_or_admin()?,
    }

    let report = service.report(&payload).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Requests starting within a year for one department (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/leave/reports/department/{department}",
    params(
        ("department" = String, Path, description = "Department name"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Department report", body = LeaveReport),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn department_report(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<String>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let report = service
        .department_report(&path.into_inner(), query.year_or_current())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
