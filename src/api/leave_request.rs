use crate::api::{Service, YearQuery, today};
use crate::auth::auth::AuthUser;
use crate::leave::validator::ValidationResult;
use crate::leave::workflow::SubmitOutcome;
use crate::model::holiday::Holiday;
use crate::model::leave_request::{Decision, LeaveRequest};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SubmitLeave {
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "2026-06-15", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-17", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ValidateLeave {
    /// Employee to check for; HR/Admin only, defaults to the caller
    #[schema(example = 7)]
    pub employee_id: Option<u64>,
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "2026-06-15", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-17", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "2026-06-16", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-19", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Keeps the current reason when omitted
    #[schema(example = "Surgery")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    #[schema(example = "approved")]
    pub decision: Decision,
    #[schema(example = "Get well soon")]
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ConflictQuery {
    /// Defaults to the caller
    pub employee_id: Option<u64>,
    #[param(example = "2026-06-15", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[param(example = "2026-06-19", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct ConflictReport {
    pub conflicting_request_ids: Vec<u64>,
    pub holidays: Vec<Holiday>,
}

#[derive(Serialize, ToSchema)]
pub struct ApproverResponse {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = 2)]
    pub approver_id: u64,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/requests",
    request_body = SubmitLeave,
    responses(
        (status = 201, description = "Leave request recorded", body = SubmitOutcome),
        (status = 404, description = "Unknown employee or leave type"),
        (status = 409, description = "NO_APPROVER or INSUFFICIENT_BALANCE"),
        (status = 422, description = "VALIDATION_FAILED with the violation list")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<SubmitLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let outcome = service
        .submit(
            employee_id,
            payload.leave_type_id,
            payload.start_date,
            payload.end_date,
            payload.reason,
            today(),
        )
        .await?;

    Ok(HttpResponse::Created().json(outcome))
}

/* =========================
Dry-run validation
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/requests/validate",
    request_body = ValidateLeave,
    responses(
        (status = 200, description = "Every rule evaluated; nothing stored", body = ValidationResult),
        (status = 403, description = "Validating for another employee without HR/Admin role"),
        (status = 404, description = "Unknown employee or leave type")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn validate_leave(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<ValidateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match payload.employee_id {
        Some(id) => {
            auth.require_self_or_hr(id)?;
            id
        }
        None => auth.require_employee()?,
    };

    let result = service
        .validate(
            employee_id,
            payload.leave_type_id,
            payload.start_date,
            payload.end_date,
            today(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/* =========================
Get one request
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/requests/{request_id}",
    params(("request_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Neither owner, approver nor HR/Admin"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_request(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = service.request(path.into_inner()).await?;

    let involved = auth.employee_id.is_some()
        && (auth.employee_id == Some(request.employee_id) || auth.employee_id == request.approver_id);
    if !involved {
        auth.require_hr_or_admin()?;
    }

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reschedule a pending request
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/requests/{request_id}",
    params(("request_id" = u64, Path, description = "Leave request id")),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Request moved to the new dates", body = SubmitOutcome),
        (status = 403, description = "NOT_REQUEST_OWNER"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "INVALID_TRANSITION once decided or cancelled"),
        (status = 422, description = "VALIDATION_FAILED with the violation list")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let request_id = path.into_inner();
    let payload = payload.into_inner();

    let outcome = service
        .update_pending(
            request_id,
            employee_id,
            payload.start_date,
            payload.end_date,
            payload.reason,
            today(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/requests/{request_id}/decision",
    params(("request_id" = u64, Path, description = "Leave request id")),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Decision recorded", body = LeaveRequest),
        (status = 403, description = "NOT_APPROVER"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "INVALID_TRANSITION or INSUFFICIENT_BALANCE")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    let approver_id = auth.require_employee()?;
    let request_id = path.into_inner();
    let payload = payload.into_inner();

    let updated = service
        .decide(request_id, approver_id, payload.decision, payload.comments, today())
        .await?;
    info!(request_id, user = %auth.username, status = %updated.status, "Decision via API");

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Cancel
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/requests/{request_id}/cancel",
    params(("request_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Request cancelled; approved days credited back", body = LeaveRequest),
        (status = 403, description = "NOT_REQUEST_OWNER"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "INVALID_TRANSITION")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let updated = service
        .cancel(path.into_inner(), employee_id, today())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Requests of one employee
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/requests/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Requests touching the year, or all when no year is given", body = [LeaveRequest]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn employee_requests(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let requests = service.employee_requests(employee_id, query.year).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
Approval queue of the caller
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/requests/pending",
    responses(
        (status = 200, description = "Pending requests the caller currently approves", body = [LeaveRequest]),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_requests(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let approver_id = auth.require_employee()?;

    let pending = service.pending_for_approver(approver_id, today()).await?;
    Ok(HttpResponse::Ok().json(pending))
}

/* =========================
Conflict check
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/conflicts",
    params(ConflictQuery),
    responses(
        (status = 200, description = "Live requests and holidays inside the range", body = ConflictReport),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn check_conflicts(
    auth: AuthUser,
    service: web::Data<Service>,
    query: web::Query<ConflictQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(id) => {
            auth.require_self_or_hr(id)?;
            id
        }
        None => auth.require_employee()?,
    };

    let conflicting_request_ids = service
        .overlaps(employee_id, query.start_date, query.end_date)
        .await?;
    let holidays = service.holidays_in(query.start_date, query.end_date).await?;

    Ok(HttpResponse::Ok().json(ConflictReport {
        conflicting_request_ids,
        holidays,
    }))
}

/* =========================
Acting approver today
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/approver/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Manager or active delegate", body = ApproverResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "NO_APPROVER")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn current_approver(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let approver_id = service.resolve_approver(employee_id, today()).await?;
    Ok(HttpResponse::Ok().json(ApproverResponse {
        employee_id,
        approver_id,
    }))
}
