use crate::api::Service;
use crate::auth::auth::AuthUser;
use crate::leave::store::LeaveTypeUpdate;
use crate::model::delegation::{DelegationUpdate, LeaveDelegation, NewDelegation};
use crate::model::holiday::{Holiday, HolidayUpdate, NewHoliday};
use crate::model::leave_type::{LeaveType, NewLeaveType};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActiveQuery {
    /// Only active rows; defaults to true
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DelegationQuery {
    pub manager_id: Option<u64>,
    /// Only delegations that are switched on
    pub active_only: Option<bool>,
}

/* ---------- leave types ---------- */

#[utoipa::path(
    get,
    path = "/api/leave/types",
    params(ActiveQuery),
    responses((status = 200, description = "Leave types", body = [LeaveType])),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn list_leave_types(
    service: web::Data<Service>,
    query: web::Query<ActiveQuery>,
) -> actix_web::Result<impl Responder> {
    let types = service
        .leave_types(query.active_only.unwrap_or(true))
        .await?;
    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    post,
    path = "/api/leave/types",
    request_body = NewLeaveType,
    responses(
        (status = 201, description = "Leave type created", body = LeaveType),
        (status = 400, description = "Name missing"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<NewLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let created = service.create_leave_type(&payload).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Partial update; only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/api/leave/types/{leave_type_id}",
    params(("leave_type_id" = u64, Path, description = "Leave type id")),
    request_body = LeaveTypeUpdate,
    responses(
        (status = 200, description = "Leave type updated", body = LeaveType),
        (status = 400, description = "Nothing to update"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    payload: web::Json<LeaveTypeUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let updated = service
        .update_leave_type(path.into_inner(), &payload)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/* ---------- holidays ---------- */

#[utoipa::path(
    get,
    path = "/api/leave/holidays",
    params(ActiveQuery),
    responses((status = 200, description = "Holiday calendar", body = [Holiday])),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn list_holidays(
    service: web::Data<Service>,
    query: web::Query<ActiveQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = service.holidays(query.active_only.unwrap_or(true)).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/leave/holidays",
    request_body = NewHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Holiday),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn create_holiday(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<NewHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday = service.create_holiday(&payload).await?;
    Ok(HttpResponse::Created().json(holiday))
}

#[utoipa::path(
    put,
    path = "/api/leave/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday id")),
    request_body = HolidayUpdate,
    responses(
        (status = 200, description = "Holiday updated", body = Holiday),
        (status = 400, description = "Nothing to update or blank name"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn update_holiday(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    payload: web::Json<HolidayUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday = service.update_holiday(path.into_inner(), &payload).await?;
    Ok(HttpResponse::Ok().json(holiday))
}

#[utoipa::path(
    delete,
    path = "/api/leave/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday id")),
    responses(
        (status = 200, description = "Holiday deleted", body = Object, example = json!({
            "message": "Holiday deleted"
        })),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday_id = path.into_inner();
    service.delete_holiday(holiday_id).await?;
    info!(holiday_id, deleted_by = %auth.username, "Holiday removed via API");

    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday deleted" })))
}

/* ---------- delegations ---------- */

#[utoipa::path(
    get,
    path = "/api/leave/delegations",
    params(DelegationQuery),
    responses(
        (status = 200, description = "Approval delegations", body = [LeaveDelegation]),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn list_delegations(
    auth: AuthUser,
    service: web::Data<Service>,
    query: web::Query<DelegationQuery>,
) -> actix_web::Result<impl Responder> {
    // Managers may list their own delegations.
    match query.manager_id {
        Some(manager_id) => auth.require_self_or_hr(manager_id)?,
        None => auth.require_hr_or_admin()?,
    }

    let delegations = service
        .delegations(query.manager_id, query.active_only.unwrap_or(false))
        .await?;
    Ok(HttpResponse::Ok().json(delegations))
}

#[utoipa::path(
    post,
    path = "/api/leave/delegations",
    request_body = NewDelegation,
    responses(
        (status = 201, description = "Delegation created", body = LeaveDelegation),
        (status = 400, description = "Bad window, self delegation or inactive delegate"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Manager or delegate not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn create_delegation(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<NewDelegation>,
) -> actix_web::Result<impl Responder> {
    auth.require_self_or_hr(payload.manager_id)?;

    let delegation = service.create_delegation(&payload).await?;
    Ok(HttpResponse::Created().json(delegation))
}

/// Managers may edit their own delegations; HR/Admin any.
#[utoipa::path(
    put,
    path = "/api/leave/delegations/{delegation_id}",
    params(("delegation_id" = u64, Path, description = "Delegation id")),
    request_body = DelegationUpdate,
    responses(
        (status = 200, description = "Delegation updated", body = LeaveDelegation),
        (status = 400, description = "Nothing to update, bad window or inactive delegate"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Delegation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Admin"
)]
pub async fn update_delegation(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<u64>,
    payload: web::Json<DelegationUpdate>,
) -> actix_web::Result<impl Responder> {
    let delegation_id = path.into_inner();
    let existing = service.delegation(delegation_id).await?;
    auth.require_self_or_hr(existing.manager_id)?;

    let delegation = service.update_delegation(delegation_id, &payload).await?;
    info!(delegation_id, updated_by = %auth.username, active = delegation.is_active, "Delegation changed via API");
    Ok(HttpResponse::Ok().json(delegation))
}
