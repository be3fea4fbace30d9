use crate::api::employee::EmployeeListResponse;
use crate::api::leave_request::{
    ApproverResponse, ConflictReport, DecideLeave, SubmitLeave, UpdateLeave, ValidateLeave,
};
use crate::error::{ErrorDetails, ErrorResponse};
use crate::leave::ledger::RolloverSummary;
use crate::leave::report::{EmployeeSummary, LeaveReport, LeaveStatistics, ReportQuery};
use crate::leave::store::LeaveTypeUpdate;
use crate::leave::validator::{ValidationResult, Violation, ViolationCode};
use crate::leave::workflow::SubmitOutcome;
use crate::model::delegation::{DelegationUpdate, LeaveDelegation, NewDelegation};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, HolidayUpdate, NewHoliday};
use crate::model::leave_balance::{BalanceView, LeaveBalance};
use crate::model::leave_request::{Decision, LeaveRequest, LeaveStatus};
use crate::model::leave_type::{LeaveType, NewLeaveType};
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management Service

Backend for employee leave: requests, approvals, balances and reporting.

### 🔹 Key Features
- **Requests**
  - Submit with full rule validation, dry-run validation, reschedule while pending, cancel
- **Approvals**
  - Routed to the direct manager or their active delegate
- **Balances**
  - Per-year ledger with capped carry-forward
- **Policy**
  - Leave types, holiday calendar, approval delegations
- **Reports**
  - Per-employee summary and filtered statistics

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** token from `/auth/login`.
Policy changes and organisation-wide reports are limited to **HR** and **Admin**.

### ❗ Errors
Failures return `{"error": {"code", "message", "details"?}}` with a stable `code`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::leave_request::submit_leave,
        crate::api::leave_request::validate_leave,
        crate::api::leave_request::get_request,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::employee_requests,
        crate::api::leave_request::pending_requests,
        crate::api::leave_request::check_conflicts,
        crate::api::leave_request::current_approver,

        crate::api::leave_balance::get_balances,
        crate::api::leave_balance::initialize_balances,
        crate::api::leave_balance::rollover,

        crate::api::leave_admin::list_leave_types,
        crate::api::leave_admin::create_leave_type,
        crate::api::leave_admin::update_leave_type,
        crate::api::leave_admin::list_holidays,
        crate::api::leave_admin::create_holiday,
        crate::api::leave_admin::update_holiday,
        crate::api::leave_admin::delete_holiday,
        crate::api::leave_admin::list_delegations,
        crate::api::leave_admin::create_delegation,
        crate::api::leave_admin::update_delegation,

        crate::api::report::employee_summary,
        crate::api::report::leave_report,
        crate::api::report::department_report,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            ErrorResponse,
            ErrorDetails,
            SubmitLeave,
            ValidateLeave,
            UpdateLeave,
            DecideLeave,
            ConflictReport,
            ApproverResponse,
            Decision,
            LeaveStatus,
            LeaveRequest,
            SubmitOutcome,
            ValidationResult,
            Violation,
            ViolationCode,
            LeaveBalance,
            BalanceView,
            RolloverSummary,
            LeaveType,
            NewLeaveType,
            LeaveTypeUpdate,
            Holiday,
            NewHoliday,
            HolidayUpdate,
            LeaveDelegation,
            NewDelegation,
            DelegationUpdate,
            ReportQuery,
            LeaveReport,
            LeaveStatistics,
            EmployeeSummary,
            Employee,
            NewEmployee,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issuing"),
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Balance", description = "Leave balance ledger"),
        (name = "Leave Admin", description = "Leave types, holidays and delegations"),
        (name = "Report", description = "Leave summaries and statistics"),
        (name = "Employee", description = "Employee directory"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
