//! Request validator.
//!
//! [`evaluate`] is a pure function over everything the rules need; the
//! service gathers that context from the store and calls it. All checks run so
//! the caller gets the complete list of violations at once.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::leave::calendar;
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;

const FAR_FUTURE_DAYS: i64 = 365;
const LONG_LEAVE_DAYS: u32 = 30;
const LOW_BALANCE_MARGIN: u32 = 5;
const PEAK_MONTH: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    StartInPast,
    EndBeforeStart,
    InsufficientBalance,
    ExceedsMaxConsecutive,
    InsufficientNotice,
    OverlappingRequest,
    HolidayConflict,
    InactiveEmployee,
    InactiveLeaveType,
}

impl ViolationCode {
    /// Codes that block even leave types whose validation is only advisory.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ViolationCode::StartInPast
                | ViolationCode::EndBeforeStart
                | ViolationCode::OverlappingRequest
                | ViolationCode::InactiveEmployee
                | ViolationCode::InactiveLeaveType
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
}

impl Violation {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// How a holiday inside the requested range is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum HolidayPolicy {
    /// The request is rejected with `HOLIDAY_CONFLICT`.
    #[default]
    Block,
    /// Holidays are not charged and only reported as a warning.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationResult {
    pub ok: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
    /// Business days that would be charged.
    pub requested_days: u32,
    pub conflicting_request_ids: Vec<u64>,
    #[schema(value_type = Vec<String>)]
    pub holiday_dates: Vec<NaiveDate>,
}

impl ValidationResult {
    pub fn has(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    /// Violations that stop a submission of this leave type.
    pub fn binding_violations(&self, leave_type: &LeaveType) -> Vec<Violation> {
        self.violations
            .iter()
            .filter(|v| leave_type.requires_approval || v.code.is_structural())
            .cloned()
            .collect()
    }
}

/// Everything the rules look at for one proposed request.
pub struct ValidationContext<'a> {
    pub employee: &'a Employee,
    pub leave_type: &'a LeaveType,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub as_of: NaiveDate,
    /// Balance row for `year(start)`, if one exists.
    pub balance: Option<&'a LeaveBalance>,
    /// Pending or approved requests of the employee overlapping the range.
    pub overlapping: &'a [LeaveRequest],
    /// Active holidays with their occurrences inside the range.
    pub holidays: &'a [(Holiday, Vec<NaiveDate>)],
    pub holiday_policy: HolidayPolicy,
}

pub fn evaluate(ctx: &ValidationContext<'_>) -> ValidationResult {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    let mut holiday_dates: Vec<NaiveDate> = ctx
        .holidays
        .iter()
        .flat_map(|(_, dates)| dates.iter().copied())
        .collect();
    holiday_dates.sort();
    holiday_dates.dedup();

    let excluded: &[NaiveDate] = match ctx.holiday_policy {
        HolidayPolicy::Exclude => &holiday_dates,
        HolidayPolicy::Block => &[],
    };
    let requested_days = calendar::business_days(ctx.start, ctx.end, excluded);

    if !ctx.employee.is_active {
        violations.push(Violation::new(
            ViolationCode::InactiveEmployee,
            "Employee is not active",
        ));
    }
    if !ctx.leave_type.is_active {
        violations.push(Violation::new(
            ViolationCode::InactiveLeaveType,
            format!("Leave type '{}' is not active", ctx.leave_type.name),
        ));
    }

    if ctx.start < ctx.as_of {
        violations.push(Violation::new(
            ViolationCode::StartInPast,
            "Start date cannot be in the past",
        ));
    }
    if ctx.end < ctx.start {
        violations.push(Violation::new(
            ViolationCode::EndBeforeStart,
            "End date cannot be before start date",
        ));
    }

    let remaining = ctx.balance.map(LeaveBalance::remaining).unwrap_or(0);
    if requested_days > remaining {
        let message = match ctx.balance {
            Some(_) => format!(
                "Insufficient balance. Available: {remaining}, Requested: {requested_days}"
            ),
            None => format!(
                "No {} balance found for {}",
                ctx.leave_type.name,
                ctx.start.year()
            ),
        };
        violations.push(Violation::new(ViolationCode::InsufficientBalance, message));
    } else if ctx.balance.is_some() && remaining - requested_days < LOW_BALANCE_MARGIN {
        warnings.push("Low balance remaining after this request".to_string());
    }

    if let Some(max) = ctx.leave_type.max_consecutive_days {
        if requested_days > max {
            violations.push(Violation::new(
                ViolationCode::ExceedsMaxConsecutive,
                format!("Request exceeds maximum consecutive days ({max})"),
            ));
        }
    }

    let notice = ctx.leave_type.advance_notice_days;
    if notice > 0 && calendar::days_until(ctx.as_of, ctx.start) < i64::from(notice) {
        violations.push(Violation::new(
            ViolationCode::InsufficientNotice,
            format!("{} requires {notice} day(s) of advance notice", ctx.leave_type.name),
        ));
    }

    let conflicting_request_ids: Vec<u64> = ctx.overlapping.iter().map(|r| r.id).collect();
    if !conflicting_request_ids.is_empty() {
        violations.push(Violation::new(
            ViolationCode::OverlappingRequest,
            format!(
                "Found {} overlapping request(s)",
                conflicting_request_ids.len()
            ),
        ));
    }

    if !holiday_dates.is_empty() {
        let names = ctx
            .holidays
            .iter()
            .map(|(h, _)| h.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        match ctx.holiday_policy {
            HolidayPolicy::Block => violations.push(Violation::new(
                ViolationCode::HolidayConflict,
                format!("Holiday conflicts detected: {names}"),
            )),
            HolidayPolicy::Exclude => {
                warnings.push(format!("Holidays not charged: {names}"));
            }
        }
    }

    if calendar::days_until(ctx.as_of, ctx.start) > FAR_FUTURE_DAYS {
        warnings.push("Start date is more than 1 year in the future".to_string());
    }
    if ctx.end >= ctx.start && calendar::is_weekend(ctx.start) && calendar::is_weekend(ctx.end)
        && requested_days == 0
    {
        warnings.push("Request appears to be for weekend only".to_string());
    }
    if requested_days > LONG_LEAVE_DAYS {
        warnings.push(format!(
            "Request is for more than {LONG_LEAVE_DAYS} days - may require special approval"
        ));
    }
    if ctx.start.month() == PEAK_MONTH {
        warnings.push("Request is during peak business period".to_string());
    }

    ValidationResult {
        ok: violations.is_empty(),
        violations,
        warnings,
        requested_days,
        conflicting_request_ids,
        holiday_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::testing::{d, employee, request, sick_leave};
    use crate::model::leave_request::LeaveStatus;

    fn balance(allocated: u32, used: u32) -> LeaveBalance {
        LeaveBalance {
            id: 1,
            employee_id: 7,
            leave_type_id: 2,
            year: 2026,
            allocated,
            used,
            carried_forward: 0,
        }
    }

    fn holiday(name: &str, date: NaiveDate) -> (Holiday, Vec<NaiveDate>) {
        (
            Holiday {
                id: 1,
                name: name.into(),
                holiday_date: date,
                is_recurring: false,
                description: None,
                is_active: true,
            },
            vec![date],
        )
    }

    struct Case {
        employee: Employee,
        leave_type: LeaveType,
        balance: Option<LeaveBalance>,
        overlapping: Vec<LeaveRequest>,
        holidays: Vec<(Holiday, Vec<NaiveDate>)>,
        policy: HolidayPolicy,
    }

    impl Case {
        fn new() -> Self {
            Self {
                employee: employee(7, Some(2)),
                leave_type: sick_leave(2),
                balance: Some(balance(10, 0)),
                overlapping: Vec::new(),
                holidays: Vec::new(),
                policy: HolidayPolicy::Block,
            }
        }

        fn run(&self, start: NaiveDate, end: NaiveDate, as_of: NaiveDate) -> ValidationResult {
            evaluate(&ValidationContext {
                employee: &self.employee,
                leave_type: &self.leave_type,
                start,
                end,
                as_of,
                balance: self.balance.as_ref(),
                overlapping: &self.overlapping,
                holidays: &self.holidays,
                holiday_policy: self.policy,
            })
        }
    }

    #[test]
    fn three_weekday_sick_leave_passes() {
        let result = Case::new().run(d(2026, 6, 15), d(2026, 6, 17), d(2026, 6, 1));
        assert!(result.ok, "{:?}", result.violations);
        assert_eq!(result.requested_days, 3);
    }

    #[test]
    fn end_before_start_is_reported_with_every_other_problem() {
        let mut case = Case::new();
        case.balance = None;
        case.employee.is_active = false;
        let result = case.run(d(2026, 5, 20), d(2026, 5, 10), d(2026, 6, 1));

        assert!(!result.ok);
        assert!(result.has(ViolationCode::EndBeforeStart));
        assert!(result.has(ViolationCode::StartInPast));
        assert!(result.has(ViolationCode::InactiveEmployee));
        assert_eq!(result.requested_days, 0);
    }

    #[test]
    fn balance_shortfall_is_a_violation() {
        let mut case = Case::new();
        case.balance = Some(balance(10, 8));
        let result = case.run(d(2026, 6, 15), d(2026, 6, 17), d(2026, 6, 1));
        assert!(result.has(ViolationCode::InsufficientBalance));
    }

    #[test]
    fn missing_balance_row_counts_as_zero() {
        let mut case = Case::new();
        case.balance = None;
        let result = case.run(d(2026, 6, 15), d(2026, 6, 15), d(2026, 6, 1));
        assert!(result.has(ViolationCode::InsufficientBalance));
    }

    #[test]
    fn max_consecutive_days_counts_business_days() {
        let mut case = Case::new();
        case.leave_type.max_consecutive_days = Some(5);
        // Mon 15 .. Mon 22 Jun: six business days
        let result = case.run(d(2026, 6, 15), d(2026, 6, 22), d(2026, 6, 1));
        assert!(result.has(ViolationCode::ExceedsMaxConsecutive));
        // Mon 15 .. Sun 21 Jun: five business days
        let result = case.run(d(2026, 6, 15), d(2026, 6, 21), d(2026, 6, 1));
        assert!(!result.has(ViolationCode::ExceedsMaxConsecutive));
    }

    #[test]
    fn advance_notice_applies_unless_exempt() {
        let mut case = Case::new();
        case.leave_type.advance_notice_days = 7;
        let late = case.run(d(2026, 6, 15), d(2026, 6, 15), d(2026, 6, 10));
        assert!(late.has(ViolationCode::InsufficientNotice));
        let on_time = case.run(d(2026, 6, 15), d(2026, 6, 15), d(2026, 6, 8));
        assert!(!on_time.has(ViolationCode::InsufficientNotice));

        case.leave_type.advance_notice_days = 0;
        let exempt = case.run(d(2026, 6, 15), d(2026, 6, 15), d(2026, 6, 15));
        assert!(exempt.ok);
    }

    #[test]
    fn overlap_lists_conflicting_ids() {
        let mut case = Case::new();
        case.overlapping = vec![request(41, 7, d(2026, 6, 16), d(2026, 6, 18), LeaveStatus::Pending)];
        let result = case.run(d(2026, 6, 15), d(2026, 6, 17), d(2026, 6, 1));
        assert!(result.has(ViolationCode::OverlappingRequest));
        assert_eq!(result.conflicting_request_ids, vec![41]);
    }

    #[test]
    fn holiday_blocks_by_default() {
        let mut case = Case::new();
        case.holidays = vec![holiday("Founders Day", d(2026, 6, 16))];
        let result = case.run(d(2026, 6, 15), d(2026, 6, 17), d(2026, 6, 1));
        assert!(result.has(ViolationCode::HolidayConflict));
        assert_eq!(result.requested_days, 3);
        assert_eq!(result.holiday_dates, vec![d(2026, 6, 16)]);
    }

    #[test]
    fn excluded_holiday_is_not_charged() {
        let mut case = Case::new();
        case.policy = HolidayPolicy::Exclude;
        case.holidays = vec![holiday("Founders Day", d(2026, 6, 16))];
        let result = case.run(d(2026, 6, 15), d(2026, 6, 17), d(2026, 6, 1));
        assert!(result.ok);
        assert_eq!(result.requested_days, 2);
        assert!(result.warnings.iter().any(|w| w.contains("Founders Day")));
    }

    #[test]
    fn advisory_types_only_bind_structural_codes() {
        let mut case = Case::new();
        case.leave_type.requires_approval = false;
        case.leave_type.advance_notice_days = 30;
        case.holidays = vec![holiday("Founders Day", d(2026, 6, 16))];
        let result = case.run(d(2026, 6, 15), d(2026, 6, 17), d(2026, 6, 1));
        assert!(!result.ok);
        assert!(result.binding_violations(&case.leave_type).is_empty());

        let reversed = case.run(d(2026, 6, 17), d(2026, 6, 15), d(2026, 6, 1));
        let binding = reversed.binding_violations(&case.leave_type);
        assert!(binding.iter().any(|v| v.code == ViolationCode::EndBeforeStart));
    }

    #[test]
    fn warnings_do_not_fail_validation() {
        let result = Case::new().run(d(2026, 12, 14), d(2026, 12, 14), d(2026, 6, 1));
        assert!(result.ok);
        assert!(result.warnings.iter().any(|w| w.contains("peak")));
    }

    #[test]
    fn holiday_policy_parses_from_config_text() {
        assert_eq!("exclude".parse::<HolidayPolicy>().unwrap(), HolidayPolicy::Exclude);
        assert_eq!("block".parse::<HolidayPolicy>().unwrap(), HolidayPolicy::Block);
        assert!("ignore".parse::<HolidayPolicy>().is_err());
    }
}
