//! Persistence contract of the leave engine.
//!
//! Reads are plain queries. The two writes that touch a balance
//! ([`LeaveStore::insert_request`] and [`LeaveStore::transition_request`]) must
//! run the request change and the ledger entry in one transaction, holding a
//! lock on the balance row while [`crate::leave::ledger`] checks it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::LeaveResult;
use crate::leave::ledger::LedgerEntry;
use crate::model::delegation::{LeaveDelegation, NewDelegation};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::leave_type::{LeaveType, NewLeaveType};

/// Partial update of a leave type; omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LeaveTypeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_quota: Option<u32>,
    /// `null` removes the limit.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u32>, nullable)]
    pub max_consecutive_days: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carry_forward_enabled: Option<bool>,
    /// `null` removes the cap.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u32>, nullable)]
    pub max_carry_forward_days: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_notice_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LeaveTypeUpdate {
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().map(serde_json::Map::is_empty))
            .unwrap_or(true)
    }

    pub fn apply_to(&self, leave_type: &mut LeaveType) {
        if let Some(name) = &self.name {
            leave_type.name = name.clone();
        }
        if let Some(description) = &self.description {
            leave_type.description = Some(description.clone());
        }
        if let Some(quota) = self.annual_quota {
            leave_type.annual_quota = quota;
        }
        if let Some(max) = self.max_consecutive_days {
            leave_type.max_consecutive_days = max;
        }
        if let Some(enabled) = self.carry_forward_enabled {
            leave_type.carry_forward_enabled = enabled;
        }
        if let Some(cap) = self.max_carry_forward_days {
            leave_type.max_carry_forward_days = cap;
        }
        if let Some(required) = self.requires_approval {
            leave_type.requires_approval = required;
        }
        if let Some(notice) = self.advance_notice_days {
            leave_type.advance_notice_days = notice;
        }
        if let Some(active) = self.is_active {
            leave_type.is_active = active;
        }
    }
}

/// Filters for listing requests. Every `Some` narrows the result.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RequestFilter {
    pub employee_id: Option<u64>,
    #[serde(skip)]
    pub employee_ids: Option<Vec<u64>>,
    pub department: Option<String>,
    pub leave_type_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    /// Requests starting on or after this date.
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Requests ending on or before this date.
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    /// Requests starting on or before this date, wherever they end.
    #[schema(value_type = Option<String>, format = "date")]
    pub starts_until: Option<NaiveDate>,
}

impl RequestFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| request.employee_id == id)
            && self
                .employee_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&request.employee_id))
            && self.leave_type_id.is_none_or(|id| request.leave_type_id == id)
            && self.status.is_none_or(|status| request.status == status)
            && self.start_date.is_none_or(|from| request.start_date >= from)
            && self.end_date.is_none_or(|to| request.end_date <= to)
            && self.starts_until.is_none_or(|to| request.start_date <= to)
    }
}

/// A conditional status update, optionally paired with a balance mutation.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub request_id: u64,
    /// Applied only if the stored status still equals this.
    pub from: LeaveStatus,
    pub to: LeaveStatus,
    pub approver_id: Option<u64>,
    pub comments: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub ledger: Option<LedgerEntry>,
}

/// New dates for a request; written only while it is still pending.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub request_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    /// Replaces the stored reason when given.
    pub reason: Option<String>,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn employee(&self, id: u64) -> LeaveResult<Option<Employee>>;
    async fn employees(&self, active_only: bool) -> LeaveResult<Vec<Employee>>;
    async fn insert_employee(&self, new: &NewEmployee) -> LeaveResult<Employee>;

    async fn leave_type(&self, id: u64) -> LeaveResult<Option<LeaveType>>;
    async fn leave_types(&self, active_only: bool) -> LeaveResult<Vec<LeaveType>>;
    async fn insert_leave_type(&self, new: &NewLeaveType) -> LeaveResult<LeaveType>;
    async fn update_leave_type(&self, id: u64, update: &LeaveTypeUpdate) -> LeaveResult<LeaveType>;

    async fn balance(&self, key: BalanceKey) -> LeaveResult<Option<LeaveBalance>>;
    async fn balances(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>>;
    /// Creates the row with `allocated` days if missing. The flag tells whether
    /// it was created.
    async fn ensure_balance(
        &self,
        key: BalanceKey,
        allocated: u32,
    ) -> LeaveResult<(LeaveBalance, bool)>;
    async fn set_carried_forward(&self, key: BalanceKey, days: u32) -> LeaveResult<LeaveBalance>;

    async fn request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>>;
    async fn requests(&self, filter: &RequestFilter) -> LeaveResult<Vec<LeaveRequest>>;
    /// Pending or approved requests of the employee intersecting `[start, end]`.
    async fn overlapping_requests(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveResult<Vec<LeaveRequest>>;
    async fn insert_request(
        &self,
        new: &NewLeaveRequest,
        ledger: Option<LedgerEntry>,
    ) -> LeaveResult<LeaveRequest>;
    /// Fails with `InvalidTransition` when the stored status is no longer
    /// `change.from`, and with the ledger's error when the balance refuses the
    /// entry. Nothing is written in either case.
    async fn transition_request(&self, change: &StatusChange) -> LeaveResult<LeaveRequest>;
    /// Fails with `InvalidTransition` when the request is no longer pending.
    async fn update_pending_request(&self, edit: &PendingEdit) -> LeaveResult<LeaveRequest>;

    /// Active holidays that may fall in `[start, end]`: dated ones inside the
    /// range plus every recurring one.
    async fn holiday_candidates(&self, start: NaiveDate, end: NaiveDate) -> LeaveResult<Vec<Holiday>>;
    async fn holidays(&self, active_only: bool) -> LeaveResult<Vec<Holiday>>;
    async fn holiday(&self, id: u64) -> LeaveResult<Option<Holiday>>;
    async fn insert_holiday(&self, new: &NewHoliday) -> LeaveResult<Holiday>;
    /// Overwrites every editable column of the row with `holiday`.
    async fn update_holiday(&self, holiday: &Holiday) -> LeaveResult<Holiday>;
    async fn delete_holiday(&self, id: u64) -> LeaveResult<bool>;

    /// Active delegations of `manager_id` whose range contains `on`.
    async fn delegations_covering(
        &self,
        manager_id: u64,
        on: NaiveDate,
    ) -> LeaveResult<Vec<LeaveDelegation>>;
    /// Active delegations to `delegate_id` whose range contains `on`.
    async fn delegations_to(&self, delegate_id: u64, on: NaiveDate)
    -> LeaveResult<Vec<LeaveDelegation>>;
    async fn delegations(
        &self,
        manager_id: Option<u64>,
        active_only: bool,
    ) -> LeaveResult<Vec<LeaveDelegation>>;
    async fn delegation(&self, id: u64) -> LeaveResult<Option<LeaveDelegation>>;
    async fn insert_delegation(&self, new: &NewDelegation) -> LeaveResult<LeaveDelegation>;
    /// Overwrites dates, reason and the active flag of the row.
    async fn update_delegation(&self, delegation: &LeaveDelegation) -> LeaveResult<LeaveDelegation>;
}
