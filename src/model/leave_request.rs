use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::LeaveError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Statuses that occupy calendar days for overlap checks.
    pub const BLOCKING: [LeaveStatus; 2] = [LeaveStatus::Pending, LeaveStatus::Approved];

    /// Checks `self -> to` against the request state machine.
    ///
    /// `pending` may become anything but `pending`; `approved` may only become
    /// `cancelled`, and only strictly before the leave starts.
    pub fn check_transition(
        self,
        to: LeaveStatus,
        today: NaiveDate,
        start_date: NaiveDate,
    ) -> Result<(), LeaveError> {
        let allowed = match (self, to) {
            (LeaveStatus::Pending, LeaveStatus::Approved)
            | (LeaveStatus::Pending, LeaveStatus::Rejected)
            | (LeaveStatus::Pending, LeaveStatus::Cancelled) => true,
            (LeaveStatus::Approved, LeaveStatus::Cancelled) => today < start_date,
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(LeaveError::InvalidTransition { from: self, to })
        }
    }
}

/// The two outcomes an approver may choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for LeaveStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => LeaveStatus::Approved,
            Decision::Rejected => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 41,
    "employee_id": 7,
    "leave_type_id": 2,
    "start_date": "2026-06-15",
    "end_date": "2026-06-17",
    "total_days": 3,
    "status": "pending",
    "reason": "Flu",
    "approver_id": 2,
    "comments": null,
    "decided_at": null,
    "created_at": "2026-06-01T09:00:00Z",
    "updated_at": "2026-06-01T09:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    /// Inclusive.
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Business days charged against the balance.
    pub total_days: u32,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    /// Approver resolved at submission, replaced by the deciding approver.
    pub approver_id: Option<u64>,
    pub comments: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

/// A request about to be inserted.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    pub approver_id: Option<u64>,
    pub comments: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}
