use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Temporary hand-over of approval authority from a manager to a delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 5,
    "manager_id": 2,
    "delegate_id": 3,
    "start_date": "2026-06-01",
    "end_date": "2026-06-30",
    "reason": "Parental leave",
    "is_active": true
}))]
pub struct LeaveDelegation {
    pub id: u64,
    pub manager_id: u64,
    pub delegate_id: u64,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    /// Inclusive.
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub is_active: bool,
}

impl LeaveDelegation {
    pub fn covers(&self, on: NaiveDate) -> bool {
        self.is_active && self.start_date <= on && on <= self.end_date
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewDelegation {
    #[schema(example = 2)]
    pub manager_id: u64,
    #[schema(example = 3)]
    pub delegate_id: u64,
    #[schema(example = "2026-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-30", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Edit of an existing delegation; omitted fields stay unchanged. The manager
/// and delegate are fixed once created.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DelegationUpdate {
    #[schema(example = "2026-06-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-06-20", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    /// `false` switches the delegation off; approvals go back to the manager.
    pub is_active: Option<bool>,
}

impl DelegationUpdate {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.reason.is_none()
            && self.is_active.is_none()
    }

    pub fn apply_to(&self, delegation: &mut LeaveDelegation) {
        if let Some(start) = self.start_date {
            delegation.start_date = start;
        }
        if let Some(end) = self.end_date {
            delegation.end_date = end;
        }
        if let Some(reason) = &self.reason {
            delegation.reason = Some(reason.clone());
        }
        if let Some(active) = self.is_active {
            delegation.is_active = active;
        }
    }
}
