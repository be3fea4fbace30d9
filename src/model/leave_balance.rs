use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ledger row for one (employee, leave type, year).
///
/// Invariant: `used <= allocated + carried_forward`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "employee_id": 7,
    "leave_type_id": 2,
    "year": 2026,
    "allocated": 10,
    "used": 3,
    "carried_forward": 0
}))]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
    pub allocated: u32,
    pub used: u32,
    pub carried_forward: u32,
}

impl LeaveBalance {
    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            employee_id: self.employee_id,
            leave_type_id: self.leave_type_id,
            year: self.year,
        }
    }

    pub fn entitlement(&self) -> u32 {
        self.allocated.saturating_add(self.carried_forward)
    }

    pub fn remaining(&self) -> u32 {
        self.entitlement().saturating_sub(self.used)
    }
}

/// Identifies a balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
}

/// Balance as returned to callers, with the derived remaining days.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceView {
    pub leave_type_id: u64,
    #[schema(example = "Sick Leave")]
    pub leave_type: String,
    pub year: i32,
    pub allocated: u32,
    pub used: u32,
    pub carried_forward: u32,
    pub remaining: u32,
}

impl BalanceView {
    pub fn new(balance: &LeaveBalance, leave_type: String) -> Self {
        Self {
            leave_type_id: balance.leave_type_id,
            leave_type,
            year: balance.year,
            allocated: balance.allocated,
            used: balance.used,
            carried_forward: balance.carried_forward,
            remaining: balance.remaining(),
        }
    }
}
