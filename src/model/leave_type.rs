use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row of the policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "name": "Sick Leave",
        "description": "Paid sick leave",
        "annual_quota": 10,
        "max_consecutive_days": 5,
        "carry_forward_enabled": false,
        "max_carry_forward_days": null,
        "requires_approval": true,
        "advance_notice_days": 0,
        "is_active": true
    })
)]
pub struct LeaveType {
    #[schema(example = 2)]
    pub id: u64,

    #[schema(example = "Sick Leave")]
    pub name: String,

    #[schema(nullable = true)]
    pub description: Option<String>,

    /// Days allocated at year initialization.
    #[schema(example = 10)]
    pub annual_quota: u32,

    /// `None` means no limit.
    #[schema(example = 5, nullable = true)]
    pub max_consecutive_days: Option<u32>,

    #[schema(example = false)]
    pub carry_forward_enabled: bool,

    /// `None` means every unused day may be carried.
    #[schema(nullable = true)]
    pub max_carry_forward_days: Option<u32>,

    #[schema(example = true)]
    pub requires_approval: bool,

    /// Zero exempts the type from the notice rule.
    #[schema(example = 0)]
    pub advance_notice_days: u32,

    #[schema(example = true)]
    pub is_active: bool,
}

impl LeaveType {
    /// Days that may roll over from a year that ended with `unused` days left.
    pub fn carry_forward_amount(&self, unused: u32) -> u32 {
        if !self.carry_forward_enabled {
            return 0;
        }
        match self.max_carry_forward_days {
            Some(cap) => unused.min(cap),
            None => unused,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLeaveType {
    #[schema(example = "Earned Leave")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 18)]
    pub annual_quota: u32,
    #[schema(example = 10)]
    pub max_consecutive_days: Option<u32>,
    #[serde(default)]
    pub carry_forward_enabled: bool,
    #[schema(example = 5)]
    pub max_carry_forward_days: Option<u32>,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    #[serde(default)]
    #[schema(example = 7)]
    pub advance_notice_days: u32,
}

fn default_true() -> bool {
    true
}
