//! Balance ledger: the arithmetic on a locked balance row, plus the
//! year-boundary operations built on it.
//!
//! Stores load the row under a lock, call [`apply`] or [`set_carried_forward`],
//! and write the result back inside the same transaction. The functions here
//! never let `used` exceed `allocated + carried_forward`.

use chrono::Datelike;
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::store::LeaveStore;
use crate::leave::workflow::LeaveService;
use crate::model::leave_balance::{BalanceKey, BalanceView, LeaveBalance};
use crate::model::leave_request::LeaveRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Debit,
    Credit,
}

/// A balance mutation to run atomically with a request status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: BalanceKey,
    pub days: u32,
    pub op: LedgerOp,
}

impl LedgerEntry {
    /// Requests are charged to the year they start in.
    pub fn for_request(request: &LeaveRequest, op: LedgerOp) -> Self {
        Self {
            key: BalanceKey {
                employee_id: request.employee_id,
                leave_type_id: request.leave_type_id,
                year: request.start_date.year(),
            },
            days: request.total_days,
            op,
        }
    }
}

pub fn debit(balance: &mut LeaveBalance, days: u32) -> LeaveResult<()> {
    let remaining = balance.remaining();
    if days > remaining {
        return Err(LeaveError::InsufficientBalance {
            requested: days,
            remaining,
        });
    }
    balance.used += days;
    Ok(())
}

pub fn credit(balance: &mut LeaveBalance, days: u32) -> LeaveResult<()> {
    balance.used = balance.used.checked_sub(days).ok_or_else(|| {
        LeaveError::InvalidInput(format!(
            "cannot credit {days} day(s) to a balance with {} used",
            balance.used
        ))
    })?;
    Ok(())
}

pub fn apply(balance: &mut LeaveBalance, op: LedgerOp, days: u32) -> LeaveResult<()> {
    match op {
        LedgerOp::Debit => debit(balance, days),
        LedgerOp::Credit => credit(balance, days),
    }
}

/// Replaces the carried-forward days of a target-year row.
pub fn set_carried_forward(balance: &mut LeaveBalance, days: u32) -> LeaveResult<()> {
    let entitlement = balance.allocated.saturating_add(days);
    if balance.used > entitlement {
        return Err(LeaveError::InsufficientBalance {
            requested: balance.used,
            remaining: entitlement,
        });
    }
    balance.carried_forward = days;
    Ok(())
}

/// Outcome of a year-boundary run over every active employee.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RolloverSummary {
    pub year: i32,
    pub employees: usize,
    pub balances_created: usize,
    pub balances_carried: usize,
}

impl<S: LeaveStore> LeaveService<S> {
    /// Balances of one employee for one year, labelled with their leave type.
    pub async fn balances(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<BalanceView>> {
        self.require_employee(employee_id).await?;

        let balances = self.store.balances(employee_id, year).await?;
        let mut views = Vec::with_capacity(balances.len());
        for balance in &balances {
            let name = match self.store.leave_type(balance.leave_type_id).await? {
                Some(leave_type) => leave_type.name,
                None => format!("#{}", balance.leave_type_id),
            };
            views.push(BalanceView::new(balance, name));
        }
        Ok(views)
    }

    /// Moves unused days of `from_year` into `to_year` for one leave type.
    ///
    /// Returns the number of days carried; zero when the type does not allow
    /// carry-forward, in which case the unused days are simply left behind.
    #[instrument(skip(self))]
    pub async fn carry_forward(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        from_year: i32,
        to_year: i32,
    ) -> LeaveResult<u32> {
        if to_year <= from_year {
            return Err(LeaveError::InvalidInput(format!(
                "carry-forward target year {to_year} must follow {from_year}"
            )));
        }

        let leave_type = self.require_leave_type(leave_type_id).await?;
        let source = BalanceKey {
            employee_id,
            leave_type_id,
            year: from_year,
        };
        let unused = self
            .store
            .balance(source)
            .await?
            .map(|balance| balance.remaining())
            .unwrap_or(0);
        let amount = leave_type.carry_forward_amount(unused);

        let target = BalanceKey {
            year: to_year,
            ..source
        };
        self.store
            .ensure_balance(target, leave_type.annual_quota)
            .await?;
        self.store.set_carried_forward(target, amount).await?;

        info!(
            employee_id,
            leave_type_id,
            from_year,
            to_year,
            unused,
            carried = amount,
            "Carry-forward applied"
        );
        Ok(amount)
    }

    /// Creates the missing balance rows of `year` for every active leave type and
    /// pulls carry-forward from the previous year.
    #[instrument(skip(self))]
    pub async fn initialize_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> LeaveResult<Vec<LeaveBalance>> {
        let (_, created) = self.initialize_year_counted(employee_id, year).await?;
        info!(employee_id, year, created, "Leave balances initialized");
        self.store.balances(employee_id, year).await
    }

    /// Runs [`Self::initialize_year`] for every active employee.
    #[instrument(skip(self))]
    pub async fn rollover(&self, year: i32) -> LeaveResult<RolloverSummary> {
        let employees = self.store.employees(true).await?;
        let mut summary = RolloverSummary {
            year,
            ..Default::default()
        };

        for employee in &employees {
            let (carried, created) = self.initialize_year_counted(employee.id, year).await?;
            summary.employees += 1;
            summary.balances_created += created;
            summary.balances_carried += carried;
        }

        info!(
            year,
            employees = summary.employees,
            created = summary.balances_created,
            carried = summary.balances_carried,
            "Year rollover complete"
        );
        Ok(summary)
    }

    /// Returns `(rows that received carried days, rows created)`.
    async fn initialize_year_counted(
        &self,
        employee_id: u64,
        year: i32,
    ) -> LeaveResult<(usize, usize)> {
        self.require_employee(employee_id).await?;

        let mut created = 0;
        let mut carried = 0;
        for leave_type in self.store.leave_types(true).await? {
            let key = BalanceKey {
                employee_id,
                leave_type_id: leave_type.id,
                year,
            };
            let (_, inserted) = self.store.ensure_balance(key, leave_type.annual_quota).await?;
            if inserted {
                created += 1;
            }

            if !leave_type.carry_forward_enabled {
                continue;
            }
            let previous = BalanceKey {
                year: year - 1,
                ..key
            };
            if self.store.balance(previous).await?.is_some()
                && self
                    .carry_forward(employee_id, leave_type.id, year - 1, year)
                    .await?
                    > 0
            {
                carried += 1;
            }
        }
        Ok((carried, created))
    }
}
