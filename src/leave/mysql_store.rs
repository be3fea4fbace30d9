//! MySQL implementation of [`LeaveStore`].
//!
//! Balance-changing writes run in one transaction: the balance row is read
//! with `FOR UPDATE`, checked by the pure ledger rules and written back before
//! commit. Request status changes are conditional on the expected old status.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::debug;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::ledger::{self, LedgerEntry, LedgerOp};
use crate::leave::store::{LeaveStore, LeaveTypeUpdate, PendingEdit, RequestFilter, StatusChange};
use crate::model::delegation::{LeaveDelegation, NewDelegation};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::leave_type::{LeaveType, NewLeaveType};
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::policy_cache;

const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, email, department, \
     position, manager_id, is_active, hire_date";

const LEAVE_TYPE_COLUMNS: &str = "id, name, description, annual_quota, max_consecutive_days, \
     carry_forward_enabled, max_carry_forward_days, requires_approval, advance_notice_days, \
     is_active";

/// Columns a leave-type update may touch.
const LEAVE_TYPE_UPDATABLE: &[&str] = &[
    "name",
    "description",
    "annual_quota",
    "max_consecutive_days",
    "carry_forward_enabled",
    "max_carry_forward_days",
    "requires_approval",
    "advance_notice_days",
    "is_active",
];

const BALANCE_COLUMNS: &str = "id, employee_id, leave_type_id, year, allocated, used, carried_forward";

const REQUEST_COLUMNS: &str = "id, employee_id, leave_type_id, start_date, end_date, total_days, \
     status, reason, approver_id, comments, decided_at, created_at, updated_at";

const HOLIDAY_COLUMNS: &str = "id, name, holiday_date, is_recurring, description, is_active";

const DELEGATION_COLUMNS: &str = "id, manager_id, delegate_id, start_date, end_date, reason, is_active";

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    leave_type_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: u32,
    status: String,
    reason: Option<String>,
    approver_id: Option<u64>,
    comments: Option<String>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status)
            .map_err(|e| LeaveError::Database(sqlx::Error::Decode(Box::new(e))))?;
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_id: row.leave_type_id,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            status,
            reason: row.reason,
            approver_id: row.approver_id,
            comments: row.comments,
            decided_at: row.decided_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_requests(rows: Vec<LeaveRequestRow>) -> LeaveResult<Vec<LeaveRequest>> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

/// Maps a duplicate-key failure to `AlreadyExists`.
fn unique_violation(e: sqlx::Error, what: String) -> LeaveError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return LeaveError::AlreadyExists(what);
        }
    }
    LeaveError::Database(e)
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Status(LeaveStatus),
    Date(NaiveDate),
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn lock_balance(
        tx: &mut Transaction<'_, MySql>,
        key: BalanceKey,
    ) -> LeaveResult<Option<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances \
             WHERE employee_id = ? AND leave_type_id = ? AND year = ? FOR UPDATE"
        );
        let balance = sqlx::query_as::<_, LeaveBalance>(&sql)
            .bind(key.employee_id)
            .bind(key.leave_type_id)
            .bind(key.year)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(balance)
    }

    async fn apply_ledger(tx: &mut Transaction<'_, MySql>, entry: &LedgerEntry) -> LeaveResult<()> {
        let Some(mut balance) = Self::lock_balance(tx, entry.key).await? else {
            return match entry.op {
                LedgerOp::Debit if entry.days > 0 => Err(LeaveError::InsufficientBalance {
                    requested: entry.days,
                    remaining: 0,
                }),
                LedgerOp::Debit => Ok(()),
                LedgerOp::Credit => Err(LeaveError::NotFound(format!(
                    "Balance of employee {} for leave type {} in {}",
                    entry.key.employee_id, entry.key.leave_type_id, entry.key.year
                ))),
            };
        };

        ledger::apply(&mut balance, entry.op, entry.days)?;

        sqlx::query("UPDATE leave_balances SET used = ? WHERE id = ?")
            .bind(balance.used)
            .bind(balance.id)
            .execute(&mut **tx)
            .await?;
        debug!(balance_id = balance.id, used = balance.used, op = ?entry.op, "Balance updated");
        Ok(())
    }

    async fn fetch_holiday(&self, id: u64) -> LeaveResult<Holiday> {
        self.holiday(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Holiday", id))
    }

    async fn fetch_delegation(&self, id: u64) -> LeaveResult<LeaveDelegation> {
        self.delegation(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Delegation", id))
    }

    async fn fetch_request(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.request(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Leave request", id))
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn employee(&self, id: u64) -> LeaveResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn employees(&self, active_only: bool) -> LeaveResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE (? = FALSE OR is_active = TRUE) ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_employee(&self, new: &NewEmployee) -> LeaveResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (employee_code, first_name, last_name, email, department, position,
                 manager_id, is_active, hire_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(&new.employee_code)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.department)
        .bind(&new.position)
        .bind(new.manager_id)
        .bind(new.hire_date)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, format!("Employee '{}'", new.employee_code)))?;

        let id = result.last_insert_id();
        self.employee(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Employee", id))
    }

    async fn leave_type(&self, id: u64) -> LeaveResult<Option<LeaveType>> {
        if let Some(cached) = policy_cache::get(id).await {
            return Ok(Some(cached));
        }

        let sql = format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE id = ?");
        let leave_type = sqlx::query_as::<_, LeaveType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(leave_type) = &leave_type {
            policy_cache::put(leave_type).await;
        }
        Ok(leave_type)
    }

    async fn leave_types(&self, active_only: bool) -> LeaveResult<Vec<LeaveType>> {
        let sql = format!(
            "SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE (? = FALSE OR is_active = TRUE) ORDER BY id"
        );
        Ok(sqlx::query_as::<_, LeaveType>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_leave_type(&self, new: &NewLeaveType) -> LeaveResult<LeaveType> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_types
                (name, description, annual_quota, max_consecutive_days, carry_forward_enabled,
                 max_carry_forward_days, requires_approval, advance_notice_days, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.annual_quota)
        .bind(new.max_consecutive_days)
        .bind(new.carry_forward_enabled)
        .bind(new.max_carry_forward_days)
        .bind(new.requires_approval)
        .bind(new.advance_notice_days)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, format!("Leave type '{}'", new.name)))?;

        let id = result.last_insert_id();
        self.leave_type(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Leave type", id))
    }

    async fn update_leave_type(&self, id: u64, update: &LeaveTypeUpdate) -> LeaveResult<LeaveType> {
        let payload = serde_json::to_value(update)
            .map_err(|e| LeaveError::InvalidInput(e.to_string()))?;
        let sql_update = build_update_sql("leave_types", &payload, LEAVE_TYPE_UPDATABLE, "id", id)?;

        let name = update.name.clone().unwrap_or_else(|| format!("#{id}"));
        execute_update(&self.pool, sql_update)
            .await
            .map_err(|e| unique_violation(e, format!("Leave type '{name}'")))?;
        policy_cache::invalidate(id).await;

        self.leave_type(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Leave type", id))
    }

    async fn balance(&self, key: BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances \
             WHERE employee_id = ? AND leave_type_id = ? AND year = ?"
        );
        Ok(sqlx::query_as::<_, LeaveBalance>(&sql)
            .bind(key.employee_id)
            .bind(key.leave_type_id)
            .bind(key.year)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn balances(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances \
             WHERE employee_id = ? AND year = ? ORDER BY leave_type_id"
        );
        Ok(sqlx::query_as::<_, LeaveBalance>(&sql)
            .bind(employee_id)
            .bind(year)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn ensure_balance(
        &self,
        key: BalanceKey,
        allocated: u32,
    ) -> LeaveResult<(LeaveBalance, bool)> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO leave_balances
                (employee_id, leave_type_id, year, allocated, used, carried_forward)
            VALUES (?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(key.employee_id)
        .bind(key.leave_type_id)
        .bind(key.year)
        .bind(allocated)
        .execute(&self.pool)
        .await?;

        let balance = self.balance(key).await?.ok_or_else(|| {
            LeaveError::NotFound(format!(
                "Balance of employee {} for leave type {} in {}",
                key.employee_id, key.leave_type_id, key.year
            ))
        })?;
        Ok((balance, result.rows_affected() == 1))
    }

    async fn set_carried_forward(&self, key: BalanceKey, days: u32) -> LeaveResult<LeaveBalance> {
        let mut tx = self.pool.begin().await?;
        let mut balance = Self::lock_balance(&mut tx, key).await?.ok_or_else(|| {
            LeaveError::NotFound(format!(
                "Balance of employee {} for leave type {} in {}",
                key.employee_id, key.leave_type_id, key.year
            ))
        })?;

        ledger::set_carried_forward(&mut balance, days)?;
        sqlx::query("UPDATE leave_balances SET carried_forward = ? WHERE id = ?")
            .bind(balance.carried_forward)
            .bind(balance.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn requests(&self, filter: &RequestFilter) -> LeaveResult<Vec<LeaveRequest>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(ids) = &filter.employee_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let marks = vec!["?"; ids.len()].join(", ");
            where_sql.push_str(&format!(" AND employee_id IN ({marks})"));
            args.extend(ids.iter().map(|id| FilterValue::U64(*id)));
        }
        if let Some(department) = filter.department.as_deref() {
            where_sql.push_str(" AND employee_id IN (SELECT id FROM employees WHERE department = ?)");
            args.push(FilterValue::Str(department));
        }
        if let Some(leave_type_id) = filter.leave_type_id {
            where_sql.push_str(" AND leave_type_id = ?");
            args.push(FilterValue::U64(leave_type_id));
        }
        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Status(status));
        }
        if let Some(from) = filter.start_date {
            where_sql.push_str(" AND start_date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = filter.end_date {
            where_sql.push_str(" AND end_date <= ?");
            args.push(FilterValue::Date(to));
        }
        if let Some(to) = filter.starts_until {
            where_sql.push_str(" AND start_date <= ?");
            args.push(FilterValue::Date(to));
        }

        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} ORDER BY id");
        let mut query = sqlx::query_as::<_, LeaveRequestRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Status(s) => query.bind(s.to_string()),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        into_requests(query.fetch_all(&self.pool).await?)
    }

    async fn overlapping_requests(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND status IN (?, ?) \
             AND start_date <= ? AND end_date >= ? ORDER BY id"
        );
        let [pending, approved] = LeaveStatus::BLOCKING;
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(employee_id)
            .bind(pending.to_string())
            .bind(approved.to_string())
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn insert_request(
        &self,
        new: &NewLeaveRequest,
        ledger: Option<LedgerEntry>,
    ) -> LeaveResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;
        if let Some(entry) = &ledger {
            Self::apply_ledger(&mut tx, entry).await?;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type_id, start_date, end_date, total_days, status,
                 reason, approver_id, comments, decided_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.total_days)
        .bind(new.status.to_string())
        .bind(&new.reason)
        .bind(new.approver_id)
        .bind(&new.comments)
        .bind(new.decided_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.fetch_request(result.last_insert_id()).await
    }

    async fn transition_request(&self, change: &StatusChange) -> LeaveResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?,
                approver_id = COALESCE(?, approver_id),
                comments = COALESCE(?, comments),
                decided_at = COALESCE(?, decided_at),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(change.to.to_string())
        .bind(change.approver_id)
        .bind(&change.comments)
        .bind(change.decided_at)
        .bind(change.request_id)
        .bind(change.from.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = sqlx::query_scalar::<_, String>("SELECT status FROM leave_requests WHERE id = ?")
                .bind(change.request_id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match current {
                None => LeaveError::not_found("Leave request", change.request_id),
                Some(status) => LeaveError::InvalidTransition {
                    from: LeaveStatus::from_str(&status).unwrap_or(change.from),
                    to: change.to,
                },
            });
        }

        if let Some(entry) = &change.ledger {
            Self::apply_ledger(&mut tx, entry).await?;
        }
        tx.commit().await?;

        self.fetch_request(change.request_id).await
    }

    async fn update_pending_request(&self, edit: &PendingEdit) -> LeaveResult<LeaveRequest> {
        let pending = LeaveStatus::Pending;
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?,
                end_date = ?,
                total_days = ?,
                reason = COALESCE(?, reason),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(edit.start_date)
        .bind(edit.end_date)
        .bind(edit.total_days)
        .bind(&edit.reason)
        .bind(edit.request_id)
        .bind(pending.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.fetch_request(edit.request_id).await?;
            return Err(LeaveError::InvalidTransition {
                from: current.status,
                to: pending,
            });
        }
        debug!(request_id = edit.request_id, total_days = edit.total_days, "Pending request rewritten");

        self.fetch_request(edit.request_id).await
    }

    async fn holiday_candidates(&self, start: NaiveDate, end: NaiveDate) -> LeaveResult<Vec<Holiday>> {
        let sql = format!(
            "SELECT {HOLIDAY_COLUMNS} FROM holidays \
             WHERE is_active = TRUE AND (is_recurring = TRUE OR holiday_date BETWEEN ? AND ?) \
             ORDER BY holiday_date"
        );
        Ok(sqlx::query_as::<_, Holiday>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn holidays(&self, active_only: bool) -> LeaveResult<Vec<Holiday>> {
        let sql = format!(
            "SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE (? = FALSE OR is_active = TRUE) ORDER BY holiday_date"
        );
        Ok(sqlx::query_as::<_, Holiday>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn holiday(&self, id: u64) -> LeaveResult<Option<Holiday>> {
        let sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?");
        Ok(sqlx::query_as::<_, Holiday>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_holiday(&self, new: &NewHoliday) -> LeaveResult<Holiday> {
        let result = sqlx::query(
            r#"
            INSERT INTO holidays (name, holiday_date, is_recurring, description, is_active)
            VALUES (?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(&new.name)
        .bind(new.holiday_date)
        .bind(new.is_recurring)
        .bind(&new.description)
        .execute(&self.pool)
        .await?;

        self.fetch_holiday(result.last_insert_id()).await
    }

    async fn update_holiday(&self, holiday: &Holiday) -> LeaveResult<Holiday> {
        let result = sqlx::query(
            r#"
            UPDATE holidays
            SET name = ?, holiday_date = ?, is_recurring = ?, description = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&holiday.name)
        .bind(holiday.holiday_date)
        .bind(holiday.is_recurring)
        .bind(&holiday.description)
        .bind(holiday.is_active)
        .bind(holiday.id)
        .execute(&self.pool)
        .await?;
        debug!(holiday_id = holiday.id, rows = result.rows_affected(), "Holiday rewritten");

        self.fetch_holiday(holiday.id).await
    }

    async fn delete_holiday(&self, id: u64) -> LeaveResult<bool> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delegations_covering(
        &self,
        manager_id: u64,
        on: NaiveDate,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        let sql = format!(
            "SELECT {DELEGATION_COLUMNS} FROM leave_delegations \
             WHERE manager_id = ? AND is_active = TRUE AND start_date <= ? AND end_date >= ? \
             ORDER BY id"
        );
        Ok(sqlx::query_as::<_, LeaveDelegation>(&sql)
            .bind(manager_id)
            .bind(on)
            .bind(on)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delegations_to(
        &self,
        delegate_id: u64,
        on: NaiveDate,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        let sql = format!(
            "SELECT {DELEGATION_COLUMNS} FROM leave_delegations \
             WHERE delegate_id = ? AND is_active = TRUE AND start_date <= ? AND end_date >= ? \
             ORDER BY id"
        );
        Ok(sqlx::query_as::<_, LeaveDelegation>(&sql)
            .bind(delegate_id)
            .bind(on)
            .bind(on)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delegations(
        &self,
        manager_id: Option<u64>,
        active_only: bool,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        let sql = format!(
            "SELECT {DELEGATION_COLUMNS} FROM leave_delegations \
             WHERE (? IS NULL OR manager_id = ?) AND (? = FALSE OR is_active = TRUE) \
             ORDER BY start_date DESC, id"
        );
        Ok(sqlx::query_as::<_, LeaveDelegation>(&sql)
            .bind(manager_id)
            .bind(manager_id)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delegation(&self, id: u64) -> LeaveResult<Option<LeaveDelegation>> {
        let sql = format!("SELECT {DELEGATION_COLUMNS} FROM leave_delegations WHERE id = ?");
        Ok(sqlx::query_as::<_, LeaveDelegation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_delegation(&self, new: &NewDelegation) -> LeaveResult<LeaveDelegation> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_delegations
                (manager_id, delegate_id, start_date, end_date, reason, is_active)
            VALUES (?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(new.manager_id)
        .bind(new.delegate_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        self.fetch_delegation(result.last_insert_id()).await
    }

    async fn update_delegation(&self, delegation: &LeaveDelegation) -> LeaveResult<LeaveDelegation> {
        sqlx::query(
            r#"
            UPDATE leave_delegations
            SET start_date = ?, end_date = ?, reason = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(delegation.start_date)
        .bind(delegation.end_date)
        .bind(&delegation.reason)
        .bind(delegation.is_active)
        .bind(delegation.id)
        .execute(&self.pool)
        .await?;

        self.fetch_delegation(delegation.id).await
    }
}
