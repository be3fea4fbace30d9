//! In-memory store and fixtures for service tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::error::{LeaveError, LeaveResult};
use crate::leave::calendar;
use crate::leave::ledger::{self, LedgerEntry, LedgerOp};
use crate::leave::notify::{LeaveEvent, Notifier};
use crate::leave::store::{LeaveStore, LeaveTypeUpdate, PendingEdit, RequestFilter, StatusChange};
use crate::leave::validator::HolidayPolicy;
use crate::leave::workflow::{LeaveService, LeaveSettings};
use crate::model::delegation::{LeaveDelegation, NewDelegation};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave_balance::{BalanceKey, LeaveBalance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::leave_type::{LeaveType, NewLeaveType};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn employee(id: u64, manager_id: Option<u64>) -> Employee {
    Employee {
        id,
        employee_code: format!("EMP-{id:03}"),
        first_name: format!("Employee{id}"),
        last_name: "Test".into(),
        email: format!("employee{id}@company.com"),
        department: "Engineering".into(),
        position: "Engineer".into(),
        manager_id,
        is_active: true,
        hire_date: d(2024, 1, 1),
    }
}

pub fn sick_leave(id: u64) -> LeaveType {
    LeaveType {
        id,
        name: "Sick Leave".into(),
        description: None,
        annual_quota: 10,
        max_consecutive_days: None,
        carry_forward_enabled: false,
        max_carry_forward_days: None,
        requires_approval: true,
        advance_notice_days: 0,
        is_active: true,
    }
}

pub fn request(
    id: u64,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    status: LeaveStatus,
) -> LeaveRequest {
    let now = Utc::now();
    LeaveRequest {
        id,
        employee_id,
        leave_type_id: 2,
        start_date: start,
        end_date: end,
        total_days: calendar::business_days(start, end, &[]),
        status,
        reason: None,
        approver_id: Some(2),
        comments: None,
        decided_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    employees: BTreeMap<u64, Employee>,
    leave_types: BTreeMap<u64, LeaveType>,
    balances: BTreeMap<BalanceKeyOrd, LeaveBalance>,
    requests: BTreeMap<u64, LeaveRequest>,
    holidays: BTreeMap<u64, Holiday>,
    delegations: BTreeMap<u64, LeaveDelegation>,
}

type BalanceKeyOrd = (u64, i32, u64);

fn ord(key: BalanceKey) -> BalanceKeyOrd {
    (key.employee_id, key.year, key.leave_type_id)
}

impl Tables {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        100 + self.next_id
    }

    /// Applies the entry to a copy of the row; nothing changes on error.
    fn ledger_result(&self, entry: &LedgerEntry) -> LeaveResult<Option<LeaveBalance>> {
        let Some(row) = self.balances.get(&ord(entry.key)) else {
            return match entry.op {
                LedgerOp::Debit if entry.days > 0 => Err(LeaveError::InsufficientBalance {
                    requested: entry.days,
                    remaining: 0,
                }),
                LedgerOp::Debit => Ok(None),
                LedgerOp::Credit => Err(LeaveError::NotFound("balance row".into())),
            };
        };
        let mut row = row.clone();
        ledger::apply(&mut row, entry.op, entry.days)?;
        Ok(Some(row))
    }
}

/// `LeaveStore` over plain maps behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn put_employee(&self, employee: Employee) {
        self.tables().employees.insert(employee.id, employee);
    }

    pub fn put_leave_type(&self, mut leave_type: LeaveType) -> u64 {
        let mut tables = self.tables();
        leave_type.id = tables.id();
        let id = leave_type.id;
        tables.leave_types.insert(id, leave_type);
        id
    }

    pub fn put_balance(&self, key: BalanceKey, allocated: u32, used: u32) {
        let mut tables = self.tables();
        let id = tables.id();
        tables.balances.insert(
            ord(key),
            LeaveBalance {
                id,
                employee_id: key.employee_id,
                leave_type_id: key.leave_type_id,
                year: key.year,
                allocated,
                used,
                carried_forward: 0,
            },
        );
    }

    pub fn put_delegation(&self, manager_id: u64, delegate_id: u64, start: NaiveDate, end: NaiveDate) {
        let mut tables = self.tables();
        let id = tables.id();
        tables.delegations.insert(
            id,
            LeaveDelegation {
                id,
                manager_id,
                delegate_id,
                start_date: start,
                end_date: end,
                reason: None,
                is_active: true,
            },
        );
    }

    pub fn put_holiday(&self, name: &str, date: NaiveDate, recurring: bool) -> u64 {
        let mut tables = self.tables();
        let id = tables.id();
        tables.holidays.insert(
            id,
            Holiday {
                id,
                name: name.into(),
                holiday_date: date,
                is_recurring: recurring,
                description: None,
                is_active: true,
            },
        );
        id
    }

    pub fn set_holiday_active(&self, id: u64, active: bool) {
        if let Some(holiday) = self.tables().holidays.get_mut(&id) {
            holiday.is_active = active;
        }
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn employee(&self, id: u64) -> LeaveResult<Option<Employee>> {
        Ok(self.tables().employees.get(&id).cloned())
    }

    async fn employees(&self, active_only: bool) -> LeaveResult<Vec<Employee>> {
        Ok(self
            .tables()
            .employees
            .values()
            .filter(|e| !active_only || e.is_active)
            .cloned()
            .collect())
    }

    async fn insert_employee(&self, new: &NewEmployee) -> LeaveResult<Employee> {
        let mut tables = self.tables();
        let employee = Employee {
            id: tables.id(),
            employee_code: new.employee_code.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            department: new.department.clone(),
            position: new.position.clone(),
            manager_id: new.manager_id,
            is_active: true,
            hire_date: new.hire_date,
        };
        tables.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn leave_type(&self, id: u64) -> LeaveResult<Option<LeaveType>> {
        Ok(self.tables().leave_types.get(&id).cloned())
    }

    async fn leave_types(&self, active_only: bool) -> LeaveResult<Vec<LeaveType>> {
        Ok(self
            .tables()
            .leave_types
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect())
    }

    async fn insert_leave_type(&self, new: &NewLeaveType) -> LeaveResult<LeaveType> {
        let mut tables = self.tables();
        let leave_type = LeaveType {
            id: tables.id(),
            name: new.name.clone(),
            description: new.description.clone(),
            annual_quota: new.annual_quota,
            max_consecutive_days: new.max_consecutive_days,
            carry_forward_enabled: new.carry_forward_enabled,
            max_carry_forward_days: new.max_carry_forward_days,
            requires_approval: new.requires_approval,
            advance_notice_days: new.advance_notice_days,
            is_active: true,
        };
        tables.leave_types.insert(leave_type.id, leave_type.clone());
        Ok(leave_type)
    }

    async fn update_leave_type(&self, id: u64, update: &LeaveTypeUpdate) -> LeaveResult<LeaveType> {
        let mut tables = self.tables();
        let leave_type = tables
            .leave_types
            .get_mut(&id)
            .ok_or_else(|| LeaveError::not_found("Leave type", id))?;
        update.apply_to(leave_type);
        Ok(leave_type.clone())
    }

    async fn balance(&self, key: BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        Ok(self.tables().balances.get(&ord(key)).cloned())
    }

    async fn balances(&self, employee_id: u64, year: i32) -> LeaveResult<Vec<LeaveBalance>> {
        Ok(self
            .tables()
            .balances
            .range((employee_id, year, 0)..=(employee_id, year, u64::MAX))
            .map(|(_, b)| b.clone())
            .collect())
    }

    async fn ensure_balance(
        &self,
        key: BalanceKey,
        allocated: u32,
    ) -> LeaveResult<(LeaveBalance, bool)> {
        let mut tables = self.tables();
        if let Some(existing) = tables.balances.get(&ord(key)) {
            return Ok((existing.clone(), false));
        }
        let balance = LeaveBalance {
            id: tables.id(),
            employee_id: key.employee_id,
            leave_type_id: key.leave_type_id,
            year: key.year,
            allocated,
            used: 0,
            carried_forward: 0,
        };
        tables.balances.insert(ord(key), balance.clone());
        Ok((balance, true))
    }

    async fn set_carried_forward(&self, key: BalanceKey, days: u32) -> LeaveResult<LeaveBalance> {
        let mut tables = self.tables();
        let row = tables
            .balances
            .get_mut(&ord(key))
            .ok_or_else(|| LeaveError::NotFound("balance row".into()))?;
        let mut updated = row.clone();
        ledger::set_carried_forward(&mut updated, days)?;
        *row = updated.clone();
        Ok(updated)
    }

    async fn request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self.tables().requests.get(&id).cloned())
    }

    async fn requests(&self, filter: &RequestFilter) -> LeaveResult<Vec<LeaveRequest>> {
        let tables = self.tables();
        Ok(tables
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .filter(|r| {
                filter.department.as_ref().is_none_or(|department| {
                    tables
                        .employees
                        .get(&r.employee_id)
                        .is_some_and(|e| &e.department == department)
                })
            })
            .cloned()
            .collect())
    }

    async fn overlapping_requests(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        Ok(self
            .tables()
            .requests
            .values()
            .filter(|r| {
                r.employee_id == employee_id
                    && LeaveStatus::BLOCKING.contains(&r.status)
                    && r.overlaps(start, end)
            })
            .cloned()
            .collect())
    }

    async fn insert_request(
        &self,
        new: &NewLeaveRequest,
        ledger: Option<LedgerEntry>,
    ) -> LeaveResult<LeaveRequest> {
        let mut tables = self.tables();
        let debited = match &ledger {
            Some(entry) => tables.ledger_result(entry)?,
            None => None,
        };

        let now = Utc::now();
        let request = LeaveRequest {
            id: tables.id(),
            employee_id: new.employee_id,
            leave_type_id: new.leave_type_id,
            start_date: new.start_date,
            end_date: new.end_date,
            total_days: new.total_days,
            status: new.status,
            reason: new.reason.clone(),
            approver_id: new.approver_id,
            comments: new.comments.clone(),
            decided_at: new.decided_at,
            created_at: now,
            updated_at: now,
        };
        if let Some(row) = debited {
            tables.balances.insert(ord(row.key()), row);
        }
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn transition_request(&self, change: &StatusChange) -> LeaveResult<LeaveRequest> {
        let mut tables = self.tables();
        let mut request = tables
            .requests
            .get(&change.request_id)
            .cloned()
            .ok_or_else(|| LeaveError::not_found("Leave request", change.request_id))?;
        if request.status != change.from {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: change.to,
            });
        }

        let balance = match &change.ledger {
            Some(entry) => tables.ledger_result(entry)?,
            None => None,
        };

        request.status = change.to;
        if change.approver_id.is_some() {
            request.approver_id = change.approver_id;
        }
        if change.comments.is_some() {
            request.comments = change.comments.clone();
        }
        if change.decided_at.is_some() {
            request.decided_at = change.decided_at;
        }
        request.updated_at = Utc::now();

        if let Some(row) = balance {
            tables.balances.insert(ord(row.key()), row);
        }
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn update_pending_request(&self, edit: &PendingEdit) -> LeaveResult<LeaveRequest> {
        let mut tables = self.tables();
        let request = tables
            .requests
            .get_mut(&edit.request_id)
            .ok_or_else(|| LeaveError::not_found("Leave request", edit.request_id))?;
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Pending,
            });
        }
        request.start_date = edit.start_date;
        request.end_date = edit.end_date;
        request.total_days = edit.total_days;
        if edit.reason.is_some() {
            request.reason = edit.reason.clone();
        }
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn holiday_candidates(&self, start: NaiveDate, end: NaiveDate) -> LeaveResult<Vec<Holiday>> {
        Ok(self
            .tables()
            .holidays
            .values()
            .filter(|h| {
                h.is_active
                    && (h.is_recurring || (h.holiday_date >= start && h.holiday_date <= end))
            })
            .cloned()
            .collect())
    }

    async fn holidays(&self, active_only: bool) -> LeaveResult<Vec<Holiday>> {
        Ok(self
            .tables()
            .holidays
            .values()
            .filter(|h| !active_only || h.is_active)
            .cloned()
            .collect())
    }

    async fn holiday(&self, id: u64) -> LeaveResult<Option<Holiday>> {
        Ok(self.tables().holidays.get(&id).cloned())
    }

    async fn insert_holiday(&self, new: &NewHoliday) -> LeaveResult<Holiday> {
        let mut tables = self.tables();
        let holiday = Holiday {
            id: tables.id(),
            name: new.name.clone(),
            holiday_date: new.holiday_date,
            is_recurring: new.is_recurring,
            description: new.description.clone(),
            is_active: true,
        };
        tables.holidays.insert(holiday.id, holiday.clone());
        Ok(holiday)
    }

    async fn update_holiday(&self, holiday: &Holiday) -> LeaveResult<Holiday> {
        let mut tables = self.tables();
        let row = tables
            .holidays
            .get_mut(&holiday.id)
            .ok_or_else(|| LeaveError::not_found("Holiday", holiday.id))?;
        *row = holiday.clone();
        Ok(row.clone())
    }

    async fn delete_holiday(&self, id: u64) -> LeaveResult<bool> {
        Ok(self.tables().holidays.remove(&id).is_some())
    }

    async fn delegations_covering(
        &self,
        manager_id: u64,
        on: NaiveDate,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        Ok(self
            .tables()
            .delegations
            .values()
            .filter(|dl| dl.manager_id == manager_id && dl.covers(on))
            .cloned()
            .collect())
    }

    async fn delegations_to(
        &self,
        delegate_id: u64,
        on: NaiveDate,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        Ok(self
            .tables()
            .delegations
            .values()
            .filter(|dl| dl.delegate_id == delegate_id && dl.covers(on))
            .cloned()
            .collect())
    }

    async fn delegations(
        &self,
        manager_id: Option<u64>,
        active_only: bool,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        Ok(self
            .tables()
            .delegations
            .values()
            .filter(|dl| manager_id.is_none_or(|m| dl.manager_id == m))
            .filter(|dl| !active_only || dl.is_active)
            .cloned()
            .collect())
    }

    async fn delegation(&self, id: u64) -> LeaveResult<Option<LeaveDelegation>> {
        Ok(self.tables().delegations.get(&id).cloned())
    }

    async fn insert_delegation(&self, new: &NewDelegation) -> LeaveResult<LeaveDelegation> {
        let mut tables = self.tables();
        let delegation = LeaveDelegation {
            id: tables.id(),
            manager_id: new.manager_id,
            delegate_id: new.delegate_id,
            start_date: new.start_date,
            end_date: new.end_date,
            reason: new.reason.clone(),
            is_active: true,
        };
        tables.delegations.insert(delegation.id, delegation.clone());
        Ok(delegation)
    }

    async fn update_delegation(&self, delegation: &LeaveDelegation) -> LeaveResult<LeaveDelegation> {
        let mut tables = self.tables();
        let row = tables
            .delegations
            .get_mut(&delegation.id)
            .ok_or_else(|| LeaveError::not_found("Delegation", delegation.id))?;
        row.start_date = delegation.start_date;
        row.end_date = delegation.end_date;
        row.reason = delegation.reason.clone();
        row.is_active = delegation.is_active;
        Ok(row.clone())
    }
}

/// Keeps every delivered notification; can be switched to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(u64, LeaveEvent)>>,
    failing: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient_id: u64,
        event: LeaveEvent,
        _payload: serde_json::Value,
    ) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("smtp relay unavailable"));
        }
        self.sent.lock().unwrap().push((recipient_id, event));
        Ok(())
    }
}

/// A small company: a CEO with two direct reports (`manager`, `deputy`), and
/// `alice` and `bob` reporting to `manager`. Alice and Bob hold 10 sick days
/// for 2026.
pub struct Fixture {
    pub service: LeaveService<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    pub ceo: u64,
    pub manager: u64,
    pub deputy: u64,
    pub alice: u64,
    pub bob: u64,
    pub sick: u64,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_fallback(None)
    }

    pub fn with_fallback(fallback_approver_id: Option<u64>) -> Self {
        let store = MemoryStore::default();
        store.put_employee(employee(1, None));
        store.put_employee(employee(2, Some(1)));
        store.put_employee(employee(3, Some(1)));
        store.put_employee(employee(7, Some(2)));
        store.put_employee(employee(8, Some(2)));
        let sick = store.put_leave_type(sick_leave(0));
        for employee_id in [7, 8] {
            store.put_balance(
                BalanceKey {
                    employee_id,
                    leave_type_id: sick,
                    year: 2026,
                },
                10,
                0,
            );
        }

        let notifier = Arc::new(RecordingNotifier::default());
        let settings = LeaveSettings {
            holiday_policy: HolidayPolicy::Block,
            fallback_approver_id,
        };
        Self {
            service: LeaveService::new(store, notifier.clone(), settings),
            notifier,
            ceo: 1,
            manager: 2,
            deputy: 3,
            alice: 7,
            bob: 8,
            sick,
        }
    }

    /// Carry-forward enabled, 18 days a year.
    pub fn earned_leave(&self, cap: Option<u32>) -> u64 {
        self.service.store.put_leave_type(LeaveType {
            name: "Earned Leave".into(),
            annual_quota: 18,
            carry_forward_enabled: true,
            max_carry_forward_days: cap,
            ..sick_leave(0)
        })
    }

    /// Needs no approval but asks for three days of notice.
    pub fn casual_leave(&self) -> u64 {
        self.service.store.put_leave_type(LeaveType {
            name: "Casual Leave".into(),
            annual_quota: 5,
            requires_approval: false,
            advance_notice_days: 3,
            ..sick_leave(0)
        })
    }

    pub fn seed_balance(&self, employee_id: u64, leave_type_id: u64, year: i32, allocated: u32, used: u32) {
        self.service.store.put_balance(
            BalanceKey {
                employee_id,
                leave_type_id,
                year,
            },
            allocated,
            used,
        );
    }

    pub fn delegate(&self, manager_id: u64, delegate_id: u64, start: NaiveDate, end: NaiveDate) {
        self.service
            .store
            .put_delegation(manager_id, delegate_id, start, end);
    }

    pub fn holiday(&self, name: &str, date: NaiveDate) -> u64 {
        self.service.store.put_holiday(name, date, false)
    }

    pub fn recurring_holiday(&self, name: &str, date: NaiveDate) -> u64 {
        self.service.store.put_holiday(name, date, true)
    }

    pub fn deactivate_holiday(&self, id: u64) {
        self.service.store.set_holiday_active(id, false);
    }

    /// Submits a sick-leave request on 2026-06-01 and expects it to pass.
    pub async fn submit_sick(&self, employee_id: u64, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        self.service
            .submit(employee_id, self.sick, start, end, None, d(2026, 6, 1))
            .await
            .unwrap()
            .request
    }

    pub fn deactivate_employee(&self, id: u64) {
        if let Some(employee) = self.service.store.tables().employees.get_mut(&id) {
            employee.is_active = false;
        }
    }

    pub fn active_employee_count(&self) -> usize {
        self.service
            .store
            .tables()
            .employees
            .values()
            .filter(|e| e.is_active)
            .count()
    }

    pub fn notifications(&self) -> Vec<(u64, LeaveEvent)> {
        self.notifier.sent.lock().unwrap().clone()
    }

    pub fn fail_notifications(&self) {
        self.notifier.failing.store(true, Ordering::SeqCst);
    }
}
