//! Leave request workflow: submit, decide, cancel.
//!
//! `LeaveService` composes the validator, the approval router and the ledger
//! over a [`LeaveStore`]. Every operation is a single sequential pass; the only
//! contended data (balance rows) is serialized by the store's transactions.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::calendar;
use crate::leave::ledger::{LedgerEntry, LedgerOp};
use crate::leave::notify::{self, LeaveEvent, Notifier};
use crate::leave::store::{LeaveStore, PendingEdit, RequestFilter, StatusChange};
use crate::leave::validator::{self, HolidayPolicy, ValidationContext, ValidationResult};
use crate::model::employee::Employee;
use crate::model::leave_balance::BalanceKey;
use crate::model::leave_request::{Decision, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::leave_type::LeaveType;

const AUTO_APPROVED_COMMENT: &str = "Auto-approved: leave type does not require approval";

#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveSettings {
    pub holiday_policy: HolidayPolicy,
    /// Approver for employees at the top of the hierarchy.
    pub fallback_approver_id: Option<u64>,
}

pub struct LeaveService<S> {
    pub(crate) store: S,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) settings: LeaveSettings,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitOutcome {
    pub validation: ValidationResult,
    pub request: LeaveRequest,
}

impl<S: LeaveStore> LeaveService<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>, settings: LeaveSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    pub(crate) async fn require_employee(&self, id: u64) -> LeaveResult<Employee> {
        self.store
            .employee(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Employee", id))
    }

    pub(crate) async fn require_leave_type(&self, id: u64) -> LeaveResult<LeaveType> {
        self.store
            .leave_type(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Leave type", id))
    }

    pub async fn request(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.store
            .request(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Leave request", id))
    }

    /// Requests of one employee, optionally only those touching `year`.
    pub async fn employee_requests(
        &self,
        employee_id: u64,
        year: Option<i32>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        self.require_employee(employee_id).await?;
        let requests = self
            .store
            .requests(&RequestFilter {
                employee_id: Some(employee_id),
                ..Default::default()
            })
            .await?;

        Ok(match year {
            Some(year) => requests
                .into_iter()
                .filter(|r| r.start_date.year() <= year && r.end_date.year() >= year)
                .collect(),
            None => requests,
        })
    }

    /// Dry run of every submission rule.
    pub async fn validate(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        as_of: NaiveDate,
    ) -> LeaveResult<ValidationResult> {
        let employee = self.require_employee(employee_id).await?;
        let leave_type = self.require_leave_type(leave_type_id).await?;
        self.evaluate(&employee, &leave_type, start, end, as_of, None)
            .await
    }

    /// Gathers the rule context from the store. `editing` is a request being
    /// rescheduled; it never conflicts with itself.
    async fn evaluate(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        as_of: NaiveDate,
        editing: Option<u64>,
    ) -> LeaveResult<ValidationResult> {
        calendar::check_range(start, end)?;
        let balance = self
            .store
            .balance(BalanceKey {
                employee_id: employee.id,
                leave_type_id: leave_type.id,
                year: start.year(),
            })
            .await?;

        let (mut overlapping, holidays) = if end >= start {
            (
                self.store
                    .overlapping_requests(employee.id, start, end)
                    .await?,
                self.holiday_occurrences(start, end).await?,
            )
        } else {
            (Vec::new(), Vec::new())
        };
        if let Some(id) = editing {
            overlapping.retain(|request| request.id != id);
        }

        Ok(validator::evaluate(&ValidationContext {
            employee,
            leave_type,
            start,
            end,
            as_of,
            balance: balance.as_ref(),
            overlapping: &overlapping,
            holidays: &holidays,
            holiday_policy: self.settings.holiday_policy,
        }))
    }

    /// Validates and records a new request.
    ///
    /// Approval-required types are stored `pending` with the resolved approver.
    /// Other types are approved and debited on the spot.
    #[instrument(skip(self, reason))]
    pub async fn submit(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<String>,
        today: NaiveDate,
    ) -> LeaveResult<SubmitOutcome> {
        let employee = self.require_employee(employee_id).await?;
        let leave_type = self.require_leave_type(leave_type_id).await?;
        let validation = self
            .evaluate(&employee, &leave_type, start, end, today, None)
            .await?;

        let binding = validation.binding_violations(&leave_type);
        if !binding.is_empty() {
            info!(employee_id, violations = binding.len(), "Leave request rejected by validation");
            return Err(LeaveError::ValidationFailed(binding));
        }

        let (new, ledger) = if leave_type.requires_approval {
            let approver_id = self.approver_for(&employee, today).await?;
            let new = NewLeaveRequest {
                employee_id,
                leave_type_id,
                start_date: start,
                end_date: end,
                total_days: validation.requested_days,
                status: LeaveStatus::Pending,
                reason,
                approver_id: Some(approver_id),
                comments: None,
                decided_at: None,
            };
            (new, None)
        } else {
            let new = NewLeaveRequest {
                employee_id,
                leave_type_id,
                start_date: start,
                end_date: end,
                total_days: validation.requested_days,
                status: LeaveStatus::Approved,
                reason,
                approver_id: None,
                comments: Some(AUTO_APPROVED_COMMENT.to_string()),
                decided_at: Some(Utc::now()),
            };
            let ledger = LedgerEntry {
                key: BalanceKey {
                    employee_id,
                    leave_type_id,
                    year: start.year(),
                },
                days: new.total_days,
                op: LedgerOp::Debit,
            };
            (new, Some(ledger))
        };

        let request = self.store.insert_request(&new, ledger).await?;
        info!(
            request_id = request.id,
            employee_id,
            status = %request.status,
            total_days = request.total_days,
            "Leave request submitted"
        );

        match request.approver_id {
            Some(approver_id) if request.status == LeaveStatus::Pending => {
                self.notify(approver_id, LeaveEvent::LeaveRequested, &request)
                    .await;
            }
            _ => {
                self.notify(employee_id, LeaveEvent::LeaveApproved, &request)
                    .await;
            }
        }

        Ok(SubmitOutcome {
            validation,
            request,
        })
    }

    /// Moves a pending request to new dates. Every submission rule runs again
    /// against the new range and the day count is recomputed; the approver
    /// keeps the request.
    #[instrument(skip(self, reason))]
    pub async fn update_pending(
        &self,
        request_id: u64,
        by_employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<String>,
        today: NaiveDate,
    ) -> LeaveResult<SubmitOutcome> {
        let request = self.request(request_id).await?;
        if request.employee_id != by_employee_id {
            return Err(LeaveError::NotRequestOwner {
                request_id,
                actor_id: by_employee_id,
            });
        }
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Pending,
            });
        }

        let employee = self.require_employee(request.employee_id).await?;
        let leave_type = self.require_leave_type(request.leave_type_id).await?;
        let validation = self
            .evaluate(&employee, &leave_type, start, end, today, Some(request_id))
            .await?;

        let binding = validation.binding_violations(&leave_type);
        if !binding.is_empty() {
            info!(request_id, violations = binding.len(), "Leave request edit rejected by validation");
            return Err(LeaveError::ValidationFailed(binding));
        }

        let updated = self
            .store
            .update_pending_request(&PendingEdit {
                request_id,
                start_date: start,
                end_date: end,
                total_days: validation.requested_days,
                reason,
            })
            .await?;
        info!(
            request_id,
            start = %updated.start_date,
            end = %updated.end_date,
            total_days = updated.total_days,
            "Pending leave request updated"
        );

        if let Some(approver_id) = updated.approver_id {
            self.notify(approver_id, LeaveEvent::LeaveUpdated, &updated)
                .await;
        }

        Ok(SubmitOutcome {
            validation,
            request: updated,
        })
    }

    /// Approves or rejects a pending request on behalf of its acting approver.
    #[instrument(skip(self, comments))]
    pub async fn decide(
        &self,
        request_id: u64,
        approver_id: u64,
        decision: Decision,
        comments: Option<String>,
        today: NaiveDate,
    ) -> LeaveResult<LeaveRequest> {
        let request = self.request(request_id).await?;
        let to = LeaveStatus::from(decision);
        request
            .status
            .check_transition(to, today, request.start_date)?;

        let employee = self.require_employee(request.employee_id).await?;
        let acting = self.approver_for(&employee, today).await?;
        if acting != approver_id {
            warn!(request_id, approver_id, acting, "Decision attempted by non-approver");
            return Err(LeaveError::NotApprover {
                request_id,
                actor_id: approver_id,
            });
        }

        let ledger = match decision {
            Decision::Approved => Some(LedgerEntry::for_request(&request, LedgerOp::Debit)),
            Decision::Rejected => None,
        };

        let updated = self
            .store
            .transition_request(&StatusChange {
                request_id,
                from: request.status,
                to,
                approver_id: Some(approver_id),
                comments,
                decided_at: Some(Utc::now()),
                ledger,
            })
            .await?;
        info!(request_id, approver_id, status = %updated.status, "Leave request decided");

        let event = match decision {
            Decision::Approved => LeaveEvent::LeaveApproved,
            Decision::Rejected => LeaveEvent::LeaveRejected,
        };
        self.notify(updated.employee_id, event, &updated).await;

        Ok(updated)
    }

    /// Withdraws a request. Approved leave can only be withdrawn before it
    /// starts, and its days go back to the balance.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        request_id: u64,
        by_employee_id: u64,
        today: NaiveDate,
    ) -> LeaveResult<LeaveRequest> {
        let request = self.request(request_id).await?;
        if request.employee_id != by_employee_id {
            return Err(LeaveError::NotRequestOwner {
                request_id,
                actor_id: by_employee_id,
            });
        }
        request
            .status
            .check_transition(LeaveStatus::Cancelled, today, request.start_date)?;

        let ledger = (request.status == LeaveStatus::Approved)
            .then(|| LedgerEntry::for_request(&request, LedgerOp::Credit));

        let updated = self
            .store
            .transition_request(&StatusChange {
                request_id,
                from: request.status,
                to: LeaveStatus::Cancelled,
                approver_id: None,
                comments: None,
                decided_at: None,
                ledger,
            })
            .await?;
        info!(request_id, credited = ledger.is_some(), "Leave request cancelled");

        if let Some(approver_id) = updated.approver_id {
            self.notify(approver_id, LeaveEvent::LeaveCancelled, &updated)
                .await;
        }

        Ok(updated)
    }

    async fn notify(&self, recipient_id: u64, event: LeaveEvent, request: &LeaveRequest) {
        let payload = json!({
            "request_id": request.id,
            "employee_id": request.employee_id,
            "leave_type_id": request.leave_type_id,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "total_days": request.total_days,
            "status": request.status,
            "comments": request.comments,
        });
        notify::dispatch(self.notifier.as_ref(), recipient_id, event, payload).await;
    }
}
