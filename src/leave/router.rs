//! Approval routing over the manager hierarchy.
//!
//! The hierarchy is stored only as `Employee::manager_id`; the reverse index
//! (manager to reports) is rebuilt from the employee list whenever it is needed.
//! Delegations are looked up by date range, so an expired delegation stops
//! applying without anyone having to clear it.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::store::{LeaveStore, RequestFilter};
use crate::leave::workflow::LeaveService;
use crate::model::delegation::LeaveDelegation;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// Picks the delegate acting for a manager on `on`.
///
/// Storage does not stop overlapping delegations, so when several cover the
/// date the oldest one wins.
pub fn active_delegate(delegations: &[LeaveDelegation], on: NaiveDate) -> Option<u64> {
    delegations
        .iter()
        .filter(|delegation| delegation.covers(on))
        .min_by_key(|delegation| delegation.id)
        .map(|delegation| delegation.delegate_id)
}

/// Manager to direct-reports index computed from `manager_id` references.
#[derive(Debug, Default)]
pub struct ReportingIndex {
    reports: HashMap<u64, Vec<u64>>,
}

impl ReportingIndex {
    pub fn build(employees: &[Employee]) -> Self {
        let mut reports: HashMap<u64, Vec<u64>> = HashMap::new();
        for employee in employees {
            if let Some(manager_id) = employee.manager_id {
                reports.entry(manager_id).or_default().push(employee.id);
            }
        }
        for ids in reports.values_mut() {
            ids.sort_unstable();
        }
        Self { reports }
    }

    pub fn direct_reports(&self, manager_id: u64) -> &[u64] {
        self.reports
            .get(&manager_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Everyone below `manager_id`, at any depth. Tolerates cycles in bad data.
    pub fn all_reports(&self, manager_id: u64) -> Vec<u64> {
        let mut seen = HashSet::from([manager_id]);
        let mut queue = vec![manager_id];
        let mut out = Vec::new();

        while let Some(current) = queue.pop() {
            for &report in self.direct_reports(current) {
                if seen.insert(report) {
                    out.push(report);
                    queue.push(report);
                }
            }
        }
        out.sort_unstable();
        out
    }
}

impl<S: LeaveStore> LeaveService<S> {
    /// Acting approver for `employee_id` on `on`.
    pub async fn resolve_approver(&self, employee_id: u64, on: NaiveDate) -> LeaveResult<u64> {
        let employee = self.require_employee(employee_id).await?;
        self.approver_for(&employee, on).await
    }

    /// The manager, or the manager's active delegate. Employees without a
    /// manager go to the configured fallback approver, if any.
    pub(crate) async fn approver_for(&self, employee: &Employee, on: NaiveDate) -> LeaveResult<u64> {
        let Some(manager_id) = employee.manager_id else {
            return self
                .settings
                .fallback_approver_id
                .filter(|fallback| *fallback != employee.id)
                .ok_or(LeaveError::NoApprover {
                    employee_id: employee.id,
                });
        };

        let delegations = self.store.delegations_covering(manager_id, on).await?;
        match active_delegate(&delegations, on) {
            // Nobody approves their own leave; the manager keeps it.
            Some(delegate_id) if delegate_id != employee.id => {
                debug!(employee_id = employee.id, manager_id, delegate_id, "Approval delegated");
                Ok(delegate_id)
            }
            _ => Ok(manager_id),
        }
    }

    /// Pending requests the given employee is the acting approver for on `on`.
    pub async fn pending_for_approver(
        &self,
        approver_id: u64,
        on: NaiveDate,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let employees = self.store.employees(false).await?;
        let index = ReportingIndex::build(&employees);

        let mut candidates: Vec<u64> = index.direct_reports(approver_id).to_vec();
        for delegation in self.store.delegations_to(approver_id, on).await? {
            candidates.extend_from_slice(index.direct_reports(delegation.manager_id));
        }
        if self.settings.fallback_approver_id == Some(approver_id) {
            candidates.extend(
                employees
                    .iter()
                    .filter(|e| e.manager_id.is_none())
                    .map(|e| e.id),
            );
        }
        candidates.sort_unstable();
        candidates.dedup();

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let pending = self
            .store
            .requests(&RequestFilter {
                employee_ids: Some(candidates),
                status: Some(LeaveStatus::Pending),
                ..Default::default()
            })
            .await?;

        let by_id: HashMap<u64, &Employee> = employees.iter().map(|e| (e.id, e)).collect();
        let mut mine = Vec::with_capacity(pending.len());
        for request in pending {
            let Some(employee) = by_id.get(&request.employee_id) else {
                continue;
            };
            if matches!(self.approver_for(employee, on).await, Ok(id) if id == approver_id) {
                mine.push(request);
            }
        }
        Ok(mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::testing::{Fixture, d, employee};

    fn delegation(id: u64, delegate: u64, start: NaiveDate, end: NaiveDate) -> LeaveDelegation {
        LeaveDelegation {
            id,
            manager_id: 2,
            delegate_id: delegate,
            start_date: start,
            end_date: end,
            reason: None,
            is_active: true,
        }
    }

    #[test]
    fn delegate_applies_only_inside_its_range() {
        let delegations = [delegation(1, 3, d(2026, 6, 1), d(2026, 6, 30))];
        assert_eq!(active_delegate(&delegations, d(2026, 6, 1)), Some(3));
        assert_eq!(active_delegate(&delegations, d(2026, 6, 30)), Some(3));
        assert_eq!(active_delegate(&delegations, d(2026, 7, 1)), None);
    }

    #[test]
    fn inactive_delegation_is_ignored() {
        let mut off = delegation(1, 3, d(2026, 6, 1), d(2026, 6, 30));
        off.is_active = false;
        assert_eq!(active_delegate(&[off], d(2026, 6, 10)), None);
    }

    #[test]
    fn oldest_of_overlapping_delegations_wins() {
        let delegations = [
            delegation(9, 4, d(2026, 6, 1), d(2026, 6, 30)),
            delegation(5, 3, d(2026, 6, 10), d(2026, 6, 20)),
        ];
        assert_eq!(active_delegate(&delegations, d(2026, 6, 15)), Some(3));
        assert_eq!(active_delegate(&delegations, d(2026, 6, 25)), Some(4));
    }

    #[test]
    fn reporting_index_walks_the_tree_without_looping() {
        let staff = vec![
            employee(1, None),
            employee(2, Some(1)),
            employee(3, Some(2)),
            employee(4, Some(2)),
            employee(5, Some(6)),
            employee(6, Some(5)),
        ];
        let index = ReportingIndex::build(&staff);

        assert_eq!(index.direct_reports(2), &[3, 4]);
        assert_eq!(index.all_reports(1), vec![2, 3, 4]);
        assert_eq!(index.all_reports(5), vec![6]);
        assert!(index.direct_reports(4).is_empty());
    }

    #[actix_web::test]
    async fn manager_approves_without_delegation() {
        let fx = Fixture::new();
        let approver = fx.service.resolve_approver(fx.alice, d(2026, 6, 15)).await.unwrap();
        assert_eq!(approver, fx.manager);
    }

    #[actix_web::test]
    async fn active_delegation_routes_to_delegate() {
        let fx = Fixture::new();
        fx.delegate(fx.manager, fx.deputy, d(2026, 6, 1), d(2026, 6, 30));

        for day in [d(2026, 6, 1), d(2026, 6, 15), d(2026, 6, 30)] {
            let approver = fx.service.resolve_approver(fx.alice, day).await.unwrap();
            assert_eq!(approver, fx.deputy);
        }
        let after = fx.service.resolve_approver(fx.alice, d(2026, 7, 1)).await.unwrap();
        assert_eq!(after, fx.manager);
    }

    #[actix_web::test]
    async fn delegate_never_approves_own_leave() {
        let fx = Fixture::new();
        fx.delegate(fx.manager, fx.alice, d(2026, 6, 1), d(2026, 6, 30));
        let approver = fx.service.resolve_approver(fx.alice, d(2026, 6, 10)).await.unwrap();
        assert_eq!(approver, fx.manager);
    }

    #[actix_web::test]
    async fn top_of_hierarchy_has_no_approver() {
        let fx = Fixture::new();
        let err = fx
            .service
            .resolve_approver(fx.ceo, d(2026, 6, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::NoApprover { employee_id } if employee_id == fx.ceo));
    }

    #[actix_web::test]
    async fn top_of_hierarchy_uses_fallback_when_configured() {
        let fx = Fixture::with_fallback(Some(3));
        let approver = fx.service.resolve_approver(fx.ceo, d(2026, 6, 10)).await.unwrap();
        assert_eq!(approver, 3);
    }

    #[actix_web::test]
    async fn pending_queue_follows_delegation() {
        let fx = Fixture::new();
        let submitted = fx.submit_sick(fx.alice, d(2026, 6, 15), d(2026, 6, 17)).await;

        let queue = fx
            .service
            .pending_for_approver(fx.manager, d(2026, 6, 1))
            .await
            .unwrap();
        assert_eq!(queue.iter().map(|r| r.id).collect::<Vec<_>>(), vec![submitted.id]);

        fx.delegate(fx.manager, fx.deputy, d(2026, 6, 1), d(2026, 6, 30));
        let manager_queue = fx
            .service
            .pending_for_approver(fx.manager, d(2026, 6, 2))
            .await
            .unwrap();
        assert!(manager_queue.is_empty());
        let deputy_queue = fx
            .service
            .pending_for_approver(fx.deputy, d(2026, 6, 2))
            .await
            .unwrap();
        assert_eq!(deputy_queue.len(), 1);
    }
}
