//! Administration of the reference data the rules read: leave types,
//! holidays, delegations and the employee directory.

use chrono::NaiveDate;
use serde_json::json;
use tracing::info;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::notify::{self, LeaveEvent};
use crate::leave::store::{LeaveStore, LeaveTypeUpdate};
use crate::leave::workflow::LeaveService;
use crate::model::delegation::{DelegationUpdate, LeaveDelegation, NewDelegation};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, HolidayUpdate, NewHoliday};
use crate::model::leave_type::{LeaveType, NewLeaveType};

impl<S: LeaveStore> LeaveService<S> {
    pub async fn leave_types(&self, active_only: bool) -> LeaveResult<Vec<LeaveType>> {
        self.store.leave_types(active_only).await
    }

    pub async fn create_leave_type(&self, new: &NewLeaveType) -> LeaveResult<LeaveType> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(LeaveError::InvalidInput("leave type name is required".into()));
        }
        self.ensure_unique_type_name(name, None).await?;

        let leave_type = self.store.insert_leave_type(new).await?;
        info!(leave_type_id = leave_type.id, name = %leave_type.name, "Leave type created");
        Ok(leave_type)
    }

    pub async fn update_leave_type(
        &self,
        id: u64,
        update: &LeaveTypeUpdate,
    ) -> LeaveResult<LeaveType> {
        if update.is_empty() {
            return Err(LeaveError::InvalidInput("no fields to update".into()));
        }
        self.require_leave_type(id).await?;
        if let Some(name) = &update.name {
            self.ensure_unique_type_name(name.trim(), Some(id)).await?;
        }

        let leave_type = self.store.update_leave_type(id, update).await?;
        info!(leave_type_id = id, "Leave type updated");
        Ok(leave_type)
    }

    async fn ensure_unique_type_name(&self, name: &str, except: Option<u64>) -> LeaveResult<()> {
        let taken = self
            .store
            .leave_types(false)
            .await?
            .into_iter()
            .any(|t| Some(t.id) != except && t.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(LeaveError::AlreadyExists(format!("Leave type '{name}'")));
        }
        Ok(())
    }

    pub async fn holidays(&self, active_only: bool) -> LeaveResult<Vec<Holiday>> {
        self.store.holidays(active_only).await
    }

    pub async fn create_holiday(&self, new: &NewHoliday) -> LeaveResult<Holiday> {
        if new.name.trim().is_empty() {
            return Err(LeaveError::InvalidInput("holiday name is required".into()));
        }
        let holiday = self.store.insert_holiday(new).await?;
        info!(holiday_id = holiday.id, date = %holiday.holiday_date, "Holiday created");
        Ok(holiday)
    }

    pub async fn update_holiday(&self, id: u64, update: &HolidayUpdate) -> LeaveResult<Holiday> {
        if update.is_empty() {
            return Err(LeaveError::InvalidInput("no fields to update".into()));
        }
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(LeaveError::InvalidInput("holiday name is required".into()));
        }
        let mut holiday = self
            .store
            .holiday(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Holiday", id))?;
        update.apply_to(&mut holiday);

        let holiday = self.store.update_holiday(&holiday).await?;
        info!(holiday_id = id, date = %holiday.holiday_date, active = holiday.is_active, "Holiday updated");
        Ok(holiday)
    }

    pub async fn delete_holiday(&self, id: u64) -> LeaveResult<()> {
        if !self.store.delete_holiday(id).await? {
            return Err(LeaveError::not_found("Holiday", id));
        }
        info!(holiday_id = id, "Holiday deleted");
        Ok(())
    }

    pub async fn delegations(
        &self,
        manager_id: Option<u64>,
        active_only: bool,
    ) -> LeaveResult<Vec<LeaveDelegation>> {
        self.store.delegations(manager_id, active_only).await
    }

    pub async fn delegation(&self, id: u64) -> LeaveResult<LeaveDelegation> {
        self.store
            .delegation(id)
            .await?
            .ok_or_else(|| LeaveError::not_found("Delegation", id))
    }

    pub async fn create_delegation(&self, new: &NewDelegation) -> LeaveResult<LeaveDelegation> {
        self.check_delegation(new.manager_id, new.delegate_id, new.start_date, new.end_date, true)
            .await?;

        let delegation = self.store.insert_delegation(new).await?;
        info!(
            delegation_id = delegation.id,
            manager_id = delegation.manager_id,
            delegate_id = delegation.delegate_id,
            "Approval delegated"
        );

        let payload = json!({
            "delegation_id": delegation.id,
            "manager_id": delegation.manager_id,
            "start_date": delegation.start_date,
            "end_date": delegation.end_date,
            "reason": delegation.reason,
        });
        notify::dispatch(
            self.notifier.as_ref(),
            delegation.delegate_id,
            LeaveEvent::DelegationAssigned,
            payload,
        )
        .await;

        Ok(delegation)
    }

    /// Moves, re-describes or switches a delegation on or off. The merged row
    /// must pass the same checks as a new one.
    pub async fn update_delegation(
        &self,
        id: u64,
        update: &DelegationUpdate,
    ) -> LeaveResult<LeaveDelegation> {
        if update.is_empty() {
            return Err(LeaveError::InvalidInput("no fields to update".into()));
        }
        let mut delegation = self.delegation(id).await?;
        update.apply_to(&mut delegation);
        self.check_delegation(
            delegation.manager_id,
            delegation.delegate_id,
            delegation.start_date,
            delegation.end_date,
            delegation.is_active,
        )
        .await?;

        let delegation = self.store.update_delegation(&delegation).await?;
        info!(
            delegation_id = id,
            active = delegation.is_active,
            start = %delegation.start_date,
            end = %delegation.end_date,
            "Delegation updated"
        );
        Ok(delegation)
    }

    /// A delegate only needs to be active while the delegation is.
    async fn check_delegation(
        &self,
        manager_id: u64,
        delegate_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        active: bool,
    ) -> LeaveResult<()> {
        if end < start {
            return Err(LeaveError::InvalidInput(
                "delegation end_date cannot be before start_date".into(),
            ));
        }
        if manager_id == delegate_id {
            return Err(LeaveError::InvalidInput(
                "a manager cannot delegate to themselves".into(),
            ));
        }
        self.require_employee(manager_id).await?;
        let delegate = self.require_employee(delegate_id).await?;
        if active && !delegate.is_active {
            return Err(LeaveError::InvalidInput(format!(
                "delegate {} is not active",
                delegate.id
            )));
        }
        Ok(())
    }

    pub async fn employees(&self, active_only: bool) -> LeaveResult<Vec<Employee>> {
        self.store.employees(active_only).await
    }

    pub async fn employee(&self, id: u64) -> LeaveResult<Employee> {
        self.require_employee(id).await
    }

    pub async fn create_employee(&self, new: &NewEmployee) -> LeaveResult<Employee> {
        if let Some(manager_id) = new.manager_id {
            self.require_employee(manager_id).await?;
        }
        let taken = self.store.employees(false).await?.into_iter().any(|e| {
            e.employee_code == new.employee_code || e.email.eq_ignore_ascii_case(&new.email)
        });
        if taken {
            return Err(LeaveError::AlreadyExists(format!(
                "Employee '{}'",
                new.employee_code
            )));
        }

        let employee = self.store.insert_employee(new).await?;
        info!(employee_id = employee.id, code = %employee.employee_code, "Employee created");
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::testing::{Fixture, d};

    fn new_type(name: &str) -> NewLeaveType {
        NewLeaveType {
            name: name.into(),
            description: None,
            annual_quota: 12,
            max_consecutive_days: None,
            carry_forward_enabled: false,
            max_carry_forward_days: None,
            requires_approval: true,
            advance_notice_days: 0,
        }
    }

    #[actix_web::test]
    async fn leave_type_names_are_unique() {
        let fx = Fixture::new();
        fx.service.create_leave_type(&new_type("Study Leave")).await.unwrap();
        let err = fx
            .service
            .create_leave_type(&new_type("study leave"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ALREADY_EXISTS");
    }

    #[actix_web::test]
    async fn update_changes_only_given_fields() {
        let fx = Fixture::new();
        let update = LeaveTypeUpdate {
            annual_quota: Some(14),
            ..Default::default()
        };
        let updated = fx.service.update_leave_type(fx.sick, &update).await.unwrap();
        assert_eq!(updated.annual_quota, 14);
        assert!(updated.requires_approval);

        let empty = fx
            .service
            .update_leave_type(fx.sick, &LeaveTypeUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(empty.code(), "INVALID_INPUT");
    }

    #[actix_web::test]
    async fn delegation_must_be_a_valid_range_between_two_people() {
        let fx = Fixture::new();
        let reversed = NewDelegation {
            manager_id: fx.manager,
            delegate_id: fx.deputy,
            start_date: d(2026, 6, 30),
            end_date: d(2026, 6, 1),
            reason: None,
        };
        assert_eq!(
            fx.service.create_delegation(&reversed).await.unwrap_err().code(),
            "INVALID_INPUT"
        );

        let to_self = NewDelegation {
            delegate_id: fx.manager,
            start_date: d(2026, 6, 1),
            end_date: d(2026, 6, 30),
            ..reversed.clone()
        };
        assert!(fx.service.create_delegation(&to_self).await.is_err());

        let valid = NewDelegation {
            start_date: d(2026, 6, 1),
            end_date: d(2026, 6, 30),
            ..reversed
        };
        let created = fx.service.create_delegation(&valid).await.unwrap();
        assert!(created.is_active);
        assert_eq!(
            fx.service.resolve_approver(fx.alice, d(2026, 6, 10)).await.unwrap(),
            fx.deputy
        );
    }

    #[actix_web::test]
    async fn delegate_is_told_about_the_hand_over() {
        let fx = Fixture::new();
        let created = fx
            .service
            .create_delegation(&NewDelegation {
                manager_id: fx.manager,
                delegate_id: fx.deputy,
                start_date: d(2026, 6, 1),
                end_date: d(2026, 6, 30),
                reason: Some("Parental leave".into()),
            })
            .await
            .unwrap();
        assert_eq!(created.delegate_id, fx.deputy);
        assert_eq!(
            fx.notifications(),
            vec![(fx.deputy, LeaveEvent::DelegationAssigned)]
        );
    }

    #[actix_web::test]
    async fn switching_a_delegation_off_routes_back_to_the_manager() {
        let fx = Fixture::new();
        fx.fail_notifications();
        let delegation = fx
            .service
            .create_delegation(&NewDelegation {
                manager_id: fx.manager,
                delegate_id: fx.deputy,
                start_date: d(2026, 6, 1),
                end_date: d(2026, 6, 30),
                reason: None,
            })
            .await
            .unwrap();
        assert_eq!(
            fx.service.resolve_approver(fx.alice, d(2026, 6, 10)).await.unwrap(),
            fx.deputy
        );

        let off = fx
            .service
            .update_delegation(
                delegation.id,
                &DelegationUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!off.is_active);
        assert_eq!(
            fx.service.resolve_approver(fx.alice, d(2026, 6, 10)).await.unwrap(),
            fx.manager
        );
    }

    #[actix_web::test]
    async fn delegation_edits_are_checked_like_new_ones() {
        let fx = Fixture::new();
        let delegation = fx
            .service
            .create_delegation(&NewDelegation {
                manager_id: fx.manager,
                delegate_id: fx.deputy,
                start_date: d(2026, 6, 1),
                end_date: d(2026, 6, 30),
                reason: None,
            })
            .await
            .unwrap();

        let reversed = DelegationUpdate {
            end_date: Some(d(2026, 5, 1)),
            ..Default::default()
        };
        assert_eq!(
            fx.service
                .update_delegation(delegation.id, &reversed)
                .await
                .unwrap_err()
                .code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            fx.service
                .update_delegation(delegation.id, &DelegationUpdate::default())
                .await
                .unwrap_err()
                .code(),
            "INVALID_INPUT"
        );

        let shortened = fx
            .service
            .update_delegation(
                delegation.id,
                &DelegationUpdate {
                    end_date: Some(d(2026, 6, 10)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(shortened.end_date, d(2026, 6, 10));
        assert_eq!(
            fx.service.resolve_approver(fx.alice, d(2026, 6, 20)).await.unwrap(),
            fx.manager
        );

        // An inactive delegate may keep a switched-off delegation but not receive a live one.
        fx.deactivate_employee(fx.deputy);
        let off = DelegationUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        fx.service.update_delegation(delegation.id, &off).await.unwrap();
        let on = DelegationUpdate {
            is_active: Some(true),
            ..Default::default()
        };
        assert_eq!(
            fx.service.update_delegation(delegation.id, &on).await.unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            fx.service.update_delegation(999, &on).await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[actix_web::test]
    async fn holiday_edit_moves_the_blocked_date() {
        let fx = Fixture::new();
        let id = fx.holiday("Founders Day", d(2026, 6, 16));

        let moved = fx
            .service
            .update_holiday(
                id,
                &HolidayUpdate {
                    holiday_date: Some(d(2026, 6, 18)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.holiday_date, d(2026, 6, 18));
        assert_eq!(moved.name, "Founders Day");

        let june = fx.service.holidays_in(d(2026, 6, 15), d(2026, 6, 17)).await.unwrap();
        assert!(june.is_empty());

        let blank = HolidayUpdate {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(fx.service.update_holiday(id, &blank).await.unwrap_err().code(), "INVALID_INPUT");

        let retire = HolidayUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!fx.service.update_holiday(id, &retire).await.unwrap().is_active);
        assert_eq!(fx.service.update_holiday(999, &retire).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[actix_web::test]
    async fn null_in_an_update_lifts_the_consecutive_day_limit() {
        let fx = Fixture::new();
        let limit = LeaveTypeUpdate {
            max_consecutive_days: Some(Some(2)),
            ..Default::default()
        };
        let limited = fx.service.update_leave_type(fx.sick, &limit).await.unwrap();
        assert_eq!(limited.max_consecutive_days, Some(2));

        let lift = LeaveTypeUpdate {
            max_consecutive_days: Some(None),
            ..Default::default()
        };
        let lifted = fx.service.update_leave_type(fx.sick, &lift).await.unwrap();
        assert_eq!(lifted.max_consecutive_days, None);
        assert_eq!(lifted.annual_quota, 10);
    }

    #[actix_web::test]
    async fn deleting_unknown_holiday_is_not_found() {
        let fx = Fixture::new();
        let id = fx.holiday("Founders Day", d(2026, 6, 16));
        fx.service.delete_holiday(id).await.unwrap();
        assert_eq!(fx.service.delete_holiday(id).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[actix_web::test]
    async fn employee_needs_existing_manager_and_unique_code() {
        let fx = Fixture::new();
        let mut new = NewEmployee {
            employee_code: "EMP-100".into(),
            first_name: "Carol".into(),
            last_name: "White".into(),
            email: "carol.white@company.com".into(),
            department: "Finance".into(),
            position: "Analyst".into(),
            manager_id: Some(999),
            hire_date: d(2026, 1, 5),
        };
        assert_eq!(fx.service.create_employee(&new).await.unwrap_err().code(), "NOT_FOUND");

        new.manager_id = Some(fx.manager);
        let created = fx.service.create_employee(&new).await.unwrap();
        assert!(created.is_active);
        assert_eq!(fx.service.employee(created.id).await.unwrap().full_name(), "Carol White");

        assert_eq!(
            fx.service.create_employee(&new).await.unwrap_err().code(),
            "ALREADY_EXISTS"
        );
    }
}
