//! Read-only reporting over leave requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::calendar;
use crate::leave::router::ReportingIndex;
use crate::leave::store::{LeaveStore, RequestFilter};
use crate::leave::workflow::LeaveService;
use crate::model::employee::Employee;
use crate::model::leave_balance::BalanceView;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// Report query. `manager_id` selects everyone below that manager.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub employee_id: Option<u64>,
    pub manager_id: Option<u64>,
    pub department: Option<String>,
    pub leave_type_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LeaveStatistics {
    pub total_requests: usize,
    pub approved_requests: usize,
    pub rejected_requests: usize,
    pub pending_requests: usize,
    pub cancelled_requests: usize,
    /// Business days across approved requests.
    pub approved_days: u32,
    /// Approved share of decided requests, 0 when nothing was decided.
    pub approval_rate: f64,
}

impl LeaveStatistics {
    pub fn from_requests(requests: &[LeaveRequest]) -> Self {
        let mut stats = LeaveStatistics {
            total_requests: requests.len(),
            ..Default::default()
        };
        for request in requests {
            match request.status {
                LeaveStatus::Approved => {
                    stats.approved_requests += 1;
                    stats.approved_days += request.total_days;
                }
                LeaveStatus::Rejected => stats.rejected_requests += 1,
                LeaveStatus::Pending => stats.pending_requests += 1,
                LeaveStatus::Cancelled => stats.cancelled_requests += 1,
            }
        }

        let decided = stats.approved_requests + stats.rejected_requests;
        if decided > 0 {
            stats.approval_rate = stats.approved_requests as f64 / decided as f64;
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveReport {
    pub statistics: LeaveStatistics,
    pub requests: Vec<LeaveRequest>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub employee: Employee,
    pub year: i32,
    pub balances: Vec<BalanceView>,
    pub statistics: LeaveStatistics,
}

impl<S: LeaveStore> LeaveService<S> {
    pub async fn report(&self, query: &ReportQuery) -> LeaveResult<LeaveReport> {
        if let (Some(from), Some(to)) = (query.start_date, query.end_date) {
            if to < from {
                return Err(LeaveError::InvalidInput(
                    "end_date cannot be before start_date".into(),
                ));
            }
        }

        let employee_ids = match query.manager_id {
            Some(manager_id) => {
                self.require_employee(manager_id).await?;
                let employees = self.store.employees(false).await?;
                let below = ReportingIndex::build(&employees).all_reports(manager_id);
                if below.is_empty() {
                    return Ok(LeaveReport {
                        statistics: LeaveStatistics::default(),
                        requests: Vec::new(),
                    });
                }
                Some(below)
            }
            None => None,
        };

        self.report_on(&RequestFilter {
            employee_id: query.employee_id,
            employee_ids,
            department: query.department.clone(),
            leave_type_id: query.leave_type_id,
            status: query.status,
            start_date: query.start_date,
            end_date: query.end_date,
            starts_until: None,
        })
        .await
    }

    /// Requests of one department starting within `year`, including those
    /// that run on into the next year.
    pub async fn department_report(&self, department: &str, year: i32) -> LeaveResult<LeaveReport> {
        let (start, end) = calendar::year_bounds(year)
            .ok_or_else(|| LeaveError::InvalidInput(format!("invalid year {year}")))?;
        self.report_on(&RequestFilter {
            department: Some(department.to_string()),
            start_date: Some(start),
            starts_until: Some(end),
            ..Default::default()
        })
        .await
    }

    async fn report_on(&self, filter: &RequestFilter) -> LeaveResult<LeaveReport> {
        let requests = self.store.requests(filter).await?;
        Ok(LeaveReport {
            statistics: LeaveStatistics::from_requests(&requests),
            requests,
        })
    }

    pub async fn employee_summary(&self, employee_id: u64, year: i32) -> LeaveResult<EmployeeSummary> {
        let employee = self.require_employee(employee_id).await?;
        let balances = self.balances(employee_id, year).await?;
        let requests = self.employee_requests(employee_id, Some(year)).await?;

        Ok(EmployeeSummary {
            employee,
            year,
            balances,
            statistics: LeaveStatistics::from_requests(&requests),
        })
    }
}
