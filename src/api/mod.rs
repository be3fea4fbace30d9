pub mod employee;
pub mod leave_admin;
pub mod leave_balance;
pub mod leave_request;
pub mod report;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::leave::mysql_store::MySqlLeaveStore;
use crate::leave::workflow::LeaveService;

/// The service instance shared through `web::Data`.
pub type Service = LeaveService<MySqlLeaveStore>;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct YearQuery {
    /// Calendar year; defaults to the current one
    #[param(example = 2026)]
    pub year: Option<i32>,
}

impl YearQuery {
    pub fn year_or_current(&self) -> i32 {
        self.year.unwrap_or_else(|| today().year())
    }
}
