//! Conflict checker: date-range overlap with live requests, and holidays.

use chrono::NaiveDate;

use crate::error::LeaveResult;
use crate::leave::calendar;
use crate::leave::store::LeaveStore;
use crate::leave::workflow::LeaveService;
use crate::model::holiday::Holiday;

impl<S: LeaveStore> LeaveService<S> {
    /// Ids of the employee's pending or approved requests intersecting the range.
    pub async fn overlaps(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveResult<Vec<u64>> {
        if end < start {
            return Ok(Vec::new());
        }
        let mut ids: Vec<u64> = self
            .store
            .overlapping_requests(employee_id, start, end)
            .await?
            .into_iter()
            .map(|request| request.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Active holidays falling inside `[start, end]`.
    pub async fn holidays_in(&self, start: NaiveDate, end: NaiveDate) -> LeaveResult<Vec<Holiday>> {
        Ok(self
            .holiday_occurrences(start, end)
            .await?
            .into_iter()
            .map(|(holiday, _)| holiday)
            .collect())
    }

    /// Like [`Self::holidays_in`], with the concrete dates each one lands on.
    pub(crate) async fn holiday_occurrences(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveResult<Vec<(Holiday, Vec<NaiveDate>)>> {
        if end < start {
            return Ok(Vec::new());
        }
        calendar::check_range(start, end)?;
        let candidates = self.store.holiday_candidates(start, end).await?;
        Ok(candidates
            .into_iter()
            .filter(|holiday| holiday.is_active)
            .filter_map(|holiday| {
                let dates = holiday.occurrences(start, end);
                (!dates.is_empty()).then_some((holiday, dates))
            })
            .collect())
    }
}
