use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "name": "Independence Day",
    "holiday_date": "2026-03-26",
    "is_recurring": true,
    "description": null,
    "is_active": true
}))]
pub struct Holiday {
    pub id: u64,
    pub name: String,
    #[schema(format = "date", value_type = String)]
    pub holiday_date: NaiveDate,
    /// Repeats every year on the same month and day.
    pub is_recurring: bool,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Holiday {
    /// Dates this holiday falls on inside `[start, end]`.
    pub fn occurrences(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if !self.is_recurring {
            return if self.holiday_date >= start && self.holiday_date <= end {
                vec![self.holiday_date]
            } else {
                Vec::new()
            };
        }

        (start.year()..=end.year())
            .filter_map(|year| {
                NaiveDate::from_ymd_opt(year, self.holiday_date.month(), self.holiday_date.day())
            })
            .filter(|date| *date >= start && *date <= end)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHoliday {
    #[schema(example = "Victory Day")]
    pub name: String,
    #[schema(example = "2026-12-16", format = "date", value_type = String)]
    pub holiday_date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    pub description: Option<String>,
}

/// Edit of an existing holiday; omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct HolidayUpdate {
    #[schema(example = "Victory Day")]
    pub name: Option<String>,
    #[schema(example = "2026-12-16", format = "date", value_type = Option<String>)]
    pub holiday_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl HolidayUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.holiday_date.is_none()
            && self.is_recurring.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
    }

    pub fn apply_to(&self, holiday: &mut Holiday) {
        if let Some(name) = &self.name {
            holiday.name = name.trim().to_string();
        }
        if let Some(date) = self.holiday_date {
            holiday.holiday_date = date;
        }
        if let Some(recurring) = self.is_recurring {
            holiday.is_recurring = recurring;
        }
        if let Some(description) = &self.description {
            holiday.description = Some(description.clone());
        }
        if let Some(active) = self.is_active {
            holiday.is_active = active;
        }
    }
}
