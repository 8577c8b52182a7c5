use crate::domain::model::{CargoItem, ExpiredItem};
use crate::utils::error::{Result, StowageError};
use crate::utils::validation::validate_range;
use chrono::{Days, NaiveDate};

pub const MAX_SIMULATED_DAYS: i64 = 365;

/// Mission clock driven by `/api/simulate/day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    today: NaiveDate,
}

impl SimulationClock {
    pub fn new(start: NaiveDate) -> Self {
        Self { today: start }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Moves the clock forward, returning `(previous, new)` dates.
    pub fn advance(&mut self, days: i64) -> Result<(NaiveDate, NaiveDate)> {
        validate_range("days", days, 1, MAX_SIMULATED_DAYS)?;

        let previous = self.today;
        let next = previous
            .checked_add_days(Days::new(days as u64))
            .ok_or_else(|| StowageError::validation("simulated date out of range"))?;
        self.today = next;
        Ok((previous, next))
    }
}

/// Items whose expiry date falls in `(previous, new]`.
pub fn newly_expired<'a>(
    items: impl IntoIterator<Item = &'a CargoItem>,
    previous: NaiveDate,
    new: NaiveDate,
) -> Vec<ExpiredItem> {
    items
        .into_iter()
        .filter(|item| item.expiry_date > previous && item.expiry_date <= new)
        .map(|item| ExpiredItem {
            id: item.id.clone(),
            name: item.name.clone(),
            zone: item.zone.clone(),
        })
        .collect()
}
