use std::borrow::Cow;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::models::Record;

pub const ALL_PERIOD: &str = "All period";

/// A period selection: every record, or the records of one `yearMonth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFilter {
    All,
    Period(String),
}

impl FromStr for PeriodFilter {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == ALL_PERIOD {
            Ok(PeriodFilter::All)
        } else {
            Ok(PeriodFilter::Period(value.to_string()))
        }
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodFilter::All => f.write_str(ALL_PERIOD),
            PeriodFilter::Period(key) => f.write_str(key),
        }
    }
}

/// Narrows `records` to one period, keeping their order. `All` borrows the
/// input untouched.
pub fn filter<'a>(records: &'a [Record], period: &PeriodFilter) -> Cow<'a, [Record]> {
    match period {
        PeriodFilter::All => Cow::Borrowed(records),
        PeriodFilter::Period(key) => {
            let selected: Vec<Record> = records
                .iter()
                .filter(|record| record.year_month == *key)
                .cloned()
                .collect();

            if selected.is_empty() {
                warn!(period = %key, "no records match the selected period");
            }

            Cow::Owned(selected)
        }
    }
}

/// The selectable periods: `All` followed by each distinct key, ascending.
pub fn available_periods(records: &[Record]) -> Vec<PeriodFilter> {
    let keys: BTreeSet<&str> = records
        .iter()
        .map(|record| record.year_month.as_str())
        .collect();

    std::iter::once(PeriodFilter::All)
        .chain(keys.into_iter().map(|key| PeriodFilter::Period(key.to_string())))
        .collect()
}
