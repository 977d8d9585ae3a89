use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::aggregate;
use crate::models::{CategorizedRecord, Currency};
use crate::rates::{ConvertError, ExchangeRates};

/// One chart row: the cumulative value of every category at `date`, plus
/// the sum across categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeriesRow {
    /// Standardized `YYYY-MM-DD` key.
    pub(crate) date: String,
    pub(crate) values: BTreeMap<String, Decimal>,
    pub(crate) total: Decimal,
}

/// Build the cumulative per-category series from category-grouped records,
/// in the display currency.
///
/// Each category accumulates its own dated net amounts; dates where a
/// category has no activity carry the previous cumulative value forward.
/// Rows are emitted in ascending date order — each row depends on the one
/// before it. Values are rounded to one decimal place for presentation;
/// the running sums themselves stay exact.
pub(crate) fn build(
    grouped: &BTreeMap<String, Vec<CategorizedRecord>>,
    rates: &ExchangeRates,
    currency: Currency,
) -> Result<Vec<SeriesRow>, ConvertError> {
    // Net converted amount per category per standardized date. A record
    // with a readable date but no usable money still contributes its date
    // column, matching the listing-vs-math exclusion policy.
    let mut deltas: BTreeMap<&str, HashMap<String, Decimal>> = BTreeMap::new();
    let mut dates: BTreeSet<String> = BTreeSet::new();

    for (category, records) in grouped {
        let per_date = deltas.entry(category.as_str()).or_default();
        for rec in records {
            let Some(date) = standardize_date(&rec.record.date) else {
                continue;
            };
            dates.insert(date.clone());
            if let Some(amount) = aggregate::convert_record(&rec.record, rates, currency)? {
                *per_date.entry(date).or_insert(Decimal::ZERO) += amount;
            }
        }
    }

    let mut running: BTreeMap<&str, Decimal> =
        deltas.keys().map(|category| (*category, Decimal::ZERO)).collect();

    let mut rows = Vec::with_capacity(dates.len());
    for date in &dates {
        let mut values = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for (category, per_date) in &deltas {
            if let Some(cumulative) = running.get_mut(category) {
                if let Some(delta) = per_date.get(date) {
                    *cumulative += *delta;
                }
                values.insert((*category).to_string(), round1(*cumulative));
                total += *cumulative;
            }
        }
        rows.push(SeriesRow {
            date: date.clone(),
            values,
            total: round1(total),
        });
    }

    Ok(rows)
}

/// `DD.MM.YYYY` → `YYYY-MM-DD`, so lexicographic order is date order.
/// Unparseable dates yield `None` and the record stays out of the series.
fn standardize_date(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date.trim(), "%d.%m.%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
