use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{CategorizedRecord, Currency, TxRecord};
use crate::payee::{self, NameMapping};
use crate::rates::{ConvertError, ExchangeRates};

/// Grouping key for a record: representative name when deduplicating,
/// raw display name otherwise.
fn item_key(record: &TxRecord, mapping: &NameMapping, hide_duplicates: bool) -> String {
    let display = payee::payment_information(record);
    if hide_duplicates {
        mapping.representative(&display).to_string()
    } else {
        display
    }
}

/// Distinct payee names, in first-occurrence order.
pub(crate) fn unique_items(
    records: &[TxRecord],
    mapping: &NameMapping,
    hide_duplicates: bool,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for record in records {
        let key = item_key(record, mapping, hide_duplicates);
        if seen.insert(key.clone()) {
            items.push(key);
        }
    }
    items
}

/// Summed amount per payee, converted to the display currency.
///
/// Records without both amount and currency are skipped, as are amounts
/// that fail to parse — they still show up in listings, just not in the
/// math. An unsupported currency code is the one hard error.
pub(crate) fn item_amounts(
    records: &[TxRecord],
    mapping: &NameMapping,
    rates: &ExchangeRates,
    currency: Currency,
    hide_duplicates: bool,
) -> Result<HashMap<String, Decimal>, ConvertError> {
    let mut sums: HashMap<String, Decimal> = HashMap::new();
    for record in records {
        let Some(converted) = convert_record(record, rates, currency)? else {
            continue;
        };
        *sums
            .entry(item_key(record, mapping, hide_duplicates))
            .or_insert(Decimal::ZERO) += converted;
    }
    Ok(sums)
}

/// Original records grouped per payee, file order preserved within each
/// group.
pub(crate) fn item_transactions(
    records: &[TxRecord],
    mapping: &NameMapping,
    hide_duplicates: bool,
) -> HashMap<String, Vec<TxRecord>> {
    let mut groups: HashMap<String, Vec<TxRecord>> = HashMap::new();
    for record in records {
        groups
            .entry(item_key(record, mapping, hide_duplicates))
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Categorized records grouped by category id. Records without a date are
/// left out, and a category key exists only when at least one record
/// qualifies — never as an empty bucket.
pub(crate) fn group_by_category(
    records: &[CategorizedRecord],
) -> BTreeMap<String, Vec<CategorizedRecord>> {
    let mut groups: BTreeMap<String, Vec<CategorizedRecord>> = BTreeMap::new();
    for rec in records {
        if rec.record.date.is_empty() {
            continue;
        }
        groups.entry(rec.category.clone()).or_default().push(rec.clone());
    }
    groups
}

/// Sum of one record set in the display currency, with the usual
/// monetary-exclusion policy. Unrounded; callers format as needed.
pub(crate) fn sum_converted<'a>(
    records: impl IntoIterator<Item = &'a TxRecord>,
    rates: &ExchangeRates,
    currency: Currency,
) -> Result<Decimal, ConvertError> {
    let mut total = Decimal::ZERO;
    for record in records {
        if let Some(converted) = convert_record(record, rates, currency)? {
            total += converted;
        }
    }
    Ok(total)
}

/// The canonical net figure: every valid record converted and summed,
/// reported at one decimal place.
pub(crate) fn total_net(
    records: &[TxRecord],
    rates: &ExchangeRates,
    currency: Currency,
) -> Result<Decimal, ConvertError> {
    Ok(sum_converted(records, rates, currency)?
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Converted value of one record, or `None` when the record is excluded
/// from monetary math (missing or unparseable amount/currency).
pub(crate) fn convert_record(
    record: &TxRecord,
    rates: &ExchangeRates,
    currency: Currency,
) -> Result<Option<Decimal>, ConvertError> {
    if !record.has_money() {
        return Ok(None);
    }
    match rates.convert(&record.amount, &record.currency, currency) {
        Ok(value) => Ok(Some(value)),
        Err(ConvertError::BadAmount(_)) => Ok(None),
        Err(err) => Err(err),
    }
}
