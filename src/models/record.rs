/// One parsed row of a Fio bank CSV export.
///
/// Every field is kept as the raw string from the export; rows missing
/// trailing columns carry empty strings. Monetary math requires both
/// `amount` and `currency` to be non-empty — records failing that are
/// excluded from sums but still appear in payee listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxRecord {
    pub source_account: String,
    /// Transaction date as exported, `DD.MM.YYYY`.
    pub date: String,
    /// Signed decimal string with `,` as the fractional separator.
    pub amount: String,
    pub currency: String,
    pub counter_account: String,
    pub bank_code: String,
    /// Free-text message for the recipient; the preferred payee name.
    pub message: String,
    pub note: String,
    pub tx_type: String,
}

impl TxRecord {
    /// True when the record can participate in monetary aggregation.
    pub fn has_money(&self) -> bool {
        !self.amount.is_empty() && !self.currency.is_empty()
    }
}

/// A record plus the category id attached at submit time. Never mutated;
/// rebuilt from scratch whenever categories are resubmitted.
#[derive(Debug, Clone)]
pub struct CategorizedRecord {
    pub record: TxRecord,
    pub category: String,
}
