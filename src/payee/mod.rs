use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::TxRecord;

/// Human-readable payee name for a record: the recipient message when
/// present, else the note, else a synthetic string built from the
/// transaction type.
pub fn payment_information(record: &TxRecord) -> String {
    if !record.message.is_empty() {
        record.message.clone()
    } else if !record.note.is_empty() {
        record.note.clone()
    } else {
        format!("Transaction type: {}", record.tx_type)
    }
}

struct Scrubber {
    masking: Option<Regex>,
    subaccount: Option<Regex>,
    trailing_digits: Option<Regex>,
}

fn scrubber() -> &'static Scrubber {
    static SCRUBBER: OnceLock<Scrubber> = OnceLock::new();
    SCRUBBER.get_or_init(|| Scrubber {
        masking: Regex::new(r"\*+").ok(),
        subaccount: Regex::new(r"/\d+").ok(),
        trailing_digits: Regex::new(r"(\s+\d+)+\s*$").ok(),
    })
}

/// Canonical form of a display name, with per-transaction noise removed:
/// card-masking asterisk runs, `/`-prefixed sub-account digits, and
/// trailing whitespace-separated digit runs (reference numbers).
///
/// Two display names normalizing to the same string are treated as the
/// same real-world payee. Only clearly volatile tokens are stripped, so
/// distinct payees are never merged at the cost of missing the odd
/// near-duplicate.
pub fn normalize(name: &str) -> String {
    let s = scrubber();
    let mut out = name.to_string();
    if let Some(re) = &s.masking {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = &s.subaccount {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = &s.trailing_digits {
        out = re.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Display name → representative name, built over a record set in its
/// original order. The first display name seen for a normalized form
/// becomes the representative for every variant of that form.
pub struct NameMapping {
    map: HashMap<String, String>,
}

impl NameMapping {
    pub fn build(records: &[TxRecord]) -> Self {
        // Keyed by normalized form; first occurrence wins, so input order
        // decides which variant represents the group.
        let mut representatives: HashMap<String, String> = HashMap::new();
        let mut map = HashMap::new();

        for record in records {
            let display = payment_information(record);
            let rep = representatives
                .entry(normalize(&display))
                .or_insert_with(|| display.clone());
            map.insert(display, rep.clone());
        }

        Self { map }
    }

    /// Representative for a display name. Names outside the mapped set
    /// represent themselves.
    pub fn representative<'a>(&'a self, display: &'a str) -> &'a str {
        self.map.get(display).map(String::as_str).unwrap_or(display)
    }
}
