use std::collections::{HashMap, HashSet};

use crate::models::{CategorizedRecord, Category, TxRecord};
use crate::payee::{self, NameMapping};

/// Fallback category id when nothing else resolves.
pub(crate) const OTHER_CATEGORY: &str = "other";

/// Built-in inference table: (lowercase substring, category id), scanned
/// in order, first match wins. Deliberately a plain substring list — the
/// overlap ordering is part of the behavior, so no fuzzy matching.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("bolt.eu/o", "travel"),
    ("operator ict", "travel"),
    ("www.cd.cz", "travel"),
    ("studentagency", "travel"),
    ("leoexpress", "travel"),
    ("gopay  *leoexpress", "travel"),
    ("uber", "travel"),
    ("lidl", "food"),
    ("tesco", "food"),
    ("albert", "food"),
    ("kaufland", "food"),
    ("zabka", "food"),
    ("kebab", "food"),
    ("donalds", "food"),
    ("burger", "food"),
    ("kfc", "food"),
    ("subway", "food"),
    ("pizz", "food"),
    ("bageterie", "food"),
    ("potraviny", "food"),
    ("restaur", "food"),
    ("penny", "food"),
    ("billa", "food"),
    ("geco", "food"),
    ("dm drogerie", "food"),
    ("rangoli", "food"),
    ("wok", "food"),
    ("cafe", "food"),
    ("kavarna", "food"),
    ("kozlovna", "food"),
    ("foodora", "food"),
    ("sodexo", "food"),
    ("relay", "food"),
    ("bankomat", "ATM"),
    ("vyber z bankomatu", "ATM"),
    ("ikea", "living"),
    ("jysk", "living"),
    ("sportisimo", "living"),
    ("action", "living"),
    ("najem", "living"),
    ("rent", "living"),
    ("byt", "living"),
    ("alza", "living"),
    ("o2", "living"),
    ("vodafone", "living"),
    ("mobile", "living"),
    ("platba prevodem uvnitr banky", "transfer"),
    ("transfer", "transfer"),
    ("revolut", "transfer"),
    ("okamžitá odchozí platba", "transfer"),
    ("bezhotovostní příjem", "income"),
    ("okamžitá příchozí platba", "income"),
    ("mzda", "income"),
    ("výplata", "income"),
    ("plat", "income"),
    ("salary", "income"),
    ("bonus", "income"),
];

/// Resolves a payee's representative name to a category id: stored user
/// assignment first, then the built-in substring table, then "other".
/// Ids pointing at categories missing from the active set degrade to
/// "other" without touching the stored row.
pub(crate) struct Categorizer {
    assignments: HashMap<String, String>,
    active: HashSet<String>,
}

impl Categorizer {
    pub(crate) fn new(assignments: HashMap<String, String>, categories: &[Category]) -> Self {
        let active = categories.iter().map(|c| c.id.clone()).collect();
        Self {
            assignments,
            active,
        }
    }

    pub(crate) fn category_for(&self, representative: &str) -> String {
        if let Some(id) = self.assignments.get(representative) {
            return self.activated(id);
        }

        let lower = representative.to_lowercase();
        for (pattern, id) in DEFAULT_RULES {
            if lower.contains(pattern) {
                return self.activated(id);
            }
        }

        OTHER_CATEGORY.to_string()
    }

    fn activated(&self, id: &str) -> String {
        if self.active.contains(id) {
            id.to_string()
        } else {
            OTHER_CATEGORY.to_string()
        }
    }

    /// Attach a category to every record, resolving payee identity through
    /// the name mapping. Consumes only explicit state — stored assignments
    /// and the mapping — never anything read back from a rendered view.
    pub(crate) fn categorize(
        &self,
        records: &[TxRecord],
        mapping: &NameMapping,
    ) -> Vec<CategorizedRecord> {
        records
            .iter()
            .map(|record| {
                let display = payee::payment_information(record);
                let representative = mapping.representative(&display);
                CategorizedRecord {
                    record: record.clone(),
                    category: self.category_for(representative),
                }
            })
            .collect()
    }
}
