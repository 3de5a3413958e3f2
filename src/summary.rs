// 📊 Summary Aggregates - the three headline numbers of the dashboard

use crate::categories::CategoryRegistry;
use crate::field_key::{encode, is_liability_key, LIABILITY_KEYS, NET_WORTH_EXCLUDED_KEYS};
use crate::record::AssetRecord;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// All entries summed, liability entries subtracted
    pub total_assets: f64,

    /// Total assets minus car, house and receivables
    pub net_worth: f64,

    pub liabilities_total: f64,
}

impl Summary {
    /// Aggregates over the fixed liability key set.
    pub fn of(record: &AssetRecord) -> Self {
        let liabilities: HashSet<&str> = LIABILITY_KEYS.iter().copied().collect();
        Self::compute(record, &liabilities)
    }

    /// Like [`Summary::of`], but custom items of liability-type categories
    /// also count as liabilities.
    pub fn with_registry(record: &AssetRecord, registry: &CategoryRegistry) -> Self {
        let mut liabilities: HashSet<String> =
            LIABILITY_KEYS.iter().map(|k| k.to_string()).collect();

        for category in registry.categories().iter().filter(|c| c.kind.is_liability()) {
            for (index, item) in category.all_items().iter().enumerate() {
                liabilities.insert(encode(&category.name, item, index));
            }
        }

        let keys: HashSet<&str> = liabilities.iter().map(|k| k.as_str()).collect();
        Self::compute(record, &keys)
    }

    fn compute(record: &AssetRecord, liabilities: &HashSet<&str>) -> Self {
        let mut total_assets = 0.0;
        let mut liabilities_total = 0.0;

        for (key, value) in record.iter() {
            if liabilities.contains(key) {
                total_assets -= value;
                liabilities_total += value;
            } else {
                total_assets += value;
            }
        }

        let excluded: f64 = NET_WORTH_EXCLUDED_KEYS.iter().map(|k| record.get(k)).sum();

        Summary {
            total_assets,
            net_worth: total_assets - excluded,
            liabilities_total,
        }
    }
}

/// Sum of the fixed liability keys only.
pub fn liabilities_total(record: &AssetRecord) -> f64 {
    record
        .iter()
        .filter(|(key, _)| is_liability_key(key))
        .map(|(_, v)| v)
        .sum()
}
