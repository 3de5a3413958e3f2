// 📒 Asset Record - the flat key → amount mapping that gets persisted
//
// Stored amounts are non-negative magnitudes. Liability items are still stored
// as positive numbers; summary.rs decides their sign.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Flat record of field key → non-negative amount.
///
/// Missing keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct AssetRecord {
    values: BTreeMap<String, f64>,
}

impl AssetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback shown when nothing usable is stored yet (or everything is zero).
    pub fn sample() -> Self {
        [
            ("currentDeposit", 50_000.0),
            ("alipay", 10_000.0),
            ("wechat", 5_000.0),
            ("car", 150_000.0),
            ("house", 3_000_000.0),
            ("fixedDeposit", 200_000.0),
            ("stocks", 100_000.0),
            ("receivable", 0.0),
            ("carLoan", 50_000.0),
            ("mortgage", 2_000_000.0),
            ("borrowing", 0.0),
        ]
        .into_iter()
        .collect()
    }

    /// Amount stored under `key`, or zero.
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Store `amount` clamped to a finite non-negative value.
    pub fn set(&mut self, key: impl Into<String>, amount: f64) {
        self.values.insert(key.into(), clamp_amount(amount));
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no entry is strictly positive.
    pub fn is_all_zero(&self) -> bool {
        !self.values.values().any(|v| *v > 0.0)
    }

    /// SHA-256 over the key-sorted `key=value;` listing.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in &self.values {
            hasher.update(format!("{}={};", key, value));
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for AssetRecord {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut record = AssetRecord::new();
        for (key, amount) in iter {
            record.set(key, amount);
        }
        record
    }
}

// Deserialized records go through the same clamp as edits.
impl From<BTreeMap<String, f64>> for AssetRecord {
    fn from(values: BTreeMap<String, f64>) -> Self {
        values.into_iter().collect()
    }
}

impl From<AssetRecord> for BTreeMap<String, f64> {
    fn from(record: AssetRecord) -> Self {
        record.values
    }
}

/// Clamp to `max(0, amount)`; NaN and infinities become zero.
pub fn clamp_amount(amount: f64) -> f64 {
    if amount.is_finite() {
        amount.max(0.0)
    } else {
        0.0
    }
}

/// Parse user input into an amount. Unparsable input reads as zero.
pub fn parse_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    clamp_amount(trimmed.parse::<f64>().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_zero() {
        let record = AssetRecord::new();
        assert_eq!(record.get("alipay"), 0.0);
        assert!(!record.contains("alipay"));
    }

    #[test]
    fn test_set_clamps_negative() {
        let mut record = AssetRecord::new();
        record.set("car", -10.0);
        record.set("house", f64::NAN);

        assert_eq!(record.get("car"), 0.0);
        assert_eq!(record.get("house"), 0.0);
        assert!(record.contains("car"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1200.5"), 1200.5);
        assert_eq!(parse_amount(" 42 "), 42.0);
        assert_eq!(parse_amount("-7"), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn test_sample_record() {
        let sample = AssetRecord::sample();

        assert_eq!(sample.len(), 11);
        assert_eq!(sample.get("house"), 3_000_000.0);
        assert!(!sample.is_all_zero());
    }

    #[test]
    fn test_all_zero() {
        let record: AssetRecord = [("car", 0.0), ("house", 0.0)].into_iter().collect();
        assert!(record.is_all_zero());
        assert!(AssetRecord::new().is_all_zero());
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let record: AssetRecord = [("alipay", 10.0), ("car", 5.0)].into_iter().collect();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"alipay": 10.0, "car": 5.0}));

        let back: AssetRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_deserialize_clamps_negative_amounts() {
        let record: AssetRecord =
            serde_json::from_str(r#"{"alipay": -5, "stocks": 100}"#).unwrap();

        assert_eq!(record.get("alipay"), 0.0);
        assert_eq!(record.get("stocks"), 100.0);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a: AssetRecord = [("alipay", 10.0), ("car", 5.0)].into_iter().collect();
        let b: AssetRecord = [("car", 5.0), ("alipay", 10.0)].into_iter().collect();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
        assert_ne!(a.fingerprint(), AssetRecord::sample().fingerprint());
    }
}
