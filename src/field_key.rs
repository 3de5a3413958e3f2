// 🔑 Field-Name Codec - (category, item, position) → flat record key
//
// Default items have fixed mnemonic keys so stored records stay readable and
// stable. Everything else gets a synthesized key whose trailing position index
// keeps it unique even when sanitizing collapses the names.

use crate::categories::{FIXED_ASSETS, INVESTMENTS, LIABILITIES, LIQUID_FUNDS, RECEIVABLES};

/// Canonical keys for every default item: (category, item, key).
///
/// This is the only copy of the table; `encode` and `reserved_label` both read it.
pub const RESERVED_KEYS: &[(&str, &str, &str)] = &[
    (LIQUID_FUNDS, "银行活期", "currentDeposit"),
    (LIQUID_FUNDS, "支付宝", "alipay"),
    (LIQUID_FUNDS, "微信", "wechat"),
    (FIXED_ASSETS, "车辆价值", "car"),
    (FIXED_ASSETS, "房产价值", "house"),
    (INVESTMENTS, "定期存款", "fixedDeposit"),
    (INVESTMENTS, "股票基金", "stocks"),
    (RECEIVABLES, "他人借款", "receivable"),
    (LIABILITIES, "车贷", "carLoan"),
    (LIABILITIES, "房贷", "mortgage"),
    (LIABILITIES, "借贷", "borrowing"),
];

/// Keys whose values subtract from total assets.
pub const LIABILITY_KEYS: &[&str] = &["carLoan", "mortgage", "borrowing"];

/// Keys removed from total assets when computing net worth (illiquid holdings).
pub const NET_WORTH_EXCLUDED_KEYS: &[&str] = &["car", "house", "receivable"];

/// Reserved key for a default (category, item) pair, if any.
pub fn reserved_key(category: &str, item: &str) -> Option<&'static str> {
    RESERVED_KEYS
        .iter()
        .find(|(c, i, _)| *c == category && *i == item)
        .map(|(_, _, key)| *key)
}

/// Inverse lookup for reserved keys only: key → (category, item).
///
/// Synthesized keys cannot be decoded (sanitizing is lossy), so callers that
/// need labels for them must carry the name alongside the key.
pub fn reserved_label(key: &str) -> Option<(&'static str, &'static str)> {
    RESERVED_KEYS
        .iter()
        .find(|(_, _, k)| *k == key)
        .map(|(c, i, _)| (*c, *i))
}

/// Keep ASCII letters and digits only.
pub fn sanitize(token: &str) -> String {
    token.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Field key for the item at `index` (among defaults ++ customs) of `category`.
pub fn encode(category: &str, item: &str, index: usize) -> String {
    if let Some(key) = reserved_key(category, item) {
        return key.to_string();
    }

    format!("{}_{}_{}", sanitize(category), sanitize(item), index)
}

pub fn is_liability_key(key: &str) -> bool {
    LIABILITY_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::CategoryRegistry;

    #[test]
    fn test_reserved_keys_ignore_index() {
        for (category, item, key) in RESERVED_KEYS {
            for index in [0, 1, 7, 42] {
                assert_eq!(encode(category, item, index), *key);
            }
        }
    }

    #[test]
    fn test_reserved_table_covers_every_default_item() {
        let registry = CategoryRegistry::with_defaults();

        for category in registry.categories() {
            for item in category.default_items() {
                assert!(
                    reserved_key(&category.name, item).is_some(),
                    "missing reserved key for {}/{}",
                    category.name,
                    item
                );
            }
        }
    }

    #[test]
    fn test_synthesized_key_sanitizes() {
        assert_eq!(encode("Crypto Assets", "BTC (cold)", 3), "CryptoAssets_BTCcold_3");
        assert_eq!(encode(LIQUID_FUNDS, "现金", 3), "__3");
        assert_eq!(encode(LIQUID_FUNDS, "Cash 2", 4), "_Cash2_4");
    }

    #[test]
    fn test_index_disambiguates_collapsed_names() {
        let a = encode(INVESTMENTS, "基金A", 2);
        let b = encode(INVESTMENTS, "基金A", 3);
        let c = encode(INVESTMENTS, "债券A", 4);

        assert_eq!(a, "_A_2");
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_reserved_pair_only_matches_own_category() {
        // "支付宝" is only reserved under 流动资金
        assert_eq!(encode(INVESTMENTS, "支付宝", 2), "__2");
    }

    #[test]
    fn test_reserved_label_round_trip() {
        assert_eq!(reserved_label("alipay"), Some((LIQUID_FUNDS, "支付宝")));
        assert_eq!(reserved_label("mortgage"), Some((LIABILITIES, "房贷")));
        assert_eq!(reserved_label("_Cash_3"), None);
    }

    #[test]
    fn test_liability_keys() {
        assert!(is_liability_key("carLoan"));
        assert!(!is_liability_key("car"));
    }
}
