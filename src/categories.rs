// 🏷️ Category Registry - the taxonomy that shapes the asset record
//
// Five fixed categories, each with immutable default items plus custom items
// the user adds during a session. Custom items are never persisted: a fresh
// registry is built for every session and dropped with it.
//
// Item position matters: the index of an item among defaults ++ customs is
// part of its field key (see field_key.rs).

use crate::error::{FinanceError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CATEGORY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Cash-like balances (bank, Alipay, WeChat)
    Liquid,

    /// Cars, property
    Fixed,

    /// Deposits, stocks, funds
    Investment,

    /// Money other people owe the user
    Receivable,

    /// Loans and debts; subtracts from totals, never drawn in the flow graph
    Liability,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Liquid => "liquid",
            CategoryKind::Fixed => "fixed",
            CategoryKind::Investment => "investment",
            CategoryKind::Receivable => "receivable",
            CategoryKind::Liability => "liability",
        }
    }

    pub fn is_liability(&self) -> bool {
        matches!(self, CategoryKind::Liability)
    }
}

// ============================================================================
// DEFAULT TAXONOMY
// ============================================================================

pub const LIQUID_FUNDS: &str = "流动资金";
pub const FIXED_ASSETS: &str = "固定资产";
pub const INVESTMENTS: &str = "投资理财";
pub const RECEIVABLES: &str = "应收款项";
pub const LIABILITIES: &str = "负债";

/// (name, icon, kind, default items) in display order.
const DEFAULT_CATEGORIES: &[(&str, &str, CategoryKind, &[&str])] = &[
    (LIQUID_FUNDS, "💰", CategoryKind::Liquid, &["银行活期", "支付宝", "微信"]),
    (FIXED_ASSETS, "🏠", CategoryKind::Fixed, &["车辆价值", "房产价值"]),
    (INVESTMENTS, "📈", CategoryKind::Investment, &["定期存款", "股票基金"]),
    (RECEIVABLES, "📋", CategoryKind::Receivable, &["他人借款"]),
    (LIABILITIES, "💳", CategoryKind::Liability, &["车贷", "房贷", "借贷"]),
];

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Display name, also the category's identity
    pub name: String,

    /// Cosmetic decoration for UIs
    pub icon: String,

    pub kind: CategoryKind,

    default_items: Vec<String>,
    custom_items: Vec<String>,
}

impl Category {
    fn new(name: &str, icon: &str, kind: CategoryKind, defaults: &[&str]) -> Self {
        Category {
            name: name.to_string(),
            icon: icon.to_string(),
            kind,
            default_items: defaults.iter().map(|s| s.to_string()).collect(),
            custom_items: Vec::new(),
        }
    }

    pub fn default_items(&self) -> &[String] {
        &self.default_items
    }

    pub fn custom_items(&self) -> &[String] {
        &self.custom_items
    }

    /// Defaults first, then customs in registration order.
    pub fn all_items(&self) -> Vec<String> {
        self.default_items
            .iter()
            .chain(self.custom_items.iter())
            .cloned()
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.default_items.len() + self.custom_items.len()
    }
}

// ============================================================================
// CATEGORY REGISTRY
// ============================================================================

/// Session-scoped registry of categories and their items.
///
/// Owned by a single session (see `Dashboard`), so mutation goes through
/// `&mut self` and no locking is involved.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// Registry with the five default categories and no custom items.
    pub fn with_defaults() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, icon, kind, defaults)| Category::new(name, icon, *kind, defaults))
            .collect();

        CategoryRegistry { categories }
    }

    /// Categories in stable display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, category: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == category)
    }

    fn get_mut(&mut self, category: &str) -> Result<&mut Category> {
        self.categories
            .iter_mut()
            .find(|c| c.name == category)
            .ok_or_else(|| FinanceError::UnknownCategory(category.to_string()))
    }

    pub fn default_items(&self, category: &str) -> &[String] {
        self.get(category).map(|c| c.default_items()).unwrap_or(&[])
    }

    pub fn custom_items(&self, category: &str) -> &[String] {
        self.get(category).map(|c| c.custom_items()).unwrap_or(&[])
    }

    /// Defaults ++ customs. Unknown categories have no items.
    pub fn all_items(&self, category: &str) -> Vec<String> {
        self.get(category).map(|c| c.all_items()).unwrap_or_default()
    }

    /// Every category with all of its items, in registry order.
    pub fn all_categories_with_items(&self) -> Vec<(String, Vec<String>)> {
        self.categories
            .iter()
            .map(|c| (c.name.clone(), c.all_items()))
            .collect()
    }

    pub fn kind_of(&self, category: &str) -> Option<CategoryKind> {
        self.get(category).map(|c| c.kind)
    }

    pub fn is_liability(&self, category: &str) -> bool {
        self.kind_of(category)
            .map(|k| k.is_liability())
            .unwrap_or(false)
    }

    /// Append a custom item.
    ///
    /// Blank names (after trimming) are ignored and `Ok(false)` is returned.
    /// Duplicate names are accepted; the position index keeps their keys apart.
    pub fn add_custom_item(&mut self, category: &str, name: &str) -> Result<bool> {
        let trimmed = name.trim();
        let entry = self.get_mut(category)?;

        if trimmed.is_empty() {
            debug!(category, "ignoring blank custom item name");
            return Ok(false);
        }

        entry.custom_items.push(trimmed.to_string());
        debug!(category, item = trimmed, "custom item added");
        Ok(true)
    }

    /// Remove the custom item at `index` of the category's custom list.
    ///
    /// Returns the removed name, or `None` when the index is out of range.
    pub fn delete_custom_item(&mut self, category: &str, index: usize) -> Result<Option<String>> {
        let entry = self.get_mut(category)?;

        if index >= entry.custom_items.len() {
            debug!(category, index, "custom item index out of range");
            return Ok(None);
        }

        let removed = entry.custom_items.remove(index);
        debug!(category, item = %removed, "custom item deleted");
        Ok(Some(removed))
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
