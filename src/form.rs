// 📝 Form Schema Generator - editable fields derived from the registry
//
// One group per category, one field per item, keyed with the field codec.
// The schema is rebuilt whenever the registry changes; values from a prior
// record are carried over by key, everything else starts at zero.

use crate::categories::CategoryRegistry;
use crate::error::{FinanceError, Result};
use crate::field_key::encode;
use crate::record::{clamp_amount, parse_amount, AssetRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormGroup {
    pub category: String,
    pub icon: String,
    pub fields: Vec<FormField>,
}

/// Ordered field groups for the current registry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub groups: Vec<FormGroup>,
}

impl FormSchema {
    /// Build the schema, seeding values from `prior` where the key exists.
    pub fn generate(registry: &CategoryRegistry, prior: Option<&AssetRecord>) -> Self {
        let groups = registry
            .categories()
            .iter()
            .map(|category| {
                let fields = category
                    .all_items()
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let key = encode(&category.name, &item, index);
                        let value = prior.map(|r| r.get(&key)).unwrap_or(0.0);
                        FormField {
                            key,
                            label: item,
                            value,
                        }
                    })
                    .collect();

                FormGroup {
                    category: category.name.clone(),
                    icon: category.icon.clone(),
                    fields,
                }
            })
            .collect();

        FormSchema { groups }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields().find(|f| f.key == key)
    }

    fn field_mut(&mut self, key: &str) -> Result<&mut FormField> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.fields.iter_mut())
            .find(|f| f.key == key)
            .ok_or_else(|| FinanceError::UnknownField(key.to_string()))
    }

    /// Apply raw user input to a field. Unparsable input becomes 0, negatives clamp to 0.
    ///
    /// Returns the value actually stored.
    pub fn set_input(&mut self, key: &str, raw: &str) -> Result<f64> {
        self.set_value(key, parse_amount(raw))
    }

    pub fn set_value(&mut self, key: &str, value: f64) -> Result<f64> {
        let field = self.field_mut(key)?;
        field.value = clamp_amount(value);
        Ok(field.value)
    }

    /// Complete record with exactly the keys of this schema.
    ///
    /// Keys from a prior record that no longer map to an item are not carried.
    /// If two items encode to the same key the later one wins.
    pub fn to_record(&self) -> AssetRecord {
        self.fields().map(|f| (f.key.clone(), f.value)).collect()
    }

    pub fn field_count(&self) -> usize {
        self.groups.iter().map(|g| g.fields.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{INVESTMENTS, LIQUID_FUNDS};

    #[test]
    fn test_generate_without_prior_is_all_zero() {
        let registry = CategoryRegistry::with_defaults();
        let schema = FormSchema::generate(&registry, None);

        assert_eq!(schema.groups.len(), 5);
        assert_eq!(schema.field_count(), 11);
        assert!(schema.fields().all(|f| f.value == 0.0));
        assert_eq!(schema.groups[0].fields[1].key, "alipay");
        assert_eq!(schema.groups[0].fields[1].label, "支付宝");
    }

    #[test]
    fn test_generate_merges_prior_values() {
        let registry = CategoryRegistry::with_defaults();
        let prior = AssetRecord::sample();
        let schema = FormSchema::generate(&registry, Some(&prior));

        assert_eq!(schema.field("house").unwrap().value, 3_000_000.0);
        assert_eq!(schema.field("borrowing").unwrap().value, 0.0);
    }

    #[test]
    fn test_custom_item_field() {
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_custom_item(LIQUID_FUNDS, "Cash").unwrap();

        let schema = FormSchema::generate(&registry, None);

        let group = &schema.groups[0];
        assert_eq!(group.fields.len(), 4);
        assert_eq!(group.fields[3].key, "_Cash_3");
        assert_eq!(group.fields[3].label, "Cash");
    }

    #[test]
    fn test_set_input_clamps() {
        let registry = CategoryRegistry::with_defaults();
        let mut schema = FormSchema::generate(&registry, None);

        assert_eq!(schema.set_input("stocks", "1500").unwrap(), 1500.0);
        assert_eq!(schema.set_input("car", "-20").unwrap(), 0.0);
        assert_eq!(schema.set_input("house", "lots").unwrap(), 0.0);
        assert!(matches!(
            schema.set_input("nope", "1"),
            Err(FinanceError::UnknownField(_))
        ));
    }

    #[test]
    fn test_to_record_drops_stale_keys() {
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_custom_item(INVESTMENTS, "Gold").unwrap();
        let mut prior = AssetRecord::sample();
        prior.set("_Gold_2", 900.0);
        prior.set("_Silver_3", 100.0);

        registry.delete_custom_item(INVESTMENTS, 0).unwrap();
        let record = FormSchema::generate(&registry, Some(&prior)).to_record();

        assert_eq!(record.len(), 11);
        assert!(!record.contains("_Gold_2"));
        assert!(!record.contains("_Silver_3"));
        assert_eq!(record.get("stocks"), 100_000.0);
    }

    #[test]
    fn test_round_trip_reproduces_keys_and_values() {
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_custom_item(INVESTMENTS, "Gold").unwrap();
        let mut first = FormSchema::generate(&registry, Some(&AssetRecord::sample()));
        first.set_input("_Gold_2", "321").unwrap();

        let record = first.to_record();
        let second = FormSchema::generate(&registry, Some(&record));

        assert_eq!(first, second);
        assert_eq!(second.to_record(), record);
    }
}
