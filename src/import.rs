// 📥 CSV import - bulk-load figures as `category,item,amount` rows
//
// Items are resolved against the registry by name (first match among
// defaults ++ customs). Custom items live only as long as a session, so an
// import never extends the registry: rows naming an unknown item are skipped
// and reported instead of being stored under a key no later session can see.

use crate::categories::CategoryRegistry;
use crate::db::{Snapshot, SnapshotStore};
use crate::error::{FinanceError, Result};
use crate::field_key::encode;
use crate::record::{parse_amount, AssetRecord};
use crate::session::Dashboard;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct ImportRow {
    category: String,
    item: String,
    amount: String,
}

/// A row whose item is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub category: String,
    pub item: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub record: AssetRecord,
    pub skipped: Vec<SkippedRow>,
}

pub fn load_csv(csv_path: &Path, registry: &CategoryRegistry) -> Result<ImportOutcome> {
    let rdr = csv::Reader::from_path(csv_path)?;
    let outcome = read_rows(rdr, registry)?;
    info!(
        path = %csv_path.display(),
        fields = outcome.record.len(),
        skipped = outcome.skipped.len(),
        "csv imported"
    );
    Ok(outcome)
}

/// Parse rows from any reader. Later rows for the same item overwrite earlier ones.
pub fn read_csv<R: Read>(reader: R, registry: &CategoryRegistry) -> Result<ImportOutcome> {
    read_rows(csv::Reader::from_reader(reader), registry)
}

fn read_rows<R: Read>(
    mut rdr: csv::Reader<R>,
    registry: &CategoryRegistry,
) -> Result<ImportOutcome> {
    let mut record = AssetRecord::new();
    let mut skipped = Vec::new();

    for result in rdr.deserialize() {
        let row: ImportRow = result?;
        let category = row.category.trim();
        let item = row.item.trim();

        if registry.get(category).is_none() {
            return Err(FinanceError::UnknownCategory(category.to_string()));
        }
        if item.is_empty() {
            debug!(category, "skipping row with blank item name");
            continue;
        }

        let items = registry.all_items(category);
        match items.iter().position(|existing| existing == item) {
            Some(index) => record.set(encode(category, item, index), parse_amount(&row.amount)),
            None => {
                warn!(
                    category,
                    item,
                    "skipping unknown item; custom items only last for a session"
                );
                skipped.push(SkippedRow {
                    category: category.to_string(),
                    item: item.to_string(),
                });
            }
        }
    }

    Ok(ImportOutcome { record, skipped })
}

/// Import a CSV file into the session and save the result.
///
/// Imported values are laid over the stored record, or over an all-zero form
/// when nothing is stored yet; the sample figures are never persisted.
pub fn import_into<S: SnapshotStore>(
    dashboard: &mut Dashboard<S>,
    csv_path: &Path,
) -> Result<(Snapshot, ImportOutcome)> {
    let outcome = load_csv(csv_path, dashboard.registry())?;

    let mut form = dashboard.form();
    for (key, amount) in outcome.record.iter() {
        form.set_value(key, amount)?;
    }

    let snapshot = dashboard.submit_form(&form)?;
    Ok((snapshot, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::LIQUID_FUNDS;
    use crate::db::SqliteSnapshotStore;
    use crate::form::FormSchema;
    use crate::graph::ROOT_NAME;
    use crate::summary::Summary;

    #[test]
    fn test_import_default_items() {
        let data = "category,item,amount\n\
                    流动资金,支付宝,1200\n\
                    负债,房贷,-5\n\
                    应收款项,他人借款,oops\n";
        let registry = CategoryRegistry::with_defaults();

        let outcome = read_csv(data.as_bytes(), &registry).unwrap();

        assert_eq!(outcome.record.get("alipay"), 1200.0);
        assert_eq!(outcome.record.get("mortgage"), 0.0);
        assert!(outcome.record.contains("receivable"));
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_unknown_items_are_skipped_not_registered() {
        let data = "category,item,amount\n流动资金,Cash,300\n流动资金,  ,9\n流动资金,微信,7\n";
        let registry = CategoryRegistry::with_defaults();

        let outcome = read_csv(data.as_bytes(), &registry).unwrap();

        assert_eq!(
            outcome.skipped,
            vec![SkippedRow {
                category: LIQUID_FUNDS.to_string(),
                item: "Cash".to_string(),
            }]
        );
        assert_eq!(outcome.record.len(), 1);
        assert_eq!(outcome.record.get("wechat"), 7.0);
        assert!(registry.custom_items(LIQUID_FUNDS).is_empty());
    }

    #[test]
    fn test_session_custom_items_resolve() {
        let data = "category,item,amount\n投资理财,Gold,10\n投资理财,Gold,20\n";
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_custom_item("投资理财", "Gold").unwrap();

        let outcome = read_csv(data.as_bytes(), &registry).unwrap();
        let form = FormSchema::generate(&registry, Some(&outcome.record));

        assert_eq!(form.field("_Gold_2").unwrap().value, 20.0);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_import_unknown_category() {
        let data = "category,item,amount\nCrypto,BTC,1\n";
        let registry = CategoryRegistry::with_defaults();

        assert!(matches!(
            read_csv(data.as_bytes(), &registry),
            Err(FinanceError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_load_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.csv");
        std::fs::write(&path, "category,item,amount\n固定资产,房产价值,2500000\n").unwrap();

        let outcome = load_csv(&path, &CategoryRegistry::with_defaults()).unwrap();

        assert_eq!(outcome.record.get("house"), 2_500_000.0);
    }

    #[test]
    fn test_import_into_empty_store_does_not_persist_sample() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("assets.csv");
        std::fs::write(&csv_path, "category,item,amount\n流动资金,支付宝,1200\n").unwrap();

        let mut dashboard = Dashboard::new(SqliteSnapshotStore::open_in_memory().unwrap());
        dashboard.load();
        import_into(&mut dashboard, &csv_path).unwrap();

        let stored = dashboard.store().latest().unwrap().unwrap().record;
        assert_eq!(stored.get("alipay"), 1200.0);
        assert_eq!(stored.get("house"), 0.0);
        assert_eq!(stored.get("mortgage"), 0.0);
        assert_eq!(Summary::of(&stored).total_assets, 1200.0);
    }

    #[test]
    fn test_import_into_overlays_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("assets.csv");
        std::fs::write(&csv_path, "category,item,amount\n投资理财,股票基金,5\n").unwrap();

        let mut dashboard = Dashboard::new(SqliteSnapshotStore::open_in_memory().unwrap());
        dashboard.submit(AssetRecord::sample()).unwrap();
        import_into(&mut dashboard, &csv_path).unwrap();

        assert_eq!(dashboard.record().get("stocks"), 5.0);
        assert_eq!(dashboard.record().get("house"), 3_000_000.0);
    }

    #[test]
    fn test_import_then_fresh_session_sees_same_totals() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("assets.db");
        let csv_path = dir.path().join("assets.csv");
        std::fs::write(&csv_path, "category,item,amount\n流动资金,支付宝,100\n流动资金,Cash,300\n")
            .unwrap();

        {
            let mut dashboard = Dashboard::new(SqliteSnapshotStore::open(&db_path).unwrap());
            dashboard.load();
            let (_, outcome) = import_into(&mut dashboard, &csv_path).unwrap();
            assert_eq!(outcome.skipped.len(), 1);
        }

        let mut fresh = Dashboard::new(SqliteSnapshotStore::open(&db_path).unwrap());
        fresh.load();

        let form_keys: Vec<String> = fresh.form().fields().map(|f| f.key.clone()).collect();
        assert!(fresh.record().keys().all(|k| form_keys.iter().any(|f| f == k)));

        let graph = fresh.graph();
        let root = graph.nodes.iter().find(|n| n.name == ROOT_NAME).unwrap();
        let graph_total: f64 = graph.outgoing(root.id).map(|l| l.value).sum();
        assert_eq!(fresh.summary().total_assets, 100.0);
        assert_eq!(graph_total, 100.0);
    }
}
