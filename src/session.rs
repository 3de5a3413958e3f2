// 🧭 Dashboard session - one user's working context
//
// Owns the category registry (custom items live only as long as the session),
// the last good record, and the snapshot store. All saves go through
// `&mut self`, so a session never has two saves in flight.

use crate::categories::CategoryRegistry;
use crate::db::{Snapshot, SnapshotStore};
use crate::error::Result;
use crate::form::FormSchema;
use crate::graph::{build_graph, AssetGraph};
use crate::record::AssetRecord;
use crate::summary::Summary;
use tracing::{info, warn};

/// Where the current record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Built-in sample (nothing stored yet, or loading failed)
    Sample,
    /// Loaded from or saved to the store
    Stored,
}

pub struct Dashboard<S: SnapshotStore> {
    store: S,
    registry: CategoryRegistry,
    record: AssetRecord,
    source: RecordSource,
    snapshot_id: Option<i64>,
}

impl<S: SnapshotStore> Dashboard<S> {
    pub fn new(store: S) -> Self {
        Dashboard {
            store,
            registry: CategoryRegistry::with_defaults(),
            record: AssetRecord::sample(),
            source: RecordSource::Sample,
            snapshot_id: None,
        }
    }

    /// Load the latest snapshot. Never fails: an empty or broken store
    /// leaves the session on the sample record.
    pub fn load(&mut self) -> &AssetRecord {
        match self.store.latest() {
            Ok(Some(snapshot)) => {
                info!(id = snapshot.id, fields = snapshot.record.len(), "loaded latest snapshot");
                self.snapshot_id = Some(snapshot.id);
                self.record = snapshot.record;
                self.source = RecordSource::Stored;
            }
            Ok(None) => {
                info!("no snapshot stored yet, using sample data");
                self.use_sample();
            }
            Err(e) => {
                warn!(error = %e, "failed to load snapshot, using sample data");
                self.use_sample();
            }
        }

        &self.record
    }

    fn use_sample(&mut self) {
        self.record = AssetRecord::sample();
        self.source = RecordSource::Sample;
        self.snapshot_id = None;
    }

    /// Persist `record` as the latest snapshot.
    ///
    /// On failure the previous record stays current and the error is returned;
    /// nothing is retried.
    pub fn submit(&mut self, record: AssetRecord) -> Result<Snapshot> {
        match self.store.save(&record) {
            Ok(snapshot) => {
                info!(id = snapshot.id, amount = snapshot.amount, "snapshot saved");
                self.snapshot_id = Some(snapshot.id);
                self.record = snapshot.record.clone();
                self.source = RecordSource::Stored;
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "failed to save snapshot, keeping last good record");
                Err(e)
            }
        }
    }

    /// Submit the values of a filled-in form.
    pub fn submit_form(&mut self, form: &FormSchema) -> Result<Snapshot> {
        self.submit(form.to_record())
    }

    /// Overwrite a specific stored snapshot; refreshes the session if it is the current one.
    pub fn update_snapshot(&mut self, id: i64, record: AssetRecord) -> Result<Snapshot> {
        let snapshot = self.store.update(id, &record)?;
        if self.snapshot_id == Some(id) {
            self.record = snapshot.record.clone();
        }
        Ok(snapshot)
    }

    /// Delete a stored snapshot. Deleting the current one drops back to the sample.
    pub fn delete_snapshot(&mut self, id: i64) -> Result<()> {
        self.store.delete(id)?;
        if self.snapshot_id == Some(id) {
            self.use_sample();
        }
        Ok(())
    }

    pub fn record(&self) -> &AssetRecord {
        &self.record
    }

    pub fn source(&self) -> RecordSource {
        self.source
    }

    pub fn snapshot_id(&self) -> Option<i64> {
        self.snapshot_id
    }

    /// Record to visualise: the sample stands in for an all-zero record.
    pub fn display_record(&self) -> &AssetRecord {
        if self.record.is_all_zero() {
            fallback_record()
        } else {
            &self.record
        }
    }

    /// True when `display_record` is substituting the sample.
    pub fn is_showing_fallback(&self) -> bool {
        self.source == RecordSource::Sample || self.record.is_all_zero()
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CategoryRegistry {
        &mut self.registry
    }

    pub fn add_custom_item(&mut self, category: &str, name: &str) -> Result<bool> {
        self.registry.add_custom_item(category, name)
    }

    pub fn delete_custom_item(&mut self, category: &str, index: usize) -> Result<Option<String>> {
        self.registry.delete_custom_item(category, index)
    }

    /// Form seeded with the stored record. While the sample is standing in the
    /// fields start at zero, so saving a form never persists sample figures.
    pub fn form(&self) -> FormSchema {
        let prior = match self.source {
            RecordSource::Stored => Some(&self.record),
            RecordSource::Sample => None,
        };
        FormSchema::generate(&self.registry, prior)
    }

    pub fn graph(&self) -> AssetGraph {
        build_graph(self.display_record(), &self.registry)
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.record)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn fallback_record() -> &'static AssetRecord {
    static SAMPLE: std::sync::OnceLock<AssetRecord> = std::sync::OnceLock::new();
    SAMPLE.get_or_init(AssetRecord::sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::LIQUID_FUNDS;
    use crate::error::FinanceError;
    use crate::db::SqliteSnapshotStore;

    /// Store whose reads and writes always fail.
    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn latest(&self) -> Result<Option<Snapshot>> {
            Err(FinanceError::Persistence("disk on fire".to_string()))
        }
        fn list(&self) -> Result<Vec<Snapshot>> {
            Err(FinanceError::Persistence("disk on fire".to_string()))
        }
        fn save(&mut self, _record: &AssetRecord) -> Result<Snapshot> {
            Err(FinanceError::Persistence("disk on fire".to_string()))
        }
        fn update(&mut self, _id: i64, _record: &AssetRecord) -> Result<Snapshot> {
            Err(FinanceError::Persistence("disk on fire".to_string()))
        }
        fn delete(&mut self, _id: i64) -> Result<()> {
            Err(FinanceError::Persistence("disk on fire".to_string()))
        }
    }

    fn memory_dashboard() -> Dashboard<SqliteSnapshotStore> {
        Dashboard::new(SqliteSnapshotStore::open_in_memory().unwrap())
    }

    #[test]
    fn test_load_empty_store_uses_sample() {
        let mut dashboard = memory_dashboard();

        assert_eq!(dashboard.load(), &AssetRecord::sample());
        assert_eq!(dashboard.source(), RecordSource::Sample);
        assert!(dashboard.is_showing_fallback());
    }

    #[test]
    fn test_load_broken_store_uses_sample() {
        let mut dashboard = Dashboard::new(BrokenStore);

        assert_eq!(dashboard.load(), &AssetRecord::sample());
        assert_eq!(dashboard.snapshot_id(), None);
    }

    #[test]
    fn test_submit_then_reload() {
        let mut dashboard = memory_dashboard();
        let mut form = dashboard.form();
        form.set_input("alipay", "123").unwrap();

        let snapshot = dashboard.submit_form(&form).unwrap();

        assert_eq!(dashboard.source(), RecordSource::Stored);
        assert_eq!(dashboard.snapshot_id(), Some(snapshot.id));
        assert_eq!(dashboard.record().get("alipay"), 123.0);

        dashboard.load();
        assert_eq!(dashboard.record().get("alipay"), 123.0);
        // untouched fields were never seeded from the sample
        assert_eq!(dashboard.record().get("house"), 0.0);
    }

    #[test]
    fn test_failed_submit_keeps_last_good_record() {
        let mut dashboard = Dashboard::new(BrokenStore);
        let before = dashboard.record().clone();

        let mut changed = before.clone();
        changed.set("stocks", 1.0);

        assert!(dashboard.submit(changed).unwrap_err().is_persistence());
        assert_eq!(dashboard.record(), &before);
    }

    #[test]
    fn test_all_zero_record_displays_sample() {
        let mut dashboard = memory_dashboard();
        dashboard.submit(AssetRecord::new()).unwrap();

        assert!(dashboard.record().is_all_zero());
        assert_eq!(dashboard.display_record(), &AssetRecord::sample());
        assert!(!dashboard.graph().is_empty());
        assert_eq!(dashboard.summary().total_assets, 0.0);
    }

    #[test]
    fn test_registry_changes_flow_into_form_and_graph() {
        let mut dashboard = memory_dashboard();
        dashboard.add_custom_item(LIQUID_FUNDS, "Cash").unwrap();

        let mut form = dashboard.form();
        form.set_input("_Cash_3", "500").unwrap();
        dashboard.submit_form(&form).unwrap();

        let graph = dashboard.graph();
        assert!(graph.nodes.iter().any(|n| n.name == "Cash"));

        dashboard.delete_custom_item(LIQUID_FUNDS, 0).unwrap();
        assert!(!dashboard.graph().nodes.iter().any(|n| n.name == "Cash"));
    }

    #[test]
    fn test_form_ignores_sample_until_stored() {
        let mut dashboard = memory_dashboard();
        dashboard.load();

        assert_eq!(dashboard.record().get("house"), 3_000_000.0);
        assert!(dashboard.form().to_record().is_all_zero());

        dashboard.submit(AssetRecord::sample()).unwrap();
        assert_eq!(dashboard.form().to_record().get("house"), 3_000_000.0);
    }

    #[test]
    fn test_delete_current_snapshot_falls_back() {
        let mut dashboard = memory_dashboard();
        let snapshot = dashboard.submit(AssetRecord::sample()).unwrap();

        dashboard.delete_snapshot(snapshot.id).unwrap();

        assert_eq!(dashboard.source(), RecordSource::Sample);
        assert!(dashboard.store().latest().unwrap().is_none());
    }
}
