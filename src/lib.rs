// Asset Flow - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod categories;     // Category Registry - defaults + session custom items
pub mod field_key;      // Field-Name Codec - (category, item, index) -> record key
pub mod record;         // Asset record - key -> non-negative amount
pub mod form;           // Form Schema Generator
pub mod graph;          // Graph Transform - record -> flow graph
pub mod summary;        // Summary Aggregates
pub mod db;             // Snapshot Store (SQLite)
pub mod session;        // Dashboard session
pub mod import;         // CSV import
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{FinanceError, Result};
pub use categories::{
    Category, CategoryKind, CategoryRegistry,
    LIQUID_FUNDS, FIXED_ASSETS, INVESTMENTS, RECEIVABLES, LIABILITIES,
};
pub use field_key::{encode, reserved_key, reserved_label, sanitize};
pub use record::{clamp_amount, parse_amount, AssetRecord};
pub use form::{FormField, FormGroup, FormSchema};
pub use graph::{
    build_graph, color_for_tag,
    AssetGraph, GraphLink, GraphNode, NodeGeometry, NodeRole, RenderRequest,
};
pub use summary::{liabilities_total, Summary};
pub use db::{
    Event, Snapshot, SnapshotStore, SqliteSnapshotStore,
    setup_database, insert_event, get_events_for_snapshot,
};
pub use session::{Dashboard, RecordSource};
pub use import::{import_into, load_csv, read_csv, ImportOutcome, SkippedRow};
pub use config::Config;
pub use logging::init_tracing;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
