// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing::info;

use asset_flow::{import_into, init_tracing, Config, Dashboard, SqliteSnapshotStore, Summary};

/// Optional JSON config next to the working directory
const CONFIG_FILE: &str = "asset-flow.json";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let config = Config::load(Path::new(CONFIG_FILE)).context("failed to read config")?;

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let Some(csv_path) = args.get(2) else {
                bail!("usage: asset-flow import <csv>");
            };
            run_import(&config, Path::new(csv_path))?;
        }
        Some("show") => run_show(&config)?,
        Some(other) => bail!("unknown command: {other} (expected `import <csv>` or `show`)"),
        // UI mode (default)
        None => run_ui_mode(&config)?,
    }

    Ok(())
}

fn open_dashboard(config: &Config, actor: &str) -> Result<Dashboard<SqliteSnapshotStore>> {
    let path = &config.database_path;
    let store = SqliteSnapshotStore::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?
        .with_actor(actor);

    let mut dashboard = Dashboard::new(store);
    dashboard.load();
    Ok(dashboard)
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    println!("🗄️  Asset Flow - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut dashboard = open_dashboard(config, "csv_importer")?;

    // 1. Load CSV and save over the stored figures
    println!("\n📂 Importing {}...", csv_path.display());
    let (snapshot, outcome) = import_into(&mut dashboard, csv_path)
        .with_context(|| format!("failed to import {}", csv_path.display()))?;
    info!(id = snapshot.id, "import saved");
    println!("✓ Imported {} fields", outcome.record.len());

    // 2. Report rows that matched no known item
    if !outcome.skipped.is_empty() {
        println!("\n⚠️  Skipped {} rows with unknown items:", outcome.skipped.len());
        for row in &outcome.skipped {
            println!("   {} / {}", row.category, row.item);
        }
    }

    println!(
        "\n✓ Snapshot #{} saved ({})",
        snapshot.id,
        snapshot.recorded_at.format("%Y-%m-%d %H:%M:%S")
    );

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print_summary(&dashboard.summary());

    Ok(())
}

fn run_show(config: &Config) -> Result<()> {
    let dashboard = open_dashboard(config, "cli")?;

    if dashboard.is_showing_fallback() {
        println!("(no saved data, showing sample figures)\n");
    }
    print_summary(&dashboard.summary());

    let graph = dashboard.graph();
    if graph.is_empty() {
        println!("\nNo data to display");
        return Ok(());
    }

    println!("\nFlows:");
    for link in &graph.links {
        let source = graph.node(link.source);
        let target = graph.node(link.target);
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };
        println!("  {} → {}: {:.2}", source.name, target.name, link.value);
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("📊 Total assets: {:.2}", summary.total_assets);
    println!("   Net worth:    {:.2}", summary.net_worth);
    println!("   Liabilities:  {:.2}", summary.liabilities_total);
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🖥️  Loading Asset Flow UI...\n");

    let dashboard = open_dashboard(config, "tui")?;
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(dashboard);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin asset-server --features server");
    std::process::exit(1);
}
