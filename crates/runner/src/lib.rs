//! `fulfillsync-runner`: runs one consolidation batch from snapshot files.
//!
//! Collaborators are wired here from [`EngineConfig`]; the batch logic itself
//! lives in `fulfillsync-infra`'s pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fulfillsync_core::{Quantity, Sku};
use fulfillsync_infra::external::{DryRunFulfillmentProvider, JsonLinesStatusSink};
use fulfillsync_infra::in_memory::InMemoryInventory;
use fulfillsync_infra::{BatchOutcome, BatchPipeline, BatchReport, EngineConfig, OrderSource};
use fulfillsync_sales::Order;

#[derive(Debug, Parser)]
#[command(name = "fulfillsync-runner")]
#[command(about = "Consolidate marketplace orders into one fulfillment request and reconcile inventory", long_about = None)]
pub struct Cli {
    /// Order snapshot: JSON array of orders
    #[arg(long)]
    pub orders: PathBuf,

    /// Inventory snapshot: JSON object mapping stock unit to quantity
    #[arg(long)]
    pub inventory: PathBuf,

    /// Leave the inventory snapshot file untouched
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Also write the full batch report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Order source reading a JSON array of orders from a file.
#[derive(Debug, Clone)]
pub struct JsonFileOrderSource {
    path: PathBuf,
}

impl JsonFileOrderSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OrderSource for JsonFileOrderSource {
    type Error = anyhow::Error;

    fn fetch(&self) -> Result<Vec<Order>, Self::Error> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading orders from {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing orders in {}", self.path.display()))
    }
}

pub fn load_inventory(path: &Path) -> Result<BTreeMap<Sku, Quantity>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading inventory from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing inventory in {}", path.display()))
}

/// Replace the snapshot file (write to a sibling, then rename).
pub fn save_inventory(path: &Path, snapshot: &BTreeMap<Sku, Quantity>) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(snapshot)?;
    fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Run one batch and write disposition records to `out` as JSON lines.
pub fn run<W: Write + Send>(cli: &Cli, config: &EngineConfig, out: W) -> Result<BatchReport> {
    let inventory = InMemoryInventory::from_snapshot(load_inventory(&cli.inventory)?);
    let provider = DryRunFulfillmentProvider::new(&config.amazon);
    let sink = JsonLinesStatusSink::new(out);

    let pipeline = BatchPipeline::new(provider, &inventory, &sink)
        .with_shortage_policy(config.shortage_policy);
    let report = pipeline.run_from(&JsonFileOrderSource::new(&cli.orders))?;

    if matches!(report.outcome, BatchOutcome::Completed { .. }) {
        if cli.dry_run {
            info!(path = %cli.inventory.display(), "dry run: inventory snapshot not written");
        } else {
            save_inventory(&cli.inventory, &inventory.snapshot())?;
        }
    }

    if let Some(path) = &cli.report {
        let body = serde_json::to_string_pretty(&report)?;
        fs::write(path, body).with_context(|| format!("writing report to {}", path.display()))?;
    }

    if let Some(summary) = report.summary() {
        info!(
            batch_id = %report.batch_id,
            fulfilled = summary.fulfilled_count,
            failed = summary.failed_order_ids.len(),
            unmatched = summary.unmatched_skus.len(),
            "batch finished"
        );
    }
    Ok(report)
}

/// Process exit code: 0 success (or nothing to do), 1 whole batch failed,
/// 2 some orders failed.
pub fn exit_code(report: &BatchReport) -> u8 {
    if report.is_batch_failure() {
        1
    } else if report.has_failed_orders() {
        2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> EngineConfig {
        let vars: HashMap<String, String> = [
            "AMAZON_REFRESH_TOKEN",
            "AMAZON_CLIENT_ID",
            "AMAZON_CLIENT_SECRET",
            "AMAZON_AWS_ACCESS_KEY",
            "AMAZON_AWS_SECRET_KEY",
            "AMAZON_ROLE_ARN",
            "TIKTOK_APP_KEY",
            "TIKTOK_APP_SECRET",
            "TIKTOK_ACCESS_TOKEN",
        ]
        .into_iter()
        .map(|k| (k.to_string(), "x".to_string()))
        .collect();
        EngineConfig::from_map(&vars).unwrap()
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from([
            "fulfillsync-runner",
            "--orders",
            "o.json",
            "--inventory",
            "i.json",
            "--dry-run",
        ]);
        assert_eq!(cli.orders, PathBuf::from("o.json"));
        assert!(cli.dry_run);
        assert!(cli.report.is_none());
    }

    #[test]
    fn batch_updates_snapshot_and_prints_dispositions() {
        let dir = tempfile::tempdir().unwrap();
        let orders = write(
            dir.path(),
            "orders.json",
            r#"[
                {"order_id": "O1", "status": "AWAITING_SHIPMENT", "items": [{"sku": "X", "quantity": 2}]},
                {"id": "O2", "status": "pending", "items": [{"sku": "X", "quantity": 3}, {"sku": "Z", "quantity": 1}]},
                {"id": "O3", "status": "SHIPPED", "items": [{"sku": "X", "quantity": 9}]}
            ]"#,
        );
        let inventory = write(dir.path(), "inventory.json", r#"{"X": 10}"#);
        let cli = Cli {
            orders,
            inventory: inventory.clone(),
            dry_run: false,
            report: Some(dir.path().join("report.json")),
        };

        let mut out = Vec::new();
        let report = run(&cli, &config(), &mut out).unwrap();

        assert_eq!(exit_code(&report), 2);
        let snapshot = load_inventory(&inventory).unwrap();
        assert_eq!(snapshot.get(&Sku::parse("X").unwrap()), Some(&Quantity::new(5)));

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["order_id"], "O1");
        assert_eq!(lines[0]["status"], "fulfilled");
        assert_eq!(lines[1]["order_id"], "O2");
        assert_eq!(lines[1]["status"], "failed");
        assert_eq!(lines[1]["reasons"], serde_json::json!(["Z"]));
        assert!(dir.path().join("report.json").exists());
    }

    #[test]
    fn dry_run_leaves_snapshot_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let orders = write(
            dir.path(),
            "orders.json",
            r#"[{"id": "O1", "items": [{"sku": "X", "quantity": 2}]}]"#,
        );
        let inventory = write(dir.path(), "inventory.json", r#"{"X": 10}"#);
        let cli = Cli {
            orders,
            inventory: inventory.clone(),
            dry_run: true,
            report: None,
        };

        let report = run(&cli, &config(), Vec::new()).unwrap();

        assert_eq!(exit_code(&report), 0);
        let snapshot = load_inventory(&inventory).unwrap();
        assert_eq!(snapshot.get(&Sku::parse("X").unwrap()), Some(&Quantity::new(10)));
    }

    #[test]
    fn unreadable_orders_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = write(dir.path(), "inventory.json", "{}");
        let cli = Cli {
            orders: dir.path().join("missing.json"),
            inventory,
            dry_run: false,
            report: None,
        };

        assert!(run(&cli, &config(), Vec::new()).is_err());
    }
}
