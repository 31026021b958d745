//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use stockroom_core::log_query::{QuerySpec, SortKey, SortOrder};
use stockroom_core::{ChangeSource, ProductAction, DEFAULT_SCAN_SOURCE};

#[derive(Debug, Parser)]
#[command(name = "stockroom", version, about = "Stockroom inventory client")]
pub struct Cli {
    /// Base URL of the Stockroom API
    #[arg(long, env = "STOCKROOM_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, add, edit and delete products
    #[command(subcommand)]
    Products(ProductCommand),

    /// Read barcodes from a keyboard-wedge scanner (stdin)
    Scan(ScanArgs),

    /// Product change log
    Logs(LogArgs),

    /// Scan history
    History(HistoryArgs),
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// List every product
    List,

    /// Show one product
    Show { id: i64 },

    /// Add a product
    Add(AddArgs),

    /// Change some fields of a product
    Edit(EditArgs),

    /// Delete a product (its log rows are kept)
    Delete {
        id: i64,
        #[arg(long, default_value = "manual")]
        source: ChangeSource,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub sku: String,
    #[arg(long)]
    pub barcode: Option<String>,
    #[arg(long)]
    pub quantity: i64,
    #[arg(long, default_value_t = 0)]
    pub threshold: i64,
    /// YYYY-MM-DD
    #[arg(long)]
    pub expiry: Option<NaiveDate>,
    #[arg(long, default_value = "manual")]
    pub source: ChangeSource,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long, conflicts_with = "clear_barcode")]
    pub barcode: Option<String>,
    #[arg(long)]
    pub clear_barcode: bool,
    #[arg(long, allow_hyphen_values = true)]
    pub quantity: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    pub threshold: Option<i64>,
    /// YYYY-MM-DD
    #[arg(long, conflicts_with = "clear_expiry")]
    pub expiry: Option<NaiveDate>,
    #[arg(long)]
    pub clear_expiry: bool,
    #[arg(long, default_value = "manual")]
    pub source: ChangeSource,
}

// =============================================================================
// Scan
// =============================================================================

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Origin label recorded in the scan history
    #[arg(long, default_value = DEFAULT_SCAN_SOURCE)]
    pub source: String,

    /// On an exact match, change the quantity by this amount
    #[arg(long, allow_hyphen_values = true)]
    pub adjust: Option<i64>,
}

// =============================================================================
// Log Views
// =============================================================================

/// Filters, sort and page shared by both log views.
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Product name contains (case-insensitive)
    #[arg(long)]
    pub name: Option<String>,

    /// SKU contains (case-insensitive)
    #[arg(long)]
    pub sku: Option<String>,

    /// First day to include, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day to include, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// timestamp | product_name | quantity_change
    #[arg(long, default_value = "timestamp")]
    pub sort: SortKey,

    /// asc | desc
    #[arg(long, default_value = "desc")]
    pub order: SortOrder,

    /// 1-based page of 10 rows
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Write the whole filtered set (every page) to this CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

impl QueryArgs {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            name: self.name.clone(),
            sku: self.sku.clone(),
            start: self.start,
            end: self.end,
            sort_key: self.sort,
            order: self.order,
            page: self.page,
            ..QuerySpec::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// add | edit | delete
    #[arg(long)]
    pub action: Option<ProductAction>,

    /// manual | scanned
    #[arg(long)]
    pub source: Option<ChangeSource>,

    #[command(flatten)]
    pub query: QueryArgs,
}

impl LogArgs {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            action: self.action,
            source: self.source.map(|s| s.as_str().to_string()),
            ..self.query.to_spec()
        }
    }
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Only scans from the current UTC day
    #[arg(long)]
    pub today: bool,

    /// Scan origin label, e.g. scanner
    #[arg(long)]
    pub source: Option<String>,

    #[command(flatten)]
    pub query: QueryArgs,
}

impl HistoryArgs {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            source: self.source.clone(),
            ..self.query.to_spec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stockroom").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_log_args_map_to_spec() {
        let cli = parse(&[
            "logs",
            "--action",
            "delete",
            "--source",
            "scanned",
            "--name",
            "wid",
            "--start",
            "2024-06-01",
            "--sort",
            "quantity_change",
            "--order",
            "asc",
            "--page",
            "3",
        ]);
        let Command::Logs(args) = cli.command else {
            panic!("expected logs");
        };

        let spec = args.to_spec();
        assert_eq!(spec.action, Some(ProductAction::Delete));
        assert_eq!(spec.source.as_deref(), Some("scanned"));
        assert_eq!(spec.name.as_deref(), Some("wid"));
        assert_eq!(spec.start, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(spec.end, None);
        assert_eq!(spec.sort_key, SortKey::QuantityChange);
        assert_eq!(spec.order, SortOrder::Asc);
        assert_eq!(spec.page, 3);
    }

    #[test]
    fn test_log_defaults_newest_first() {
        let cli = parse(&["logs"]);
        let Command::Logs(args) = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(args.to_spec(), QuerySpec::default());
        assert!(args.query.csv.is_none());
    }

    #[test]
    fn test_history_source_is_free_text() {
        let cli = parse(&["history", "--today", "--source", "scan-from-add"]);
        let Command::History(args) = cli.command else {
            panic!("expected history");
        };
        assert!(args.today);
        assert_eq!(args.to_spec().source.as_deref(), Some("scan-from-add"));
    }

    #[test]
    fn test_bad_action_rejected() {
        let result = Cli::try_parse_from(["stockroom", "logs", "--action", "restock"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_clear_flags_conflict_with_values() {
        let result = Cli::try_parse_from([
            "stockroom",
            "products",
            "edit",
            "1",
            "--barcode",
            "123",
            "--clear-barcode",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_api_url_default() {
        let cli = parse(&["products", "list"]);
        assert!(cli.api_url.starts_with("http://"));
    }
}
