//! # Seed Data Generator
//!
//! Populates a development database with products.
//!
//! ## Usage
//! ```bash
//! # Generate 60 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Products
//! - Unique SKU: `{CATEGORY}-{NAME}-{INDEX}`
//! - Barcodes grouped by category: every product of a category shares the
//!   same 6-digit prefix, so scanning an unknown code of that category
//!   yields similar matches
//! - Some products low on stock, some with past expiry dates
//!
//! Every product goes through the normal logged create path, so the
//! product log starts with one `add` row per product.

use chrono::{Duration, Utc};
use std::env;
use stockroom_core::{ChangeSource, NewProduct};
use stockroom_db::{Database, DbConfig};

/// Categories with their barcode prefix.
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "BEV",
        "590100",
        &["Sparkling Water", "Orange Juice", "Iced Tea", "Cola", "Lemonade"],
    ),
    (
        "DRY",
        "590200",
        &["Whole Milk", "Greek Yogurt", "Butter", "Cheddar", "Cream"],
    ),
    (
        "GRO",
        "590300",
        &["Pasta Penne", "Rice Brown", "Canned Beans", "Oatmeal", "Flour"],
    ),
    (
        "HWR",
        "590400",
        &["Hex Bolt M6", "Wood Screw", "Washer", "Hinge", "Wall Plug"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut index = 0;

    while generated < count && index < count * 2 {
        let (category, prefix, names) = CATEGORIES[index % CATEGORIES.len()];
        let name = names[(index / CATEGORIES.len()) % names.len()];
        let product = generate_product(category, prefix, name, index);
        index += 1;

        if let Err(e) = db.products().create(&product, ChangeSource::Manual).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }
        generated += 1;
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    // Exercise the similar-match path once
    let probe = format!("{}999999", CATEGORIES[0].1);
    let resolution = db.resolver().resolve(&probe, "seed").await?;
    println!(
        "  Lookup '{}': exact={} similar={}",
        probe,
        resolution.exact.is_some(),
        resolution.similar.len()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(category: &str, prefix: &str, name: &str, seed: usize) -> NewProduct {
    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect();
    let sku = format!("{}-{}-{:03}", category, short.to_uppercase(), seed);

    // 13 digits: category prefix + running number
    let barcode = Some(format!("{}{:07}", prefix, seed));

    let quantity = ((seed * 37) % 120) as i64;
    let alert_threshold = 5 + (seed % 4) as i64 * 5;

    // Every seventh product expired last week, every fifth expires next month
    let today = Utc::now().date_naive();
    let expiry_date = if seed % 7 == 0 {
        Some(today - Duration::days(7))
    } else if seed % 5 == 0 {
        Some(today + Duration::days(30))
    } else {
        None
    };

    NewProduct {
        name: name.to_string(),
        sku,
        barcode,
        quantity,
        alert_threshold,
        expiry_date,
    }
}
