//! `stockroom products ...`

use anyhow::Result;
use chrono::Local;

use stockroom_core::{NewProduct, Product, ProductPatch};

use crate::args::{AddArgs, EditArgs, ProductCommand};
use crate::client::ApiClient;

pub async fn run(client: &ApiClient, command: ProductCommand) -> Result<()> {
    match command {
        ProductCommand::List => {
            let products = client.list_products().await?;
            print_table(&products);
        }
        ProductCommand::Show { id } => {
            let product = client.get_product(id).await?;
            print_detail(&product);
        }
        ProductCommand::Add(args) => {
            let source = args.source;
            let product = client.create_product(&new_product(args), source).await?;
            println!("Added product {} ({})", product.id, product.sku);
        }
        ProductCommand::Edit(args) => {
            let (id, source) = (args.id, args.source);
            let patch = patch_from(args);
            if patch.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }
            let product = client.update_product(id, &patch, source).await?;
            print_detail(&product);
        }
        ProductCommand::Delete { id, source } => {
            client.delete_product(id, source).await?;
            println!("Deleted product {}", id);
        }
    }
    Ok(())
}

fn new_product(args: AddArgs) -> NewProduct {
    NewProduct {
        name: args.name,
        sku: args.sku,
        barcode: args.barcode,
        quantity: args.quantity,
        alert_threshold: args.threshold,
        expiry_date: args.expiry,
    }
    .normalized()
}

/// Only flags that were given end up in the patch.
pub(crate) fn patch_from(args: EditArgs) -> ProductPatch {
    let barcode = if args.clear_barcode {
        Some(None)
    } else {
        args.barcode.map(Some)
    };
    let expiry_date = if args.clear_expiry {
        Some(None)
    } else {
        args.expiry.map(Some)
    };

    ProductPatch {
        name: args.name,
        sku: args.sku,
        barcode,
        quantity: args.quantity,
        alert_threshold: args.threshold,
        expiry_date,
    }
    .normalized()
}

/// Short flag for the list view.
fn flag(product: &Product) -> &'static str {
    if product.is_expired(Local::now().date_naive()) {
        "EXPIRED"
    } else if product.is_low_stock() {
        "LOW"
    } else {
        ""
    }
}

fn print_table(products: &[Product]) {
    if products.is_empty() {
        println!("No products");
        return;
    }

    println!(
        "{:>5}  {:<28} {:<16} {:<15} {:>6} {:>6}  {:<10} {}",
        "ID", "NAME", "SKU", "BARCODE", "QTY", "ALERT", "EXPIRY", ""
    );
    for p in products {
        println!(
            "{:>5}  {:<28} {:<16} {:<15} {:>6} {:>6}  {:<10} {}",
            p.id,
            truncate(&p.name, 28),
            truncate(&p.sku, 16),
            p.barcode.as_deref().unwrap_or("-"),
            p.quantity,
            p.alert_threshold,
            p.expiry_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            flag(p)
        );
    }
}

pub(crate) fn print_detail(product: &Product) {
    println!("#{} {}", product.id, product.name);
    println!("  SKU:       {}", product.sku);
    println!("  Barcode:   {}", product.barcode.as_deref().unwrap_or("-"));
    println!("  Quantity:  {} (alert at {})", product.quantity, product.alert_threshold);
    match product.expiry_date {
        Some(date) => println!("  Expires:   {}", date),
        None => println!("  Expires:   -"),
    }
    let flag = flag(product);
    if !flag.is_empty() {
        println!("  Status:    {}", flag);
    }
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockroom_core::ChangeSource;

    fn edit(id: i64) -> EditArgs {
        EditArgs {
            id,
            name: None,
            sku: None,
            barcode: None,
            clear_barcode: false,
            quantity: None,
            threshold: None,
            expiry: None,
            clear_expiry: false,
            source: ChangeSource::Manual,
        }
    }

    #[test]
    fn test_patch_only_carries_given_flags() {
        let patch = patch_from(EditArgs {
            quantity: Some(3),
            ..edit(1)
        });
        assert_eq!(patch.quantity, Some(3));
        assert_eq!(patch.barcode, None);
        assert_eq!(patch.expiry_date, None);
        assert!(!patch.is_empty());
        assert!(patch_from(edit(1)).is_empty());
    }

    #[test]
    fn test_clear_flags_become_explicit_nulls() {
        let patch = patch_from(EditArgs {
            clear_barcode: true,
            clear_expiry: true,
            ..edit(1)
        });
        assert_eq!(patch.barcode, Some(None));
        assert_eq!(patch.expiry_date, Some(None));
    }

    #[test]
    fn test_expiry_is_set() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 31).unwrap();
        let patch = patch_from(EditArgs {
            expiry: Some(date),
            ..edit(1)
        });
        assert_eq!(patch.expiry_date, Some(Some(date)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Widget", 10), "Widget");
        assert_eq!(truncate("Sparkling Water", 6), "Spark…");
    }
}
