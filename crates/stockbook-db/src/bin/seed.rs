//! Seeds a Stockbook database with demo data.
//!
//! Usage:
//!   seed [--db <path>]
//!
//! Defaults to ./stockbook.db. Safe to re-run: it always adds fresh rows,
//! it never wipes existing data.

use std::time::Duration;

use chrono::Utc;
use stockbook_core::{CustomerInput, ProductInput, ProductionInput, PurchaseInput};
use stockbook_db::{Database, DbConfig, DbError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut db_path = String::from("./stockbook.db");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                if let Some(path) = args.next() {
                    db_path = path;
                } else {
                    eprintln!("--db requires a path argument");
                    std::process::exit(2);
                }
            }
            "--help" | "-h" => {
                println!("Usage: seed [--db <path>]");
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    if let Err(e) = run(&db_path).await {
        eprintln!("seed failed: {e}");
        std::process::exit(1);
    }
}

async fn run(db_path: &str) -> Result<(), DbError> {
    println!("Seeding {db_path} ...");

    let config = DbConfig::new(db_path).connect_timeout(Duration::from_secs(10));
    let db = Database::new(config).await?;

    // ------------------------------------------------------------------
    // Catalogue
    // ------------------------------------------------------------------
    let products = [
        ("wheat flour 25kg", 1_450_00, 1_650_00),
        ("maize meal 10kg", 520_00, 640_00),
        ("wheat bran 40kg", 380_00, 460_00),
        ("semolina 5kg", 310_00, 395_00),
    ];

    let mut product_ids = Vec::new();
    for (name, purchase, customer) in products {
        let product = db
            .products()
            .create(&ProductInput {
                name: name.to_string(),
                purchase_price_cents: purchase,
                customer_price_cents: customer,
            })
            .await?;
        println!("  product  {name}");
        product_ids.push(product.id);
    }

    // ------------------------------------------------------------------
    // Stock inflows
    // ------------------------------------------------------------------
    for product_id in &product_ids {
        db.products()
            .record_purchase(&PurchaseInput {
                product_id: product_id.clone(),
                purchase_unit_price_cents: 500_00,
                quantity: 40,
                purchase_date: Utc::now(),
            })
            .await?;
        db.products()
            .record_production(&ProductionInput {
                product_id: product_id.clone(),
                quantity: 15,
                production_date: Utc::now(),
            })
            .await?;
    }
    println!("  stocked  {} products (40 purchased + 15 produced each)", product_ids.len());

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------
    let customers = [
        ("Awa", "Diop", "770000001", false),
        ("Moussa", "Ba", "770000002", false),
        ("Fatou", "Ndiaye", "770000003", true),
    ];

    let mut customer_ids = Vec::new();
    for (given, surname, phone, is_supplier) in customers {
        let customer = db
            .customers()
            .create(&CustomerInput {
                given_name: given.to_string(),
                surname: surname.to_string(),
                phone_number: phone.to_string(),
                is_supplier,
            })
            .await?;
        println!("  customer {given} {surname}{}", if is_supplier { " (supplier)" } else { "" });
        customer_ids.push(customer.id);
    }

    // ------------------------------------------------------------------
    // A worked order: two lines, a partial payment
    // ------------------------------------------------------------------
    let order = db.orders().create_order(&customer_ids[0]).await?;
    db.orders().add_line_item(&order.id, &product_ids[0], 2).await?;
    db.orders().add_line_item(&order.id, &product_ids[1], 5).await?;

    let summary = db.orders().order_summary(&order.id).await?;
    db.orders()
        .record_payment(
            &order.id,
            summary.total_amount_cents / 2,
            stockbook_core::PaymentMethod::Cash,
        )
        .await?;

    let summary = db.orders().order_summary(&order.id).await?;
    println!(
        "  order    {} [{:?}] total {} paid {} remaining {}",
        order.id,
        summary.status,
        summary.total_amount(),
        summary.total_paid(),
        summary.remaining(),
    );

    println!(
        "Done: {} products, {} customers.",
        db.products().count().await?,
        db.customers().count().await?
    );

    db.close().await;
    Ok(())
}
