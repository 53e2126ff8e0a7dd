//! # Seed Data Generator
//!
//! Populates a development database with a small restaurant catalog and an
//! open shift.
//!
//! ## Usage
//! ```bash
//! cargo run -p bistro-db --bin seed
//!
//! # Specify database path and attendant
//! cargo run -p bistro-db --bin seed -- --db ./data/bistro.db --attendant maria
//! ```
//!
//! ## Generated Catalog
//! - Pizza: Small/Medium/Large, quantities 0.5 and 1, one product per size
//! - Borders: complements sized like the pizzas
//! - Drinks: 350ml/600ml, quantities 1 and 2

use std::env;

use bistro_core::{Category, Money, Product, QuantityOption, Shift, Size};
use bistro_db::{Database, DbConfig};

/// (category, sizes with price in cents, quantity options, product names)
const CATALOG: &[(&str, &[(&str, i64)], &[f64], &[&str])] = &[
    (
        "Pizza",
        &[("Small", 2990), ("Medium", 3890), ("Large", 4790)],
        &[0.5, 1.0],
        &["Margherita", "Calabresa", "Four Cheese", "Portuguesa", "Chicken"],
    ),
    (
        "Borders",
        &[("Small", 600), ("Medium", 800), ("Large", 1000)],
        &[1.0],
        &["Cheese border", "Chocolate border"],
    ),
    (
        "Drinks",
        &[("350ml", 650), ("600ml", 950)],
        &[1.0, 2.0],
        &["Cola", "Guarana", "Orange Juice", "Water"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bistro_dev.db");
    let mut attendant = String::from("attendant-dev");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--attendant" | "-a" => {
                if i + 1 < args.len() {
                    attendant = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bistro Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./bistro_dev.db)");
                println!("  -a, --attendant <ID>     Attendant of the opened shift");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bistro Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
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

    let repo = db.products();
    let mut generated = 0;

    for (category_name, sizes, quantities, products) in CATALOG {
        let category = Category::new(*category_name);
        repo.insert_category(&category).await?;

        for (size_name, _) in sizes.iter() {
            repo.insert_size(&Size::new(*size_name, &category.id)).await?;
        }
        for quantity in quantities.iter() {
            repo.insert_quantity(&QuantityOption::new(*quantity, &category.id)).await?;
        }

        for product_name in products.iter() {
            for (size_name, price_cents) in sizes.iter() {
                let product = Product::new(
                    *product_name,
                    Money::from_cents(*price_cents),
                    &category.id,
                    *size_name,
                );

                if let Err(e) = repo.insert(&product).await {
                    eprintln!("Failed to insert {} ({}): {}", product.name, product.size, e);
                    continue;
                }
                generated += 1;
            }
        }

        println!("  {}: {} sizes, {} products", category_name, sizes.len(), products.len());
    }

    println!("✓ Generated {} products", generated);

    if db.shifts().get_open().await?.is_none() {
        let shift = Shift::open(attendant)?;
        db.shifts().insert(&shift).await?;
        println!("✓ Opened shift {}", shift.id);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
