//! # Seed Data Generator
//!
//! Populates the database with a demo webshop for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/webshop.db
//! cargo run -p webshop-db --bin seed
//!
//! # Specify database path
//! cargo run -p webshop-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! ## Generated Data
//! - One active webshop
//! - A category tree: each top-level category with two sub-categories
//! - Stand-alone products in every sub-category, priced either VAT-inclusive
//!   or VAT-exclusive so both derivation directions are exercised
//! - A parent "Yoga course" with one child per weekday

use std::env;
use std::str::FromStr;

use webshop_core::{Money, Product, ProductStructure, VatRate};
use webshop_db::{Database, DbConfig, NewCategory, NewWebshop};

/// Top-level categories with their sub-categories and products.
const CATALOG: &[(&str, &[(&str, &[(&str, &str)])])] = &[
    (
        "Tea",
        &[
            (
                "Green tea",
                &[("Sencha", "4.95"), ("Gyokuro", "12.50"), ("Matcha", "18.00")],
            ),
            (
                "Black tea",
                &[("Assam", "3.95"), ("Darjeeling", "6.75"), ("Earl Grey", "4.25")],
            ),
        ],
    ),
    (
        "Yoga",
        &[
            (
                "Mats",
                &[("Travel mat", "29.95"), ("Studio mat", "49.00")],
            ),
            (
                "Accessories",
                &[("Block", "12.95"), ("Strap", "7.50"), ("Bolster", "39.95")],
            ),
        ],
    ),
];

const WEEKDAYS: &[&str] = &["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = "./data/webshop.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: seed [--db PATH]");
                println!();
                println!("Options:");
                println!("  --db, -d PATH    Database path (default: ./data/webshop.db)");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!("🌱 Webshop seed data generator");
    println!("   Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let webshop = db
        .webshops()
        .insert(&NewWebshop {
            name: "Demo webshop".to_string(),
            active: true,
        })
        .await?;

    let mut product_count = 0;
    for (top_name, subcategories) in CATALOG {
        let top = db
            .categories()
            .insert(&NewCategory {
                webshop_id: webshop.id,
                parent_id: None,
                name: top_name.to_string(),
                description: String::new(),
                active: true,
            })
            .await?;

        for (sub_name, products) in subcategories.iter() {
            let sub = db
                .categories()
                .insert(&NewCategory {
                    webshop_id: webshop.id,
                    parent_id: Some(top.id),
                    name: sub_name.to_string(),
                    description: String::new(),
                    active: true,
                })
                .await?;

            for (idx, (name, price)) in products.iter().enumerate() {
                let mut product = Product::new(webshop.id, *name);
                product.category_id = Some(sub.id);
                product.featured = idx == 0;
                product.pcs_in_stock = Some(10 + idx as u32 * 5);
                let amount = Money::from_str(price)?;
                if idx % 2 == 0 {
                    product.price = Some(amount);
                } else {
                    product.vat = VatRate::High;
                    product.price_excl_vat = Some(amount);
                }
                db.products().save_product(product).await?;
                product_count += 1;
            }
        }

        if *top_name == "Yoga" {
            let mut course = Product::new(webshop.id, "Yoga course");
            course.structure = ProductStructure::Parent;
            course.category_id = Some(top.id);
            course.vat = VatRate::High;
            let course = db.products().save_product(course).await?;
            product_count += 1;

            for day in WEEKDAYS {
                let mut variant = Product::new(webshop.id, *day);
                variant.structure = ProductStructure::Child;
                variant.parent_id = course.id;
                variant.description = format!("Evening class on {day}");
                variant.pcs_in_stock = Some(12);
                variant.price = Some(Money::from_str("15.00")?);
                db.products().save_product(variant).await?;
                product_count += 1;
            }
        }
    }

    println!("✅ Seeded webshop #{} with {} products", webshop.id, product_count);
    println!(
        "   Categories: {}",
        db.webshops().num_categories(webshop.id).await?
    );

    Ok(())
}
