//! # Seed Data Generator
//!
//! Populates the database with demo catalog data for development.
//!
//! ## Usage
//! ```bash
//! # Default: ./backoffice_dev.db, 200 products
//! cargo run -p backoffice-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p backoffice-db --bin seed -- --count 500 --db ./data/backoffice.db
//! ```
//!
//! ## Generated Data
//! - Five product families (Beverages, Snacks, Dairy, Bakery, Household)
//! - Products with valid EAN-13 barcodes and deterministic prices
//! - One bulk case wired to two selling units through BOM links
//! - A handful of loyalty customers with ledger history
//! - Two registers, ready for till sessions

use chrono::Utc;
use std::env;

use backoffice_core::bom::PricingStrategy;
use backoffice_core::labels::normalize_ean13;
use backoffice_core::{BomLink, Customer, LoyaltyEntry, LoyaltyKind, Product, ProductFamily, Register};
use backoffice_db::repository::bom::generate_bom_link_id;
use backoffice_db::repository::customer::{generate_customer_id, generate_loyalty_entry_id};
use backoffice_db::repository::family::generate_family_id;
use backoffice_db::repository::product::generate_product_id;
use backoffice_db::repository::till::generate_register_id;
use backoffice_db::{Database, DbConfig};

/// Family name, then base product names within it.
const FAMILIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Cola", "Lemon Soda", "Orange Soda", "Spring Water", "Energy Drink", "Iced Tea",
            "Apple Juice", "Mango Juice", "Sparkling Water", "Ginger Ale",
        ],
    ),
    (
        "Snacks",
        &[
            "Salted Chips", "Nacho Chips", "Pretzels", "Salted Peanuts", "Trail Mix",
            "Chocolate Bar", "Gummy Bears", "Crackers", "Popcorn", "Biscuits",
        ],
    ),
    (
        "Dairy",
        &[
            "Whole Milk", "Skim Milk", "Butter", "Cheddar Cheese", "Yogurt", "Cream",
            "Mozzarella", "Eggs Dozen", "Cottage Cheese", "Sour Cream",
        ],
    ),
    (
        "Bakery",
        &[
            "White Bread", "Wheat Bread", "Baguette", "Croissant", "Bagels", "Muffins",
            "Dinner Rolls", "Rye Bread", "Pita Bread", "Naan",
        ],
    ),
    (
        "Household",
        &[
            "Dish Soap", "Laundry Powder", "Paper Towels", "Trash Bags", "Sponges",
            "Glass Cleaner", "Bleach", "Air Freshener", "Matches", "Candles",
        ],
    ),
];

/// Size variants and their price bumps in cents.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Regular", 50),
    ("Large", 120),
    ("Family Pack", 280),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./backoffice_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Backoffice Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./backoffice_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Backoffice Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Families first; products reference them
    let mut family_ids = Vec::new();
    for (order, (name, _)) in FAMILIES.iter().enumerate() {
        let now = Utc::now();
        let family = ProductFamily {
            id: generate_family_id(),
            name: name.to_string(),
            description: None,
            display_order: order as i64,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.families().insert(&family).await?;
        family_ids.push(family.id);
    }
    println!("✓ Created {} families", family_ids.len());

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (family_idx, (_, names)) in FAMILIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = family_idx * 1000 + name_idx * 10 + size_idx;
                let product = generate_product(
                    &family_ids[family_idx],
                    name,
                    size,
                    *price_addon,
                    seed,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    seed_bom_demo(&db, &family_ids[0]).await?;
    println!("✓ Created BOM demo (24-can case → can, six-pack)");

    let customers = seed_customers(&db).await?;
    println!("✓ Created {} loyalty customers", customers);

    for name in ["Front Counter", "Back Counter"] {
        let now = Utc::now();
        let register = Register {
            id: generate_register_id(),
            name: name.to_string(),
            location: Some("Main floor".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.till().insert_register(&register).await?;
    }
    println!("✓ Created 2 registers");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic demo data.
fn generate_product(
    family_id: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    let code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{:04}", code, seed);

    // Valid EAN-13: 12-digit body, check digit appended
    let barcode = normalize_ean13(&format!("590{:09}", seed));

    // Base price $1.49-$9.49 plus the size bump
    let base_price = 149 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Cost lands at 60-79% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_cents = price_cents * cost_pct / 100;

    Product {
        id: generate_product_id(),
        sku,
        barcode,
        name: format!("{} {}", name, size),
        description: None,
        family_id: Some(family_id.to_string()),
        price_cents,
        cost_cents,
        pack_quantity: 1,
        stock_on_hand: (seed % 101) as i64,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// One bulk case plus two selling units derived from it.
async fn seed_bom_demo(db: &Database, family_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();

    let case = Product {
        id: generate_product_id(),
        sku: "COLA-CASE24".to_string(),
        barcode: normalize_ean13("590000900001"),
        name: "Cola 24-Can Case".to_string(),
        description: Some("Bulk stock for single-can sales".to_string()),
        family_id: Some(family_id.to_string()),
        price_cents: 1440,
        cost_cents: 960,
        pack_quantity: 24,
        stock_on_hand: 1152, // 48 cases worth of cans
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&case).await?;

    let can = Product {
        id: generate_product_id(),
        sku: "COLA-CAN".to_string(),
        barcode: normalize_ean13("590000900002"),
        name: "Cola Single Can".to_string(),
        description: None,
        family_id: Some(family_id.to_string()),
        price_cents: 60,
        cost_cents: 40,
        pack_quantity: 1,
        stock_on_hand: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&can).await?;

    let six_pack = Product {
        id: generate_product_id(),
        sku: "COLA-SIX".to_string(),
        barcode: normalize_ean13("590000900003"),
        name: "Cola Six-Pack".to_string(),
        description: None,
        family_id: Some(family_id.to_string()),
        price_cents: 400,
        cost_cents: 240,
        pack_quantity: 1,
        stock_on_hand: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&six_pack).await?;

    db.bom()
        .insert(&BomLink {
            id: generate_bom_link_id(),
            base_product_id: case.id.clone(),
            unit_product_id: can.id,
            unit_quantity: 1,
            strategy: PricingStrategy::RetailProRata,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    db.bom()
        .insert(&BomLink {
            id: generate_bom_link_id(),
            base_product_id: case.id,
            unit_product_id: six_pack.id,
            unit_quantity: 6,
            strategy: PricingStrategy::Fixed { price_cents: 400 },
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    Ok(())
}

/// A few customers with card numbers and ledger history.
async fn seed_customers(db: &Database) -> Result<usize, Box<dyn std::error::Error>> {
    let names = [
        "Amira Khan",
        "Bilal Ahmed",
        "Carla Mendes",
        "Dawid Nowak",
        "Elena Petrova",
        "Farhan Qureshi",
    ];

    for (idx, name) in names.iter().enumerate() {
        let now = Utc::now();
        let customer = Customer {
            id: generate_customer_id(),
            name: name.to_string(),
            phone: Some(format!("555-01{:02}", idx)),
            email: None,
            loyalty_card: Some(format!("LC-{:04}", 1000 + idx)),
            points_balance: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await?;

        db.customers()
            .append_loyalty(&LoyaltyEntry {
                id: generate_loyalty_entry_id(),
                customer_id: customer.id.clone(),
                kind: LoyaltyKind::Earn,
                points: 20 + idx as i64 * 5,
                note: Some("welcome bonus".to_string()),
                created_at: Utc::now(),
            })
            .await?;
    }

    Ok(names.len())
}
