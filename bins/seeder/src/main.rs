//! Database seeder for Orderdesk development and testing.
//!
//! Seeds a handful of customers, a small film and wrap catalog priced in
//! several currencies, and orders that reference them, so invoices can be
//! generated against a fresh database.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use orderdesk_core::order::{LineItem, OrderItems, OrderStatus, PaymentStatus};
use orderdesk_db::repositories::{
    CreateCustomerInput, CreateOrderInput, CreateProductInput, CustomerFilter, ProductError,
};
use orderdesk_db::{CustomerRepository, OrderRepository, ProductRepository};
use orderdesk_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// `(id, brand, type, unit price, currency, unit cost, width, length)`
const PRODUCTS: [(&str, &str, &str, Decimal, &str, Decimal, Decimal, Decimal); 6] = [
    ("3M-DI-NOC-PS-957", "3M", "Decorating Film", dec!(42.00), "SGD", dec!(28.50), dec!(1.22), dec!(50)),
    ("3M-1080-G12", "3M", "Vinyl Wrap", dec!(38.00), "USD", dec!(24.00), dec!(1.52), dec!(25)),
    ("AVERY-SW900-190", "Avery Dennison", "Vinyl Wrap", dec!(35.50), "USD", dec!(21.75), dec!(1.52), dec!(25)),
    ("HEXIS-HX20000", "Hexis", "Vinyl Wrap", dec!(31.00), "EUR", dec!(19.40), dec!(1.52), dec!(30)),
    ("LLUMAR-CTX-40", "LLumar", "Window Film", dec!(4200.00), "JPY", dec!(2600.00), dec!(1.52), dec!(30.5)),
    ("SUNTEK-PPF-ULTRA", "SunTek", "Paint Protection Film", dec!(61.00), "GBP", dec!(40.00), dec!(1.52), dec!(15)),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = orderdesk_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding products...");
    seed_products(&db).await;

    println!("Seeding customers...");
    let customers = seed_customers(&db).await;

    println!("Seeding orders...");
    seed_orders(&db, &customers).await;

    println!("Seeding complete!");
}

/// Seeds the demo catalog, skipping products that already exist.
async fn seed_products(db: &DatabaseConnection) {
    let repo = ProductRepository::new(db.clone());

    for (id, brand, product_type, unit_price, currency, unit_cost, width, length) in PRODUCTS {
        let currency: CurrencyCode = currency.parse().expect("seed currency is valid");
        let input = CreateProductInput {
            id: id.to_string(),
            brand: brand.to_string(),
            product_type: product_type.to_string(),
            unit_price,
            price_currency: currency,
            unit_cost,
            cost_currency: currency,
            width: Some(width),
            length: Some(length),
            thickness: None,
        };

        match repo.create(input).await {
            Ok(product) => println!("  Created product: {}", product.id),
            Err(ProductError::DuplicateId(_)) => {
                println!("  Product {id} already exists, skipping...");
            }
            Err(e) => eprintln!("Failed to insert product {id}: {e}"),
        }
    }
}

/// Seeds demo customers unless some are already present.
async fn seed_customers(db: &DatabaseConnection) -> Vec<Uuid> {
    let repo = CustomerRepository::new(db.clone());

    let existing = repo
        .count(CustomerFilter::default())
        .await
        .expect("Failed to count customers");
    if existing > 0 {
        println!("  {existing} customers already exist, skipping...");
        return Vec::new();
    }

    let customers = [
        ("Acme Interiors Pte Ltd", "Lim Mei Ling", "meiling@acme-interiors.test", "+65 6555 0100"),
        ("Harbourfront Motors", "Rahul Nair", "rahul@harbourfront.test", "+65 6555 0142"),
        ("Kowloon Signage Co", "Chan Ka Wai", "kawai@kowloonsign.test", "+852 5555 0199"),
    ];

    let mut ids = Vec::with_capacity(customers.len());
    for (company, full_name, email, phone) in customers {
        let input = CreateCustomerInput {
            company: company.to_string(),
            full_name: Some(full_name.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            preferred_language: Some("en".to_string()),
            ..Default::default()
        };

        match repo.create(input).await {
            Ok(customer) => {
                println!("  Created customer: {company}");
                ids.push(customer.id);
            }
            Err(e) => eprintln!("Failed to insert customer {company}: {e}"),
        }
    }
    ids
}

/// Seeds two orders per new customer, spread over the last few weeks.
async fn seed_orders(db: &DatabaseConnection, customers: &[Uuid]) {
    if customers.is_empty() {
        println!("  No new customers, skipping orders...");
        return;
    }

    let repo = OrderRepository::new(db.clone());
    let now = Utc::now().naive_utc();
    let mut created = 0;

    for (n, customer_id) in customers.iter().enumerate() {
        for (k, (lines, total_price, status, payment)) in order_templates().into_iter().enumerate() {
            let items = OrderItems::new(
                lines
                    .iter()
                    .map(|(product_id, quantity)| LineItem {
                        product_id: (*product_id).into(),
                        quantity: *quantity,
                    })
                    .collect(),
            )
            .expect("seed line items are valid");

            let days_ago = i64::try_from(n * 7 + k * 3).unwrap_or_default();
            let input = CreateOrderInput {
                items,
                customer_id: *customer_id,
                order_status: status,
                payment_status: payment,
                notes: Some("Seeded order".to_string()),
                total_price,
            };

            match repo.create(input, now - Duration::days(days_ago)).await {
                Ok(order) => {
                    println!("  Created order: {}", order.id);
                    created += 1;
                }
                Err(e) => eprintln!("Failed to insert order: {e}"),
            }
        }
    }

    println!("  Created {created} orders");
}

/// Line items, agreed total (SGD) and statuses of each seeded order.
type OrderTemplate = (Vec<(&'static str, u32)>, Decimal, OrderStatus, PaymentStatus);

fn order_templates() -> Vec<OrderTemplate> {
    vec![
        (
            vec![("3M-DI-NOC-PS-957", 4), ("LLUMAR-CTX-40", 2)],
            dec!(241.92),
            OrderStatus::Delivered,
            PaymentStatus::Paid,
        ),
        (
            vec![("3M-1080-G12", 3), ("AVERY-SW900-190", 1), ("SUNTEK-PPF-ULTRA", 2)],
            dec!(409.23),
            OrderStatus::Pending,
            PaymentStatus::Pending,
        ),
    ]
}
