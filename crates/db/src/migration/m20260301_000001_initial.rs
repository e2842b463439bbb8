//! Initial schema: customers, products and orders.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;
        db.execute_unprepared(ORDERS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS orders CASCADE;
             DROP TABLE IF EXISTS products CASCADE;
             DROP TABLE IF EXISTS customers CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company VARCHAR(255) NOT NULL CHECK (length(trim(company)) > 0),
    description TEXT,
    full_name VARCHAR(255),
    email VARCHAR(255),
    phone VARCHAR(255),
    gender VARCHAR(255),
    preferred_language VARCHAR(64),
    address TEXT,
    profile_image_key VARCHAR(512),
    is_valid BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_customers_company ON customers(company);
CREATE INDEX idx_customers_valid ON customers(is_valid);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id VARCHAR(128) PRIMARY KEY,
    brand VARCHAR(255) NOT NULL,
    product_type VARCHAR(255) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (unit_price >= 0),
    price_currency CHAR(3) NOT NULL,
    unit_cost NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (unit_cost >= 0),
    cost_currency CHAR(3) NOT NULL,
    width NUMERIC(19, 4),
    length NUMERIC(19, 4),
    thickness NUMERIC(19, 4),
    is_valid BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_products_brand ON products(brand);
CREATE INDEX idx_products_type ON products(product_type);
";

const ORDERS_SQL: &str = r"
CREATE TABLE orders (
    id VARCHAR(32) PRIMARY KEY,
    order_items TEXT NOT NULL,
    customer_id UUID NOT NULL REFERENCES customers(id),
    order_date TIMESTAMP NOT NULL,
    order_update_date TIMESTAMP NOT NULL,
    order_status VARCHAR(16) NOT NULL DEFAULT 'Pending'
        CHECK (order_status IN ('Pending', 'Processing', 'Shipped', 'Delivered', 'Cancelled')),
    payment_status VARCHAR(16) NOT NULL DEFAULT 'Pending'
        CHECK (payment_status IN ('Pending', 'Paid', 'Failed')),
    notes TEXT,
    total_price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_valid BOOLEAN NOT NULL DEFAULT TRUE
);

-- Listing sorts and filters by order date
CREATE INDEX idx_orders_date ON orders(order_date DESC);
CREATE INDEX idx_orders_customer ON orders(customer_id, order_date DESC);
CREATE INDEX idx_orders_status ON orders(order_status);
";
