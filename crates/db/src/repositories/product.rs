//! Product repository for database operations.

use std::collections::HashMap;

use orderdesk_core::invoice::{InvoiceError, ProductCatalog, ProductSnapshot};
use orderdesk_shared::types::{CurrencyCode, CurrencyCodeError, PageRequest, ProductId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use thiserror::Error;

use crate::entities::products;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// A product with this id already exists.
    #[error("Product already exists: {0}")]
    DuplicateId(String),

    /// Input failed validation.
    #[error("Invalid product: {0}")]
    Invalid(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Catalog key chosen by the caller.
    pub id: String,
    /// Brand name.
    pub brand: String,
    /// Product type, e.g. "Vinyl Wrap".
    pub product_type: String,
    /// List price per unit.
    pub unit_price: Decimal,
    /// Currency of the list price.
    pub price_currency: CurrencyCode,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Currency of the cost.
    pub cost_currency: CurrencyCode,
    /// Width in metres.
    pub width: Option<Decimal>,
    /// Length in metres.
    pub length: Option<Decimal>,
    /// Thickness in metres.
    pub thickness: Option<Decimal>,
}

/// Input for updating a product.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// New brand.
    pub brand: Option<String>,
    /// New product type.
    pub product_type: Option<String>,
    /// New list price.
    pub unit_price: Option<Decimal>,
    /// New price currency.
    pub price_currency: Option<CurrencyCode>,
    /// New cost.
    pub unit_cost: Option<Decimal>,
    /// New cost currency.
    pub cost_currency: Option<CurrencyCode>,
    /// New width.
    pub width: Option<Option<Decimal>>,
    /// New length.
    pub length: Option<Option<Decimal>>,
    /// New thickness.
    pub thickness: Option<Option<Decimal>>,
    /// New validity flag.
    pub is_valid: Option<bool>,
}

/// Filter options for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Include products marked invalid.
    pub display_invalid: bool,
    /// Exact brand match.
    pub brand: Option<String>,
    /// Exact product type match.
    pub product_type: Option<String>,
}

/// Product repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists products ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Vec<products::Model>, DbErr> {
        filtered(filter)
            .order_by_asc(products::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
    }

    /// Counts products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: &ProductFilter) -> Result<u64, DbErr> {
        filtered(filter).count(&self.db).await
    }

    /// Finds a product by id, valid or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<products::Model>, DbErr> {
        products::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
    }

    /// Fetches the products named in `ids`, in request order.
    ///
    /// Unknown ids are skipped. Repeated ids yield the product once.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<products::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.db)
            .await?;

        Ok(in_request_order(ids, found))
    }

    /// Creates a new product.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The id is blank or a price is negative
    /// - A product with the same id exists
    /// - The insert fails
    pub async fn create(&self, input: CreateProductInput) -> Result<products::Model, ProductError> {
        validate_create(&input)?;

        if self.find_by_id(&input.id).await?.is_some() {
            return Err(ProductError::DuplicateId(input.id));
        }

        let now = chrono::Utc::now().into();
        let product = products::ActiveModel {
            id: Set(input.id),
            brand: Set(input.brand),
            product_type: Set(input.product_type),
            unit_price: Set(input.unit_price),
            price_currency: Set(input.price_currency.to_string()),
            unit_cost: Set(input.unit_cost),
            cost_currency: Set(input.cost_currency.to_string()),
            width: Set(input.width),
            length: Set(input.length),
            thickness: Set(input.thickness),
            is_valid: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(product.insert(&self.db).await?)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist, a new price is
    /// negative, or the update fails.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateProductInput,
    ) -> Result<products::Model, ProductError> {
        for price in [input.unit_price, input.unit_cost].into_iter().flatten() {
            ensure_non_negative(price)?;
        }

        let product = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        let mut active: products::ActiveModel = product.into();

        if let Some(brand) = input.brand {
            active.brand = Set(brand);
        }
        if let Some(product_type) = input.product_type {
            active.product_type = Set(product_type);
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(price_currency) = input.price_currency {
            active.price_currency = Set(price_currency.to_string());
        }
        if let Some(unit_cost) = input.unit_cost {
            active.unit_cost = Set(unit_cost);
        }
        if let Some(cost_currency) = input.cost_currency {
            active.cost_currency = Set(cost_currency.to_string());
        }
        if let Some(width) = input.width {
            active.width = Set(width);
        }
        if let Some(length) = input.length {
            active.length = Set(length);
        }
        if let Some(thickness) = input.thickness {
            active.thickness = Set(thickness);
        }
        if let Some(is_valid) = input.is_valid {
            active.is_valid = Set(is_valid);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Marks a product invalid. Orders referencing it can still be invoiced.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the update fails.
    pub async fn soft_delete(&self, id: &str) -> Result<(), ProductError> {
        let result = products::Entity::update_many()
            .col_expr(products::Column::IsValid, Expr::value(false))
            .col_expr(products::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(products::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ProductError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl ProductCatalog for ProductRepository {
    async fn find_product(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, InvoiceError> {
        let product = self
            .find_by_id(id.as_str())
            .await
            .map_err(|e| InvoiceError::Catalog(e.to_string()))?;

        product
            .map(|p| to_snapshot(&p))
            .transpose()
            .map_err(|e| InvoiceError::Catalog(format!("product '{id}': {e}")))
    }
}

/// Catalog view of a stored product.
///
/// # Errors
///
/// Returns an error if the stored price currency is not a valid code.
pub fn to_snapshot(product: &products::Model) -> Result<ProductSnapshot, CurrencyCodeError> {
    Ok(ProductSnapshot {
        id: ProductId::new(product.id.as_str()),
        brand: product.brand.clone(),
        product_type: product.product_type.clone(),
        unit_price: product.unit_price,
        price_currency: product.price_currency.parse()?,
    })
}

fn filtered(filter: &ProductFilter) -> Select<products::Entity> {
    let mut query = products::Entity::find();
    if !filter.display_invalid {
        query = query.filter(products::Column::IsValid.eq(true));
    }
    if let Some(brand) = &filter.brand {
        query = query.filter(products::Column::Brand.eq(brand.as_str()));
    }
    if let Some(product_type) = &filter.product_type {
        query = query.filter(products::Column::ProductType.eq(product_type.as_str()));
    }
    query
}

fn validate_create(input: &CreateProductInput) -> Result<(), ProductError> {
    if input.id.trim().is_empty() {
        return Err(ProductError::Invalid("id is required".to_string()));
    }
    if input.brand.trim().is_empty() {
        return Err(ProductError::Invalid("brand is required".to_string()));
    }
    ensure_non_negative(input.unit_price)?;
    ensure_non_negative(input.unit_cost)
}

fn ensure_non_negative(amount: Decimal) -> Result<(), ProductError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ProductError::Invalid(format!(
            "price must not be negative, got {amount}"
        )));
    }
    Ok(())
}

fn in_request_order(ids: &[String], found: Vec<products::Model>) -> Vec<products::Model> {
    let mut by_id: HashMap<String, products::Model> =
        found.into_iter().map(|p| (p.id.clone(), p)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn product(id: &str, price: Decimal, currency: &str) -> products::Model {
        let now = chrono::Utc::now().fixed_offset();
        products::Model {
            id: id.to_string(),
            brand: "3M".to_string(),
            product_type: "Decorating Film".to_string(),
            unit_price: price,
            price_currency: currency.to_string(),
            unit_cost: dec!(1.00),
            cost_currency: currency.to_string(),
            width: Some(dec!(1.22)),
            length: Some(dec!(50)),
            thickness: None,
            is_valid: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_input(id: &str) -> CreateProductInput {
        CreateProductInput {
            id: id.to_string(),
            brand: "3M".to_string(),
            product_type: "Vinyl Wrap".to_string(),
            unit_price: dec!(10.00),
            price_currency: CurrencyCode::SGD,
            unit_cost: dec!(4.00),
            cost_currency: CurrencyCode::USD,
            width: None,
            length: None,
            thickness: None,
        }
    }

    #[test]
    fn test_filter_applies_brand_and_type() {
        let sql = filtered(&ProductFilter {
            display_invalid: true,
            brand: Some("3M".to_string()),
            product_type: Some("Vinyl Wrap".to_string()),
        })
        .build(DatabaseBackend::Postgres)
        .to_string();
        assert!(sql.contains("\"brand\" = '3M'"), "{sql}");
        assert!(sql.contains("\"product_type\" = 'Vinyl Wrap'"), "{sql}");
        assert!(!sql.contains("\"is_valid\" = "), "{sql}");
    }

    #[test]
    fn test_snapshot_carries_price_and_currency() {
        let snapshot = to_snapshot(&product("P1", dec!(5.00), "usd")).unwrap();
        assert_eq!(snapshot.id.as_str(), "P1");
        assert_eq!(snapshot.unit_price, dec!(5.00));
        assert_eq!(snapshot.price_currency, CurrencyCode::USD);
        assert_eq!(snapshot.description(), "P1 3M Decorating Film");
    }

    #[test]
    fn test_snapshot_rejects_corrupt_currency() {
        assert!(to_snapshot(&product("P1", dec!(5.00), "DOLLARS")).is_err());
    }

    #[test]
    fn test_in_request_order_skips_missing_and_repeats() {
        let ids = ["B", "missing", "A", "B"].map(String::from);
        let found = vec![
            product("A", dec!(1), "SGD"),
            product("B", dec!(2), "SGD"),
        ];
        let ordered: Vec<_> = in_request_order(&ids, found)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ordered, ["B", "A"]);
    }

    #[rstest]
    #[case("", dec!(1), dec!(1))]
    #[case("  ", dec!(1), dec!(1))]
    #[case("P1", dec!(-0.01), dec!(1))]
    #[case("P1", dec!(1), dec!(-5))]
    fn test_validate_create_rejects(
        #[case] id: &str,
        #[case] price: Decimal,
        #[case] cost: Decimal,
    ) {
        let mut input = create_input(id);
        input.unit_price = price;
        input.unit_cost = cost;
        assert!(matches!(
            validate_create(&input),
            Err(ProductError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_create_accepts_free_items() {
        let mut input = create_input("SAMPLE");
        input.unit_price = Decimal::ZERO;
        assert!(validate_create(&input).is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![product("P1", dec!(10), "SGD")]])
            .into_connection();
        let repo = ProductRepository::new(db);

        let err = repo.create(create_input("P1")).await.unwrap_err();
        assert!(matches!(err, ProductError::DuplicateId(id) if id == "P1"));
    }

    #[tokio::test]
    async fn test_catalog_returns_snapshot() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![product("P2", dec!(5.00), "USD")]])
            .into_connection();
        let repo = ProductRepository::new(db);

        let snapshot = repo
            .find_product(&ProductId::new("P2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.price_currency, CurrencyCode::USD);
    }

    #[tokio::test]
    async fn test_catalog_missing_product_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<products::Model>::new()])
            .into_connection();
        let repo = ProductRepository::new(db);

        assert!(
            repo.find_product(&ProductId::new("GONE"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = ProductRepository::new(db);

        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
