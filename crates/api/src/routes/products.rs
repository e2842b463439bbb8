//! Product catalog routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use orderdesk_db::entities::products;
use orderdesk_db::repositories::{
    CreateProductInput, ProductFilter, ProductRepository, UpdateProductInput,
};
use orderdesk_shared::types::{CountResponse, CurrencyCode, ListResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::{MessageResponse, page_request};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppJson, AppQuery};
use crate::{AppState, middleware::AuthUser};

/// Upper bound on ids in one batch lookup.
const MAX_BATCH_NAMES: usize = 500;

/// Creates the product routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/", get(list_products).post(create_product))
        .route("/products/product_count", get(product_count))
        .route("/products/batch-by-names", post(batch_by_names))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Query parameters for listing products.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// Rows to skip.
    pub skip: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Include products marked invalid.
    #[serde(default)]
    pub display_invalid: bool,
    /// Exact brand match.
    pub brand: Option<String>,
    /// Exact product type match.
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

impl ListProductsQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            display_invalid: self.display_invalid,
            brand: self.brand.clone().filter(|b| !b.is_empty()),
            product_type: self.product_type.clone().filter(|t| !t.is_empty()),
        }
    }
}

/// Request body for creating a product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Catalog key.
    pub id: String,
    /// Brand name.
    pub brand: String,
    /// Product type.
    #[serde(rename = "type")]
    pub product_type: String,
    /// List price per unit.
    pub unit_price: Decimal,
    /// Currency of the list price.
    pub price_currency: CurrencyCode,
    /// Cost per unit.
    #[serde(default)]
    pub unit_cost: Decimal,
    /// Currency of the cost; defaults to the price currency.
    pub cost_currency: Option<CurrencyCode>,
    /// Width.
    pub width: Option<Decimal>,
    /// Length.
    pub length: Option<Decimal>,
    /// Thickness.
    pub thickness: Option<Decimal>,
}

/// Request body for updating a product. Absent fields are left as is.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    /// Brand name.
    pub brand: Option<String>,
    /// Product type.
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    /// List price per unit.
    pub unit_price: Option<Decimal>,
    /// Currency of the list price.
    pub price_currency: Option<CurrencyCode>,
    /// Cost per unit.
    pub unit_cost: Option<Decimal>,
    /// Currency of the cost.
    pub cost_currency: Option<CurrencyCode>,
    /// Width.
    pub width: Option<Decimal>,
    /// Length.
    pub length: Option<Decimal>,
    /// Thickness.
    pub thickness: Option<Decimal>,
    /// Validity flag.
    pub is_valid: Option<bool>,
}

/// Request body for a batch lookup.
#[derive(Debug, Deserialize)]
pub struct BatchByNamesRequest {
    /// Product ids to fetch.
    pub names: Vec<String>,
}

/// GET `/products`
async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListProductsQuery>,
) -> ApiResult<Json<ListResponse<products::Model>>> {
    let repo = ProductRepository::new((*state.db).clone());
    let filter = query.filter();

    let count = repo.count(&filter).await?;
    let data = repo
        .list(&filter, page_request(query.skip, query.limit))
        .await?;

    Ok(Json(ListResponse::new(data, count)))
}

/// GET `/products/product_count`
async fn product_count(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListProductsQuery>,
) -> ApiResult<Json<CountResponse>> {
    let repo = ProductRepository::new((*state.db).clone());
    let count = repo.count(&query.filter()).await?;
    Ok(Json(CountResponse { count }))
}

/// GET `/products/{id}`
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<products::Model>> {
    let repo = ProductRepository::new((*state.db).clone());
    repo.find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Product {id}")))
}

/// POST `/products/batch-by-names` - known products in request order.
async fn batch_by_names(
    State(state): State<AppState>,
    AppJson(body): AppJson<BatchByNamesRequest>,
) -> ApiResult<Json<Vec<products::Model>>> {
    if body.names.len() > MAX_BATCH_NAMES {
        return Err(ApiError::validation(format!(
            "at most {MAX_BATCH_NAMES} names per request"
        )));
    }

    let repo = ProductRepository::new((*state.db).clone());
    Ok(Json(repo.find_by_ids(&body.names).await?))
}

/// POST `/products`
async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(body): AppJson<CreateProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = ProductRepository::new((*state.db).clone());
    let product = repo
        .create(CreateProductInput {
            id: body.id.trim().to_string(),
            brand: body.brand,
            product_type: body.product_type,
            unit_price: body.unit_price,
            price_currency: body.price_currency,
            unit_cost: body.unit_cost,
            cost_currency: body.cost_currency.unwrap_or(body.price_currency),
            width: body.width,
            length: body.length,
            thickness: body.thickness,
        })
        .await?;

    info!(product_id = %product.id, by = auth.subject(), "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT `/products/{id}` (superuser)
async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateProductRequest>,
) -> ApiResult<Json<products::Model>> {
    auth.require_superuser()?;

    let repo = ProductRepository::new((*state.db).clone());
    let product = repo
        .update(
            &id,
            UpdateProductInput {
                brand: body.brand,
                product_type: body.product_type,
                unit_price: body.unit_price,
                price_currency: body.price_currency,
                unit_cost: body.unit_cost,
                cost_currency: body.cost_currency,
                width: body.width.map(Some),
                length: body.length.map(Some),
                thickness: body.thickness.map(Some),
                is_valid: body.is_valid,
            },
        )
        .await?;

    info!(product_id = %id, by = auth.subject(), "Product updated");
    Ok(Json(product))
}

/// DELETE `/products/{id}` (superuser)
async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    auth.require_superuser()?;

    let repo = ProductRepository::new((*state.db).clone());
    repo.soft_delete(&id).await?;

    info!(product_id = %id, by = auth.subject(), "Product marked invalid");
    Ok(Json(MessageResponse::new(
        "Product deleted successfully, marked as invalid",
    )))
}
