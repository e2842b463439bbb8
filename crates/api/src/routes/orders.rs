//! Order routes and invoice download.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use orderdesk_core::currency::BASE_CURRENCY;
use orderdesk_core::invoice::{InvoiceError, InvoiceRequest, InvoiceService};
use orderdesk_core::order::{
    OrderItems, OrderStatus, PaymentStatus, format_timestamp, parse_timestamp,
};
use orderdesk_db::entities::orders;
use orderdesk_db::repositories::{
    CreateOrderInput, CustomerRepository, OrderFilter, OrderRepository, ProductRepository,
    SortOrder, UpdateOrderInput,
};
use orderdesk_shared::AppError;
use orderdesk_shared::types::{CountResponse, CurrencyCode, ListResponse, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{MessageResponse, page_request};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppJson, AppQuery};
use crate::{AppState, middleware::AuthUser};

/// Creates the order routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/order_count", get(order_count))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route(
            "/orders/get-order-invoice/{order_id}",
            get(get_order_invoice),
        )
}

/// Query parameters for listing orders.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    /// Rows to skip.
    pub skip: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// `asc` or `desc` by order date.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Include orders marked invalid.
    #[serde(default)]
    pub display_invalid: bool,
    /// Only this customer's orders.
    pub customer_id: Option<Uuid>,
    /// Only orders in this status.
    pub order_status: Option<String>,
    /// Lower bound, `YYYY-MM-DD HH:MM:SS`.
    pub start_date: Option<String>,
    /// Upper bound, `YYYY-MM-DD HH:MM:SS`.
    pub end_date: Option<String>,
}

impl ListOrdersQuery {
    fn filter(&self) -> ApiResult<OrderFilter> {
        let date = |raw: &Option<String>, name: &str| {
            raw.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(parse_timestamp)
                .transpose()
                .map_err(|_| {
                    ApiError::validation(format!("{name} must be formatted YYYY-MM-DD HH:MM:SS"))
                })
        };

        Ok(OrderFilter {
            display_invalid: self.display_invalid,
            customer_id: self.customer_id,
            order_status: self
                .order_status
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::parse::<OrderStatus>)
                .transpose()?,
            start_date: date(&self.start_date, "start_date")?,
            end_date: date(&self.end_date, "end_date")?,
            sort_order: self.sort_order,
        })
    }
}

/// Request body for creating an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Line items, as an envelope or a `{"product": quantity}` object.
    pub order_items: OrderItems,
    /// Ordering customer.
    pub customer_id: Uuid,
    /// Initial status, `Pending` when absent.
    #[serde(default)]
    pub order_status: OrderStatus,
    /// Initial payment status, `Pending` when absent.
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Agreed total.
    #[serde(default)]
    pub total_price: Decimal,
}

/// Request body for updating an order. Absent fields are left as is.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    /// Replacement line items.
    pub order_items: Option<OrderItems>,
    /// New customer.
    pub customer_id: Option<Uuid>,
    /// New order status.
    pub order_status: Option<OrderStatus>,
    /// New payment status.
    pub payment_status: Option<PaymentStatus>,
    /// New notes.
    pub notes: Option<String>,
    /// New total.
    pub total_price: Option<Decimal>,
    /// Validity flag.
    pub is_valid: Option<bool>,
}

/// Query parameters for the invoice download.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    /// Currency of every amount on the invoice; the base currency when absent.
    pub output_currency: Option<CurrencyCode>,
}

/// Order as returned to clients.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order number.
    pub id: String,
    /// Decoded line items.
    pub order_items: OrderItems,
    /// Ordering customer.
    pub customer_id: Uuid,
    /// Placement time, `YYYY-MM-DD HH:MM:SS`.
    pub order_date: String,
    /// Last change, `YYYY-MM-DD HH:MM:SS`.
    pub order_update_date: String,
    /// Order status.
    pub order_status: OrderStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Agreed total.
    pub total_price: Decimal,
    /// Validity flag.
    pub is_valid: bool,
}

impl TryFrom<orders::Model> for OrderResponse {
    type Error = ApiError;

    fn try_from(order: orders::Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, err: &dyn std::fmt::Display| {
            ApiError(AppError::Internal(format!(
                "order {} has invalid {what}: {err}",
                order.id
            )))
        };
        let order_items = order
            .items()
            .map_err(|e| ApiError::from(InvoiceError::LineItems(e)))?;
        let order_status = order.status().map_err(|e| corrupt("status", &e))?;
        let payment_status = order.payment().map_err(|e| corrupt("payment status", &e))?;

        Ok(Self {
            order_items,
            order_status,
            payment_status,
            order_date: format_timestamp(order.order_date),
            order_update_date: format_timestamp(order.order_update_date),
            id: order.id,
            customer_id: order.customer_id,
            notes: order.notes,
            total_price: order.total_price,
            is_valid: order.is_valid,
        })
    }
}

async fn find_order(repo: &OrderRepository, id: &str) -> ApiResult<orders::Model> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {id}")))
}

/// GET `/orders`
async fn list_orders(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListOrdersQuery>,
) -> ApiResult<Json<ListResponse<OrderResponse>>> {
    let repo = OrderRepository::new((*state.db).clone());
    let filter = query.filter()?;

    let count = repo.count(filter).await?;
    // A row that no longer decodes is left out of the page instead of
    // failing it; `count` still includes it.
    let data = repo
        .list(filter, page_request(query.skip, query.limit))
        .await?
        .into_iter()
        .filter_map(|order| {
            let order_id = order.id.clone();
            OrderResponse::try_from(order)
                .inspect_err(|e| warn!(%order_id, error = %e.0, "Skipping unreadable order"))
                .ok()
        })
        .collect();

    Ok(Json(ListResponse::new(data, count)))
}

/// GET `/orders/order_count`
async fn order_count(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListOrdersQuery>,
) -> ApiResult<Json<CountResponse>> {
    let repo = OrderRepository::new((*state.db).clone());
    let count = repo.count(query.filter()?).await?;
    Ok(Json(CountResponse { count }))
}

/// GET `/orders/{id}`
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderResponse>> {
    let repo = OrderRepository::new((*state.db).clone());
    Ok(Json(find_order(&repo, &id).await?.try_into()?))
}

/// POST `/orders`
async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(body): AppJson<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = OrderRepository::new((*state.db).clone());
    let order = repo
        .create(
            CreateOrderInput {
                items: body.order_items,
                customer_id: body.customer_id,
                order_status: body.order_status,
                payment_status: body.payment_status,
                notes: body.notes,
                total_price: body.total_price,
            },
            Utc::now().naive_utc(),
        )
        .await?;

    info!(order_id = %order.id, customer_id = %order.customer_id, by = auth.subject(), "Order created");
    Ok((StatusCode::CREATED, Json(OrderResponse::try_from(order)?)))
}

/// PUT `/orders/{id}` (superuser)
async fn update_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    auth.require_superuser()?;

    let repo = OrderRepository::new((*state.db).clone());
    let order = repo
        .update(
            &id,
            UpdateOrderInput {
                items: body.order_items,
                customer_id: body.customer_id,
                order_status: body.order_status,
                payment_status: body.payment_status,
                notes: body.notes.map(Some),
                total_price: body.total_price,
                is_valid: body.is_valid,
            },
            Utc::now().naive_utc(),
        )
        .await?;

    info!(order_id = %id, by = auth.subject(), "Order updated");
    Ok(Json(order.try_into()?))
}

/// DELETE `/orders/{id}`
async fn delete_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let repo = OrderRepository::new((*state.db).clone());
    repo.soft_delete(&id, Utc::now().naive_utc()).await?;

    info!(order_id = %id, by = auth.subject(), "Order marked invalid");
    Ok(Json(MessageResponse::new(
        "Order deleted successfully, marked as invalid",
    )))
}

/// GET `/orders/get-order-invoice/{order_id}?output_currency=SGD`
///
/// Renders the order into the invoice workbook, stores it and returns it
/// as an attachment.
async fn get_order_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<String>,
    AppQuery(query): AppQuery<InvoiceQuery>,
) -> ApiResult<Response> {
    let currency = query.output_currency.unwrap_or(BASE_CURRENCY);

    let order = find_order(&OrderRepository::new((*state.db).clone()), &order_id).await?;
    let customer = CustomerRepository::new((*state.db).clone())
        .find_by_id(order.customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer {}", order.customer_id)))?;
    let items = order.items().map_err(InvoiceError::from)?;

    let service = InvoiceService::new(
        Arc::new(ProductRepository::new((*state.db).clone())),
        Arc::clone(&state.rates),
        Arc::clone(&state.storage),
        Arc::clone(&state.invoice_writer),
        state.invoice_prefix.as_ref(),
    );
    let rendered = service
        .generate(InvoiceRequest {
            order_id: OrderId::new(order.id),
            items,
            company: customer.company,
            phone: customer.phone,
            currency,
            issued_on: Utc::now().date_naive(),
        })
        .await?;

    info!(
        order_id = %order_id,
        %currency,
        total = %rendered.total,
        by = auth.subject(),
        "Invoice downloaded"
    );

    let disposition = format!("attachment; filename=\"{}\"", rendered.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, rendered.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}
