//! Order repository for database operations.

use chrono::NaiveDateTime;
use orderdesk_core::order::{OrderItems, OrderStatus, PaymentStatus, next_order_id};
use orderdesk_shared::types::PageRequest;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::entities::{customers, orders};

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The referenced customer does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Another order took the generated number first.
    #[error("Order number already taken: {0}")]
    DuplicateId(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Direction of the order-date sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(sort: SortOrder) -> Self {
        match sort {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

/// Filter options for listing orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Include orders marked invalid.
    pub display_invalid: bool,
    /// Only orders of this customer.
    pub customer_id: Option<Uuid>,
    /// Only orders in this status.
    pub order_status: Option<OrderStatus>,
    /// Order date lower bound, inclusive.
    pub start_date: Option<NaiveDateTime>,
    /// Order date upper bound, inclusive.
    pub end_date: Option<NaiveDateTime>,
    /// Sort direction by order date.
    pub sort_order: SortOrder,
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    /// Validated line items.
    pub items: OrderItems,
    /// Ordering customer.
    pub customer_id: Uuid,
    /// Initial order status.
    pub order_status: OrderStatus,
    /// Initial payment status.
    pub payment_status: PaymentStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Agreed total.
    pub total_price: Decimal,
}

/// Input for updating an order.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrderInput {
    /// Replacement line items.
    pub items: Option<OrderItems>,
    /// New customer.
    pub customer_id: Option<Uuid>,
    /// New order status.
    pub order_status: Option<OrderStatus>,
    /// New payment status.
    pub payment_status: Option<PaymentStatus>,
    /// New notes.
    pub notes: Option<Option<String>>,
    /// New total.
    pub total_price: Option<Decimal>,
    /// New validity flag.
    pub is_valid: Option<bool>,
}

/// Order repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: DatabaseConnection,
}

impl OrderRepository {
    /// Creates a new order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists orders sorted by order date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Vec<orders::Model>, DbErr> {
        filtered(filter)
            .order_by(orders::Column::OrderDate, filter.sort_order.into())
            .order_by(orders::Column::Id, filter.sort_order.into())
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
    }

    /// Counts orders matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: OrderFilter) -> Result<u64, DbErr> {
        filtered(filter).count(&self.db).await
    }

    /// Finds an order by id, valid or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<orders::Model>, DbErr> {
        orders::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
    }

    /// Creates an order numbered after every order on file.
    ///
    /// Both date columns are set to `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Customer not found
    /// - A concurrent insert took the same number
    /// - The insert fails
    pub async fn create(
        &self,
        input: CreateOrderInput,
        now: NaiveDateTime,
    ) -> Result<orders::Model, OrderError> {
        let customer = customers::Entity::find_by_id(input.customer_id)
            .one(&self.db)
            .await?;
        if customer.is_none() {
            return Err(OrderError::CustomerNotFound(input.customer_id));
        }

        let existing = orders::Entity::find().count(&self.db).await?;
        let id = next_order_id(now, existing).into_inner();

        let order = orders::ActiveModel {
            id: Set(id.clone()),
            order_items: Set(input.items.encode()),
            customer_id: Set(input.customer_id),
            order_date: Set(now),
            order_update_date: Set(now),
            order_status: Set(input.order_status.as_str().to_string()),
            payment_status: Set(input.payment_status.as_str().to_string()),
            notes: Set(input.notes),
            total_price: Set(input.total_price),
            is_valid: Set(true),
        };

        order.insert(&self.db).await.map_err(|err| {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                warn!(order_id = %id, "Order number collision");
                OrderError::DuplicateId(id)
            } else {
                OrderError::Database(err)
            }
        })
    }

    /// Applies a partial update and stamps the update date with `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the order or a new customer does not exist, or
    /// the update fails.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateOrderInput,
        now: NaiveDateTime,
    ) -> Result<orders::Model, OrderError> {
        let order = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        if let Some(customer_id) = input.customer_id
            && customer_id != order.customer_id
        {
            let customer = customers::Entity::find_by_id(customer_id)
                .one(&self.db)
                .await?;
            if customer.is_none() {
                return Err(OrderError::CustomerNotFound(customer_id));
            }
        }

        let mut active: orders::ActiveModel = order.into();

        if let Some(items) = input.items {
            active.order_items = Set(items.encode());
        }
        if let Some(customer_id) = input.customer_id {
            active.customer_id = Set(customer_id);
        }
        if let Some(status) = input.order_status {
            active.order_status = Set(status.as_str().to_string());
        }
        if let Some(payment) = input.payment_status {
            active.payment_status = Set(payment.as_str().to_string());
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(total_price) = input.total_price {
            active.total_price = Set(total_price);
        }
        if let Some(is_valid) = input.is_valid {
            active.is_valid = Set(is_valid);
        }
        active.order_update_date = Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Marks an order invalid. The row and its number are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the update fails.
    pub async fn soft_delete(&self, id: &str, now: NaiveDateTime) -> Result<(), OrderError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::IsValid, Expr::value(false))
            .col_expr(orders::Column::OrderUpdateDate, Expr::value(now))
            .filter(orders::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(OrderError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn filtered(filter: OrderFilter) -> Select<orders::Entity> {
    let mut query = orders::Entity::find();
    if !filter.display_invalid {
        query = query.filter(orders::Column::IsValid.eq(true));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(orders::Column::CustomerId.eq(customer_id));
    }
    if let Some(status) = filter.order_status {
        query = query.filter(orders::Column::OrderStatus.eq(status.as_str()));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(orders::Column::OrderDate.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(orders::Column::OrderDate.lte(end));
    }
    query
}

#[cfg(test)]
#[path = "order_tests.rs"]
mod tests;
