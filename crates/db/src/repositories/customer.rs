//! Customer repository for database operations.

use orderdesk_shared::types::PageRequest;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::customers;

/// Errors that can occur during customer operations.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// Customer not found.
    #[error("Customer not found: {0}")]
    NotFound(Uuid),

    /// Company name is blank.
    #[error("Company name is required")]
    CompanyRequired,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct CreateCustomerInput {
    /// Company name.
    pub company: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Contact person.
    pub full_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Gender of the contact person.
    pub gender: Option<String>,
    /// Preferred language for correspondence.
    pub preferred_language: Option<String>,
    /// Postal address as free text.
    pub address: Option<String>,
}

/// Input for updating a customer.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerInput {
    /// New company name.
    pub company: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New contact person.
    pub full_name: Option<Option<String>>,
    /// New email.
    pub email: Option<Option<String>>,
    /// New phone.
    pub phone: Option<Option<String>>,
    /// New gender.
    pub gender: Option<Option<String>>,
    /// New preferred language.
    pub preferred_language: Option<Option<String>>,
    /// New address.
    pub address: Option<Option<String>>,
    /// New validity flag.
    pub is_valid: Option<bool>,
}

/// Filter options for listing customers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerFilter {
    /// Include customers marked invalid.
    pub display_invalid: bool,
}

/// Customer repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists customers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: CustomerFilter,
        page: PageRequest,
    ) -> Result<Vec<customers::Model>, DbErr> {
        filtered(filter)
            .order_by_asc(customers::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
    }

    /// Counts customers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: CustomerFilter) -> Result<u64, DbErr> {
        filtered(filter).count(&self.db).await
    }

    /// Finds a customer by ID, valid or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a new customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the company is blank or the insert fails.
    pub async fn create(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        let company = input.company.trim();
        if company.is_empty() {
            return Err(CustomerError::CompanyRequired);
        }

        let now = chrono::Utc::now().into();
        let customer = customers::ActiveModel {
            id: Set(Uuid::new_v4()),
            company: Set(company.to_string()),
            description: Set(input.description),
            full_name: Set(input.full_name),
            email: Set(input.email),
            phone: Set(input.phone),
            gender: Set(input.gender),
            preferred_language: Set(input.preferred_language),
            address: Set(input.address),
            profile_image_key: Set(None),
            is_valid: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(customer.insert(&self.db).await?)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Customer not found
    /// - The new company name is blank
    /// - The update fails
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        let customer = self
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let mut active: customers::ActiveModel = customer.into();

        if let Some(company) = input.company {
            let company = company.trim();
            if company.is_empty() {
                return Err(CustomerError::CompanyRequired);
            }
            active.company = Set(company.to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(gender) = input.gender {
            active.gender = Set(gender);
        }
        if let Some(preferred_language) = input.preferred_language {
            active.preferred_language = Set(preferred_language);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        if let Some(is_valid) = input.is_valid {
            active.is_valid = Set(is_valid);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Records the storage key of the customer's profile image.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist or the update fails.
    pub async fn set_profile_image_key(
        &self,
        id: Uuid,
        key: &str,
    ) -> Result<customers::Model, CustomerError> {
        let customer = self
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let mut active: customers::ActiveModel = customer.into();
        active.profile_image_key = Set(Some(key.to_string()));
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Marks a customer invalid. The row is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist or the update fails.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), CustomerError> {
        let now = chrono::Utc::now();

        let result = customers::Entity::update_many()
            .col_expr(customers::Column::IsValid, Expr::value(false))
            .col_expr(customers::Column::UpdatedAt, Expr::value(now))
            .filter(customers::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(CustomerError::NotFound(id));
        }
        Ok(())
    }
}

fn filtered(filter: CustomerFilter) -> Select<customers::Entity> {
    let mut query = customers::Entity::find();
    if !filter.display_invalid {
        query = query.filter(customers::Column::IsValid.eq(true));
    }
    query
}
