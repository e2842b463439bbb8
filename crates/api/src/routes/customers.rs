//! Customer routes, including profile images.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use orderdesk_core::storage::StorageService;
use orderdesk_db::entities::customers;
use orderdesk_db::repositories::{
    CreateCustomerInput, CustomerFilter, CustomerRepository, UpdateCustomerInput,
};
use orderdesk_shared::types::{CountResponse, ListResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{MessageResponse, page_request};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppJson, AppQuery};
use crate::{AppState, middleware::AuthUser};

/// Multipart bodies may exceed the image limit slightly; the storage
/// service enforces the exact maximum.
const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// Creates the customer routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/", get(list_customers).post(create_customer))
        .route("/customers/customer_count", get(customer_count))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route(
            "/customers/upload-profile-image/{customer_id}",
            post(upload_profile_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/customers/get-profile-image/{customer_id}",
            get(get_profile_image),
        )
}

/// Query parameters for listing customers.
#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    /// Rows to skip.
    pub skip: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Include customers marked invalid.
    #[serde(default)]
    pub display_invalid: bool,
}

/// Request body for creating a customer.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
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
    /// Preferred language.
    pub preferred_language: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Request body for updating a customer. Absent fields are left as is.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    /// Company name.
    pub company: Option<String>,
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
    /// Preferred language.
    pub preferred_language: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Validity flag.
    pub is_valid: Option<bool>,
}

/// Result of a profile image upload.
#[derive(Debug, Serialize)]
pub struct ProfileImageResponse {
    /// Outcome message.
    pub message: String,
    /// Storage key of the image.
    pub key: String,
}

fn check_email(email: Option<&str>) -> ApiResult<()> {
    match email {
        Some(email) if !email.contains('@') || email.starts_with('@') || email.ends_with('@') => {
            Err(ApiError::validation(format!("invalid email address '{email}'")))
        }
        _ => Ok(()),
    }
}

async fn find_customer(repo: &CustomerRepository, id: Uuid) -> ApiResult<customers::Model> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer {id}")))
}

/// GET `/customers`
async fn list_customers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListCustomersQuery>,
) -> ApiResult<Json<ListResponse<customers::Model>>> {
    let repo = CustomerRepository::new((*state.db).clone());
    let filter = CustomerFilter {
        display_invalid: query.display_invalid,
    };

    let count = repo.count(filter).await?;
    let data = repo
        .list(filter, page_request(query.skip, query.limit))
        .await?;

    Ok(Json(ListResponse::new(data, count)))
}

/// GET `/customers/customer_count`
async fn customer_count(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListCustomersQuery>,
) -> ApiResult<Json<CountResponse>> {
    let repo = CustomerRepository::new((*state.db).clone());
    let count = repo
        .count(CustomerFilter {
            display_invalid: query.display_invalid,
        })
        .await?;
    Ok(Json(CountResponse { count }))
}

/// GET `/customers/{id}`
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<customers::Model>> {
    let repo = CustomerRepository::new((*state.db).clone());
    Ok(Json(find_customer(&repo, id).await?))
}

/// POST `/customers`
async fn create_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(body): AppJson<CreateCustomerRequest>,
) -> ApiResult<impl IntoResponse> {
    check_email(body.email.as_deref())?;

    let repo = CustomerRepository::new((*state.db).clone());
    let customer = repo
        .create(CreateCustomerInput {
            company: body.company,
            description: body.description,
            full_name: body.full_name,
            email: body.email,
            phone: body.phone,
            gender: body.gender,
            preferred_language: body.preferred_language,
            address: body.address,
        })
        .await?;

    info!(customer_id = %customer.id, by = auth.subject(), "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT `/customers/{id}` (superuser)
async fn update_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<UpdateCustomerRequest>,
) -> ApiResult<Json<customers::Model>> {
    auth.require_superuser()?;
    check_email(body.email.as_deref())?;

    let repo = CustomerRepository::new((*state.db).clone());
    let customer = repo
        .update(
            id,
            UpdateCustomerInput {
                company: body.company,
                description: body.description.map(Some),
                full_name: body.full_name.map(Some),
                email: body.email.map(Some),
                phone: body.phone.map(Some),
                gender: body.gender.map(Some),
                preferred_language: body.preferred_language.map(Some),
                address: body.address.map(Some),
                is_valid: body.is_valid,
            },
        )
        .await?;

    info!(customer_id = %id, by = auth.subject(), "Customer updated");
    Ok(Json(customer))
}

/// DELETE `/customers/{id}`
async fn delete_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let repo = CustomerRepository::new((*state.db).clone());
    repo.soft_delete(id).await?;

    info!(customer_id = %id, by = auth.subject(), "Customer marked invalid");
    Ok(Json(MessageResponse::new(
        "Customer deleted successfully, marked as invalid",
    )))
}

/// POST `/customers/upload-profile-image/{customer_id}`
///
/// Expects a multipart body with an image in the `file` field.
async fn upload_profile_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(customer_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfileImageResponse>> {
    let repo = CustomerRepository::new((*state.db).clone());
    find_customer(&repo, customer_id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("profile").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, content_type, bytes));
        break;
    }
    let Some((file_name, content_type, bytes)) = upload else {
        return Err(ApiError::validation("multipart field 'file' is required"));
    };

    let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    state.storage.validate_upload(&content_type, size)?;

    let key = StorageService::profile_image_key(&customer_id.to_string(), &file_name);
    state
        .storage
        .put(&key, bytes.to_vec(), &content_type)
        .await?;
    repo.set_profile_image_key(customer_id, &key).await?;

    info!(%customer_id, %key, size, by = auth.subject(), "Profile image stored");
    Ok(Json(ProfileImageResponse {
        message: "Profile image uploaded".to_string(),
        key,
    }))
}

/// GET `/customers/get-profile-image/{customer_id}`
async fn get_profile_image(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Response> {
    let repo = CustomerRepository::new((*state.db).clone());
    let customer = find_customer(&repo, customer_id).await?;
    let key = customer
        .profile_image_key
        .ok_or_else(|| ApiError::not_found(format!("Customer {customer_id} has no profile image")))?;

    let object = state.storage.get(&key).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], object.bytes).into_response())
}
