use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    models::{Customer, Order},
    response::{ApiResponse, Pagination},
};

#[derive(Deserialize)]
pub struct CustomerFilters {
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    preferences: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    preferences: Option<String>,
}

#[derive(Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    customer: Customer,
    orders: Vec<Order>,
}

pub async fn list_customers(
    State(db): State<Database>,
    Query(filters): Query<CustomerFilters>,
) -> Result<Json<ApiResponse<Vec<Customer>>>, ApiError> {
    let page = filters.page.unwrap_or(1).max(1);
    let limit = filters.limit.unwrap_or(50).clamp(1, 200);
    let offset = (page - 1) * limit;
    let pattern = format!("%{}%", filters.search.as_deref().unwrap_or("").trim());

    let customers = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers \
         WHERE name ILIKE $1 OR phone LIKE $1 OR email ILIKE $1 \
         ORDER BY created_at DESC \
         LIMIT $2 OFFSET $3",
    )
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(&db)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM customers WHERE name ILIKE $1 OR phone LIKE $1 OR email ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(&db)
    .await?;

    Ok(Json(ApiResponse::paginated(
        customers,
        Pagination::new(page, limit, total),
    )))
}

pub async fn create_customer(
    State(db): State<Database>,
    Json(body): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ApiError> {
    if body.name.trim().is_empty() || body.phone.trim().is_empty() {
        return Err(ApiError::validation("Name and phone number are required"));
    }

    let phone_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE phone = $1)",
    )
    .bind(&body.phone)
    .fetch_one(&db)
    .await?;

    if phone_taken {
        return Err(ApiError::validation("Phone number is already registered"));
    }

    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (name, phone, email, address, preferences) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(body.name.trim())
    .bind(body.phone.trim())
    .bind(&body.email)
    .bind(&body.address)
    .bind(&body.preferences)
    .fetch_one(&db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(customer, "Customer added successfully")),
    ))
}

pub async fn get_customer(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerDetail>>, ApiError> {
    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(&db)
        .await?
        .ok_or(ApiError::NotFound("Customer"))?;

    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC LIMIT 10",
    )
    .bind(id)
    .fetch_all(&db)
    .await?;

    Ok(Json(ApiResponse::ok(CustomerDetail { customer, orders })))
}

pub async fn update_customer(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCustomer>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let customer = sqlx::query_as::<_, Customer>(
        "UPDATE customers SET \
            name = COALESCE($2, name), \
            phone = COALESCE($3, phone), \
            email = COALESCE($4, email), \
            address = COALESCE($5, address), \
            preferences = COALESCE($6, preferences), \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&body.name)
    .bind(&body.phone)
    .bind(&body.email)
    .bind(&body.address)
    .bind(&body.preferences)
    .fetch_optional(&db)
    .await?
    .ok_or(ApiError::NotFound("Customer"))?;

    Ok(Json(ApiResponse::with_message(
        customer,
        "Customer updated successfully",
    )))
}

pub async fn delete_customer(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Customer"));
    }

    Ok(Json(ApiResponse::message("Customer deleted successfully")))
}
