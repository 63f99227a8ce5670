use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{database::Database, error::ApiError, models::Service, response::ApiResponse};

#[derive(Deserialize)]
pub struct ServiceFilters {
    category: Option<String>,
    active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateService {
    name: String,
    description: Option<String>,
    price: Option<Decimal>,
    unit: Option<String>,
    category: Option<String>,
    estimated_days: Option<i32>,
    is_active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateService {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    unit: Option<String>,
    category: Option<String>,
    estimated_days: Option<i32>,
    is_active: Option<bool>,
}

/// Delete response carries what actually happened: a service with order
/// history is only deactivated, never removed.
#[derive(Serialize)]
pub struct DeleteServiceResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Service>,
    pub action: &'static str,
}

pub async fn list_services(
    State(db): State<Database>,
    Query(filters): Query<ServiceFilters>,
) -> Result<Json<ApiResponse<Vec<Service>>>, ApiError> {
    let active_only = filters.active.unwrap_or(true);
    let category = filters
        .category
        .filter(|c| !c.is_empty() && c.as_str() != "all");

    let services = sqlx::query_as::<_, Service>(
        "SELECT * FROM services \
         WHERE ($1::text IS NULL OR category = $1) \
           AND (NOT $2 OR is_active) \
         ORDER BY category, name",
    )
    .bind(&category)
    .bind(active_only)
    .fetch_all(&db)
    .await?;

    Ok(Json(ApiResponse::ok(services)))
}

pub async fn create_service(
    State(db): State<Database>,
    Json(body): Json<CreateService>,
) -> Result<(StatusCode, Json<ApiResponse<Service>>), ApiError> {
    let (price, unit, category) = match (body.price, body.unit, body.category) {
        (Some(price), Some(unit), Some(category))
            if !body.name.trim().is_empty() && !unit.is_empty() && !category.is_empty() =>
        {
            (price, unit, category)
        }
        _ => return Err(ApiError::validation("Name, price, unit and category are required")),
    };

    let service = sqlx::query_as::<_, Service>(
        "INSERT INTO services (name, description, price, unit, category, estimated_days, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(body.name.trim())
    .bind(&body.description)
    .bind(price)
    .bind(&unit)
    .bind(&category)
    .bind(body.estimated_days.unwrap_or(2))
    .bind(body.is_active.unwrap_or(true))
    .fetch_one(&db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(service, "Service added successfully")),
    ))
}

pub async fn get_service(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
        .bind(id)
        .fetch_optional(&db)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

    Ok(Json(ApiResponse::ok(service)))
}

pub async fn update_service(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateService>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    let service = sqlx::query_as::<_, Service>(
        "UPDATE services SET \
            name = COALESCE($2, name), \
            description = COALESCE($3, description), \
            price = COALESCE($4, price), \
            unit = COALESCE($5, unit), \
            category = COALESCE($6, category), \
            estimated_days = COALESCE($7, estimated_days), \
            is_active = COALESCE($8, is_active), \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.price)
    .bind(&body.unit)
    .bind(&body.category)
    .bind(body.estimated_days)
    .bind(body.is_active)
    .fetch_optional(&db)
    .await?
    .ok_or(ApiError::NotFound("Service"))?;

    Ok(Json(ApiResponse::with_message(
        service,
        "Service updated successfully",
    )))
}

pub async fn delete_service(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteServiceResponse>, ApiError> {
    let referenced = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM order_items WHERE service_id = $1)",
    )
    .bind(id)
    .fetch_one(&db)
    .await?;

    if referenced {
        // Order items snapshot this service; keep the row for history and
        // just take it off the menu.
        let service = sqlx::query_as::<_, Service>(
            "UPDATE services SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&db)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

        return Ok(Json(DeleteServiceResponse {
            success: true,
            message: "Service deactivated because it has order history".to_string(),
            data: Some(service),
            action: "deactivated",
        }));
    }

    let result = sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Service"));
    }

    Ok(Json(DeleteServiceResponse {
        success: true,
        message: "Service deleted permanently".to_string(),
        data: None,
        action: "deleted",
    }))
}
