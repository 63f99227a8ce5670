use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    models::{
        order::{line_subtotal, order_totals},
        Customer, Order, OrderItem, OrderStatus, Payment, PaymentStatus, TransactionType,
    },
    response::{ApiResponse, Pagination},
};

#[derive(Deserialize)]
pub struct OrderFilters {
    search: Option<String>,
    status: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    customer_id: Uuid,
    items: Vec<CreateOrderItem>,
    discount_amount: Option<Decimal>,
    payment_method: Option<String>,
    payment_status: Option<PaymentStatus>,
    paid_amount: Option<Decimal>,
    notes: Option<String>,
    estimated_days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    service_id: Uuid,
    service_name: String,
    quantity: Option<i32>,
    weight: Option<f64>,
    price_per_unit: Decimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrder {
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
    paid_amount: Option<Decimal>,
    notes: Option<String>,
}

#[derive(Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Customer,
    pub payments: Vec<Payment>,
}

pub async fn list_orders(
    State(db): State<Database>,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<ApiResponse<Vec<OrderWithItems>>>, ApiError> {
    let page = filters.page.unwrap_or(1).max(1);
    let limit = filters.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let pattern = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let status = match filters.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
        Some(s) => Some(
            s.parse::<OrderStatus>()
                .map_err(ApiError::Validation)?,
        ),
        None => None,
    };

    // Build the WHERE clause from whichever filters are present
    let mut conditions = Vec::new();
    let mut bind_count = 1;

    if pattern.is_some() {
        conditions.push(format!(
            "(order_number ILIKE ${n} OR customer_name ILIKE ${n} OR customer_phone LIKE ${n})",
            n = bind_count
        ));
        bind_count += 1;
    }

    if status.is_some() {
        conditions.push(format!("status = ${}", bind_count));
        bind_count += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let list_sql = format!(
        "SELECT * FROM orders {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
        where_clause,
        bind_count,
        bind_count + 1
    );
    let count_sql = format!("SELECT COUNT(*) FROM orders {}", where_clause);

    let mut list_query = sqlx::query_as::<_, Order>(&list_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

    if let Some(pattern) = &pattern {
        list_query = list_query.bind(pattern);
        count_query = count_query.bind(pattern);
    }
    if let Some(status) = status {
        list_query = list_query.bind(status);
        count_query = count_query.bind(status);
    }

    let orders = list_query.bind(limit).bind(offset).fetch_all(&db).await?;
    let total = count_query.fetch_one(&db).await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order = fetch_items(&db, &order_ids).await?;

    let data = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect();

    Ok(Json(ApiResponse::paginated(
        data,
        Pagination::new(page, limit, total),
    )))
}

pub async fn create_order(
    State(db): State<Database>,
    Json(body): Json<CreateOrder>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithItems>>), ApiError> {
    if body.items.is_empty() {
        return Err(ApiError::validation("An order needs at least one item"));
    }

    let discount_amount = body.discount_amount.unwrap_or(Decimal::ZERO);
    let paid_amount = body.paid_amount.unwrap_or(Decimal::ZERO);

    // Price every line up front so the whole checkout either commits or not
    let mut subtotals = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let quantity = item.quantity.unwrap_or(1);
        let subtotal = line_subtotal(item.price_per_unit, quantity, item.weight)
            .ok_or_else(|| ApiError::validation("Invalid item weight"))?;
        subtotals.push(subtotal);
    }
    let (total_price, final_price) = order_totals(&subtotals, discount_amount);
    let total_weight: f64 = body.items.iter().filter_map(|i| i.weight).sum();

    let payment_status = body.payment_status.unwrap_or(if paid_amount <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else if paid_amount >= final_price {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    });

    let estimated_completion = Utc::now() + Duration::days(body.estimated_days.unwrap_or(2));

    let mut tx = db.begin().await?;

    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(body.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("Customer"))?;

    // Atomic daily sequence; two concurrent checkouts can never share a number
    let sequence = sqlx::query_scalar::<_, i32>(
        "INSERT INTO order_counters (day, counter) VALUES (CURRENT_DATE, 1) \
         ON CONFLICT (day) DO UPDATE SET counter = order_counters.counter + 1 \
         RETURNING counter",
    )
    .fetch_one(&mut *tx)
    .await?;

    let order_number = format!("ORD-{}-{:03}", Utc::now().format("%Y%m%d"), sequence);

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders ( \
            order_number, customer_id, customer_name, customer_phone, total_weight, \
            total_price, discount_amount, final_price, payment_status, payment_method, \
            paid_amount, notes, estimated_completion \
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING *",
    )
    .bind(&order_number)
    .bind(customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(total_weight)
    .bind(total_price)
    .bind(discount_amount)
    .bind(final_price)
    .bind(payment_status)
    .bind(&body.payment_method)
    .bind(paid_amount)
    .bind(&body.notes)
    .bind(estimated_completion)
    .fetch_one(&mut *tx)
    .await?;

    for (item, subtotal) in body.items.iter().zip(&subtotals) {
        sqlx::query(
            "INSERT INTO order_items \
                (order_id, service_id, service_name, quantity, weight, price_per_unit, subtotal) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order.id)
        .bind(item.service_id)
        .bind(&item.service_name)
        .bind(item.quantity.unwrap_or(1))
        .bind(item.weight)
        .bind(item.price_per_unit)
        .bind(subtotal)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE customers SET \
            total_orders = total_orders + 1, \
            total_spent = total_spent + $2, \
            updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(customer.id)
    .bind(paid_amount)
    .execute(&mut *tx)
    .await?;

    if paid_amount > Decimal::ZERO {
        record_payment(&mut tx, &order, paid_amount).await?;
    }

    tx.commit().await?;

    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(order.id)
        .fetch_all(&db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            OrderWithItems { order, items },
            "Order created successfully",
        )),
    ))
}

pub async fn get_order(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetail>>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&db)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(id)
        .fetch_all(&db)
        .await?;

    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(order.customer_id)
        .fetch_one(&db)
        .await?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at DESC",
    )
    .bind(id)
    .fetch_all(&db)
    .await?;

    Ok(Json(ApiResponse::ok(OrderDetail {
        order,
        items,
        customer,
        payments,
    })))
}

pub async fn update_order(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrder>,
) -> Result<Json<ApiResponse<OrderWithItems>>, ApiError> {
    let mut tx = db.begin().await?;

    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    let mut status = current.status;
    let mut completed_at = current.completed_at;

    if let Some(requested) = body.status {
        if current.status.next() != Some(requested) {
            return Err(ApiError::Validation(format!(
                "Invalid status transition from {} to {}",
                current.status, requested
            )));
        }
        status = requested;
        if requested == OrderStatus::Completed {
            completed_at = Some(Utc::now());
        }
    }

    let mut paid_amount = current.paid_amount;
    if let Some(paid) = body.paid_amount {
        if paid > paid_amount {
            record_payment(&mut tx, &current, paid - paid_amount).await?;
        }
        paid_amount = paid;
    }

    let payment_status = body.payment_status.unwrap_or(current.payment_status);
    let notes = body.notes.or(current.notes);

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET \
            status = $2, \
            payment_status = $3, \
            paid_amount = $4, \
            notes = $5, \
            completed_at = $6, \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(payment_status)
    .bind(paid_amount)
    .bind(&notes)
    .bind(completed_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(id)
        .fetch_all(&db)
        .await?;

    Ok(Json(ApiResponse::with_message(
        OrderWithItems { order, items },
        "Order updated successfully",
    )))
}

pub async fn cancel_order(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let current = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&db)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    if current.status == OrderStatus::Completed {
        return Err(ApiError::validation("A completed order cannot be cancelled"));
    }

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(OrderStatus::Cancelled)
    .fetch_one(&db)
    .await?;

    Ok(Json(ApiResponse::with_message(
        order,
        "Order cancelled successfully",
    )))
}

/// Appends a payment row and the matching INCOME ledger entry. Runs inside
/// the caller's transaction so the order, the payment and the ledger commit
/// together.
async fn record_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
    amount: Decimal,
) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO payments (order_id, amount, method) VALUES ($1, $2, $3)")
        .bind(order.id)
        .bind(amount)
        .bind(&order.payment_method)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO transactions (type, category, amount, description) VALUES ($1, $2, $3, $4)",
    )
    .bind(TransactionType::Income)
    .bind("Laundry revenue")
    .bind(amount)
    .bind(format!("Payment for order {}", order.order_number))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn fetch_items(
    db: &Database,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderItem>>, ApiError> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1)",
    )
    .bind(order_ids)
    .fetch_all(db)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(by_order)
}
