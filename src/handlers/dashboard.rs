use axum::{extract::State, Json};
use chrono::{Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    models::{OrderStatus, PaymentStatus},
    response::ApiResponse,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    stats: DashboardStats,
    financial: DashboardFinancial,
    recent_orders: Vec<RecentOrder>,
    top_customers: Vec<TopCustomer>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    total_orders: i64,
    active_orders: i64,
    ready_orders: i64,
    completed_orders: i64,
    total_customers: i64,
    today_orders: i64,
    low_stock_items: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFinancial {
    total_income: Decimal,
    total_expense: Decimal,
    net_profit: Decimal,
}

#[derive(Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: chrono::DateTime<Utc>,
    #[sqlx(skip)]
    pub services: Vec<String>,
}

#[derive(Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub total_orders: i32,
    pub total_spent: Decimal,
}

pub async fn get_dashboard(
    State(db): State<Database>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiError> {
    let today = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let start_of_month = today
        .date_naive()
        .with_day0(0)
        .unwrap_or_else(|| today.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();

    let (
        total_orders,
        active_orders,
        ready_orders,
        completed_orders,
        total_customers,
        today_orders,
        low_stock_items,
        total_income,
        total_expense,
        mut recent_orders,
        top_customers,
    ) = tokio::try_join!(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders").fetch_one(&db),
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE status NOT IN ('COMPLETED', 'CANCELLED')"
        )
        .fetch_one(&db),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE status = 'READY'")
            .fetch_one(&db),
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE status = 'COMPLETED' AND completed_at >= $1"
        )
        .bind(today)
        .fetch_one(&db),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers").fetch_one(&db),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(today)
            .fetch_one(&db),
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_items WHERE stock <= min_stock"
        )
        .fetch_one(&db),
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions \
             WHERE type = 'INCOME' AND created_at >= $1"
        )
        .bind(start_of_month)
        .fetch_one(&db),
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions \
             WHERE type = 'EXPENSE' AND created_at >= $1"
        )
        .bind(start_of_month)
        .fetch_one(&db),
        sqlx::query_as::<_, RecentOrder>(
            "SELECT id, order_number, customer_name, customer_phone, total_price, \
                    status, payment_status, created_at \
             FROM orders ORDER BY created_at DESC LIMIT 5"
        )
        .fetch_all(&db),
        sqlx::query_as::<_, TopCustomer>(
            "SELECT id, name, phone, total_orders, total_spent \
             FROM customers ORDER BY total_spent DESC LIMIT 5"
        )
        .fetch_all(&db),
    )?;

    for order in &mut recent_orders {
        order.services = sqlx::query_scalar::<_, String>(
            "SELECT service_name FROM order_items WHERE order_id = $1",
        )
        .bind(order.id)
        .fetch_all(&db)
        .await?;
    }

    Ok(Json(ApiResponse::ok(DashboardData {
        stats: DashboardStats {
            total_orders,
            active_orders,
            ready_orders,
            completed_orders,
            total_customers,
            today_orders,
            low_stock_items,
        },
        financial: DashboardFinancial {
            total_income,
            total_expense,
            net_profit: total_income - total_expense,
        },
        recent_orders,
        top_customers,
    })))
}
