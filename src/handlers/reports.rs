use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    database::Database,
    error::ApiError,
    models::{OrderStatus, Transaction, TransactionType},
    response::ApiResponse,
};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    period: ReportPeriod,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    transactions: Vec<Transaction>,
    summary: ReportSummary,
    breakdown: ReportBreakdown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    total_income: Decimal,
    total_expense: Decimal,
    net_profit: Decimal,
    total_orders: usize,
    completed_orders: usize,
    average_order_value: Decimal,
    profit_margin: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBreakdown {
    expenses: BTreeMap<String, Decimal>,
    top_services: Vec<TopService>,
}

#[derive(Debug, Serialize)]
pub struct TopService {
    name: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct ItemCount {
    service_name: String,
    quantity: i32,
}

pub async fn get_report(
    State(db): State<Database>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<ReportData>>, ApiError> {
    let start = period_start(query.period, Utc::now());

    let transactions = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE created_at >= $1 ORDER BY created_at DESC",
    )
    .bind(start)
    .fetch_all(&db)
    .await?;

    let statuses = sqlx::query_scalar::<_, OrderStatus>(
        "SELECT status FROM orders WHERE created_at >= $1",
    )
    .bind(start)
    .fetch_all(&db)
    .await?;

    let items = sqlx::query_as::<_, ItemCount>(
        "SELECT oi.service_name, oi.quantity \
         FROM order_items oi \
         JOIN orders o ON o.id = oi.order_id \
         WHERE o.created_at >= $1",
    )
    .bind(start)
    .fetch_all(&db)
    .await?;

    let summary = summarize(&transactions, &statuses);
    let breakdown = ReportBreakdown {
        expenses: expense_breakdown(&transactions),
        top_services: top_services(&items),
    };

    Ok(Json(ApiResponse::ok(ReportData {
        transactions,
        summary,
        breakdown,
    })))
}

/// Start of the reporting window: today's midnight, Monday of the current
/// week, or the first of the month — all in UTC.
fn period_start(period: ReportPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = NaiveTime::MIN;
    let date = match period {
        ReportPeriod::Daily => now.date_naive(),
        ReportPeriod::Weekly => now.date_naive().week(Weekday::Mon).first_day(),
        ReportPeriod::Monthly => now
            .date_naive()
            .with_day(1)
            .unwrap_or_else(|| now.date_naive()),
    };
    date.and_time(midnight).and_utc()
}

fn summarize(transactions: &[Transaction], statuses: &[OrderStatus]) -> ReportSummary {
    let total_income: Decimal = transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Income)
        .map(|t| t.amount)
        .sum();
    let total_expense: Decimal = transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Expense)
        .map(|t| t.amount)
        .sum();
    let net_profit = total_income - total_expense;

    let total_orders = statuses.len();
    let completed_orders = statuses
        .iter()
        .filter(|s| **s == OrderStatus::Completed)
        .count();

    let average_order_value = if total_orders > 0 {
        total_income / Decimal::from(total_orders as u64)
    } else {
        Decimal::ZERO
    };
    let profit_margin = if total_income > Decimal::ZERO {
        (net_profit / total_income * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };

    ReportSummary {
        total_income,
        total_expense,
        net_profit,
        total_orders,
        completed_orders,
        average_order_value,
        profit_margin,
    }
}

fn expense_breakdown(transactions: &[Transaction]) -> BTreeMap<String, Decimal> {
    let mut by_category = BTreeMap::new();
    for t in transactions {
        if t.transaction_type == TransactionType::Expense {
            *by_category.entry(t.category.clone()).or_insert(Decimal::ZERO) += t.amount;
        }
    }
    by_category
}

fn top_services(items: &[ItemCount]) -> Vec<TopService> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for item in items {
        *counts.entry(&item.service_name).or_insert(0) += i64::from(item.quantity);
    }

    let mut ranked: Vec<TopService> = counts
        .into_iter()
        .map(|(name, count)| TopService {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(5);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn entry(transaction_type: TransactionType, category: &str, amount: Decimal) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            transaction_type,
            category: category.to_string(),
            amount,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    fn item(name: &str, quantity: i32) -> ItemCount {
        ItemCount {
            service_name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn daily_period_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 14, 30, 0).unwrap();
        let start = period_start(ReportPeriod::Daily, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn weekly_period_starts_on_monday() {
        // 2026-08-29 is a Saturday
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 14, 30, 0).unwrap();
        let start = period_start(ReportPeriod::Weekly, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).unwrap());

        // A Monday is its own week start
        let monday = Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap();
        assert_eq!(period_start(ReportPeriod::Weekly, monday), start);
    }

    #[test]
    fn monthly_period_starts_on_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 14, 30, 0).unwrap();
        let start = period_start(ReportPeriod::Monthly, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn summary_totals_and_margin() {
        let transactions = vec![
            entry(TransactionType::Income, "Laundry revenue", dec!(30000)),
            entry(TransactionType::Income, "Laundry revenue", dec!(20000)),
            entry(TransactionType::Expense, "Supplies", dec!(10000)),
        ];
        let statuses = vec![OrderStatus::Completed, OrderStatus::Washing];

        let summary = summarize(&transactions, &statuses);
        assert_eq!(summary.total_income, dec!(50000));
        assert_eq!(summary.total_expense, dec!(10000));
        assert_eq!(summary.net_profit, dec!(40000));
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.completed_orders, 1);
        assert_eq!(summary.average_order_value, dec!(25000));
        assert_eq!(summary.profit_margin, 80.0);
    }

    #[test]
    fn summary_of_nothing_is_all_zero() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.average_order_value, Decimal::ZERO);
        assert_eq!(summary.profit_margin, 0.0);
    }

    #[test]
    fn expenses_group_by_category() {
        let transactions = vec![
            entry(TransactionType::Expense, "Supplies", dec!(10000)),
            entry(TransactionType::Expense, "Utilities", dec!(7500)),
            entry(TransactionType::Expense, "Supplies", dec!(2500)),
            entry(TransactionType::Income, "Laundry revenue", dec!(50000)),
        ];

        let breakdown = expense_breakdown(&transactions);
        assert_eq!(breakdown["Supplies"], dec!(12500));
        assert_eq!(breakdown["Utilities"], dec!(7500));
        assert_eq!(breakdown.len(), 2);
    }

    #[test]
    fn top_services_rank_by_quantity_and_cap_at_five() {
        let items = vec![
            item("Regular Wash", 3),
            item("Dry Clean", 1),
            item("Regular Wash", 4),
            item("Express Wash", 5),
            item("Iron Only", 2),
            item("Bed Cover", 1),
            item("Shoe Cleaning", 1),
        ];

        let top = top_services(&items);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "Regular Wash");
        assert_eq!(top[0].count, 7);
        assert_eq!(top[1].name, "Express Wash");
        assert_eq!(top[1].count, 5);
    }
}
