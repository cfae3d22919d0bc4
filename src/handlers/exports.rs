use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::Session;
use crate::db::DbPool;
use crate::domain::reports::{
    report_filename, resolve_range, DateFilterType, DateRangePreset, ReportKind,
};
use crate::domain::status::{OrderStatus, PaymentStatus};
use crate::errors::AppError;
use crate::export::{
    earnings_workbook, orders_workbook, EarningsExportRow, OrderExportRow, XLSX_CONTENT_TYPE,
};
use crate::models::order::Order;
use crate::models::order_item::OrderItem;
use crate::models::user::User;
use crate::schema::{orders, users};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdersExportQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub date_range: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningsExportQuery {
    pub date_range: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// "created" or "payment" (default: payment, cash basis)
    pub date_filter_type: Option<String>,
}

fn xlsx_response(filename: String, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes)
}

fn items_summary(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|i| {
            let variant = i
                .variant
                .as_deref()
                .map(|v| format!(" ({})", v))
                .unwrap_or_default();
            format!("{} x {}{}", i.quantity, i.product_name, variant)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Spreadsheet of orders matching the status/payment/date filters.
/// Unrecognized filter values are treated as absent.
#[utoipa::path(
    get,
    path = "/orders/export",
    params(
        ("status" = Option<String>, Query, description = "Order status filter"),
        ("paymentStatus" = Option<String>, Query, description = "Payment status filter"),
        ("dateRange" = Option<String>, Query, description = "today | weeks | months | months3 | quarter"),
        ("startDate" = Option<String>, Query, description = "Custom range start (YYYY-MM-DD)"),
        ("endDate" = Option<String>, Query, description = "Custom range end (YYYY-MM-DD)"),
    ),
    responses(
        (status = 200, description = "xlsx workbook"),
        (status = 401, description = "Not an admin"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "exports"
)]
pub async fn export_orders(
    pool: web::Data<DbPool>,
    session: Session,
    query: web::Query<OrdersExportQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let params = query.into_inner();

    let status = params.status.as_deref().and_then(OrderStatus::parse);
    let payment = params
        .payment_status
        .as_deref()
        .and_then(PaymentStatus::parse);
    let preset = params
        .date_range
        .as_deref()
        .and_then(DateRangePreset::parse);
    let range = resolve_range(preset, params.start_date, params.end_date, Utc::now());
    let filename = report_filename(ReportKind::Orders, status, payment, &range.label);

    let bytes = web::block(move || {
        let mut conn = pool.get()?;

        let mut query = orders::table
            .inner_join(users::table)
            .select((Order::as_select(), User::as_select()))
            .order(orders::created_at.desc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(payment) = payment {
            query = query.filter(orders::payment_status.eq(payment.as_str()));
        }
        if let Some(start) = range.start {
            query = query.filter(orders::created_at.ge(start));
        }
        if let Some(end) = range.end {
            query = query.filter(orders::created_at.le(end));
        }

        let rows: Vec<(Order, User)> = query.load(&mut conn)?;

        let order_rows: Vec<Order> = rows.iter().map(|(o, _)| o.clone()).collect();
        let items: Vec<OrderItem> = OrderItem::belonging_to(&order_rows)
            .select(OrderItem::as_select())
            .load(&mut conn)?;
        let grouped = items.grouped_by(&order_rows);

        let export_rows: Vec<OrderExportRow> = rows
            .into_iter()
            .zip(grouped)
            .map(|((order, user), items)| OrderExportRow {
                order_id: order.id.to_string(),
                customer_name: order.customer_name.unwrap_or(user.name),
                customer_phone: order
                    .customer_phone
                    .or(user.phone)
                    .unwrap_or_default(),
                status: order.status,
                payment_status: order.payment_status,
                total_amount: order.total_amount,
                items_summary: items_summary(&items),
                created_at: order.created_at,
            })
            .collect();

        Ok::<_, AppError>(orders_workbook(&export_rows)?)
    })
    .await??;

    Ok(xlsx_response(filename, bytes))
}

/// Spreadsheet of received payments over the resolved range. Only
/// payment-completed orders count; the range filters by payment date by
/// default, or by creation date when requested.
#[utoipa::path(
    get,
    path = "/products/earnings/export",
    params(
        ("dateRange" = Option<String>, Query, description = "today | weeks | months | months3 | quarter"),
        ("startDate" = Option<String>, Query, description = "Custom range start (YYYY-MM-DD)"),
        ("endDate" = Option<String>, Query, description = "Custom range end (YYYY-MM-DD)"),
        ("dateFilterType" = Option<String>, Query, description = "created | payment"),
    ),
    responses(
        (status = 200, description = "xlsx workbook"),
        (status = 401, description = "Not an admin"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "exports"
)]
pub async fn export_earnings(
    pool: web::Data<DbPool>,
    session: Session,
    query: web::Query<EarningsExportQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let params = query.into_inner();

    let preset = params
        .date_range
        .as_deref()
        .and_then(DateRangePreset::parse);
    let filter_type = params
        .date_filter_type
        .as_deref()
        .and_then(DateFilterType::parse)
        .unwrap_or_default();
    let range = resolve_range(preset, params.start_date, params.end_date, Utc::now());
    let filename = report_filename(ReportKind::Earnings, None, None, &range.label);

    let bytes = web::block(move || {
        let mut conn = pool.get()?;

        let mut query = orders::table
            .inner_join(users::table)
            .select((Order::as_select(), User::as_select()))
            .order(orders::created_at.desc())
            .filter(orders::payment_status.eq(PaymentStatus::Completed.as_str()))
            .into_boxed();
        match filter_type {
            DateFilterType::Created => {
                if let Some(start) = range.start {
                    query = query.filter(orders::created_at.ge(start));
                }
                if let Some(end) = range.end {
                    query = query.filter(orders::created_at.le(end));
                }
            }
            DateFilterType::Payment => {
                if let Some(start) = range.start {
                    query = query.filter(orders::payment_received_at.ge(start));
                }
                if let Some(end) = range.end {
                    query = query.filter(orders::payment_received_at.le(end));
                }
            }
        }

        let rows: Vec<(Order, User)> = query.load(&mut conn)?;

        let export_rows: Vec<EarningsExportRow> = rows
            .into_iter()
            .map(|(order, user)| EarningsExportRow {
                order_id: order.id.to_string(),
                customer_name: order.customer_name.unwrap_or(user.name),
                amount: order.total_amount,
                payment_received_at: order.payment_received_at,
                created_at: order.created_at,
            })
            .collect();

        Ok::<_, AppError>(earnings_workbook(&export_rows)?)
    })
    .await??;

    Ok(xlsx_response(filename, bytes))
}
