use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::errors::AppError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

impl From<XlsxError> for AppError {
    fn from(e: XlsxError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// One row of the orders export, flattened for the sheet.
#[derive(Debug)]
pub struct OrderExportRow {
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub status: String,
    pub payment_status: String,
    pub total_amount: BigDecimal,
    pub items_summary: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the earnings export (payment-completed orders only).
#[derive(Debug)]
pub struct EarningsExportRow {
    pub order_id: String,
    pub customer_name: String,
    pub amount: BigDecimal,
    pub payment_received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn amount_cell(amount: &BigDecimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

fn timestamp_cell(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn orders_workbook(rows: &[OrderExportRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Orders")?;
    let header = Format::new().set_bold();

    let columns = [
        "Order ID",
        "Customer",
        "Phone",
        "Status",
        "Payment",
        "Total",
        "Items",
        "Created",
    ];
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.order_id)?;
        sheet.write_string(r, 1, &row.customer_name)?;
        sheet.write_string(r, 2, &row.customer_phone)?;
        sheet.write_string(r, 3, &row.status)?;
        sheet.write_string(r, 4, &row.payment_status)?;
        sheet.write_number(r, 5, amount_cell(&row.total_amount))?;
        sheet.write_string(r, 6, &row.items_summary)?;
        sheet.write_string(r, 7, &timestamp_cell(row.created_at))?;
    }

    workbook.save_to_buffer()
}

pub fn earnings_workbook(rows: &[EarningsExportRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Earnings")?;
    let header = Format::new().set_bold();

    let columns = ["Order ID", "Customer", "Amount", "Payment received", "Created"];
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    let mut total = BigDecimal::from(0);
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.order_id)?;
        sheet.write_string(r, 1, &row.customer_name)?;
        sheet.write_number(r, 2, amount_cell(&row.amount))?;
        let received = row
            .payment_received_at
            .map(timestamp_cell)
            .unwrap_or_default();
        sheet.write_string(r, 3, &received)?;
        sheet.write_string(r, 4, &timestamp_cell(row.created_at))?;
        total += &row.amount;
    }

    let summary_row = (rows.len() + 2) as u32;
    sheet.write_string_with_format(summary_row, 1, "Total earnings", &header)?;
    sheet.write_number_with_format(summary_row, 2, amount_cell(&total), &header)?;

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn orders_workbook_produces_bytes() {
        let rows = vec![OrderExportRow {
            order_id: "a1b2".to_string(),
            customer_name: "Asha".to_string(),
            customer_phone: "+911112223334".to_string(),
            status: "pending".to_string(),
            payment_status: "payment_pending".to_string(),
            total_amount: BigDecimal::from_str("27.00").unwrap(),
            items_summary: "3 x Choco Ladoo (500gm)".to_string(),
            created_at: Utc::now(),
        }];
        let bytes = orders_workbook(&rows).expect("workbook failed");
        assert!(!bytes.is_empty());
    }

    #[test]
    fn earnings_workbook_produces_bytes_for_empty_input() {
        let bytes = earnings_workbook(&[]).expect("workbook failed");
        assert!(!bytes.is_empty());
    }
}
