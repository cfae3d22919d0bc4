use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::orders;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub payment_received_at: Option<DateTime<Utc>>,
    pub pickup_location: Option<String>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub admin_timeline: Option<String>,
    pub admin_notes: Option<String>,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub pickup_location: Option<String>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}
