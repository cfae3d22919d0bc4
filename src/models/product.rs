use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::Pricing;
use crate::schema::products;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub base_price: BigDecimal,
    pub unit_label: String,
    pub available: bool,
    pub preorder_only: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Variant label → override price, e.g. `{"250gm": 5, "500gm": 9}`.
    pub variants: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn pricing(&self) -> Pricing {
        Pricing::from_parts(&self.base_price, self.variants.as_ref())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub category: String,
    pub base_price: BigDecimal,
    pub unit_label: String,
    pub available: bool,
    pub preorder_only: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub variants: Option<serde_json::Value>,
}
