use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::product::Product;
use crate::schema::products;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub base_price: String,
    pub unit_label: String,
    pub available: bool,
    pub preorder_only: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Variant label → price override
    pub variants: Option<serde_json::Value>,
}

/// The public menu: available products, grouped client-side by category.
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Available products", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let response = web::block(move || {
        let mut conn = pool.get()?;

        let rows: Vec<Product> = products::table
            .filter(products::available.eq(true))
            .order((products::category.asc(), products::name.asc()))
            .select(Product::as_select())
            .load(&mut conn)?;

        Ok::<_, AppError>(
            rows.into_iter()
                .map(|p| ProductResponse {
                    id: p.id,
                    name: p.name,
                    category: p.category,
                    base_price: p.base_price.to_string(),
                    unit_label: p.unit_label,
                    available: p.available,
                    preorder_only: p.preorder_only,
                    image_url: p.image_url,
                    description: p.description,
                    variants: p.variants,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}
