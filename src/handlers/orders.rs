use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Session;
use crate::db::DbPool;
use crate::domain::status::{
    allows_item_deletion, is_status_change_allowed, OrderStatus, PaymentStatus,
};
use crate::errors::AppError;
use crate::models::order::{NewOrder, Order};
use crate::models::order_item::{NewOrderItem, OrderItem};
use crate::models::product::Product;
use crate::models::user::User;
use crate::notify::Notifier;
use crate::schema::{order_items, orders, products, users};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: String,
    pub quantity: i32,
    /// Variant label, e.g. "500gm"
    pub selected_size: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfoRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartItemRequest>,
    pub customer_info: Option<CustomerInfoRequest>,
    pub pickup_location: Option<String>,
    pub pickup_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPriceEntry {
    pub item_id: Uuid,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.50"
    pub price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    /// Caller-supplied payment timestamp; unparseable input falls back to now.
    pub payment_received_at: Option<String>,
    pub admin_timeline: Option<String>,
    pub admin_notes: Option<String>,
    /// Manual total override as a decimal string.
    pub total_amount: Option<String>,
    pub item_prices: Option<Vec<ItemPriceEntry>>,
    pub pickup_location: Option<String>,
    pub pickup_date: Option<DateTime<Utc>>,
}

impl UpdateOrderRequest {
    fn has_any_field(&self) -> bool {
        self.status.is_some()
            || self.payment_status.is_some()
            || self.payment_received_at.is_some()
            || self.admin_timeline.is_some()
            || self.admin_notes.is_some()
            || self.total_amount.is_some()
            || self.item_prices.is_some()
            || self.pickup_location.is_some()
            || self.pickup_date.is_some()
    }

    fn has_admin_only_field(&self) -> bool {
        self.payment_status.is_some()
            || self.payment_received_at.is_some()
            || self.admin_timeline.is_some()
            || self.admin_notes.is_some()
            || self.total_amount.is_some()
            || self.item_prices.is_some()
            || self.pickup_location.is_some()
            || self.pickup_date.is_some()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemQuery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub subtotal: String,
    pub selected_size: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: String,
    pub status: String,
    pub payment_status: String,
    pub payment_received_at: Option<String>,
    pub pickup_location: Option<String>,
    pub pickup_date: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub admin_timeline: Option<String>,
    pub admin_notes: Option<String>,
    pub notification_sent: bool,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
    pub user: Option<UserSummaryResponse>,
}

pub(crate) fn order_response(order: Order, items: Vec<OrderItem>, user: Option<User>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        user_id: order.user_id,
        total_amount: order.total_amount.to_string(),
        status: order.status,
        payment_status: order.payment_status,
        payment_received_at: order.payment_received_at.map(|t| t.to_rfc3339()),
        pickup_location: order.pickup_location,
        pickup_date: order.pickup_date.map(|t| t.to_rfc3339()),
        customer_name: order.customer_name,
        customer_phone: order.customer_phone,
        customer_email: order.customer_email,
        admin_timeline: order.admin_timeline,
        admin_notes: order.admin_notes,
        notification_sent: order.notification_sent,
        created_at: order.created_at.to_rfc3339(),
        updated_at: order.updated_at.to_rfc3339(),
        items: items
            .into_iter()
            .map(|i| OrderItemResponse {
                id: i.id,
                product_id: i.product_id,
                product_name: i.product_name,
                quantity: i.quantity,
                unit_price: i.unit_price.to_string(),
                subtotal: i.subtotal.to_string(),
                selected_size: i.variant,
                special_instructions: i.special_instructions,
            })
            .collect(),
        user: user.map(|u| UserSummaryResponse {
            id: u.id,
            name: u.name,
            email: u.email,
        }),
    }
}

fn load_order_expanded(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Option<(Order, Vec<OrderItem>, Option<User>)>, AppError> {
    let order = orders::table
        .find(order_id)
        .select(Order::as_select())
        .first(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .order(order_items::created_at.asc())
        .select(OrderItem::as_select())
        .load(conn)?;

    let user = users::table
        .find(order.user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(Some((order, items, user)))
}

// ── POST /orders ─────────────────────────────────────────────────────────────

/// Creates an order from a cart snapshot. The order row and all item rows are
/// written in one transaction; totals come from the resolved per-line prices.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty cart or unavailable product"),
        (status = 401, description = "Unauthenticated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    if body.items.is_empty() {
        return Err(AppError::validation("Cart is empty"));
    }

    let user_id = session.user_id;
    let response = web::block(move || {
        let mut conn = pool.get()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let user: User = users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or(AppError::Unauthorized)?;

            let order_id = Uuid::new_v4();
            let mut total = BigDecimal::from(0);
            let mut new_items = Vec::with_capacity(body.items.len());

            for line in &body.items {
                if line.quantity <= 0 {
                    return Err(AppError::validation(format!(
                        "Invalid quantity for product '{}'",
                        line.product_id
                    )));
                }

                let product = products::table
                    .find(&line.product_id)
                    .select(Product::as_select())
                    .first(conn)
                    .optional()?
                    .filter(|p| p.available)
                    .ok_or_else(|| {
                        AppError::validation(format!(
                            "Product '{}' is not available",
                            line.product_id
                        ))
                    })?;

                let unit_price = product
                    .pricing()
                    .resolve_unit_price(line.selected_size.as_deref());
                let subtotal = &unit_price * BigDecimal::from(line.quantity);
                total += &subtotal;

                new_items.push(NewOrderItem {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: product.id,
                    product_name: product.name,
                    quantity: line.quantity,
                    unit_price,
                    subtotal,
                    variant: line.selected_size.clone(),
                    special_instructions: line.special_instructions.clone(),
                });
            }

            // Contact snapshot: explicit payload → user profile → null.
            let info = body.customer_info.as_ref();
            let customer_name = info
                .and_then(|c| c.name.clone())
                .or_else(|| Some(user.name.clone()));
            let customer_phone = info
                .and_then(|c| c.phone.clone())
                .or_else(|| user.phone.clone());
            let customer_email = info
                .and_then(|c| c.email.clone())
                .or_else(|| Some(user.email.clone()));

            let order: Order = diesel::insert_into(orders::table)
                .values(&NewOrder {
                    id: order_id,
                    user_id,
                    total_amount: total,
                    status: OrderStatus::Pending.as_str().to_string(),
                    payment_status: PaymentStatus::Pending.as_str().to_string(),
                    pickup_location: body.pickup_location.clone(),
                    pickup_date: body.pickup_date,
                    customer_name,
                    customer_phone,
                    customer_email,
                })
                .get_result(conn)?;

            let items: Vec<OrderItem> = diesel::insert_into(order_items::table)
                .values(&new_items)
                .get_results(conn)?;

            Ok(order_response(order, items, Some(user)))
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

// ── GET /orders ──────────────────────────────────────────────────────────────

/// Lists orders newest first. Admins see every order; customers see their own.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders, newest first", body = [OrderResponse]),
        (status = 401, description = "Unauthenticated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    pool: web::Data<DbPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let response = web::block(move || {
        let mut conn = pool.get()?;

        let mut query = orders::table
            .inner_join(users::table)
            .select((Order::as_select(), User::as_select()))
            .order(orders::created_at.desc())
            .into_boxed();
        if !session.is_admin() {
            query = query.filter(orders::user_id.eq(session.user_id));
        }

        let rows: Vec<(Order, User)> = query.load(&mut conn)?;

        let order_rows: Vec<Order> = rows.iter().map(|(o, _)| o.clone()).collect();
        let items: Vec<OrderItem> = OrderItem::belonging_to(&order_rows)
            .select(OrderItem::as_select())
            .load(&mut conn)?;
        let grouped = items.grouped_by(&order_rows);

        let responses: Vec<OrderResponse> = rows
            .into_iter()
            .zip(grouped)
            .map(|((order, user), items)| order_response(order, items, Some(user)))
            .collect();

        Ok::<_, AppError>(responses)
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

// ── GET /orders/{id} ─────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;

        let (order, items, user) =
            load_order_expanded(&mut conn, order_id)?.ok_or(AppError::NotFound("Order"))?;

        if !session.is_admin() && order.user_id != session.user_id {
            return Err(AppError::Unauthorized);
        }

        Ok(order_response(order, items, user))
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

// ── DELETE /orders ───────────────────────────────────────────────────────────

/// Deletes every order; item rows go with them via the cascade.
#[utoipa::path(
    delete,
    path = "/orders",
    responses(
        (status = 200, description = "Count of deleted orders"),
        (status = 401, description = "Not an admin"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_all_orders(
    pool: web::Data<DbPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let count = web::block(move || {
        let mut conn = pool.get()?;
        let count = diesel::delete(orders::table).execute(&mut conn)?;
        Ok::<_, AppError>(count)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({ "deletedCount": count })))
}

// ── PATCH /orders/{id} ───────────────────────────────────────────────────────

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = orders)]
struct OrderChanges {
    status: Option<String>,
    payment_status: Option<String>,
    payment_received_at: Option<Option<DateTime<Utc>>>,
    pickup_location: Option<String>,
    pickup_date: Option<DateTime<Utc>>,
    admin_timeline: Option<String>,
    admin_notes: Option<String>,
    total_amount: Option<BigDecimal>,
    updated_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 or a plain `YYYY-MM-DD`; anything else falls back to `now`.
fn parse_payment_timestamp(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(date) = chrono::NaiveDate::from_str(raw) {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return ts.and_utc();
        }
    }
    now
}

/// Updates order fields. Customers may only cancel their own pending order;
/// admins may set status, payment fields, notes, per-item prices and a manual
/// total. All checks and writes run in one transaction.
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Invalid status or no fields to update"),
        (status = 401, description = "Not permitted for this caller"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();

    if !body.has_any_field() {
        return Err(AppError::validation("no fields to update"));
    }

    let requested_status = match &body.status {
        Some(raw) => Some(
            OrderStatus::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Invalid status '{}'", raw)))?,
        ),
        None => None,
    };
    let requested_payment = match &body.payment_status {
        Some(raw) => Some(
            PaymentStatus::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Invalid payment status '{}'", raw)))?,
        ),
        None => None,
    };

    let response = web::block(move || {
        let mut conn = pool.get()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let now = Utc::now();

            if !session.is_admin() {
                if body.has_admin_only_field() {
                    return Err(AppError::Unauthorized);
                }
                let Some(OrderStatus::Cancelled) = requested_status else {
                    return Err(AppError::Unauthorized);
                };

                // Single conditional update closes the check-then-act window:
                // the row must still be this caller's pending order.
                let cancelled: Option<Order> = diesel::update(
                    orders::table.filter(
                        orders::id
                            .eq(order_id)
                            .and(orders::user_id.eq(session.user_id))
                            .and(orders::status.eq(OrderStatus::Pending.as_str())),
                    ),
                )
                .set((
                    orders::status.eq(OrderStatus::Cancelled.as_str()),
                    orders::updated_at.eq(now),
                ))
                .get_result(conn)
                .optional()?;

                if cancelled.is_none() {
                    let exists: Option<Uuid> = orders::table
                        .find(order_id)
                        .select(orders::id)
                        .first(conn)
                        .optional()?;
                    return Err(match exists {
                        Some(_) => AppError::Unauthorized,
                        None => AppError::NotFound("Order"),
                    });
                }

                let (order, items, user) = load_order_expanded(conn, order_id)?
                    .ok_or(AppError::NotFound("Order"))?;
                return Ok(order_response(order, items, user));
            }

            // Admin path.
            let order: Order = orders::table
                .find(order_id)
                .select(Order::as_select())
                .first(conn)
                .optional()?
                .ok_or(AppError::NotFound("Order"))?;

            if let Some(requested) = requested_status {
                let current = OrderStatus::parse(&order.status)
                    .ok_or_else(|| AppError::Internal("stored status unrecognized".to_string()))?;
                if !is_status_change_allowed(true, false, current, requested) {
                    return Err(AppError::Unauthorized);
                }
            }

            let mut changes = OrderChanges {
                status: requested_status.map(|s| s.as_str().to_string()),
                payment_status: requested_payment.map(|s| s.as_str().to_string()),
                pickup_location: body.pickup_location.clone(),
                pickup_date: body.pickup_date,
                admin_timeline: body.admin_timeline.clone(),
                admin_notes: body.admin_notes.clone(),
                updated_at: Some(now),
                ..OrderChanges::default()
            };

            match requested_payment {
                Some(PaymentStatus::Completed) => {
                    let ts = body
                        .payment_received_at
                        .as_deref()
                        .map(|raw| parse_payment_timestamp(raw, now))
                        .unwrap_or(now);
                    changes.payment_received_at = Some(Some(ts));
                }
                Some(PaymentStatus::Pending) => {
                    changes.payment_received_at = Some(None);
                }
                None => {}
            }

            // Per-item price batch: applied against one snapshot of the
            // order's items, then the total is recomputed from that snapshot.
            if let Some(entries) = &body.item_prices {
                let mut items: Vec<OrderItem> = order_items::table
                    .filter(order_items::order_id.eq(order_id))
                    .select(OrderItem::as_select())
                    .load(conn)?;

                for entry in entries {
                    let item = items
                        .iter_mut()
                        .find(|i| i.id == entry.item_id)
                        .ok_or_else(|| {
                            AppError::validation(format!(
                                "Item '{}' does not belong to this order",
                                entry.item_id
                            ))
                        })?;
                    let price = BigDecimal::from_str(&entry.price).map_err(|_| {
                        AppError::validation(format!("Invalid price '{}'", entry.price))
                    })?;
                    item.unit_price = price.clone();
                    item.subtotal = &price * BigDecimal::from(item.quantity);

                    diesel::update(order_items::table.find(item.id))
                        .set((
                            order_items::unit_price.eq(&item.unit_price),
                            order_items::subtotal.eq(&item.subtotal),
                        ))
                        .execute(conn)?;
                }

                let recomputed: BigDecimal =
                    items.iter().map(|i| i.subtotal.clone()).sum();
                changes.total_amount = Some(recomputed);
            }

            // An explicit manual total always wins over the recomputed one.
            if let Some(raw) = &body.total_amount {
                let total = BigDecimal::from_str(raw)
                    .map_err(|_| AppError::validation(format!("Invalid total '{}'", raw)))?;
                changes.total_amount = Some(total);
            }

            diesel::update(orders::table.find(order_id))
                .set(&changes)
                .execute(conn)?;

            let (order, items, user) =
                load_order_expanded(conn, order_id)?.ok_or(AppError::NotFound("Order"))?;
            Ok(order_response(order, items, user))
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

// ── POST /orders/{id}/confirm ────────────────────────────────────────────────

/// Confirms a pending order: status moves to `processing`, the notification
/// flag is set, and the admin phone gets a message. The status change commits
/// before the message is sent; a send failure is logged, never surfaced.
#[utoipa::path(
    post,
    path = "/orders/{id}/confirm",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Confirmed order", body = OrderResponse),
        (status = 400, description = "Order is not pending"),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn confirm_order(
    pool: web::Data<DbPool>,
    notifier: web::Data<Notifier>,
    session: Session,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let order_id = path.into_inner();

    let (order, items, user) = web::block(move || {
        let mut conn = pool.get()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let current: Option<String> = orders::table
                .find(order_id)
                .select(orders::status)
                .first(conn)
                .optional()?;
            let current = current.ok_or(AppError::NotFound("Order"))?;
            if current != OrderStatus::Pending.as_str() {
                return Err(AppError::validation("Order is not pending"));
            }

            // Conditional update: a concurrent confirm loses the race cleanly.
            let confirmed = diesel::update(
                orders::table.filter(
                    orders::id
                        .eq(order_id)
                        .and(orders::status.eq(OrderStatus::Pending.as_str())),
                ),
            )
            .set((
                orders::status.eq(OrderStatus::Processing.as_str()),
                orders::notification_sent.eq(true),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
            if confirmed == 0 {
                return Err(AppError::validation("Order is not pending"));
            }

            load_order_expanded(conn, order_id)?.ok_or(AppError::NotFound("Order"))
        })
    })
    .await??;

    if let Err(e) = notifier
        .send_order_confirmation(&order, &items, user.as_ref())
        .await
    {
        log::error!("order {} confirmed but notification failed: {}", order.id, e);
    }

    Ok(HttpResponse::Ok().json(order_response(order, items, user)))
}

// ── DELETE /orders/items ─────────────────────────────────────────────────────

/// `[timestamp] DELETED: <product name>[(size)][ - Reason: <reason>]`
fn deletion_audit_line(
    timestamp: DateTime<Utc>,
    product_name: &str,
    variant: Option<&str>,
    reason: Option<&str>,
) -> String {
    let mut line = format!("[{}] DELETED: {}", timestamp.to_rfc3339(), product_name);
    if let Some(variant) = variant {
        line.push_str(&format!("({})", variant));
    }
    if let Some(reason) = reason {
        line.push_str(&format!(" - Reason: {}", reason));
    }
    line
}

fn append_note(existing: Option<&str>, line: &str) -> String {
    match existing {
        Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, line),
        _ => line.to_string(),
    }
}

/// Removes one item from an order. Deleting the last remaining item deletes
/// the whole order instead; otherwise the total is recomputed from the
/// remaining items and an audit line is appended to the admin notes.
#[utoipa::path(
    delete,
    path = "/orders/items",
    params(
        ("id" = Uuid, Query, description = "Order item UUID"),
        ("orderId" = Uuid, Query, description = "Parent order UUID"),
        ("reason" = Option<String>, Query, description = "Free-text audit reason"),
    ),
    responses(
        (status = 200, description = "newTotal, or orderDeleted when the last item went"),
        (status = 400, description = "Missing parameters"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Wrong status or not permitted"),
        (status = 404, description = "Order or item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order_item(
    pool: web::Data<DbPool>,
    session: Session,
    query: web::Query<DeleteItemQuery>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();

    let body = web::block(move || {
        let mut conn = pool.get()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let order: Order = orders::table
                .find(params.order_id)
                .select(Order::as_select())
                .first(conn)
                .optional()?
                .ok_or(AppError::NotFound("Order"))?;

            let status = OrderStatus::parse(&order.status)
                .ok_or_else(|| AppError::Internal("stored status unrecognized".to_string()))?;
            if !allows_item_deletion(status) {
                return Err(AppError::Forbidden);
            }
            if !session.is_admin() && order.user_id != session.user_id {
                return Err(AppError::Forbidden);
            }

            let items: Vec<OrderItem> = order_items::table
                .filter(order_items::order_id.eq(order.id))
                .select(OrderItem::as_select())
                .load(conn)?;

            // Last item: the order goes with it. Empty orders never persist.
            if items.len() == 1 {
                diesel::delete(orders::table.find(order.id)).execute(conn)?;
                return Ok(json!({ "orderDeleted": true }));
            }

            let item = items
                .iter()
                .find(|i| i.id == params.id)
                .ok_or(AppError::NotFound("Order item"))?;

            diesel::delete(order_items::table.find(item.id)).execute(conn)?;

            let new_total: BigDecimal = items
                .iter()
                .filter(|i| i.id != item.id)
                .map(|i| i.subtotal.clone())
                .sum();

            let line = deletion_audit_line(
                Utc::now(),
                &item.product_name,
                item.variant.as_deref(),
                params.reason.as_deref(),
            );
            let notes = append_note(order.admin_notes.as_deref(), &line);

            diesel::update(orders::table.find(order.id))
                .set((
                    orders::total_amount.eq(&new_total),
                    orders::admin_notes.eq(notes),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(json!({ "newTotal": new_total.to_string() }))
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(body))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn audit_line_with_size_and_reason() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
        let line = deletion_audit_line(ts, "Choco Ladoo", Some("500gm"), Some("out of stock"));
        assert_eq!(
            line,
            "[2026-08-23T10:00:00+00:00] DELETED: Choco Ladoo(500gm) - Reason: out of stock"
        );
    }

    #[test]
    fn audit_line_without_optionals() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
        let line = deletion_audit_line(ts, "B", None, None);
        assert_eq!(line, "[2026-08-23T10:00:00+00:00] DELETED: B");
    }

    #[test]
    fn notes_are_newline_appended() {
        assert_eq!(append_note(Some("first"), "second"), "first\nsecond");
        assert_eq!(append_note(None, "only"), "only");
        assert_eq!(append_note(Some(""), "only"), "only");
    }

    #[test]
    fn unparseable_payment_timestamp_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        assert_eq!(parse_payment_timestamp("not a date", now), now);
        assert_eq!(
            parse_payment_timestamp("2026-08-20", now),
            Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_payment_timestamp("2026-08-20T09:30:00+00:00", now),
            Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap()
        );
    }
}
