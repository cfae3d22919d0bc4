use serde_json::json;

use crate::config::AppConfig;
use crate::models::order::Order;
use crate::models::order_item::OrderItem;
use crate::models::user::User;

/// Customer contact details after applying the fallback chain:
/// order snapshot fields → owning user's profile → none.
#[derive(Debug, Clone, Default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub fn resolve_contact(order: &Order, user: Option<&User>) -> ContactInfo {
    ContactInfo {
        name: order
            .customer_name
            .clone()
            .or_else(|| user.map(|u| u.name.clone())),
        phone: order
            .customer_phone
            .clone()
            .or_else(|| user.and_then(|u| u.phone.clone())),
        email: order
            .customer_email
            .clone()
            .or_else(|| user.map(|u| u.email.clone())),
    }
}

/// Human-readable confirmation message sent to the admin phone.
pub fn compose_confirmation_message(
    order: &Order,
    items: &[OrderItem],
    contact: &ContactInfo,
) -> String {
    let mut lines = vec![format!("Order confirmed: {}", order.id)];

    for item in items {
        let variant = item
            .variant
            .as_deref()
            .map(|v| format!(" ({})", v))
            .unwrap_or_default();
        lines.push(format!(
            "  {} x {}{} - {}",
            item.quantity, item.product_name, variant, item.subtotal
        ));
    }

    lines.push(format!("Total: {}", order.total_amount));

    if let Some(location) = &order.pickup_location {
        lines.push(format!("Pickup: {}", location));
    }
    if let Some(date) = order.pickup_date {
        lines.push(format!("Pickup date: {}", date.format("%Y-%m-%d")));
    }

    lines.push(format!(
        "Customer: {} / {} / {}",
        contact.name.as_deref().unwrap_or("-"),
        contact.phone.as_deref().unwrap_or("-"),
        contact.email.as_deref().unwrap_or("-"),
    ));

    lines.join("\n")
}

/// Sends confirmation messages through a WhatsApp gateway. When no gateway is
/// configured the message is logged instead, which keeps local development
/// working without credentials.
#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    gateway_url: Option<String>,
    admin_phone: String,
}

impl Notifier {
    pub fn new(config: &AppConfig) -> Self {
        Notifier {
            http: reqwest::Client::new(),
            gateway_url: config.whatsapp_gateway_url.clone(),
            admin_phone: config.admin_phone.clone(),
        }
    }

    /// Delivery failures are reported to the caller but must never undo the
    /// already-committed status change; callers log and move on.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
        user: Option<&User>,
    ) -> Result<(), String> {
        let contact = resolve_contact(order, user);
        let message = compose_confirmation_message(order, items, &contact);

        let Some(url) = &self.gateway_url else {
            log::info!(
                "no WhatsApp gateway configured; notification for order {}:\n{}",
                order.id,
                message
            );
            return Ok(());
        };

        let resp = self
            .http
            .post(url)
            .json(&json!({
                "to": self.admin_phone,
                "message": message,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            return Err(format!("gateway returned {}", resp.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn order(name: Option<&str>, phone: Option<&str>) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_amount: BigDecimal::from_str("27").unwrap(),
            status: "processing".to_string(),
            payment_status: "payment_pending".to_string(),
            payment_received_at: None,
            pickup_location: Some("Main store".to_string()),
            pickup_date: None,
            customer_name: name.map(str::to_string),
            customer_phone: phone.map(str::to_string),
            customer_email: None,
            admin_timeline: None,
            admin_notes: None,
            notification_sent: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "asha@example.com".to_string(),
            password_hash: "x".to_string(),
            name: "Asha".to_string(),
            phone: Some("+911112223334".to_string()),
            role: "customer".to_string(),
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_fields_win_over_profile() {
        let contact = resolve_contact(&order(Some("Walk-in"), Some("+910000000000")), Some(&user()));
        assert_eq!(contact.name.as_deref(), Some("Walk-in"));
        assert_eq!(contact.phone.as_deref(), Some("+910000000000"));
        assert_eq!(contact.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn profile_fills_missing_snapshot_fields() {
        let contact = resolve_contact(&order(None, None), Some(&user()));
        assert_eq!(contact.name.as_deref(), Some("Asha"));
        assert_eq!(contact.phone.as_deref(), Some("+911112223334"));
    }

    #[test]
    fn no_user_means_empty_contact() {
        let contact = resolve_contact(&order(None, None), None);
        assert!(contact.name.is_none());
        assert!(contact.phone.is_none());
        assert!(contact.email.is_none());
    }

    #[test]
    fn message_lists_items_and_total() {
        let order = order(Some("Asha"), None);
        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_id: "choco-ladoo".to_string(),
            product_name: "Choco Ladoo".to_string(),
            quantity: 3,
            unit_price: BigDecimal::from_str("9").unwrap(),
            subtotal: BigDecimal::from_str("27").unwrap(),
            variant: Some("500gm".to_string()),
            special_instructions: None,
            created_at: Utc::now(),
        };
        let contact = resolve_contact(&order, None);
        let message = compose_confirmation_message(&order, &[item], &contact);
        assert!(message.contains("3 x Choco Ladoo (500gm) - 27"));
        assert!(message.contains("Total: 27"));
        assert!(message.contains("Pickup: Main store"));
        assert!(message.contains("Customer: Asha"));
    }
}
