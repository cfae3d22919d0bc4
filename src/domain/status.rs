use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "payment_pending")]
    Pending,
    #[serde(rename = "payment_completed")]
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "payment_pending",
            PaymentStatus::Completed => "payment_completed",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "payment_pending" => Some(PaymentStatus::Pending),
            "payment_completed" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }
}

/// Who may write which status value. Admins may set any recognized status;
/// a customer may only move their own order from `pending` to `cancelled`.
pub fn is_status_change_allowed(
    caller_is_admin: bool,
    caller_owns_order: bool,
    current: OrderStatus,
    requested: OrderStatus,
) -> bool {
    if caller_is_admin {
        return true;
    }
    caller_owns_order && current == OrderStatus::Pending && requested == OrderStatus::Cancelled
}

/// Item deletion is only possible while the order is still being worked on.
pub fn allows_item_deletion(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Pending | OrderStatus::Processing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_may_cancel_own_pending_order() {
        assert!(is_status_change_allowed(
            false,
            true,
            OrderStatus::Pending,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn customer_may_not_cancel_someone_elses_order() {
        assert!(!is_status_change_allowed(
            false,
            false,
            OrderStatus::Pending,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn customer_may_not_perform_other_transitions() {
        for requested in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
        ] {
            assert!(
                !is_status_change_allowed(false, true, OrderStatus::Pending, requested),
                "customer should not be able to set {:?}",
                requested
            );
        }
        // Already past pending: cancel is no longer available either.
        assert!(!is_status_change_allowed(
            false,
            true,
            OrderStatus::Processing,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn admin_may_set_any_recognized_status() {
        for current in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            for requested in [
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ] {
                assert!(is_status_change_allowed(true, false, current, requested));
            }
        }
    }

    #[test]
    fn unrecognized_values_do_not_parse() {
        assert!(OrderStatus::parse("shipped").is_none());
        assert!(PaymentStatus::parse("paid").is_none());
    }

    #[test]
    fn item_deletion_only_for_pending_and_processing() {
        assert!(allows_item_deletion(OrderStatus::Pending));
        assert!(allows_item_deletion(OrderStatus::Processing));
        assert!(!allows_item_deletion(OrderStatus::Completed));
        assert!(!allows_item_deletion(OrderStatus::Cancelled));
    }
}
