use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UserProfile;

/// One product line inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: String,
    pub name: String,
    /// Unit price, never negative.
    pub price: f64,
    /// At least one.
    pub quantity: u32,
}

impl LineItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }
}

/// Sum of unit price times quantity over all line items.
///
/// No rounding is applied.
pub fn calculate_total(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.price * f64::from(item.quantity)).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid status {0:?}. Must be pending, completed, or cancelled")]
pub struct InvalidOrderStatus(pub String);

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Terminal orders never go back to pending.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        !(self.is_terminal() && next == OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(InvalidOrderStatus(other.to_string())),
        }
    }
}

/// A priced, persisted customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub products: Vec<LineItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order priced from its line items.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        products: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            id: id.into(),
            user_id: user_id.into(),
            products: Vec::new(),
            total_amount: 0.0,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        order.set_products(products);
        order
    }

    /// Replaces the line items and re-derives the total.
    pub fn set_products(&mut self, products: Vec<LineItem>) {
        self.total_amount = calculate_total(&products);
        self.products = products;
    }
}

/// Input for order creation. Carries no total: it is always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub products: Vec<LineItem>,
}

impl CreateOrderRequest {
    /// Checks the request shape before any lookup or write.
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user ID is required".into());
        }
        if self.products.is_empty() {
            return Err("order must contain at least one product".into());
        }
        for item in &self.products {
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(format!("product {} has invalid price {}", item.product_id, item.price));
            }
            if item.quantity == 0 {
                return Err(format!(
                    "product {} must have a quantity of at least 1",
                    item.product_id
                ));
            }
        }
        Ok(())
    }
}

/// Whether the live user lookup behind an [`OrderView`] succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Resolved,
    Skipped { reason: String },
}

/// Order as returned to callers, with the owner's name and email looked up live.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user_name: String,
    pub user_email: String,
    #[serde(skip)]
    pub enrichment: Enrichment,
}

impl OrderView {
    pub fn enriched(order: Order, user: &UserProfile) -> Self {
        Self {
            order,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            enrichment: Enrichment::Resolved,
        }
    }

    /// View with empty user fields because the lookup failed.
    pub fn unenriched(order: Order, reason: impl fmt::Display) -> Self {
        Self {
            order,
            user_name: String::new(),
            user_email: String::new(),
            enrichment: Enrichment::Skipped { reason: reason.to_string() },
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.enrichment == Enrichment::Resolved
    }
}
