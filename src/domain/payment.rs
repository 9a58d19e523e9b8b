use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment attempt. Amount is in minor currency units (e.g. cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: PaymentStatus,
    /// Gateway identifier recorded on success. Holds the payment intent id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_charge_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for payment creation.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "desc", default)]
    pub description: Option<String>,
    #[serde(rename = "card_token")]
    pub method_token: String,
}

impl fmt::Debug for CreatePaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatePaymentRequest")
            .field("user_id", &self.user_id)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("description", &self.description)
            .field("method_token", &"<redacted>")
            .finish()
    }
}

impl CreatePaymentRequest {
    /// Checks presence of the required fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user ID is required".into());
        }
        if self.amount <= 0 {
            return Err(format!("amount must be positive, got {}", self.amount));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("currency must be a 3-letter ISO code, got {:?}", self.currency));
        }
        if self.method_token.trim().is_empty() {
            return Err("payment method token is required".into());
        }
        Ok(())
    }
}
