use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors from a charge attempt.
///
/// The payment workflow treats every variant the same way: the payment fails.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("charge declined: {message}")]
    Declined { code: Option<String>, message: String },
    #[error("payment gateway unreachable: {0}")]
    Transport(String),
    #[error("unexpected payment gateway response: {0}")]
    InvalidResponse(String),
    #[error("invalid payment gateway configuration: {0}")]
    Setup(String),
}

/// One charge, confirmed immediately.
#[derive(Clone, PartialEq)]
pub struct ChargeRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub method_token: String,
    /// Correlation metadata: the persisted payment id.
    pub payment_id: String,
    pub user_id: String,
}

impl fmt::Debug for ChargeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChargeRequest")
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("description", &self.description)
            .field("method_token", &"<redacted>")
            .field("payment_id", &self.payment_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeOutcome {
    /// Identifier of the payment intent that carried the charge.
    pub charge_id: String,
    pub status: String,
}

/// Remote charge processor. Called at most once per payment.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError>;
}

#[derive(Deserialize)]
struct IntentResponse {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Intent states that mean the charge did not go through.
const DECLINED_STATES: [&str; 2] = ["canceled", "requires_payment_method"];

/// [`PaymentGateway`] over the Stripe payment intents API.
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    base_url: Url,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(base_url: &str, secret_key: impl Into<String>) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url).map_err(|e| GatewayError::Setup(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Setup(format!("{} cannot be a base URL", base_url)));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            secret_key: secret_key.into(),
        })
    }

    fn intents_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1", "payment_intents"]);
        }
        url
    }

    fn form(request: &ChargeRequest) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("payment_method", request.method_token.clone()),
            ("payment_method_types[]", "card".to_string()),
            ("confirm", "true".to_string()),
            ("metadata[payment_id]", request.payment_id.clone()),
            ("metadata[user_id]", request.user_id.clone()),
        ];
        if let Some(description) = &request.description {
            form.push(("description", description.clone()));
        }
        form
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(
        skip(self, request),
        fields(payment_id = %request.payment_id, amount = request.amount)
    )]
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        debug!("Sending request");
        let response = self
            .client
            .post(self.intents_url())
            .bearer_auth(&self.secret_key)
            .form(&Self::form(request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorEnvelope>().await.ok().map(|e| e.error);
            let (code, message) = match body {
                Some(ErrorBody { code, message }) => (
                    code,
                    message.unwrap_or_else(|| format!("status {}", status.as_u16())),
                ),
                None => (None, format!("status {}", status.as_u16())),
            };
            warn!(status = status.as_u16(), ?code, "Charge rejected by gateway");
            return if status.is_server_error() {
                Err(GatewayError::Transport(message))
            } else {
                Err(GatewayError::Declined { code, message })
            };
        }

        let intent = response
            .json::<IntentResponse>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if DECLINED_STATES.contains(&intent.status.as_str()) {
            return Err(GatewayError::Declined {
                code: None,
                message: format!("payment intent {} ended as {}", intent.id, intent.status),
            });
        }
        Ok(ChargeOutcome { charge_id: intent.id, status: intent.status })
    }
}
