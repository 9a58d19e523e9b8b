use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::{requested, StoreError};
use crate::actor_framework::{Entity, FrameworkError, ResourceClient};
use crate::domain::{Payment, PaymentStatus};

/// Payment persistence operations used by the payment workflow.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts the payment. An empty id is replaced by a generated one.
    async fn create_payment(&self, payment: Payment) -> Result<Payment, StoreError>;
    async fn get_payment(&self, id: &str) -> Result<Payment, StoreError>;
    /// Most recent first.
    async fn list_payments_by_user(&self, user_id: &str) -> Result<Vec<Payment>, StoreError>;
    /// Writes status, gateway id and update time. Amount and currency are never rewritten.
    async fn update_payment(&self, payment: &Payment) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub stripe_charge_id: Option<String>,
    pub at: DateTime<Utc>,
}

impl Entity for Payment {
    type Id = String;
    type CreateParams = Payment;
    type UpdateParams = PaymentUpdate;

    fn id(&self) -> &String { &self.id }

    fn requested_id(params: &Payment) -> Option<String> {
        requested(&params.id)
    }

    fn from_create_params(id: String, params: Payment) -> Result<Self, String> {
        Ok(Self { id, ..params })
    }

    /// Settles a pending payment. Settled payments are final.
    fn on_update(&mut self, update: PaymentUpdate) -> Result<(), String> {
        if self.status != PaymentStatus::Pending && update.status != self.status {
            return Err(format!(
                "payment {} is already {}, cannot move to {}",
                self.id, self.status, update.status
            ));
        }
        self.status = update.status;
        self.stripe_charge_id = update.stripe_charge_id;
        self.updated_at = update.at;
        Ok(())
    }
}

/// [`PaymentStore`] backed by the payment store actor.
#[derive(Clone)]
pub struct ActorPaymentStore {
    inner: ResourceClient<Payment>,
}

impl ActorPaymentStore {
    pub fn new(inner: ResourceClient<Payment>) -> Self {
        Self { inner }
    }
}

fn not_found(err: FrameworkError) -> StoreError {
    StoreError::from_framework("payment", err)
}

#[async_trait]
impl PaymentStore for ActorPaymentStore {
    #[instrument(skip(self, payment), fields(user_id = %payment.user_id, amount = payment.amount))]
    async fn create_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        debug!("Sending request");
        self.inner.create(payment).await.map_err(not_found)
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, id: &str) -> Result<Payment, StoreError> {
        debug!("Sending request");
        self.inner
            .get(id.to_string())
            .await
            .map_err(not_found)?
            .ok_or_else(|| StoreError::NotFound(format!("payment {} not found", id)))
    }

    #[instrument(skip(self))]
    async fn list_payments_by_user(&self, user_id: &str) -> Result<Vec<Payment>, StoreError> {
        debug!("Sending request");
        let owner = user_id.to_string();
        let mut payments = self
            .inner
            .list_where(move |payment: &Payment| payment.user_id == owner)
            .await
            .map_err(not_found)?;
        // Insertion order is creation order.
        payments.reverse();
        Ok(payments)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id, status = %payment.status))]
    async fn update_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        debug!("Sending request");
        let update = PaymentUpdate {
            status: payment.status,
            stripe_charge_id: payment.stripe_charge_id.clone(),
            at: payment.updated_at,
        };
        self.inner
            .update(payment.id.clone(), update)
            .await
            .map(|_| ())
            .map_err(not_found)
    }
}
