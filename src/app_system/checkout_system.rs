use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::{Config, ConfigError};
use crate::actor_framework::ResourceActor;
use crate::clients::{
    GatewayError, HttpUserClient, PaymentGateway, StripeGateway, UserClientError, UserDirectory,
};
use crate::clock::{Clock, SystemClock};
use crate::domain::Payment;
use crate::services::{OrderService, PaymentService};
use crate::store::{ActorOrderStore, ActorPaymentStore, OrderRow};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    UserClient(#[from] UserClientError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Actor task failed: {0}")]
    Task(String),
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Starts the store actors and wires them to the workflows.
///
/// Must be created inside a tokio runtime.
pub struct CheckoutSystem {
    pub order_service: OrderService,
    pub payment_service: PaymentService,
    handles: Vec<JoinHandle<()>>,
}

impl CheckoutSystem {
    /// Production wiring: HTTP user directory, Stripe gateway, wall clock.
    pub fn new(config: &Config) -> Result<Self, SystemError> {
        let users = HttpUserClient::new(&config.user_service_url, config.user_service_timeout)?;
        let gateway =
            StripeGateway::new(&config.payment_gateway_url, config.payment_gateway_key.clone())?;
        Ok(Self::with_dependencies(
            config,
            Arc::new(users),
            Arc::new(gateway),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_dependencies(
        config: &Config,
        users: Arc<dyn UserDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // 1. Order store
        let (order_actor, order_client) =
            ResourceActor::<OrderRow>::new(config.store_buffer_size, new_id);
        let order_handle = tokio::spawn(order_actor.run());
        let order_service =
            OrderService::new(Arc::new(ActorOrderStore::new(order_client)), users, clock.clone());

        // 2. Payment store
        let (payment_actor, payment_client) =
            ResourceActor::<Payment>::new(config.store_buffer_size, new_id);
        let payment_handle = tokio::spawn(payment_actor.run());
        let payment_service =
            PaymentService::new(Arc::new(ActorPaymentStore::new(payment_client)), gateway, clock);

        info!(
            user_service_url = %config.user_service_url,
            payment_gateway_url = %config.payment_gateway_url,
            "Checkout system started"
        );

        Self {
            order_service,
            payment_service,
            handles: vec![order_handle, payment_handle],
        }
    }

    /// Drops the services, which closes the store channels, then waits for the actors.
    ///
    /// Clones of the services held elsewhere keep their store actor alive.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        drop(self.order_service);
        drop(self.payment_service);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::Task(e.to_string()));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
