use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::clients::{UserClientError, UserDirectory};
use crate::clock::Clock;
use crate::domain::{CreateOrderRequest, Order, OrderStatus, OrderView};
use crate::error::ServiceError;
use crate::store::OrderStore;

/// Orchestrates order creation and enriched order reads.
///
/// Creation is fatal on any user lookup failure. Reads degrade to empty user fields
/// instead, so committed orders stay readable while the directory is down.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, users, clock }
    }

    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, items = request.products.len())
    )]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderView, ServiceError> {
        request.validate().map_err(ServiceError::Caller)?;
        info!("Processing create_order request");

        // Step 1: Validate user. The same profile is used for the response.
        let user = match self.users.validate_user(&request.user_id).await {
            Ok(user) => {
                info!(user_name = %user.name, "User validation successful");
                user
            }
            Err(UserClientError::NotFound(_)) => {
                error!("User not found");
                return Err(ServiceError::Caller(format!("user {} not found", request.user_id)));
            }
            Err(e) => {
                error!(error = %e, "User validation failed");
                return Err(ServiceError::Dependency(e.to_string()));
            }
        };

        // Step 2: Price
        let order = Order::new(String::new(), request.user_id, request.products, self.clock.now());
        info!(total_amount = order.total_amount, "Order priced");

        // Step 3: Persist
        let created = self.store.create_order(order).await.map_err(|e| {
            error!(error = %e, "Order persistence failed");
            ServiceError::Persistence(e.to_string())
        })?;

        info!(order_id = %created.id, "Order created successfully");
        Ok(OrderView::enriched(created, &user))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<OrderView, ServiceError> {
        let order = self.store.get_order(id).await?;
        Ok(self.enrich(order).await)
    }

    #[instrument(skip(self))]
    pub async fn get_orders_by_user(&self, user_id: &str) -> Result<Vec<OrderView>, ServiceError> {
        let orders = self.store.get_orders_by_user(user_id).await?;
        Ok(self.enrich_all(orders).await)
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderView>, ServiceError> {
        let orders = self.store.list_orders().await?;
        Ok(self.enrich_all(orders).await)
    }

    /// Sets the status of an existing order.
    ///
    /// The value is checked here as well as at the boundary because internal callers
    /// reach this method directly.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<OrderView, ServiceError> {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: crate::domain::InvalidOrderStatus| ServiceError::Caller(e.to_string()))?;

        let mut order = self.store.get_order(id).await?;
        if !order.status.can_transition_to(status) {
            warn!(from = %order.status, to = %status, "Rejected status transition");
            return Err(ServiceError::Caller(format!(
                "order {} is {} and cannot return to {}",
                id, order.status, status
            )));
        }

        let at = self.clock.now();
        self.store.update_order_status(id, status, at).await?;
        info!(status = %status, "Order status updated");

        order.status = status;
        order.updated_at = at;
        Ok(self.enrich(order).await)
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete_order(id).await?;
        info!("Order deleted");
        Ok(())
    }

    /// Best-effort user lookup. Failures are logged and recorded on the view.
    async fn enrich(&self, order: Order) -> OrderView {
        match self.users.validate_user(&order.user_id).await {
            Ok(user) => OrderView::enriched(order, &user),
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "User enrichment skipped");
                OrderView::unenriched(order, e)
            }
        }
    }

    async fn enrich_all(&self, orders: Vec<Order>) -> Vec<OrderView> {
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.enrich(order).await);
        }
        views
    }
}
