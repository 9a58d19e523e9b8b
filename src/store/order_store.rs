use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::{requested, StoreError};
use crate::actor_framework::{Entity, ResourceClient};
use crate::domain::{LineItem, Order, OrderStatus};

/// Order persistence operations used by the order workflow.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order. An empty id is replaced by a generated one.
    async fn create_order(&self, order: Order) -> Result<Order, StoreError>;
    async fn get_order(&self, id: &str) -> Result<Order, StoreError>;
    async fn get_orders_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError>;
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn delete_order(&self, id: &str) -> Result<(), StoreError>;
}

/// Stored shape of an order: line items live in the row as a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub products: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderRowUpdate {
    Status { status: OrderStatus, at: DateTime<Utc> },
}

impl OrderRow {
    pub fn encode(order: &Order) -> Result<Self, StoreError> {
        let products = serde_json::to_string(&order.products)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        Ok(Self {
            id: order.id.clone(),
            user_id: order.user_id.clone(),
            products,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }

    pub fn decode(self) -> Result<Order, StoreError> {
        let products: Vec<LineItem> = serde_json::from_str(&self.products)
            .map_err(|e| StoreError::Encoding(format!("order {}: {}", self.id, e)))?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            products,
            total_amount: self.total_amount,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl Entity for OrderRow {
    type Id = String;
    type CreateParams = OrderRow;
    type UpdateParams = OrderRowUpdate;

    fn id(&self) -> &String { &self.id }

    fn requested_id(params: &OrderRow) -> Option<String> {
        requested(&params.id)
    }

    fn from_create_params(id: String, params: OrderRow) -> Result<Self, String> {
        Ok(Self { id, ..params })
    }

    fn on_update(&mut self, update: OrderRowUpdate) -> Result<(), String> {
        match update {
            OrderRowUpdate::Status { status, at } => {
                self.status = status;
                self.updated_at = at;
            }
        }
        Ok(())
    }
}

/// [`OrderStore`] backed by the order store actor.
#[derive(Clone)]
pub struct ActorOrderStore {
    inner: ResourceClient<OrderRow>,
}

impl ActorOrderStore {
    pub fn new(inner: ResourceClient<OrderRow>) -> Self {
        Self { inner }
    }
}

fn decode_all(rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
    rows.into_iter().map(OrderRow::decode).collect()
}

fn not_found(err: crate::actor_framework::FrameworkError) -> StoreError {
    StoreError::from_framework("order", err)
}

#[async_trait]
impl OrderStore for ActorOrderStore {
    #[instrument(skip(self, order), fields(user_id = %order.user_id))]
    async fn create_order(&self, order: Order) -> Result<Order, StoreError> {
        debug!("Sending request");
        let row = OrderRow::encode(&order)?;
        self.inner.create(row).await.map_err(not_found)?.decode()
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
        debug!("Sending request");
        self.inner
            .get(id.to_string())
            .await
            .map_err(not_found)?
            .ok_or_else(|| StoreError::NotFound(format!("order {} not found", id)))?
            .decode()
    }

    #[instrument(skip(self))]
    async fn get_orders_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        debug!("Sending request");
        let owner = user_id.to_string();
        let rows = self
            .inner
            .list_where(move |row: &OrderRow| row.user_id == owner)
            .await
            .map_err(not_found)?;
        decode_all(rows)
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        debug!("Sending request");
        decode_all(self.inner.list().await.map_err(not_found)?)
    }

    #[instrument(skip(self))]
    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner
            .update(id.to_string(), OrderRowUpdate::Status { status, at })
            .await
            .map(|_| ())
            .map_err(not_found)
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: &str) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner.delete(id.to_string()).await.map_err(not_found)
    }
}
