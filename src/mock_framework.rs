//! # Mock Framework
//!
//! Utilities for testing workflows in isolation.
//!
//! Use [`create_mock_client`] to get a store client and a receiver, then helpers like
//! [`expect_create`] or [`expect_update`] to assert requests and script the answers.
//! [`StubDirectory`], [`StubGateway`] and [`SteppingClock`] stand in for the user
//! directory, the payment gateway and wall-clock time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{
    Entity, FrameworkError, ResourceActor, ResourceClient, ResourceRequest,
};
use crate::clients::{
    ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway, UserClientError, UserDirectory,
};
use crate::clock::Clock;
use crate::domain::{Payment, UserProfile};
use crate::store::{ActorOrderStore, ActorPaymentStore, OrderRow};

// =============================================================================
// STORE CHANNEL MOCKS
// =============================================================================

/// Creates a mock client and a receiver for asserting requests.
///
/// Instead of a running `ResourceActor`, the test owns the receiving end of the
/// channel and answers each request itself, which makes store failures at a
/// chosen step deterministic.
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, oneshot::Sender<Result<T, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::UpdateParams, oneshot::Sender<Result<T, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Update { id, update, respond_to }) => Some((id, update, respond_to)),
        _ => None,
    }
}

fn counter_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || format!("{}_{}", prefix, counter.fetch_add(1, Ordering::SeqCst))
}

/// Spawns a real order store actor with predictable ids.
pub fn start_order_store() -> ActorOrderStore {
    let (actor, client) = ResourceActor::<OrderRow>::new(16, counter_ids("order"));
    tokio::spawn(actor.run());
    ActorOrderStore::new(client)
}

/// Spawns a real payment store actor with predictable ids.
pub fn start_payment_store() -> ActorPaymentStore {
    let (actor, client) = ResourceActor::<Payment>::new(16, counter_ids("pay"));
    tokio::spawn(actor.run());
    ActorPaymentStore::new(client)
}

// =============================================================================
// DEPENDENCY DOUBLES
// =============================================================================

#[derive(Default)]
struct DirectoryState {
    users: HashMap<String, UserProfile>,
    unreachable: bool,
    calls: Vec<String>,
}

/// In-memory user directory that records every lookup.
#[derive(Clone, Default)]
pub struct StubDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl StubDirectory {
    pub fn with_user(user: UserProfile) -> Self {
        Self::default().and_user(user)
    }

    pub fn and_user(self, user: UserProfile) -> Self {
        self.state.lock().unwrap().users.insert(user.id.clone(), user);
        self
    }

    /// A directory whose every lookup fails with a transport error.
    pub fn unreachable() -> Self {
        let directory = Self::default();
        directory.set_unreachable(true);
        directory
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn remove(&self, user_id: &str) {
        self.state.lock().unwrap().users.remove(user_id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl UserDirectory for StubDirectory {
    async fn validate_user(&self, user_id: &str) -> Result<UserProfile, UserClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(user_id.to_string());
        if state.unreachable {
            return Err(UserClientError::Transport("connection refused".into()));
        }
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| UserClientError::NotFound(user_id.to_string()))
    }
}

/// Payment gateway with a fixed answer that records every charge.
#[derive(Clone)]
pub struct StubGateway {
    outcome: Result<String, GatewayError>,
    charges: Arc<Mutex<Vec<ChargeRequest>>>,
}

impl StubGateway {
    pub fn succeeding(charge_id: &str) -> Self {
        Self { outcome: Ok(charge_id.to_string()), charges: Arc::default() }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self { outcome: Err(error), charges: Arc::default() }
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        self.charges.lock().unwrap().push(request.clone());
        self.outcome.clone().map(|charge_id| ChargeOutcome {
            charge_id,
            status: "succeeded".into(),
        })
    }
}

/// Clock that moves one second forward on every reading.
pub struct SteppingClock {
    start: DateTime<Utc>,
    ticks: AtomicI64,
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.ticks.fetch_add(1, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Payment>(10);

        let get_task = tokio::spawn(async move { client.get("pay_1".to_string()).await });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, "pay_1");
        responder.send(Ok(None)).unwrap();

        assert_eq!(get_task.await.unwrap(), Ok(None));
    }

    #[test]
    fn test_stepping_clock_strictly_increases() {
        let clock = SteppingClock::default();
        let first = clock.now();
        assert!(clock.now() > first);
    }
}
