use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::clients::{ChargeRequest, PaymentGateway};
use crate::clock::Clock;
use crate::domain::{CreatePaymentRequest, Payment, PaymentStatus};
use crate::error::ServiceError;
use crate::store::PaymentStore;

/// Runs the payment saga: persist pending, charge, persist the outcome, re-read.
///
/// The pending row is written before the gateway is called and nothing ties the
/// charge back to it if the process dies in between, so a crash mid-flight leaves
/// the payment pending with no reconciliation path.
#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, gateway, clock }
    }

    #[instrument(
        skip(self, request),
        fields(
            user_id = %request.user_id,
            amount = request.amount,
            currency = %request.currency
        )
    )]
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<Payment, ServiceError> {
        request.validate().map_err(ServiceError::Caller)?;
        info!("Processing create_payment request");

        // Step 1: Persist the intent as pending
        let now = self.clock.now();
        let pending = Payment {
            id: String::new(),
            user_id: request.user_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            description: request.description.clone(),
            status: PaymentStatus::Pending,
            stripe_charge_id: None,
            created_at: now,
            updated_at: now,
        };
        let mut payment = self.store.create_payment(pending).await.map_err(|e| {
            error!(error = %e, "Pending payment could not be persisted");
            ServiceError::Persistence(e.to_string())
        })?;
        info!(payment_id = %payment.id, "Pending payment persisted");

        // Step 2: Charge, exactly once
        let charge = ChargeRequest {
            amount: payment.amount,
            currency: payment.currency.clone(),
            description: payment.description.clone(),
            method_token: request.method_token,
            payment_id: payment.id.clone(),
            user_id: payment.user_id.clone(),
        };
        let outcome = self.gateway.charge(&charge).await;

        // Step 3: Reconcile
        payment.updated_at = self.clock.now();
        match outcome {
            Ok(outcome) => {
                info!(payment_id = %payment.id, charge_id = %outcome.charge_id, "Charge succeeded");
                payment.status = PaymentStatus::Succeeded;
                payment.stripe_charge_id = Some(outcome.charge_id);
                self.store.update_payment(&payment).await.map_err(|e| {
                    error!(
                        payment_id = %payment.id,
                        error = %e,
                        "Charged payment could not be marked succeeded"
                    );
                    ServiceError::Persistence(e.to_string())
                })?;
            }
            Err(gateway_error) => {
                warn!(payment_id = %payment.id, error = %gateway_error, "Charge failed");
                payment.status = PaymentStatus::Failed;
                payment.stripe_charge_id = None;
                if let Err(e) = self.store.update_payment(&payment).await {
                    error!(
                        payment_id = %payment.id,
                        error = %e,
                        "Failed payment could not be recorded"
                    );
                }
                return Err(ServiceError::Dependency(gateway_error.to_string()));
            }
        }

        // Step 4: Answer from what is durable. A failure here still fails the call
        // even though the charge went through.
        self.store.get_payment(&payment.id).await.map_err(|e| {
            error!(
                payment_id = %payment.id,
                charge_id = ?payment.stripe_charge_id,
                error = %e,
                "Payment re-read failed after successful charge"
            );
            ServiceError::Persistence(e.to_string())
        })
    }

    #[instrument(skip(self))]
    pub async fn get_payment(&self, id: &str) -> Result<Payment, ServiceError> {
        Ok(self.store.get_payment(id).await?)
    }

    /// Most recent first.
    #[instrument(skip(self))]
    pub async fn list_payments_by_user(&self, user_id: &str) -> Result<Vec<Payment>, ServiceError> {
        if user_id.trim().is_empty() {
            return Err(ServiceError::Caller("user ID is required".into()));
        }
        Ok(self.store.list_payments_by_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::{FrameworkError, ResourceRequest};
    use crate::clients::GatewayError;
    use crate::mock_framework::{
        create_mock_client, expect_create, expect_get, expect_update, start_payment_store,
        SteppingClock, StubGateway,
    };
    use crate::store::ActorPaymentStore;

    fn service(gateway: StubGateway) -> (PaymentService, Arc<dyn PaymentStore>) {
        let store: Arc<dyn PaymentStore> = Arc::new(start_payment_store());
        let service = PaymentService::new(
            store.clone(),
            Arc::new(gateway),
            Arc::new(SteppingClock::default()),
        );
        (service, store)
    }

    fn request(token: &str) -> CreatePaymentRequest {
        CreatePaymentRequest {
            user_id: "u1".into(),
            amount: 2500,
            currency: "usd".into(),
            description: Some("order o1".into()),
            method_token: token.into(),
        }
    }

    #[tokio::test]
    async fn test_success_records_charge_id_and_answers_from_store() {
        let gateway = StubGateway::succeeding("pi_1");
        let (service, store) = service(gateway.clone());

        let payment = service.create_payment(request("tok_ok")).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Succeeded);
        assert_eq!(payment.stripe_charge_id.as_deref(), Some("pi_1"));
        assert_eq!(store.get_payment(&payment.id).await.unwrap(), payment);

        let charges = gateway.charges();
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].payment_id, payment.id);
        assert_eq!(charges[0].user_id, "u1");
        assert_eq!(charges[0].amount, 2500);
        assert_eq!(charges[0].method_token, "tok_ok");
    }

    #[tokio::test]
    async fn test_every_gateway_failure_leaves_a_failed_row() {
        let failures = [
            GatewayError::Declined {
                code: Some("card_declined".into()),
                message: "declined".into(),
            },
            GatewayError::Transport("connection reset".into()),
            GatewayError::InvalidResponse("missing id".into()),
        ];
        for failure in failures {
            let (service, store) = service(StubGateway::failing(failure.clone()));

            let result = service.create_payment(request("tok_bad")).await;
            assert_eq!(result, Err(ServiceError::Dependency(failure.to_string())));

            let rows = store.list_payments_by_user("u1").await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].status, PaymentStatus::Failed);
            assert_eq!(rows[0].stripe_charge_id, None);
            assert_eq!(rows[0].amount, 2500);
        }
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_store_or_gateway() {
        let gateway = StubGateway::succeeding("pi_1");
        let (service, store) = service(gateway.clone());

        let result = service
            .create_payment(CreatePaymentRequest { amount: 0, ..request("tok_ok") })
            .await;
        assert!(matches!(result, Err(ServiceError::Caller(_))));
        let result = service.create_payment(request("")).await;
        assert!(matches!(result, Err(ServiceError::Caller(_))));

        assert!(gateway.charges().is_empty());
        assert!(store.list_payments_by_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lists_most_recent_first_and_requires_user() {
        let (service, _store) = service(StubGateway::succeeding("pi_1"));
        let first = service.create_payment(request("tok_ok")).await.unwrap();
        let second = service
            .create_payment(CreatePaymentRequest { amount: 900, ..request("tok_ok") })
            .await
            .unwrap();

        let listed = service.list_payments_by_user("u1").await.unwrap();
        assert_eq!(listed, vec![second, first]);

        assert_eq!(
            service.list_payments_by_user("").await,
            Err(ServiceError::Caller("user ID is required".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_user_listing_does_not_query_the_store() {
        let (client, mut receiver) = create_mock_client(4);
        let service = PaymentService::new(
            Arc::new(ActorPaymentStore::new(client)),
            Arc::new(StubGateway::succeeding("pi_1")),
            Arc::new(SteppingClock::default()),
        );

        assert!(matches!(service.list_payments_by_user("  ").await, Err(ServiceError::Caller(_))));
        drop(service);
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_payment_is_not_found() {
        let (service, _store) = service(StubGateway::succeeding("pi_1"));
        assert_eq!(
            service.get_payment("ghost").await,
            Err(ServiceError::NotFound("payment ghost not found".into()))
        );
    }

    /// The charge goes through but the final re-read fails: the call still fails.
    #[tokio::test]
    async fn test_failed_reread_after_charge_fails_the_call() {
        let (client, mut receiver) = create_mock_client::<Payment>(4);
        let gateway = StubGateway::succeeding("pi_9");
        let service = PaymentService::new(
            Arc::new(ActorPaymentStore::new(client)),
            Arc::new(gateway.clone()),
            Arc::new(SteppingClock::default()),
        );
        let task = tokio::spawn(async move { service.create_payment(request("tok_ok")).await });

        let (params, responder) =
            expect_create(&mut receiver).await.expect("Expected Payment Create");
        assert_eq!(params.status, PaymentStatus::Pending);
        let mut row = params.clone();
        row.id = "pay_9".into();
        responder.send(Ok(row.clone())).unwrap();

        let (id, update, responder) =
            expect_update(&mut receiver).await.expect("Expected Payment Update");
        assert_eq!(id, "pay_9");
        assert_eq!(update.status, PaymentStatus::Succeeded);
        assert_eq!(update.stripe_charge_id.as_deref(), Some("pi_9"));
        responder.send(Ok(row)).unwrap();

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Payment Get");
        assert_eq!(id, "pay_9");
        responder.send(Err(FrameworkError::ActorDropped)).unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ServiceError::Persistence(_))));
        assert_eq!(gateway.charges().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_status_write_does_not_mask_gateway_error() {
        let (client, mut receiver) = create_mock_client::<Payment>(4);
        let service = PaymentService::new(
            Arc::new(ActorPaymentStore::new(client)),
            Arc::new(StubGateway::failing(GatewayError::Transport("timeout".into()))),
            Arc::new(SteppingClock::default()),
        );
        let task = tokio::spawn(async move { service.create_payment(request("tok_ok")).await });

        let (mut row, responder) =
            expect_create(&mut receiver).await.expect("Expected Payment Create");
        row.id = "pay_1".into();
        responder.send(Ok(row)).unwrap();

        match receiver.recv().await {
            Some(ResourceRequest::Update { update, respond_to, .. }) => {
                assert_eq!(update.status, PaymentStatus::Failed);
                respond_to.send(Err(FrameworkError::ActorDropped)).unwrap();
            }
            _ => panic!("Expected Payment Update"),
        }

        let result = task.await.unwrap();
        assert_eq!(
            result,
            Err(ServiceError::Dependency(GatewayError::Transport("timeout".into()).to_string()))
        );
    }
}
