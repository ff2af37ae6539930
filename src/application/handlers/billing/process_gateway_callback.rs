//! ProcessGatewayCallbackHandler - the webhook reconciler.
//!
//! Turns an untrusted, possibly-duplicated gateway callback into
//! exactly-once financial state transitions:
//!
//! 1. Authenticate the signature header
//! 2. Parse the JSON body and its `sessionId`
//! 3. Decode the payload through the provider codec
//! 4. Resolve the checkout session (rejecting cross-provider confusion)
//! 5. Branch on paid-ness: settle in one transaction, or mark failed
//! 6. After commit, apply entitlements iff this settlement was the first
//!
//! The ledger commits before entitlements are applied. That ordering is
//! deliberate: the financial record survives even if entitlement
//! application crashes, and an external reconciliation sweep catches the
//! missed grant.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::billing::{
    codec_for, CheckoutSessionStatus, Provider, SignatureVerifier, WebhookError,
};
use crate::domain::foundation::{CheckoutSessionId, PaymentId};
use crate::ports::{
    CheckoutSessionStore, EntitlementGranter, GrantRequest, PaymentLedger, PriceStore,
    SettlementCommand,
};

/// Command carrying one inbound webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessGatewayCallbackCommand {
    /// Provider named by the endpoint path.
    pub provider: Provider,
    /// Value of the `X-Webhook-Signature` header, if present.
    pub signature: Option<String>,
    /// Raw request body.
    pub body: Vec<u8>,
}

/// Terminal outcome of processing a callback. All variants are HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Paid callback settled (or re-settled idempotently).
    Settled { payment_id: PaymentId },
    /// Not-paid callback recorded; session marked failed.
    MarkedFailed,
    /// Callback conflicted with an already-terminal session and was
    /// acknowledged without applying anything.
    AlreadyTerminal { status: CheckoutSessionStatus },
}

impl CallbackOutcome {
    /// Status string reported to the gateway.
    pub fn wire_status(&self) -> &'static str {
        match self {
            CallbackOutcome::Settled { .. } => "PAID",
            CallbackOutcome::MarkedFailed => "FAILED",
            CallbackOutcome::AlreadyTerminal { status } => match status {
                CheckoutSessionStatus::Success => "PAID",
                _ => "FAILED",
            },
        }
    }
}

/// Handler reconciling gateway callbacks against the transactional store.
pub struct ProcessGatewayCallbackHandler {
    verifier: SignatureVerifier,
    sessions: Arc<dyn CheckoutSessionStore>,
    prices: Arc<dyn PriceStore>,
    ledger: Arc<dyn PaymentLedger>,
    granter: Arc<dyn EntitlementGranter>,
}

impl ProcessGatewayCallbackHandler {
    pub fn new(
        verifier: SignatureVerifier,
        sessions: Arc<dyn CheckoutSessionStore>,
        prices: Arc<dyn PriceStore>,
        ledger: Arc<dyn PaymentLedger>,
        granter: Arc<dyn EntitlementGranter>,
    ) -> Self {
        Self {
            verifier,
            sessions,
            prices,
            ledger,
            granter,
        }
    }

    /// Process one webhook delivery to a terminal response.
    ///
    /// Delivering the identical callback N times produces exactly one
    /// payment/invoice pair and invokes the entitlement granter exactly
    /// once, regardless of N.
    ///
    /// # Errors
    ///
    /// Every variant of [`WebhookError`] maps to a 4xx except
    /// `WebhookError::Store`, the only retryable (5xx) condition.
    pub async fn handle(
        &self,
        cmd: ProcessGatewayCallbackCommand,
    ) -> Result<CallbackOutcome, WebhookError> {
        // 1. Authenticate
        self.verifier.verify(cmd.provider, cmd.signature.as_deref())?;

        // 2. Parse
        let payload: Value = serde_json::from_slice(&cmd.body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        let session_id = payload
            .get("sessionId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSessionId)?;
        let session_id =
            CheckoutSessionId::new(session_id).map_err(|_| WebhookError::MissingSessionId)?;

        // 3. Decode
        let event = codec_for(cmd.provider).decode(&payload)?;

        // 4. Resolve session
        let session = self
            .sessions
            .find_by_id(&session_id)
            .await?
            .ok_or(WebhookError::SessionNotFound)?;
        if session.provider != cmd.provider {
            return Err(WebhookError::ProviderMismatch {
                expected: session.provider,
                actual: cmd.provider,
            });
        }

        // 5. Branch on paid-ness
        let target = if event.status.is_paid() {
            CheckoutSessionStatus::Success
        } else {
            CheckoutSessionStatus::Failed
        };
        if !session.status.accepts_provider_transition(target) {
            tracing::warn!(
                session_id = %session.id,
                current = ?session.status,
                attempted = ?target,
                "conflicting callback for terminal session acknowledged without effect"
            );
            return Ok(CallbackOutcome::AlreadyTerminal {
                status: session.status,
            });
        }

        if event.status.is_paid() {
            let price = self
                .prices
                .find_by_id(&session.price_id)
                .await?
                .ok_or(WebhookError::PriceNotFound)?;

            if event.amount == 0 {
                tracing::warn!(
                    session_id = %session.id,
                    provider_ref = %event.provider_ref,
                    "paid callback carried no parsable amount"
                );
            } else if event.amount != price.amount {
                tracing::warn!(
                    session_id = %session.id,
                    callback_amount = event.amount,
                    price_amount = price.amount,
                    "callback amount differs from catalog price; price is authoritative"
                );
            }

            let user_id = session.user_id.clone();
            let price_id = session.price_id.clone();
            let outcome = self
                .ledger
                .settle(SettlementCommand {
                    session,
                    price,
                    event,
                    raw_payload: payload,
                })
                .await?;

            // 6. Post-commit: apply entitlements exactly once. Failure here
            // is logged, not surfaced - the payment is already durable and
            // the reconciliation sweep re-applies.
            let payment_id = outcome.payment.id;
            if outcome.should_apply_entitlements {
                let request = GrantRequest {
                    user_id,
                    price_id,
                    payment_id,
                };
                if let Err(err) = self.granter.apply(request).await {
                    tracing::error!(
                        payment_id = %payment_id,
                        error = %err,
                        "entitlement application failed after settlement; \
                         reconciliation sweep must re-apply"
                    );
                }
            }

            Ok(CallbackOutcome::Settled { payment_id })
        } else {
            self.sessions
                .update_status(&session.id, CheckoutSessionStatus::Failed, &payload)
                .await?;
            Ok(CallbackOutcome::MarkedFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{CheckoutSession, CodecError, Payment, PaymentStatus, ProviderSecrets};
    use crate::domain::foundation::{DomainError, PriceId, Timestamp, UserId};
    use crate::ports::{GrantError, Price, SettlementOutcome};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    struct MockSessionStore {
        sessions: Mutex<HashMap<String, CheckoutSession>>,
    }

    impl MockSessionStore {
        fn with(session: CheckoutSession) -> Self {
            let mut map = HashMap::new();
            map.insert(session.id.as_str().to_string(), session);
            Self {
                sessions: Mutex::new(map),
            }
        }

        fn status_of(&self, id: &str) -> CheckoutSessionStatus {
            self.sessions.lock().unwrap()[id].status
        }
    }

    #[async_trait]
    impl CheckoutSessionStore for MockSessionStore {
        async fn find_by_id(
            &self,
            id: &CheckoutSessionId,
        ) -> Result<Option<CheckoutSession>, DomainError> {
            Ok(self.sessions.lock().unwrap().get(id.as_str()).cloned())
        }

        async fn update_status(
            &self,
            id: &CheckoutSessionId,
            status: CheckoutSessionStatus,
            raw_payload: &Value,
        ) -> Result<(), DomainError> {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions
                .get_mut(id.as_str())
                .ok_or_else(|| DomainError::database("no such session"))?;
            session.status = status;
            session.last_callback_payload = Some(raw_payload.clone());
            Ok(())
        }
    }

    struct MockPriceStore {
        prices: HashMap<String, Price>,
    }

    impl MockPriceStore {
        fn with(price: Price) -> Self {
            let mut prices = HashMap::new();
            prices.insert(price.id.as_str().to_string(), price);
            Self { prices }
        }

        fn empty() -> Self {
            Self {
                prices: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl PriceStore for MockPriceStore {
        async fn find_by_id(&self, id: &PriceId) -> Result<Option<Price>, DomainError> {
            Ok(self.prices.get(id.as_str()).cloned())
        }
    }

    /// In-memory settlement ledger reproducing the idempotent upsert
    /// semantics: one payment row per (provider, provider_ref), the gate
    /// open only until the row is first marked paid.
    struct MockPaymentLedger {
        payments: Mutex<HashMap<(Provider, String), Payment>>,
        sessions: Arc<MockSessionStore>,
    }

    impl MockPaymentLedger {
        fn new(sessions: Arc<MockSessionStore>) -> Self {
            Self {
                payments: Mutex::new(HashMap::new()),
                sessions,
            }
        }

        fn payment_count(&self) -> usize {
            self.payments.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentLedger for MockPaymentLedger {
        async fn settle(
            &self,
            command: SettlementCommand,
        ) -> Result<SettlementOutcome, DomainError> {
            let key = (command.event.provider, command.event.provider_ref.clone());
            let now = Timestamp::now();
            let (payment, should_apply) = {
                let mut payments = self.payments.lock().unwrap();
                match payments.get(&key) {
                    Some(existing) => (existing.clone(), false),
                    None => {
                        let payment = Payment {
                            id: PaymentId::new(),
                            user_id: command.session.user_id.clone(),
                            checkout_session_id: command.session.id.clone(),
                            provider: command.event.provider,
                            provider_ref: command.event.provider_ref.clone(),
                            external_id: command.event.external_id.clone(),
                            amount: command.price.amount,
                            currency: command.price.currency.clone(),
                            status: PaymentStatus::Paid,
                            created_at: now,
                            updated_at: now,
                        };
                        payments.insert(key, payment.clone());
                        (payment, true)
                    }
                }
            };

            self.sessions
                .update_status(
                    &command.session.id,
                    CheckoutSessionStatus::Success,
                    &command.raw_payload,
                )
                .await?;

            Ok(SettlementOutcome {
                payment,
                should_apply_entitlements: should_apply,
            })
        }
    }

    struct MockGranter {
        calls: AtomicU32,
        should_fail: bool,
    }

    impl MockGranter {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                should_fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                should_fail: true,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EntitlementGranter for MockGranter {
        async fn apply(&self, _request: GrantRequest) -> Result<(), GrantError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(GrantError::Failed("simulated outage".into()))
            } else {
                Ok(())
            }
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Test Helpers
    // ══════════════════════════════════════════════════════════════

    const SECRET: &str = "whk_test_secret";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(ProviderSecrets {
            shared: Some(SecretString::new(SECRET.to_string())),
            ..ProviderSecrets::default()
        })
    }

    fn test_session(provider: Provider) -> CheckoutSession {
        CheckoutSession::new(
            CheckoutSessionId::new("S1").unwrap(),
            provider,
            PriceId::new("price_job_post").unwrap(),
            UserId::new("user-1").unwrap(),
        )
    }

    fn test_price() -> Price {
        Price {
            id: PriceId::new("price_job_post").unwrap(),
            amount: 100000,
            currency: "IRR".to_string(),
        }
    }

    struct Fixture {
        handler: ProcessGatewayCallbackHandler,
        sessions: Arc<MockSessionStore>,
        ledger: Arc<MockPaymentLedger>,
        granter: Arc<MockGranter>,
    }

    fn fixture_with(
        session: CheckoutSession,
        prices: MockPriceStore,
        granter: MockGranter,
    ) -> Fixture {
        let sessions = Arc::new(MockSessionStore::with(session));
        let ledger = Arc::new(MockPaymentLedger::new(sessions.clone()));
        let granter = Arc::new(granter);
        let handler = ProcessGatewayCallbackHandler::new(
            verifier(),
            sessions.clone(),
            Arc::new(prices),
            ledger.clone(),
            granter.clone(),
        );
        Fixture {
            handler,
            sessions,
            ledger,
            granter,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            test_session(Provider::Idpay),
            MockPriceStore::with(test_price()),
            MockGranter::new(),
        )
    }

    fn paid_idpay_body() -> Vec<u8> {
        json!({
            "sessionId": "S1",
            "id": "idp_1",
            "track_id": "trk_1",
            "status": 100
        })
        .to_string()
        .into_bytes()
    }

    fn command(body: Vec<u8>) -> ProcessGatewayCallbackCommand {
        ProcessGatewayCallbackCommand {
            provider: Provider::Idpay,
            signature: Some(SECRET.to_string()),
            body,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Paid Path Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn paid_callback_settles_and_grants_once() {
        let fx = fixture();

        let outcome = fx.handler.handle(command(paid_idpay_body())).await.unwrap();

        assert!(matches!(outcome, CallbackOutcome::Settled { .. }));
        assert_eq!(outcome.wire_status(), "PAID");
        assert_eq!(fx.sessions.status_of("S1"), CheckoutSessionStatus::Success);
        assert_eq!(fx.ledger.payment_count(), 1);
        assert_eq!(fx.granter.calls(), 1);
    }

    #[tokio::test]
    async fn redelivery_is_idempotent() {
        let fx = fixture();

        fx.handler.handle(command(paid_idpay_body())).await.unwrap();
        let outcome = fx.handler.handle(command(paid_idpay_body())).await.unwrap();

        // Second delivery succeeds but the gate stays closed.
        assert!(matches!(outcome, CallbackOutcome::Settled { .. }));
        assert_eq!(fx.ledger.payment_count(), 1);
        assert_eq!(fx.granter.calls(), 1);
    }

    #[tokio::test]
    async fn grant_failure_does_not_fail_the_callback() {
        let fx = fixture_with(
            test_session(Provider::Idpay),
            MockPriceStore::with(test_price()),
            MockGranter::failing(),
        );

        let outcome = fx.handler.handle(command(paid_idpay_body())).await.unwrap();

        // The payment is durable; the gateway still sees success.
        assert!(matches!(outcome, CallbackOutcome::Settled { .. }));
        assert_eq!(fx.granter.calls(), 1);
    }

    #[tokio::test]
    async fn zero_amount_paid_callback_still_settles() {
        let fx = fixture();
        let body = json!({
            "sessionId": "S1",
            "id": "idp_1",
            "track_id": "trk_1",
            "amount": "not-a-number",
            "status": 100
        })
        .to_string()
        .into_bytes();

        let outcome = fx.handler.handle(command(body)).await.unwrap();
        assert!(matches!(outcome, CallbackOutcome::Settled { .. }));
    }

    // ══════════════════════════════════════════════════════════════
    // Not-Paid Path Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn failed_callback_marks_session_failed() {
        let fx = fixture();
        let body = json!({
            "sessionId": "S1",
            "id": "idp_1",
            "track_id": "trk_1",
            "status": 2
        })
        .to_string()
        .into_bytes();

        let outcome = fx.handler.handle(command(body)).await.unwrap();

        assert_eq!(outcome, CallbackOutcome::MarkedFailed);
        assert_eq!(outcome.wire_status(), "FAILED");
        assert_eq!(fx.sessions.status_of("S1"), CheckoutSessionStatus::Failed);
        assert_eq!(fx.ledger.payment_count(), 0);
        assert_eq!(fx.granter.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_status_takes_the_failed_path() {
        let fx = fixture();
        let body = json!({
            "sessionId": "S1",
            "id": "idp_1",
            "track_id": "trk_1",
            "status": "garbage"
        })
        .to_string()
        .into_bytes();

        let outcome = fx.handler.handle(command(body)).await.unwrap();
        assert_eq!(outcome, CallbackOutcome::MarkedFailed);
    }

    // ══════════════════════════════════════════════════════════════
    // Rejection Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let fx = fixture();
        let mut cmd = command(paid_idpay_body());
        cmd.signature = Some("wrong".to_string());

        let err = fx.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(fx.granter.calls(), 0);
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let fx = fixture();
        let mut cmd = command(paid_idpay_body());
        cmd.signature = None;

        let err = fx.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let fx = fixture();
        let err = fx
            .handler
            .handle(command(b"{not json".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn missing_session_id_is_rejected() {
        let fx = fixture();
        let body = json!({"id": "idp_1", "track_id": "trk_1", "status": 100})
            .to_string()
            .into_bytes();

        let err = fx.handler.handle(command(body)).await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingSessionId));
    }

    #[tokio::test]
    async fn codec_failure_is_rejected() {
        let fx = fixture();
        // No provider id fields and no shared fallback reference.
        let body = json!({"sessionId": "S1", "status": 100})
            .to_string()
            .into_bytes();

        let err = fx.handler.handle(command(body)).await.unwrap_err();
        assert!(matches!(
            err,
            WebhookError::Codec(CodecError::MissingExternalId)
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let fx = fixture();
        let body = json!({
            "sessionId": "S999",
            "id": "idp_1",
            "track_id": "trk_1",
            "status": 100
        })
        .to_string()
        .into_bytes();

        let err = fx.handler.handle(command(body)).await.unwrap_err();
        assert!(matches!(err, WebhookError::SessionNotFound));
    }

    #[tokio::test]
    async fn cross_provider_callback_is_rejected() {
        // Session opened with ZarinPal, callback arriving on the IDPay path.
        let fx = fixture_with(
            test_session(Provider::Zarinpal),
            MockPriceStore::with(test_price()),
            MockGranter::new(),
        );

        let err = fx.handler.handle(command(paid_idpay_body())).await.unwrap_err();
        assert!(matches!(
            err,
            WebhookError::ProviderMismatch {
                expected: Provider::Zarinpal,
                actual: Provider::Idpay,
            }
        ));
    }

    #[tokio::test]
    async fn deleted_price_is_rejected() {
        let fx = fixture_with(
            test_session(Provider::Idpay),
            MockPriceStore::empty(),
            MockGranter::new(),
        );

        let err = fx.handler.handle(command(paid_idpay_body())).await.unwrap_err();
        assert!(matches!(err, WebhookError::PriceNotFound));
    }

    // ══════════════════════════════════════════════════════════════
    // Terminal Session Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn paid_callback_for_failed_session_is_acknowledged_without_effect() {
        let mut session = test_session(Provider::Idpay);
        session.status = CheckoutSessionStatus::Failed;
        let fx = fixture_with(session, MockPriceStore::with(test_price()), MockGranter::new());

        let outcome = fx.handler.handle(command(paid_idpay_body())).await.unwrap();

        assert_eq!(
            outcome,
            CallbackOutcome::AlreadyTerminal {
                status: CheckoutSessionStatus::Failed
            }
        );
        assert_eq!(outcome.wire_status(), "FAILED");
        assert_eq!(fx.ledger.payment_count(), 0);
        assert_eq!(fx.granter.calls(), 0);
    }

    #[tokio::test]
    async fn paid_redelivery_to_successful_session_stays_paid() {
        let mut session = test_session(Provider::Idpay);
        session.status = CheckoutSessionStatus::Success;
        let fx = fixture_with(session, MockPriceStore::with(test_price()), MockGranter::new());

        let outcome = fx.handler.handle(command(paid_idpay_body())).await.unwrap();

        // Same terminal state: runs the idempotent settle, grant fires for
        // the first observed settlement of this provider_ref.
        assert!(matches!(outcome, CallbackOutcome::Settled { .. }));
        assert_eq!(outcome.wire_status(), "PAID");
    }
}
