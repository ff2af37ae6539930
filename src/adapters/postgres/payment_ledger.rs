//! PostgreSQL implementation of the settlement transaction.
//!
//! `settle` runs the whole paid path in one transaction. The pre-read of
//! the existing payment row uses `FOR UPDATE` so two concurrent duplicate
//! deliveries serialize: the second observes the first's committed `paid`
//! status and closes the exactly-once gate.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::billing::{
    CheckoutSessionStatus, Invoice, InvoiceStatus, Payment, PaymentStatus,
};
use crate::domain::foundation::{DomainError, InvoiceId, PaymentId, Timestamp};
use crate::ports::{PaymentLedger, SettlementCommand, SettlementOutcome};

use super::checkout_session_store::session_status_to_string;

/// PostgreSQL implementation of the PaymentLedger port.
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    /// Creates a new ledger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn payment_status_to_string(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Paid => "paid",
        PaymentStatus::Pending => "pending",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Refunded => "refunded",
        PaymentStatus::RefundedPartial => "refunded_partial",
    }
}

fn invoice_status_to_string(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Paid => "paid",
        InvoiceStatus::Void => "void",
    }
}

fn db_err(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn settle(&self, command: SettlementCommand) -> Result<SettlementOutcome, DomainError> {
        let mut tx: Transaction<'_, Postgres> = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to open settlement transaction"))?;

        // Read any existing payment for (provider, provider_ref). FOR
        // UPDATE linearizes concurrent duplicate deliveries on this key.
        let existing: Option<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT id, status FROM payments
            WHERE provider = $1 AND provider_ref = $2
            FOR UPDATE
            "#,
        )
        .bind(command.event.provider.as_str())
        .bind(&command.event.provider_ref)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to read existing payment"))?;

        // The exactly-once gate: open only if the row is absent or was not
        // yet paid.
        let should_apply_entitlements = match &existing {
            Some((_, status)) => status != payment_status_to_string(PaymentStatus::Paid),
            None => true,
        };
        let payment_id = existing
            .map(|(id, _)| PaymentId::from_uuid(id))
            .unwrap_or_default();

        let now = Timestamp::now();
        let payment = Payment {
            id: payment_id,
            user_id: command.session.user_id.clone(),
            checkout_session_id: command.session.id.clone(),
            provider: command.event.provider,
            provider_ref: command.event.provider_ref.clone(),
            external_id: command.event.external_id.clone(),
            // The catalog price is authoritative for amount/currency, not
            // whatever the callback claims.
            amount: command.price.amount,
            currency: command.price.currency.clone(),
            status: PaymentStatus::Paid,
            created_at: now,
            updated_at: now,
        };

        // Upsert the payment keyed by (provider, provider_ref).
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, checkout_session_id, provider, provider_ref,
                external_id, amount, currency, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (provider, provider_ref) DO UPDATE SET
                external_id = EXCLUDED.external_id,
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_str())
        .bind(payment.checkout_session_id.as_str())
        .bind(payment.provider.as_str())
        .bind(&payment.provider_ref)
        .bind(&payment.external_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment_status_to_string(payment.status))
        .bind(payment.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to upsert payment"))?;

        // Upsert the invoice, mirroring the payment.
        let invoice = Invoice {
            id: InvoiceId::new(),
            payment_id: payment.id,
            total: payment.amount,
            currency: payment.currency.clone(),
            status: InvoiceStatus::Paid,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, payment_id, total, currency, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (payment_id) DO UPDATE SET
                total = EXCLUDED.total,
                currency = EXCLUDED.currency,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.payment_id.as_uuid())
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(invoice_status_to_string(invoice.status))
        .bind(invoice.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to upsert invoice"))?;

        // Transition the session, persisting the raw payload for audit.
        sqlx::query(
            r#"
            UPDATE checkout_sessions
            SET status = $2, last_callback_payload = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(command.session.id.as_str())
        .bind(session_status_to_string(CheckoutSessionStatus::Success))
        .bind(&command.raw_payload)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to transition session"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit settlement"))?;

        Ok(SettlementOutcome {
            payment,
            should_apply_entitlements,
        })
    }
}
