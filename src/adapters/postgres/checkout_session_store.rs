//! PostgreSQL implementation of CheckoutSessionStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::billing::{CheckoutSession, CheckoutSessionStatus, Provider};
use crate::domain::foundation::{
    CheckoutSessionId, DomainError, ErrorCode, PriceId, Timestamp, UserId,
};
use crate::ports::CheckoutSessionStore;

/// PostgreSQL implementation of the CheckoutSessionStore port.
pub struct PostgresCheckoutSessionStore {
    pool: PgPool,
}

impl PostgresCheckoutSessionStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a checkout session.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutSessionRow {
    id: String,
    provider: String,
    price_id: String,
    user_id: String,
    status: String,
    last_callback_payload: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CheckoutSessionRow> for CheckoutSession {
    type Error = DomainError;

    fn try_from(row: CheckoutSessionRow) -> Result<Self, Self::Error> {
        Ok(CheckoutSession {
            id: CheckoutSessionId::new(row.id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid session id: {}", e))
            })?,
            provider: parse_provider(&row.provider)?,
            price_id: PriceId::new(row.price_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid price id: {}", e))
            })?,
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            status: parse_session_status(&row.status)?,
            last_callback_payload: row.last_callback_payload,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

pub(crate) fn parse_provider(s: &str) -> Result<Provider, DomainError> {
    s.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid provider value: {}", s),
        )
    })
}

fn parse_session_status(s: &str) -> Result<CheckoutSessionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "started" => Ok(CheckoutSessionStatus::Started),
        "pending" => Ok(CheckoutSessionStatus::Pending),
        "success" => Ok(CheckoutSessionStatus::Success),
        "failed" => Ok(CheckoutSessionStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid session status value: {}", s),
        )),
    }
}

pub(crate) fn session_status_to_string(status: CheckoutSessionStatus) -> &'static str {
    match status {
        CheckoutSessionStatus::Started => "started",
        CheckoutSessionStatus::Pending => "pending",
        CheckoutSessionStatus::Success => "success",
        CheckoutSessionStatus::Failed => "failed",
    }
}

#[async_trait]
impl CheckoutSessionStore for PostgresCheckoutSessionStore {
    async fn find_by_id(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<Option<CheckoutSession>, DomainError> {
        let row = sqlx::query_as::<_, CheckoutSessionRow>(
            r#"
            SELECT id, provider, price_id, user_id, status,
                   last_callback_payload, created_at, updated_at
            FROM checkout_sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load session: {}", e)))?;

        row.map(CheckoutSession::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: &CheckoutSessionId,
        status: CheckoutSessionStatus,
        raw_payload: &Value,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions
            SET status = $2, last_callback_payload = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(session_status_to_string(status))
        .bind(raw_payload)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update session: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("No session with id {}", id),
            ));
        }
        Ok(())
    }
}
