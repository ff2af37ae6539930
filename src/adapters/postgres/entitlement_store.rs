//! PostgreSQL implementations of the entitlement store ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::entitlement::{CreditBundle, CreditKind};
use crate::domain::foundation::{DomainError, EntitlementId, ErrorCode, Timestamp, UserId};
use crate::ports::{EntitlementReader, LedgerTx};

/// Database row representation of a credit bundle.
#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    id: Uuid,
    user_id: String,
    kind: String,
    remaining_credits: i32,
    expires_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntitlementRow> for CreditBundle {
    type Error = DomainError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        Ok(CreditBundle {
            id: EntitlementId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            kind: row.kind.parse().map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid kind: {}", e))
            })?,
            remaining_credits: row.remaining_credits,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_BUNDLES: &str = r#"
    SELECT id, user_id, kind, remaining_credits, expires_at, updated_at
    FROM entitlements
    WHERE user_id = $1 AND kind = $2
"#;

/// Pool-backed read side of the entitlement ledger.
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementReader for PostgresEntitlementStore {
    async fn bundles_for(
        &self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<Vec<CreditBundle>, DomainError> {
        let rows = sqlx::query_as::<_, EntitlementRow>(SELECT_BUNDLES)
            .bind(user_id.as_str())
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to load bundles: {}", e)))?;

        rows.into_iter().map(CreditBundle::try_from).collect()
    }
}

/// Ledger handle over a caller-supplied connection.
///
/// Wraps `&mut PgConnection`, so it works over a pool connection or over a
/// transaction the caller already opened - credit consumption then commits
/// or aborts together with the caller's other writes.
pub struct PgLedgerTx<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgLedgerTx<'a> {
    /// Wraps a connection or open transaction.
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx<'_> {
    async fn bundles_for(
        &mut self,
        user_id: &UserId,
        kind: CreditKind,
    ) -> Result<Vec<CreditBundle>, DomainError> {
        let rows = sqlx::query_as::<_, EntitlementRow>(SELECT_BUNDLES)
            .bind(user_id.as_str())
            .bind(kind.as_str())
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| DomainError::database(format!("Failed to load bundles: {}", e)))?;

        rows.into_iter().map(CreditBundle::try_from).collect()
    }

    async fn decrement_if_available(
        &mut self,
        id: &EntitlementId,
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        // The guard repeats the activity predicate so a bundle drained or
        // expired after the read affects zero rows instead of going
        // negative. No row lock; losers see rows_affected == 0.
        let result = sqlx::query(
            r#"
            UPDATE entitlements
            SET remaining_credits = remaining_credits - 1, updated_at = $2
            WHERE id = $1
              AND remaining_credits > 0
              AND (expires_at IS NULL OR expires_at > $2)
            "#,
        )
        .bind(id.as_uuid())
        .bind(now.as_datetime())
        .execute(&mut *self.conn)
        .await
        .map_err(|e| DomainError::database(format!("Failed to decrement bundle: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn grant(&mut self, bundle: &CreditBundle) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO entitlements (
                id, user_id, kind, remaining_credits, expires_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(bundle.id.as_uuid())
        .bind(bundle.user_id.as_str())
        .bind(bundle.kind.as_str())
        .bind(bundle.remaining_credits)
        .bind(bundle.expires_at.map(|t| *t.as_datetime()))
        .bind(bundle.updated_at.as_datetime())
        .execute(&mut *self.conn)
        .await
        .map_err(|e| DomainError::database(format!("Failed to grant bundle: {}", e)))?;

        Ok(())
    }
}
