//! PostgreSQL implementation of PriceStore.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, PriceId};
use crate::ports::{Price, PriceStore};

/// PostgreSQL implementation of the PriceStore port.
pub struct PostgresPriceStore {
    pool: PgPool,
}

impl PostgresPriceStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PriceRow {
    id: String,
    amount: i64,
    currency: String,
}

impl TryFrom<PriceRow> for Price {
    type Error = DomainError;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        Ok(Price {
            id: PriceId::new(row.id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid price id: {}", e))
            })?,
            amount: row.amount,
            currency: row.currency,
        })
    }
}

#[async_trait]
impl PriceStore for PostgresPriceStore {
    async fn find_by_id(&self, id: &PriceId) -> Result<Option<Price>, DomainError> {
        let row = sqlx::query_as::<_, PriceRow>(
            "SELECT id, amount, currency FROM prices WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load price: {}", e)))?;

        row.map(Price::try_from).transpose()
    }
}
