//! Price catalog port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PriceId};

/// A purchasable price as the settlement pipeline sees it.
///
/// On payment creation the price's current amount/currency is what lands in
/// the payment row - not the callback's claimed amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub id: PriceId,
    /// Amount in the currency's smallest unit.
    pub amount: i64,
    pub currency: String,
}

/// Read port into the marketplace's price catalog.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Find a price by its id.
    ///
    /// Returns `None` if the price was deleted; a session pointing at a
    /// deleted price is a 404 for the webhook pipeline.
    async fn find_by_id(&self, id: &PriceId) -> Result<Option<Price>, DomainError>;
}
