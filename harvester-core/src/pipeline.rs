//! Seams between the orchestrator and the two I/O components.

use crate::error::{DatabaseError, FeedApiError};
use crate::types::{DateRange, FeedFilters, FeedPage, Opportunity};

// Implementations' futures are awaited in place, never spawned, so no
// `Send` bound is required.

/// Something that can hand out one page of the remote listing.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
        date_range: &DateRange,
        filters: &FeedFilters,
    ) -> Result<FeedPage, FeedApiError>;
}

/// Append-only sink for fetched records.
#[allow(async_fn_in_trait)]
pub trait OpportunityStore {
    async fn ensure_schema(&self) -> Result<(), DatabaseError>;

    /// Writes the whole batch or nothing. Returns the number of rows written.
    async fn persist(&self, records: &[Opportunity]) -> Result<usize, DatabaseError>;
}
