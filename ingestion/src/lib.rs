//! Drives the fetch → persist loop.
//!
//! The run is a small state machine:
//!
//! ```text
//! Init → Fetching → (Persisting → Fetching)* → Done
//!   \________\______________\_________________→ Error
//! ```
//!
//! It stops on the first of: an empty page, the last page the server
//! announced, or any fetch/persist error. There is no cursor between runs;
//! every run starts again at page 0.

use harvester_core::{
    CoreError, DateRange, FeedConfig, FeedFilters, FeedPage, OpportunityStore, PageSource,
};
use std::time::Duration;
use tracing::{debug, error, info};


#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub page_size: u32,
    pub polite_delay: Duration,
    pub date_range: DateRange,
    pub filters: FeedFilters,
}

impl IngestSettings {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            page_size: config.page_size,
            polite_delay: config.polite_delay(),
            date_range: config.date_range(),
            filters: config.filters(),
        }
    }
}

/// Why a successful run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The server returned no records for this page.
    EmptyPage { page_index: u32 },
    /// This page was the last one according to `totalPages`.
    LastPage { page_index: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub pages_fetched: u32,
    pub pages_persisted: u32,
    pub rows_persisted: usize,
    pub termination: Termination,
}

#[derive(Debug)]
enum IngestState {
    Init,
    Fetching { page_index: u32 },
    Persisting { page_index: u32, page: FeedPage },
    Done(Termination),
    Error(CoreError),
}

#[derive(Debug, Default)]
struct Progress {
    pages_fetched: u32,
    pages_persisted: u32,
    rows_persisted: usize,
}

pub struct Ingestor<S, D> {
    source: S,
    store: D,
    settings: IngestSettings,
}

impl<S: PageSource, D: OpportunityStore> Ingestor<S, D> {
    pub fn new(source: S, store: D, settings: IngestSettings) -> Self {
        Self {
            source,
            store,
            settings,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Runs one ingestion from page 0 until a terminal state.
    pub async fn run(&self) -> Result<IngestSummary, CoreError> {
        let mut state = IngestState::Init;
        let mut progress = Progress::default();

        loop {
            state = match state {
                IngestState::Init => self.init().await,
                IngestState::Fetching { page_index } => {
                    self.fetch(page_index, &mut progress).await
                }
                IngestState::Persisting { page_index, page } => {
                    self.persist(page_index, page, &mut progress).await
                }
                IngestState::Done(termination) => {
                    info!(
                        "Ingestion finished: {} pages fetched, {} rows persisted ({:?})",
                        progress.pages_fetched, progress.rows_persisted, termination
                    );
                    return Ok(IngestSummary {
                        pages_fetched: progress.pages_fetched,
                        pages_persisted: progress.pages_persisted,
                        rows_persisted: progress.rows_persisted,
                        termination,
                    });
                }
                IngestState::Error(e) => {
                    error!(
                        "Ingestion halted after {} pages ({} rows persisted): {}",
                        progress.pages_persisted, progress.rows_persisted, e
                    );
                    return Err(e);
                }
            };
        }
    }

    async fn init(&self) -> IngestState {
        debug!("Ensuring schema before the first page");
        match self.store.ensure_schema().await {
            Ok(()) => IngestState::Fetching { page_index: 0 },
            Err(e) => IngestState::Error(e.into()),
        }
    }

    async fn fetch(&self, page_index: u32, progress: &mut Progress) -> IngestState {
        let result = self
            .source
            .fetch_page(
                page_index,
                self.settings.page_size,
                &self.settings.date_range,
                &self.settings.filters,
            )
            .await;

        match result {
            Ok(page) => {
                progress.pages_fetched += 1;
                if page.is_empty() {
                    info!("No more content found at page {}", page_index);
                    IngestState::Done(Termination::EmptyPage { page_index })
                } else {
                    IngestState::Persisting { page_index, page }
                }
            }
            Err(e) => IngestState::Error(e.into()),
        }
    }

    async fn persist(
        &self,
        page_index: u32,
        page: FeedPage,
        progress: &mut Progress,
    ) -> IngestState {
        let rows = match self.store.persist(&page.records).await {
            Ok(rows) => rows,
            Err(e) => return IngestState::Error(e.into()),
        };

        progress.pages_persisted += 1;
        progress.rows_persisted += rows;
        info!(
            "Page {} done: {} records, {} rows persisted so far",
            page_index,
            page.records.len(),
            progress.rows_persisted
        );

        if page.is_last(page_index) {
            info!(
                "Reached last page ({} of {})",
                page_index + 1,
                page.total_pages
            );
            return IngestState::Done(Termination::LastPage { page_index });
        }

        if !self.settings.polite_delay.is_zero() {
            debug!("Sleeping {:?} before the next page", self.settings.polite_delay);
            tokio::time::sleep(self.settings.polite_delay).await;
        }
        IngestState::Fetching {
            page_index: page_index + 1,
        }
    }
}
