pub mod api;
pub mod metrics;


pub use api::{FeedClient, FeedPageData, OpportunityData};
pub use metrics::{FetchMetrics, MetricsCollector, PageRequestMetrics};
