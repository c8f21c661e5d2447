use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub records_received: u64,
    pub average_response_time: Duration,
    pub min_response_time: Option<Duration>,
    pub max_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
    pub last_status_code: Option<u16>,
    pub last_error: Option<String>,
}

/// Outcome of one page request.
#[derive(Debug, Clone)]
pub struct PageRequestMetrics {
    pub page_index: u32,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub success: bool,
    pub records: usize,
    pub error_type: Option<String>,
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self {
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            records_received: 0,
            average_response_time: Duration::from_millis(0),
            min_response_time: None,
            max_response_time: Duration::from_millis(0),
            last_request_time: None,
            last_status_code: None,
            last_error: None,
        }
    }
}

impl FetchMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<FetchMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(FetchMetrics::default())),
        }
    }

    pub async fn record_request(&self, request: PageRequestMetrics) {
        let mut metrics = self.metrics.write().await;

        metrics.total_requests += 1;
        metrics.last_request_time = Some(SystemTime::now());
        metrics.last_status_code = request.status_code;

        if request.success {
            metrics.successful_requests += 1;
            metrics.records_received += request.records as u64;
        } else {
            metrics.failed_requests += 1;
            metrics.last_error = Some(format!(
                "page {}: {}",
                request.page_index,
                request.error_type.as_deref().unwrap_or("unknown")
            ));
        }

        // Running average
        let total_time = metrics.average_response_time * metrics.total_requests as u32
            - metrics.average_response_time
            + request.response_time;
        metrics.average_response_time = total_time / metrics.total_requests as u32;

        metrics.min_response_time = Some(match metrics.min_response_time {
            Some(min) => min.min(request.response_time),
            None => request.response_time,
        });
        if request.response_time > metrics.max_response_time {
            metrics.max_response_time = request.response_time;
        }
    }

    pub async fn get_metrics(&self) -> FetchMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn export_metrics(&self) -> Result<String, serde_json::Error> {
        let metrics = self.get_metrics().await;
        serde_json::to_string_pretty(&metrics)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_request(page_index: u32, millis: u64, success: bool) -> PageRequestMetrics {
        PageRequestMetrics {
            page_index,
            status_code: Some(if success { 200 } else { 500 }),
            response_time: Duration::from_millis(millis),
            success,
            records: if success { 1000 } else { 0 },
            error_type: if success {
                None
            } else {
                Some("server_error".to_string())
            },
        }
    }

    #[tokio::test]
    async fn test_metrics_collection() {
        let collector = MetricsCollector::new();

        collector.record_request(page_request(0, 150, true)).await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 0);
        assert_eq!(metrics.records_received, 1000);
        assert!(metrics.last_request_time.is_some());
    }

    #[tokio::test]
    async fn test_response_time_bounds() {
        let collector = MetricsCollector::new();

        collector.record_request(page_request(0, 100, true)).await;
        collector.record_request(page_request(1, 300, true)).await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.average_response_time, Duration::from_millis(200));
        assert_eq!(metrics.min_response_time, Some(Duration::from_millis(100)));
        assert_eq!(metrics.max_response_time, Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_failure_tracking() {
        let collector = MetricsCollector::new();

        collector.record_request(page_request(0, 100, true)).await;
        collector.record_request(page_request(1, 100, false)).await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.records_received, 1000);
        assert_eq!(metrics.success_rate(), 0.5);
        assert_eq!(metrics.last_error.as_deref(), Some("page 1: server_error"));
        assert_eq!(metrics.last_status_code, Some(500));
    }

    #[tokio::test]
    async fn test_export_metrics() {
        let collector = MetricsCollector::new();
        collector.record_request(page_request(0, 150, true)).await;

        let exported = collector.export_metrics().await.unwrap();
        assert!(exported.contains("records_received"));
        assert!(exported.contains("\"last_status_code\": 200"));
    }
}
