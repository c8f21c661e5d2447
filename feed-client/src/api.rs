use crate::metrics::{FetchMetrics, MetricsCollector, PageRequestMetrics};
use chrono::{NaiveDate, NaiveDateTime};
use harvester_core::{
    ConfigError, CoreError, DateRange, FeedApiError, FeedConfig, FeedFilters, FeedPage,
    Opportunity, PageSource,
};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER,
};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// One page as the feed API returns it. Only the fields the pipeline uses
/// are declared; the rest of the paging envelope is ignored. A missing or
/// `null` field reads as an empty page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPageData {
    #[serde(default)]
    pub content: Option<Vec<OpportunityData>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_elements: Option<u64>,
}

impl From<FeedPageData> for FeedPage {
    fn from(data: FeedPageData) -> Self {
        Self {
            records: data
                .content
                .unwrap_or_default()
                .into_iter()
                .map(Opportunity::from)
                .collect(),
            total_pages: data.total_pages.unwrap_or_default(),
        }
    }
}

/// One opportunity in the feed's wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityData {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, rename = "createdUTC")]
    pub created_utc: Option<NaiveDateTime>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub subreddit_subscribers: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub num_comments: Option<i64>,
    #[serde(default)]
    pub opportunity_description: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub dislikes: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub liked_by_me: Option<bool>,
    #[serde(default)]
    pub disliked_by_me: Option<bool>,
    #[serde(default)]
    pub saved_by_me: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub new: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedRequestBody<'a> {
    start_date: NaiveDate,
    end_date: NaiveDate,
    subreddits: &'a [String],
    categories: &'a [String],
}

#[derive(Debug)]
pub struct FeedClient {
    http_client: Client,
    endpoint: Url,
    sort: String,
    timeout: Duration,
    metrics: Arc<MetricsCollector>,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, CoreError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|_| ConfigError::InvalidValue {
            field: "feed.endpoint".to_string(),
            value: config.endpoint.clone(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("feed.accept_language", &config.accept_language)?,
        );
        headers.insert(ORIGIN, header_value("feed.origin", &config.origin)?);
        headers.insert(REFERER, header_value("feed.referer", &config.referer)?);
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
        if let Some(cookie) = config.cookie_header() {
            let mut value = header_value("feed.cookies", &cookie)?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(FeedApiError::from)?;

        Ok(Self {
            http_client,
            endpoint,
            sort: config.sort.clone(),
            timeout: config.timeout(),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Requests one page. Never retries; every failure goes back to the caller.
    pub async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
        date_range: &DateRange,
        filters: &FeedFilters,
    ) -> Result<FeedPage, FeedApiError> {
        let start_time = Instant::now();
        let result = self
            .request_page(page_index, page_size, date_range, filters)
            .await;

        let (status_code, records, error_type) = match &result {
            Ok(page) => (Some(200), page.records.len(), None),
            Err(FeedApiError::ServerError { status_code, .. }) => {
                (Some(*status_code), 0, Some("server_error".to_string()))
            }
            Err(FeedApiError::RequestTimeout { .. }) => (None, 0, Some("timeout".to_string())),
            Err(FeedApiError::Transport { .. }) => (None, 0, Some("transport".to_string())),
            Err(FeedApiError::InvalidResponse { .. }) => {
                (None, 0, Some("invalid_response".to_string()))
            }
        };

        self.metrics
            .record_request(PageRequestMetrics {
                page_index,
                status_code,
                response_time: start_time.elapsed(),
                success: result.is_ok(),
                records,
                error_type,
            })
            .await;

        result
    }

    async fn request_page(
        &self,
        page_index: u32,
        page_size: u32,
        date_range: &DateRange,
        filters: &FeedFilters,
    ) -> Result<FeedPage, FeedApiError> {
        let page = page_index.to_string();
        let size = page_size.to_string();
        let body = FeedRequestBody {
            start_date: date_range.start,
            end_date: date_range.end,
            subreddits: &filters.subreddits,
            categories: &filters.categories,
        };

        info!("Fetching page {}...", page_index);
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .query(&[
                ("page", page.as_str()),
                ("size", size.as_str()),
                ("sort", self.sort.as_str()),
            ])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Network error fetching page {}: {}", page_index, e);
                self.classify(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Error: status code {} for page {}", status, page_index);
            debug!("Error response body: {}", body);
            return Err(FeedApiError::ServerError {
                status_code: status.as_u16(),
                body,
            });
        }

        let data: FeedPageData = response.json().await.map_err(|e| {
            error!("Failed to parse page {}: {}", page_index, e);
            self.classify(e)
        })?;
        let total_elements = data.total_elements;

        let page = FeedPage::from(data);
        debug!(
            "Page {} returned {} records (totalPages={}, totalElements={:?})",
            page_index,
            page.records.len(),
            page.total_pages,
            total_elements
        );
        Ok(page)
    }

    fn classify(&self, e: reqwest::Error) -> FeedApiError {
        if e.is_timeout() {
            FeedApiError::RequestTimeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            FeedApiError::from(e)
        }
    }

    pub async fn get_metrics(&self) -> FetchMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn export_metrics(&self) -> Result<String, serde_json::Error> {
        self.metrics.export_metrics().await
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

impl PageSource for FeedClient {
    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
        date_range: &DateRange,
        filters: &FeedFilters,
    ) -> Result<FeedPage, FeedApiError> {
        FeedClient::fetch_page(self, page_index, page_size, date_range, filters).await
    }
}

// The feed calls the flag `new`; everything downstream calls it `is_new`.
impl From<OpportunityData> for Opportunity {
    fn from(data: OpportunityData) -> Self {
        Self {
            post_id: data.post_id,
            author_id: data.author_id,
            created_utc: data.created_utc,
            title: data.title,
            text: data.text,
            subreddit: data.subreddit,
            subreddit_subscribers: data.subreddit_subscribers,
            score: data.score,
            num_comments: data.num_comments,
            opportunity_description: data.opportunity_description,
            likes: data.likes,
            dislikes: data.dislikes,
            url: data.url,
            liked_by_me: data.liked_by_me,
            disliked_by_me: data.disliked_by_me,
            saved_by_me: data.saved_by_me,
            category: data.category,
            is_new: data.new,
        }
    }
}
