use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One feed entry as the rest of the workspace sees it.
///
/// Every field is optional because the feed sends `null` freely. The source
/// field `new` is carried as `is_new`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opportunity {
    pub post_id: Option<String>,
    pub author_id: Option<String>,
    pub created_utc: Option<NaiveDateTime>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub subreddit: Option<String>,
    pub subreddit_subscribers: Option<i64>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub opportunity_description: Option<String>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub url: Option<String>,
    pub liked_by_me: Option<bool>,
    pub disliked_by_me: Option<bool>,
    pub saved_by_me: Option<bool>,
    pub category: Option<String>,
    pub is_new: Option<bool>,
}

/// One page of the remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub records: Vec<Opportunity>,
    pub total_pages: u32,
}

impl FeedPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when `page_index` is the last page the server announced.
    /// A reported total of zero also counts as exhausted.
    pub fn is_last(&self, page_index: u32) -> bool {
        page_index.saturating_add(1) >= self.total_pages
    }
}

/// Inclusive date window sent with every page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Allow-lists; empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilters {
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}
