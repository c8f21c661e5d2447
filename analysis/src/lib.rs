//! Aggregates stored opportunities into a plain-text report.

pub mod keywords;
pub mod report;

pub use keywords::{tokenize, STOP_WORDS};
pub use report::{render_report, write_report};

use harvester_core::{Opportunity, ReportConfig};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityStats {
    pub subreddit: String,
    pub count: usize,
    pub total_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub total_records: usize,
    pub communities: Vec<CommunityStats>,
    pub categories: Vec<CategoryCount>,
    pub keywords: Vec<KeywordCount>,
}

impl Analysis {
    pub fn from_records(records: &[Opportunity], top_communities: usize, top_keywords: usize) -> Self {
        let analysis = Self {
            total_records: records.len(),
            communities: community_stats(records, top_communities),
            categories: category_counts(records),
            keywords: keyword_counts(records, top_keywords),
        };
        debug!(
            "Analyzed {} records: {} communities, {} categories, {} keywords",
            analysis.total_records,
            analysis.communities.len(),
            analysis.categories.len(),
            analysis.keywords.len()
        );
        analysis
    }

    pub fn with_config(records: &[Opportunity], config: &ReportConfig) -> Self {
        Self::from_records(records, config.top_communities, config.top_keywords)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Ranked by count, then total score, then name.
pub fn community_stats(records: &[Opportunity], limit: usize) -> Vec<CommunityStats> {
    let mut by_name: HashMap<&str, (usize, i64)> = HashMap::new();
    for record in records {
        if let Some(name) = non_empty(&record.subreddit) {
            let entry = by_name.entry(name).or_default();
            entry.0 += 1;
            entry.1 += record.score.unwrap_or(0);
        }
    }

    let mut stats: Vec<CommunityStats> = by_name
        .into_iter()
        .map(|(name, (count, total_score))| CommunityStats {
            subreddit: name.to_string(),
            count,
            total_score,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.total_score.cmp(&a.total_score))
            .then_with(|| a.subreddit.cmp(&b.subreddit))
    });
    stats.truncate(limit);
    stats
}

pub fn category_counts(records: &[Opportunity]) -> Vec<CategoryCount> {
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for record in records {
        if let Some(name) = non_empty(&record.category) {
            *by_name.entry(name).or_default() += 1;
        }
    }

    let mut counts: Vec<CategoryCount> = by_name
        .into_iter()
        .map(|(name, count)| CategoryCount {
            category: name.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| by_count_then_name(a.count, &a.category, b.count, &b.category));
    counts
}

pub fn keyword_counts(records: &[Opportunity], limit: usize) -> Vec<KeywordCount> {
    let mut by_word: HashMap<String, usize> = HashMap::new();
    for record in records {
        let text = format!(
            "{} {}",
            record.title.as_deref().unwrap_or_default(),
            record.opportunity_description.as_deref().unwrap_or_default()
        );
        for token in tokenize(&text) {
            *by_word.entry(token).or_default() += 1;
        }
    }

    let mut counts: Vec<KeywordCount> = by_word
        .into_iter()
        .map(|(word, count)| KeywordCount { word, count })
        .collect();
    counts.sort_by(|a, b| by_count_then_name(a.count, &a.word, b.count, &b.word));
    counts.truncate(limit);
    counts
}

fn by_count_then_name(a_count: usize, a_name: &str, b_count: usize, b_name: &str) -> Ordering {
    b_count.cmp(&a_count).then_with(|| a_name.cmp(b_name))
}
