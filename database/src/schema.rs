use chrono::NaiveDateTime;
use harvester_core::Opportunity;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "opportunities";

/// Column name and declared type, in insert order. Names follow the feed's
/// camelCase keys except `is_new`, which stores the feed's `new` flag.
pub const COLUMNS: &[(&str, &str)] = &[
    ("postId", "TEXT"),
    ("authorId", "TEXT"),
    ("createdUTC", "DATETIME"),
    ("title", "TEXT"),
    ("text", "TEXT"),
    ("subreddit", "TEXT"),
    ("subredditSubscribers", "INTEGER"),
    ("score", "INTEGER"),
    ("numComments", "INTEGER"),
    ("opportunityDescription", "TEXT"),
    ("likes", "INTEGER"),
    ("dislikes", "INTEGER"),
    ("url", "TEXT"),
    ("likedByMe", "BOOLEAN"),
    ("dislikedByMe", "BOOLEAN"),
    ("savedByMe", "BOOLEAN"),
    ("category", "TEXT"),
    ("is_new", "BOOLEAN"),
];

pub fn create_table_sql() -> String {
    let columns: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ty)| format!("    \"{}\" {}", name, ty))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        TABLE_NAME,
        columns.join(",\n")
    )
}

pub fn add_column_sql(name: &str, ty: &str) -> String {
    format!("ALTER TABLE {} ADD COLUMN \"{}\" {}", TABLE_NAME, name, ty)
}

fn quoted_column_list() -> String {
    COLUMNS
        .iter()
        .map(|(name, _)| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn insert_sql() -> String {
    let placeholders = vec!["?"; COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        TABLE_NAME,
        quoted_column_list(),
        placeholders
    )
}

pub fn select_all_sql() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY rowid",
        quoted_column_list(),
        TABLE_NAME
    )
}

#[derive(Debug, FromRow)]
pub struct OpportunityRow {
    #[sqlx(rename = "postId")]
    pub post_id: Option<String>,
    #[sqlx(rename = "authorId")]
    pub author_id: Option<String>,
    #[sqlx(rename = "createdUTC")]
    pub created_utc: Option<NaiveDateTime>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub subreddit: Option<String>,
    #[sqlx(rename = "subredditSubscribers")]
    pub subreddit_subscribers: Option<i64>,
    pub score: Option<i64>,
    #[sqlx(rename = "numComments")]
    pub num_comments: Option<i64>,
    #[sqlx(rename = "opportunityDescription")]
    pub opportunity_description: Option<String>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub url: Option<String>,
    #[sqlx(rename = "likedByMe")]
    pub liked_by_me: Option<bool>,
    #[sqlx(rename = "dislikedByMe")]
    pub disliked_by_me: Option<bool>,
    #[sqlx(rename = "savedByMe")]
    pub saved_by_me: Option<bool>,
    pub category: Option<String>,
    pub is_new: Option<bool>,
}

impl From<OpportunityRow> for Opportunity {
    fn from(row: OpportunityRow) -> Self {
        Self {
            post_id: row.post_id,
            author_id: row.author_id,
            created_utc: row.created_utc,
            title: row.title,
            text: row.text,
            subreddit: row.subreddit,
            subreddit_subscribers: row.subreddit_subscribers,
            score: row.score,
            num_comments: row.num_comments,
            opportunity_description: row.opportunity_description,
            likes: row.likes,
            dislikes: row.dislikes,
            url: row.url,
            liked_by_me: row.liked_by_me,
            disliked_by_me: row.disliked_by_me,
            saved_by_me: row.saved_by_me,
            category: row.category,
            is_new: row.is_new,
        }
    }
}
