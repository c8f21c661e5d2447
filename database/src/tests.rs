use crate::{Database, COLUMNS, TABLE_NAME};
use chrono::NaiveDate;
use harvester_core::{DatabaseError, Opportunity};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::env;
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

/// A database on a throwaway file that is deleted when the value drops.
struct TestDb {
    db: Database,
    path: PathBuf,
}

impl TestDb {
    fn new() -> Self {
        let path = env::temp_dir().join(format!("test_harvester_{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(format!("sqlite://{}", path.display()));
        Self { db, path }
    }
}

impl Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn setup_test_db() -> TestDb {
    let db = TestDb::new();
    db.ensure_schema().await.expect("Failed to ensure schema");
    db
}

async fn raw_connection(db: &Database) -> SqliteConnection {
    SqliteConnectOptions::from_str(&db.connection_string)
        .expect("Invalid test connection string")
        .create_if_missing(true)
        .connect()
        .await
        .expect("Failed to open raw connection")
}

async fn column_names(db: &Database) -> Vec<String> {
    let mut conn = raw_connection(db).await;
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?)")
        .bind(TABLE_NAME)
        .fetch_all(&mut conn)
        .await
        .expect("Failed to read table info");
    conn.close().await.ok();
    names
}

fn opportunity(post_id: &str, subreddit: &str, score: i64) -> Opportunity {
    Opportunity {
        post_id: Some(post_id.to_string()),
        author_id: Some("t2_author".to_string()),
        created_utc: NaiveDate::from_ymd_opt(2026, 1, 30)
            .and_then(|d| d.and_hms_opt(22, 55, 34)),
        title: Some(format!("Looking for a tool ({})", post_id)),
        text: Some("Body text with non-Latin content: 机会 🚀".to_string()),
        subreddit: Some(subreddit.to_string()),
        subreddit_subscribers: Some(120_000),
        score: Some(score),
        num_comments: Some(4),
        opportunity_description: Some("Users want a scheduling assistant".to_string()),
        likes: Some(1),
        dislikes: Some(0),
        url: Some(format!("https://reddit.com/r/{}/comments/{}", subreddit, post_id)),
        liked_by_me: Some(false),
        disliked_by_me: Some(false),
        saved_by_me: Some(true),
        category: Some("productivity".to_string()),
        is_new: Some(true),
    }
}

#[tokio::test]
async fn test_schema_creation() {
    let db = setup_test_db().await;

    let columns = column_names(&db).await;
    assert_eq!(columns.len(), COLUMNS.len());
    assert!(columns.iter().any(|c| c == "is_new"));
    assert!(!columns.iter().any(|c| c == "new"));
    assert_eq!(db.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_schema_is_idempotent() {
    let db = setup_test_db().await;
    let records = vec![opportunity("p1", "a", 5), opportunity("p2", "b", 3)];
    db.persist(&records).await.unwrap();

    db.ensure_schema().await.expect("Second ensure_schema failed");
    db.ensure_schema().await.expect("Third ensure_schema failed");

    assert_eq!(db.count().await.unwrap(), 2);
    assert_eq!(db.fetch_all().await.unwrap(), records);
}

#[tokio::test]
async fn test_persist_round_trip() {
    let db = setup_test_db().await;
    let records = vec![
        opportunity("p1", "a", 5),
        opportunity("p2", "a", 10),
        opportunity("p3", "b", 1),
    ];

    let written = db.persist(&records).await.unwrap();
    assert_eq!(written, 3);

    let stored = db.fetch_all().await.unwrap();
    assert_eq!(stored, records);
    assert_eq!(
        stored[0].text.as_deref(),
        Some("Body text with non-Latin content: 机会 🚀")
    );
}

#[tokio::test]
async fn test_is_new_column_holds_translated_flag() {
    let db = setup_test_db().await;
    let mut fresh = opportunity("p1", "a", 1);
    fresh.is_new = Some(true);
    let mut old = opportunity("p2", "a", 1);
    old.is_new = Some(false);
    db.persist(&[fresh, old]).await.unwrap();

    let mut conn = raw_connection(&db).await;
    let flags = sqlx::query_scalar::<_, bool>("SELECT is_new FROM opportunities ORDER BY rowid")
        .fetch_all(&mut conn)
        .await
        .unwrap();
    conn.close().await.ok();
    assert_eq!(flags, vec![true, false]);
}

#[tokio::test]
async fn test_null_fields_stored_as_null() {
    let db = setup_test_db().await;
    let sparse = Opportunity {
        post_id: Some("sparse".to_string()),
        ..Default::default()
    };
    db.persist(&[sparse.clone()]).await.unwrap();

    let stored = db.fetch_all().await.unwrap();
    assert_eq!(stored, vec![sparse]);
    assert_eq!(stored[0].score, None);
    assert_eq!(stored[0].is_new, None);
}

#[tokio::test]
async fn test_duplicates_are_appended() {
    let db = setup_test_db().await;
    let records = vec![opportunity("dup", "a", 1)];
    db.persist(&records).await.unwrap();
    db.persist(&records).await.unwrap();

    assert_eq!(db.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let db = setup_test_db().await;
    assert_eq!(db.persist(&[]).await.unwrap(), 0);
    assert_eq!(db.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_insert_rolls_back_batch() {
    let db = TestDb::new();

    // Same columns as the managed schema, plus a constraint the second record breaks.
    let mut conn = raw_connection(&db).await;
    let columns: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ty)| {
            if *name == "score" {
                format!("\"{}\" {} CHECK (\"score\" >= 0)", name, ty)
            } else {
                format!("\"{}\" {}", name, ty)
            }
        })
        .collect();
    sqlx::query(&format!(
        "CREATE TABLE {} ({})",
        TABLE_NAME,
        columns.join(", ")
    ))
    .execute(&mut conn)
    .await
    .unwrap();
    conn.close().await.ok();

    db.ensure_schema().await.unwrap();

    let records = vec![
        opportunity("ok-1", "a", 1),
        opportunity("bad", "a", -1),
        opportunity("ok-2", "a", 1),
    ];
    let result = db.persist(&records).await;

    match result {
        Err(DatabaseError::InsertFailed { index, post_id, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(post_id, "bad");
        }
        other => panic!("Expected InsertFailed, got {:?}", other),
    }
    assert_eq!(db.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_persist_without_schema_fails() {
    let db = TestDb::new();
    let result = db.persist(&[opportunity("p1", "a", 1)]).await;
    assert!(matches!(result, Err(DatabaseError::InsertFailed { .. })));
}

#[tokio::test]
async fn test_missing_columns_are_added() {
    let db = TestDb::new();

    let mut conn = raw_connection(&db).await;
    sqlx::query("CREATE TABLE opportunities (\"postId\" TEXT, \"title\" TEXT, \"score\" INTEGER)")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query("INSERT INTO opportunities (\"postId\", \"title\", \"score\") VALUES ('legacy', 'Old row', 7)")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.ok();

    db.ensure_schema().await.unwrap();

    let columns = column_names(&db).await;
    assert_eq!(columns.len(), COLUMNS.len());
    assert!(columns.iter().any(|c| c == "is_new"));

    db.persist(&[opportunity("p1", "a", 1)]).await.unwrap();
    let stored = db.fetch_all().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].post_id.as_deref(), Some("legacy"));
    assert_eq!(stored[0].title.as_deref(), Some("Old row"));
    assert_eq!(stored[0].score, Some(7));
    assert_eq!(stored[0].is_new, None);
}

#[tokio::test]
async fn test_temp_database_file_is_removed() {
    let db = setup_test_db().await;
    db.persist(&[opportunity("p1", "a", 1)]).await.unwrap();
    let path = db.path.clone();
    assert!(path.exists());

    drop(db);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_unreachable_database() {
    let db = Database::new("sqlite:///nonexistent-harvester-dir/nested/db.sqlite".to_string());
    let result = db.ensure_schema().await;
    assert!(matches!(result, Err(DatabaseError::ConnectionFailed { .. })));
}
