use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Typed projection of a raw post payload for the warehouse `posts` table.
/// Missing provider fields become NULLs/defaults; only the id is required.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub post_id: String,
    pub subreddit: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub created_utc: Option<f64>,
    pub url: Option<String>,
    pub selftext: Option<String>,
    pub over_18: bool,
    pub stickied: bool,
    pub fetched_at: DateTime<Utc>,
}

impl PostRecord {
    pub fn from_payload(
        subreddit: &str,
        payload: &Map<String, Value>,
        fetched_at: DateTime<Utc>,
    ) -> Option<Self> {
        let post_id = payload.get("id")?.as_str()?.to_string();
        Some(Self {
            post_id,
            subreddit: subreddit.to_string(),
            title: string_field(payload, "title"),
            author: string_field(payload, "author"),
            score: payload.get("score").and_then(Value::as_i64),
            num_comments: payload.get("num_comments").and_then(Value::as_i64),
            created_utc: payload.get("created_utc").and_then(Value::as_f64),
            url: string_field(payload, "url"),
            selftext: string_field(payload, "selftext"),
            over_18: bool_field(payload, "over_18"),
            stickied: bool_field(payload, "stickied"),
            fetched_at,
        })
    }
}

pub async fn upsert_post(pool: &PgPool, record: &PostRecord) -> Result<(), PostsRepoError> {
    sqlx::query(
        r#"
        INSERT INTO posts (
            post_id,
            subreddit,
            title,
            author,
            score,
            num_comments,
            created_utc,
            url,
            selftext,
            over_18,
            stickied,
            fetched_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (post_id)
        DO UPDATE SET
            subreddit = EXCLUDED.subreddit,
            title = EXCLUDED.title,
            author = EXCLUDED.author,
            score = EXCLUDED.score,
            num_comments = EXCLUDED.num_comments,
            created_utc = EXCLUDED.created_utc,
            url = EXCLUDED.url,
            selftext = EXCLUDED.selftext,
            over_18 = EXCLUDED.over_18,
            stickied = EXCLUDED.stickied,
            fetched_at = EXCLUDED.fetched_at
        "#,
    )
    .bind(&record.post_id)
    .bind(&record.subreddit)
    .bind(&record.title)
    .bind(&record.author)
    .bind(record.score)
    .bind(record.num_comments)
    .bind(record.created_utc)
    .bind(&record.url)
    .bind(&record.selftext)
    .bind(record.over_18)
    .bind(record.stickied)
    .bind(record.fetched_at)
    .execute(pool)
    .await?;
    Ok(())
}

fn string_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(payload: &Map<String, Value>, key: &str) -> bool {
    payload.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::PostRecord;

    fn payload(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn from_payload_extracts_known_fields() {
        let fetched_at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let payload = payload(json!({
            "id": "p1",
            "title": "A post",
            "author": "someone",
            "score": 42,
            "num_comments": 7,
            "created_utc": 1638393600.0,
            "url": "https://example.com",
            "selftext": "body text",
            "over_18": true,
            "stickied": false,
            "upvote_ratio": 0.97
        }));
        let record = PostRecord::from_payload("rust", &payload, fetched_at).unwrap();
        assert_eq!(record.post_id, "p1");
        assert_eq!(record.subreddit, "rust");
        assert_eq!(record.title.as_deref(), Some("A post"));
        assert_eq!(record.score, Some(42));
        assert_eq!(record.num_comments, Some(7));
        assert_eq!(record.created_utc, Some(1638393600.0));
        assert!(record.over_18);
        assert!(!record.stickied);
        assert_eq!(record.fetched_at, fetched_at);
    }

    #[test]
    fn from_payload_defaults_missing_fields() {
        let payload = payload(json!({"id": "p1"}));
        let record = PostRecord::from_payload("rust", &payload, Utc::now()).unwrap();
        assert_eq!(record.title, None);
        assert_eq!(record.score, None);
        assert!(!record.over_18);
        assert!(!record.stickied);
    }

    #[test]
    fn from_payload_requires_string_id() {
        let missing = payload(json!({"title": "no id"}));
        assert!(PostRecord::from_payload("rust", &missing, Utc::now()).is_none());
        let wrong_type = payload(json!({"id": 17}));
        assert!(PostRecord::from_payload("rust", &wrong_type, Utc::now()).is_none());
    }
}
