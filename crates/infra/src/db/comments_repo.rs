use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, Transaction};
use thiserror::Error;

use snoosync_core::FlatComment;

#[derive(Debug, Error)]
pub enum CommentsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Replaces a post's comment set atomically. Rows are inserted in slice
/// order, so the serial `seq` column preserves the traversal order.
pub async fn replace_post_comments(
    pool: &PgPool,
    post_id: &str,
    comments: &[FlatComment],
    fetched_at: DateTime<Utc>,
) -> Result<(), CommentsRepoError> {
    let mut tx = pool.begin().await?;
    delete_post_comments(&mut tx, post_id).await?;
    for comment in comments {
        insert_comment(&mut tx, comment, fetched_at).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn list_post_comments(
    pool: &PgPool,
    post_id: &str,
) -> Result<Vec<FlatComment>, CommentsRepoError> {
    let rows = sqlx::query(
        r#"
        SELECT comment_id,
               post_id,
               parent_comment_id,
               author,
               body,
               score,
               created_utc,
               edited,
               is_submitter,
               stickied,
               level
        FROM post_comments
        WHERE post_id = $1
        ORDER BY seq ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    let mut comments = Vec::with_capacity(rows.len());
    for row in rows {
        comments.push(FlatComment {
            comment_id: row.try_get("comment_id")?,
            post_id: row.try_get("post_id")?,
            parent_comment_id: row.try_get("parent_comment_id")?,
            author: row.try_get("author")?,
            body: row.try_get("body")?,
            score: row.try_get("score")?,
            created_utc: row.try_get("created_utc")?,
            edited: row.try_get("edited")?,
            is_submitter: row.try_get("is_submitter")?,
            stickied: row.try_get("stickied")?,
            level: row.try_get::<i32, _>("level")? as u32,
        });
    }
    Ok(comments)
}

async fn delete_post_comments(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    post_id: &str,
) -> Result<(), CommentsRepoError> {
    sqlx::query(
        r#"
        DELETE FROM post_comments
        WHERE post_id = $1
        "#,
    )
    .bind(post_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_comment(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    comment: &FlatComment,
    fetched_at: DateTime<Utc>,
) -> Result<(), CommentsRepoError> {
    sqlx::query(
        r#"
        INSERT INTO post_comments (
            comment_id,
            post_id,
            parent_comment_id,
            author,
            body,
            score,
            created_utc,
            edited,
            is_submitter,
            stickied,
            level,
            fetched_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(&comment.comment_id)
    .bind(&comment.post_id)
    .bind(&comment.parent_comment_id)
    .bind(&comment.author)
    .bind(&comment.body)
    .bind(comment.score)
    .bind(comment.created_utc)
    .bind(comment.edited)
    .bind(comment.is_submitter)
    .bind(comment.stickied)
    .bind(comment.level as i32)
    .bind(fetched_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
