use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Comment record joined with its author name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

const COMMENT_SELECT: &str = r#"
SELECT c.id, c.post_id, c.author_id, u.name AS author_name, c.content, c.created_at
FROM comments c
JOIN users u ON u.id = c.author_id
"#;

/// All comments for a post, newest first. An unknown post yields an empty
/// list, not an error.
pub async fn list_for_post(db: &PgPool, post_id: Uuid) -> anyhow::Result<Vec<CommentRow>> {
    let sql = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at DESC");
    let rows = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(post_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CommentRow>> {
    let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
    let row = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert(
    db: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> anyhow::Result<CommentRow> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO comments (post_id, author_id, content)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(db)
    .await?;

    let row = find_by_id(db, id)
        .await?
        .context("comment vanished after insert")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let n = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(n == 1)
}
