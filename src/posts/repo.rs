use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

/// Post record joined with its author name and liking-user set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub author_name: String,
    pub likes: Vec<Uuid>,
    pub is_published: bool,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Newest,
    Popular,
    Liked,
}

/// Typed listing filter; every field optional except the sort mode.
#[derive(Debug, Default)]
pub struct PostFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: SortMode,
}

const POST_SELECT: &str = r#"
SELECT p.id, p.title, p.slug, p.content, p.excerpt, p.cover_image, p.category,
       p.tags, p.author_id, u.name AS author_name,
       ARRAY(SELECT pl.user_id FROM post_likes pl
             WHERE pl.post_id = p.id ORDER BY pl.created_at) AS likes,
       p.is_published, p.views, p.created_at, p.updated_at
FROM posts p
JOIN users u ON u.id = p.author_id
"#;

/// Escape LIKE wildcards so user input matches as a literal substring.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn build_list_query(filter: &PostFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(POST_SELECT);
    qb.push("WHERE p.is_published = TRUE");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (p.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.content ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM unnest(p.tags) AS t(tag) WHERE t.tag ILIKE ");
        qb.push_bind(pattern);
        qb.push("))");
    }

    if let Some(category) = filter.category.as_deref() {
        qb.push(" AND p.category = ");
        qb.push_bind(category.to_string());
    }

    if let Some(tag) = filter.tag.as_deref() {
        qb.push(" AND ");
        qb.push_bind(tag.to_string());
        qb.push(" = ANY(p.tags)");
    }

    qb.push(match filter.sort {
        SortMode::Newest => " ORDER BY p.created_at DESC",
        SortMode::Popular => " ORDER BY p.views DESC",
        SortMode::Liked => {
            " ORDER BY (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) DESC"
        }
    });

    qb
}

/// All published posts matching the filter, sorted. No pagination.
pub async fn list_published(db: &PgPool, filter: &PostFilter) -> anyhow::Result<Vec<PostRow>> {
    let mut qb = build_list_query(filter);
    let rows = qb.build_query_as::<PostRow>().fetch_all(db).await?;
    Ok(rows)
}

/// Fetch one post regardless of publication state, without side effects.
pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<PostRow>> {
    let sql = format!("{POST_SELECT} WHERE p.id = $1");
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Fetch one post and count the read: `views` is bumped in the same
/// statement, so concurrent readers never lose an increment.
pub async fn find_and_bump_views(db: &PgPool, id: Uuid) -> anyhow::Result<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        WITH bumped AS (
            UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING *
        )
        SELECT b.id, b.title, b.slug, b.content, b.excerpt, b.cover_image, b.category,
               b.tags, b.author_id, u.name AS author_name,
               ARRAY(SELECT pl.user_id FROM post_likes pl
                     WHERE pl.post_id = b.id ORDER BY pl.created_at) AS likes,
               b.is_published, b.views, b.created_at, b.updated_at
        FROM bumped b
        JOIN users u ON u.id = b.author_id
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn exists(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT TRUE FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

#[derive(Debug)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub is_published: bool,
}

pub async fn insert(db: &PgPool, new: &NewPost) -> anyhow::Result<PostRow> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO posts (title, slug, content, excerpt, cover_image, category,
                           tags, author_id, is_published)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&new.title)
    .bind(&new.slug)
    .bind(&new.content)
    .bind(&new.excerpt)
    .bind(&new.cover_image)
    .bind(&new.category)
    .bind(&new.tags)
    .bind(new.author_id)
    .bind(new.is_published)
    .fetch_one(db)
    .await?;

    let row = find_by_id(db, id).await?.context("post vanished after insert")?;
    Ok(row)
}

/// Fully-resolved field set written by an update. The handler merges the
/// caller's patch with the stored row and re-runs the derivations first.
#[derive(Debug)]
pub struct PostPatch {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub is_published: bool,
}

pub async fn update(db: &PgPool, id: Uuid, patch: &PostPatch) -> anyhow::Result<Option<PostRow>> {
    let n = sqlx::query(
        r#"
        UPDATE posts
        SET title = $2, slug = $3, content = $4, excerpt = $5, cover_image = $6,
            category = $7, tags = $8, is_published = $9, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&patch.title)
    .bind(&patch.slug)
    .bind(&patch.content)
    .bind(&patch.excerpt)
    .bind(&patch.cover_image)
    .bind(&patch.category)
    .bind(&patch.tags)
    .bind(patch.is_published)
    .execute(db)
    .await?
    .rows_affected();

    if n == 0 {
        return Ok(None);
    }
    find_by_id(db, id).await
}

/// Flip the caller's membership in the post's liking set.
///
/// Add-if-absent and remove-if-present are each one atomic statement, so two
/// racing toggles from the same user resolve by store ordering and never
/// produce a duplicate entry. Returns `None` when the post does not exist.
pub async fn toggle_like(
    db: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<(bool, i64)>> {
    if !exists(db, post_id).await? {
        return Ok(None);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO post_likes (post_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (post_id, user_id) DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .execute(db)
    .await?
    .rows_affected()
        == 1;

    if !inserted {
        sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(db)
            .await?;
    }

    let (like_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(db)
        .await?;

    Ok(Some((inserted, like_count)))
}

/// Delete a post together with its comments and likes, as one transaction.
/// Returns false (and rolls back) when the post does not exist.
pub async fn delete_cascade(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin tx")?;

    sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        == 1;

    if !deleted {
        tx.rollback().await?;
        return Ok(false);
    }
    tx.commit().await.context("commit tx")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_protects_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn default_listing_selects_published_newest_first() {
        let qb = build_list_query(&PostFilter::default());
        let sql = qb.sql();
        assert!(sql.contains("p.is_published = TRUE"));
        assert!(sql.ends_with("ORDER BY p.created_at DESC"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn search_matches_title_content_and_tags() {
        let filter = PostFilter {
            search: Some("rust".into()),
            ..Default::default()
        };
        let qb = build_list_query(&filter);
        let sql = qb.sql();
        assert!(sql.contains("p.title ILIKE $1"));
        assert!(sql.contains("p.content ILIKE $2"));
        assert!(sql.contains("unnest(p.tags)"));
        assert!(sql.contains("$3"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = PostFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(!build_list_query(&filter).sql().contains("ILIKE"));
    }

    #[test]
    fn category_and_tag_filters_bind_exact_values() {
        let filter = PostFilter {
            category: Some("Travel".into()),
            tag: Some("india".into()),
            ..Default::default()
        };
        let qb = build_list_query(&filter);
        let sql = qb.sql();
        assert!(sql.contains("p.category = $1"));
        assert!(sql.contains("$2 = ANY(p.tags)"));
    }

    #[test]
    fn sort_modes_order_by_the_right_column() {
        let popular = build_list_query(&PostFilter {
            sort: SortMode::Popular,
            ..Default::default()
        });
        assert!(popular.sql().ends_with("ORDER BY p.views DESC"));

        let liked = build_list_query(&PostFilter {
            sort: SortMode::Liked,
            ..Default::default()
        });
        assert!(liked.sql().contains("COUNT(*) FROM post_likes"));
        assert!(liked.sql().trim_end().ends_with("DESC"));
    }
}
