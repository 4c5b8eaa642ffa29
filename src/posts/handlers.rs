use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    posts::{
        derive::{derive_excerpt, resolve_excerpt, slugify},
        dto::{
            Category, CreatePostRequest, LikeResponse, ListPostsResponse, PostQuery, PostResponse,
            UpdatePostRequest,
        },
        repo::{self, NewPost, PostFilter, PostPatch},
    },
    state::AppState,
};

// Matches the stock cover the original deployment shipped with.
const DEFAULT_COVER_IMAGE: &str =
    "https://images.unsplash.com/photo-1499750310107-5fef28a66643?w=800";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(toggle_like))
}

fn parse_category(raw: &str) -> Result<Category, ApiError> {
    Category::from_str(raw).map_err(|_| {
        ApiError::validation(
            "category",
            format!("Category must be one of: {}", Category::ALL.join(", ")),
        )
    })
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(q): Query<PostQuery>,
) -> Result<Json<ListPostsResponse>, ApiError> {
    let filter = PostFilter {
        search: q.search,
        category: q.category,
        tag: q.tag,
        sort: q.sort,
    };
    let rows = repo::list_published(&state.db, &filter).await?;
    let posts: Vec<PostResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(ListPostsResponse {
        count: posts.len(),
        posts,
    }))
}

/// Detail fetch. Every call counts as a view, repeat visitors included.
#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let row = repo::find_and_bump_views(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    Ok(Json(row.into()))
}

#[instrument(skip(state, body))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    identity.require_admin()?;

    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::validation("title", "Title is required"));
    }
    if body.content.trim().is_empty() {
        return Err(ApiError::validation("content", "Content is required"));
    }
    let category = parse_category(&body.category)?;

    let new = NewPost {
        slug: slugify(&title),
        excerpt: resolve_excerpt(body.excerpt.as_deref(), &body.content),
        title,
        content: body.content,
        cover_image: body
            .cover_image
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COVER_IMAGE.to_string()),
        category: category.as_str().to_string(),
        tags: body.tags.unwrap_or_default(),
        author_id: identity.id,
        is_published: body.is_published.unwrap_or(true),
    };

    let row = repo::insert(&state.db, &new).await?;
    info!(post_id = %row.id, author_id = %identity.id, "post created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state, body))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    identity.require_admin()?;

    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;

    let title = match &body.title {
        Some(t) => {
            let t = t.trim();
            if t.is_empty() {
                return Err(ApiError::validation("title", "Title is required"));
            }
            t.to_string()
        }
        None => existing.title.clone(),
    };
    let category = match &body.category {
        Some(c) => parse_category(c)?.as_str().to_string(),
        None => existing.category.clone(),
    };
    let content = body.content.clone().unwrap_or_else(|| existing.content.clone());

    // Slug follows the title; the excerpt follows the content unless the
    // caller supplied a non-blank one of their own.
    let slug = if body.title.is_some() {
        slugify(&title)
    } else {
        existing.slug.clone()
    };
    let excerpt = match (&body.excerpt, &body.content) {
        (Some(e), _) if !e.trim().is_empty() => e.trim().to_string(),
        (Some(_), _) | (None, Some(_)) => derive_excerpt(&content),
        (None, None) => existing.excerpt.clone(),
    };

    let patch = PostPatch {
        title,
        slug,
        content,
        excerpt,
        cover_image: body
            .cover_image
            .clone()
            .unwrap_or_else(|| existing.cover_image.clone()),
        category,
        tags: body.tags.clone().unwrap_or_else(|| existing.tags.clone()),
        is_published: body.is_published.unwrap_or(existing.is_published),
    };

    let row = repo::update(&state.db, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    info!(post_id = %id, "post updated");
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;

    if !repo::delete_cascade(&state.db, id).await? {
        return Err(ApiError::NotFound("Post"));
    }
    info!(post_id = %id, "post deleted with its comments");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let (liked, like_count) = repo::toggle_like(&state.db, id, identity.id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    Ok(Json(LikeResponse { liked, like_count }))
}
