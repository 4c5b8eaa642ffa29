use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    comments::{
        dto::{CommentResponse, CreateCommentRequest, ListCommentsResponse},
        repo,
    },
    error::ApiError,
    posts,
    state::AppState,
};

pub const COMMENT_MAX_CHARS: usize = 500;

pub fn routes() -> Router<AppState> {
    // One path, three meanings: the id is a post id for GET/POST and a
    // comment id for DELETE, mirroring the public API shape.
    Router::new().route(
        "/comments/:id",
        get(list_comments).post(add_comment).delete(delete_comment),
    )
}

fn validate_content(raw: &str) -> Result<String, ApiError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ApiError::validation("content", "Comment cannot be empty"));
    }
    if content.chars().count() > COMMENT_MAX_CHARS {
        return Err(ApiError::validation(
            "content",
            format!("Comment cannot exceed {COMMENT_MAX_CHARS} characters"),
        ));
    }
    Ok(content.to_string())
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<ListCommentsResponse>, ApiError> {
    let rows = repo::list_for_post(&state.db, post_id).await?;
    let comments: Vec<CommentResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(ListCommentsResponse {
        count: comments.len(),
        comments,
    }))
}

#[instrument(skip(state, body))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let content = validate_content(&body.content)?;

    if !posts::repo::exists(&state.db, post_id).await? {
        return Err(ApiError::NotFound("Post"));
    }

    let row = repo::insert(&state.db, post_id, identity.id, &content).await?;
    info!(comment_id = %row.id, post_id = %post_id, "comment added");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let comment = repo::find_by_id(&state.db, comment_id)
        .await?
        .ok_or(ApiError::NotFound("Comment"))?;

    if comment.author_id != identity.id && !identity.is_admin() {
        warn!(comment_id = %comment_id, user_id = %identity.id, "comment delete refused");
        return Err(ApiError::Forbidden("You cannot delete this comment"));
    }

    if !repo::delete(&state.db, comment_id).await? {
        return Err(ApiError::NotFound("Comment"));
    }
    info!(comment_id = %comment_id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected() {
        for raw in ["", "   ", "\n\t"] {
            let err = validate_content(raw).unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn content_is_trimmed() {
        assert_eq!(validate_content("  nice post  ").unwrap(), "nice post");
    }

    #[test]
    fn content_over_limit_is_rejected() {
        let at_limit = "x".repeat(COMMENT_MAX_CHARS);
        assert!(validate_content(&at_limit).is_ok());

        let over = "x".repeat(COMMENT_MAX_CHARS + 1);
        let err = validate_content(&over).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
