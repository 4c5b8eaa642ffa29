use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::comments::repo::CommentRow;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentAuthor {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author: CommentAuthor,
    pub created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentResponse {
    fn from(c: CommentRow) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            content: c.content,
            author: CommentAuthor {
                id: c.author_id,
                name: c.author_name,
            },
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListCommentsResponse {
    pub count: usize,
    pub comments: Vec<CommentResponse>,
}
