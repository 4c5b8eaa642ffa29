use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::posts::repo::{PostRow, SortMode};

/// The fixed category enumeration. Stored as exact text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Technology,
    Lifestyle,
    Travel,
    Food,
    Health,
    Education,
    Other,
}

impl Category {
    pub const ALL: [&'static str; 7] = [
        "Technology",
        "Lifestyle",
        "Travel",
        "Food",
        "Health",
        "Education",
        "Other",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Lifestyle => "Lifestyle",
            Category::Travel => "Travel",
            Category::Food => "Food",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Technology" => Ok(Category::Technology),
            "Lifestyle" => Ok(Category::Lifestyle),
            "Travel" => Ok(Category::Travel),
            "Food" => Ok(Category::Food),
            "Health" => Ok(Category::Health),
            "Education" => Ok(Category::Education),
            "Other" => Ok(Category::Other),
            other => anyhow::bail!("unknown category: {other}"),
        }
    }
}

/// Query string for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub sort: SortMode,
}

/// Request body for post creation. Title, content and category are required.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category: String,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// Partial patch for post update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PostAuthor {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: PostAuthor,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    pub is_published: bool,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PostRow> for PostResponse {
    fn from(p: PostRow) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            excerpt: p.excerpt,
            cover_image: p.cover_image,
            category: p.category,
            tags: p.tags,
            author: PostAuthor {
                id: p.author_id,
                name: p.author_name,
            },
            like_count: p.likes.len(),
            likes: p.likes,
            is_published: p.is_published,
            views: p.views,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub count: usize,
    pub posts: Vec<PostResponse>,
}

/// Result of a like toggle.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_category_parses_back() {
        for name in Category::ALL {
            assert_eq!(Category::from_str(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn category_match_is_exact() {
        assert!(Category::from_str("travel").is_err());
        assert!(Category::from_str("TRAVEL").is_err());
        assert!(Category::from_str("Gardening").is_err());
    }

    #[test]
    fn sort_mode_parses_from_query_values() {
        assert_eq!(
            serde_json::from_str::<SortMode>("\"newest\"").unwrap(),
            SortMode::Newest
        );
        assert_eq!(
            serde_json::from_str::<SortMode>("\"popular\"").unwrap(),
            SortMode::Popular
        );
        assert_eq!(
            serde_json::from_str::<SortMode>("\"liked\"").unwrap(),
            SortMode::Liked
        );
        assert!(serde_json::from_str::<SortMode>("\"trending\"").is_err());
    }

    #[test]
    fn sort_mode_defaults_to_newest() {
        let q: PostQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort, SortMode::Newest);
        assert!(q.search.is_none());
    }
}
