use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookCreateRequest {
    #[schema(example = "The Left Hand of Darkness")]
    pub title: String,
    #[schema(example = "Ursula K. Le Guin")]
    pub author: String,
    #[schema(example = 1969)]
    pub publication_year: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookUpdateRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
}

/// Query parameters for the book list: optional substring search over
/// title and author.
#[derive(Debug, Default, Deserialize)]
pub struct BookListParams {
    pub q: Option<String>,
}
