use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use crate::models::book::{Book, BookCreateRequest, BookUpdateRequest};

/// In-memory book storage. Stands in for the persistence collaborator the
/// pipeline hands requests to; the security core never looks inside it.
#[derive(Debug, Default)]
pub struct BookStore {
    inner: RwLock<HashMap<Uuid, Book>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All books ordered by title, optionally filtered by a case-insensitive
    /// substring match over title and author.
    pub fn list(&self, query: Option<&str>) -> Vec<Book> {
        let inner = self.inner.read().expect("book store lock poisoned");
        let needle = query.map(str::to_lowercase);

        let mut books: Vec<Book> = inner
            .values()
            .filter(|book| match &needle {
                Some(needle) => {
                    book.title.to_lowercase().contains(needle)
                        || book.author.to_lowercase().contains(needle)
                }
                None => true,
            })
            .cloned()
            .collect();

        books.sort_by(|a, b| a.title.cmp(&b.title));
        books
    }

    pub fn get(&self, id: Uuid) -> Option<Book> {
        let inner = self.inner.read().expect("book store lock poisoned");
        inner.get(&id).cloned()
    }

    pub fn insert(&self, payload: BookCreateRequest) -> Book {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            title: payload.title,
            author: payload.author,
            publication_year: payload.publication_year,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().expect("book store lock poisoned");
        inner.insert(book.id, book.clone());
        book
    }

    pub fn update(&self, id: Uuid, payload: BookUpdateRequest) -> Option<Book> {
        let mut inner = self.inner.write().expect("book store lock poisoned");
        let book = inner.get_mut(&id)?;

        if let Some(title) = payload.title {
            book.title = title;
        }
        if let Some(author) = payload.author {
            book.author = author;
        }
        if let Some(publication_year) = payload.publication_year {
            book.publication_year = publication_year;
        }
        book.updated_at = Utc::now();

        Some(book.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().expect("book store lock poisoned");
        inner.remove(&id).is_some()
    }
}
