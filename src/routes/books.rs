//! Book CRUD handlers.
//!
//! Capability gates (view/create/edit/delete) are enforced by the
//! pipeline's route layers before these handlers run; by the time a
//! request lands here it is authenticated, CSRF-checked and authorized.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::book::{Book, BookCreateRequest, BookListParams, BookUpdateRequest};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_AUTHOR_LENGTH: usize = 100;

#[utoipa::path(
    get,
    path = "/books",
    tag = "Books",
    params(("q" = Option<String>, Query, description = "Substring match over title and author")),
    responses((status = 200, description = "List books", body = [Book])),
    security(("bearerAuth" = []))
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> AppResult<Json<Vec<Book>>> {
    let query = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    Ok(Json(state.books.list(query)))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = Uuid, Path, description = "Book id")),
    responses((status = 200, description = "Book detail", body = Book)),
    security(("bearerAuth" = []))
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Book>> {
    let book = state
        .books
        .get(id)
        .ok_or_else(|| AppError::not_found("book not found"))?;
    Ok(Json(book))
}

#[utoipa::path(
    post,
    path = "/books",
    tag = "Books",
    request_body = BookCreateRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 403, description = "Missing capability or CSRF token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<BookCreateRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    validate_title(&payload.title)?;
    validate_author(&payload.author)?;
    validate_year(payload.publication_year)?;

    let book = state.books.insert(payload);
    tracing::info!(book = %book.id, "created book");
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = BookUpdateRequest,
    responses((status = 200, description = "Book updated", body = Book)),
    security(("bearerAuth" = []))
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookUpdateRequest>,
) -> AppResult<Json<Book>> {
    if let Some(title) = payload.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(author) = payload.author.as_deref() {
        validate_author(author)?;
    }
    if let Some(year) = payload.publication_year {
        validate_year(year)?;
    }

    let book = state
        .books
        .update(id, payload)
        .ok_or_else(|| AppError::not_found("book not found"))?;
    Ok(Json(book))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = Uuid, Path, description = "Book id")),
    responses((status = 204, description = "Book deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_book(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    if !state.books.remove(id) {
        return Err(AppError::not_found("book not found"));
    }
    tracing::info!(book = %id, "deleted book");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(AppError::bad_request(format!(
            "title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_author(author: &str) -> AppResult<()> {
    if author.trim().is_empty() {
        return Err(AppError::bad_request("author must not be empty"));
    }
    if author.len() > MAX_AUTHOR_LENGTH {
        return Err(AppError::bad_request(format!(
            "author must be at most {} characters",
            MAX_AUTHOR_LENGTH
        )));
    }
    Ok(())
}

fn validate_year(year: i32) -> AppResult<()> {
    if !(0..=9999).contains(&year) {
        return Err(AppError::bad_request("publication_year out of range"));
    }
    Ok(())
}
