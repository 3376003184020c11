use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use shelfguard::authz::Principal;
use shelfguard::config::SecurityConfig;
use shelfguard::create_app;
use shelfguard::jwt::JwtConfig;

async fn test_app() -> Result<Router> {
    std::env::set_var("JWT_SECRET", "test-secret");
    Ok(create_app(SecurityConfig::default()).await?)
}

fn bearer_for(roles: &[&str], superuser: bool) -> Result<String> {
    std::env::set_var("JWT_SECRET", "test-secret");
    let jwt = JwtConfig::from_env()?;
    let principal = Principal::new(Uuid::new_v4())
        .with_roles(roles.iter().map(|r| r.to_string()))
        .with_superuser(superuser);
    Ok(format!("Bearer {}", jwt.encode(&principal)?))
}

async fn json_body(resp: Response) -> Result<Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Establish a session and CSRF token for state-changing calls.
async fn establish_session(app: &Router) -> Result<(String, String)> {
    let req = Request::builder().uri("/security/csrf").body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("sessionid="))
        .and_then(|v| v.split(';').next())
        .map(String::from)
        .expect("session cookie");

    let body = json_body(resp).await?;
    let token = body["csrf_token"].as_str().expect("csrf token").to_string();
    Ok((cookie, token))
}

async fn create_book(
    app: &Router,
    auth: &str,
    cookie: &str,
    token: &str,
    title: &str,
) -> Result<Response> {
    let payload = json!({"title": title, "author": "Test Author", "publication_year": 2001});
    let req = Request::builder()
        .method("POST")
        .uri("/books")
        .header("content-type", "application/json")
        .header(header::AUTHORIZATION, auth)
        .header(header::COOKIE, cookie)
        .header("X-CSRFToken", token)
        .body(Body::from(payload.to_string()))?;
    Ok(app.clone().oneshot(req).await?)
}

#[tokio::test]
async fn editor_can_edit_but_not_delete() -> Result<()> {
    let app = test_app().await?;
    let editor = bearer_for(&["Editors"], false)?;
    let (cookie, token) = establish_session(&app).await?;

    // Create
    let resp = create_book(&app, &editor, &cookie, &token, "A Wizard of Earthsea").await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let book = json_body(resp).await?;
    let book_id = book["id"].as_str().expect("book id").to_string();

    // Edit
    let payload = json!({"publication_year": 1968});
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/books/{}", book_id))
        .header("content-type", "application/json")
        .header(header::AUTHORIZATION, &editor)
        .header(header::COOKIE, &cookie)
        .header("X-CSRFToken", &token)
        .body(Body::from(payload.to_string()))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await?;
    assert_eq!(updated["publication_year"], 1968);

    // Delete is denied for editors
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/books/{}", book_id))
        .header(header::AUTHORIZATION, &editor)
        .header(header::COOKIE, &cookie)
        .header("X-CSRFToken", &token)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await?;
    assert_eq!(body["error"].as_str(), Some("forbidden"));

    // An admin can delete it
    let admin = bearer_for(&["Admins"], false)?;
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/books/{}", book_id))
        .header(header::AUTHORIZATION, &admin)
        .header(header::COOKIE, &cookie)
        .header("X-CSRFToken", &token)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn viewer_is_read_only() -> Result<()> {
    let app = test_app().await?;
    let viewer = bearer_for(&["Viewers"], false)?;
    let (cookie, token) = establish_session(&app).await?;

    let req = Request::builder()
        .uri("/books")
        .header(header::AUTHORIZATION, &viewer)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = create_book(&app, &viewer, &cookie, &token, "Forbidden Fruit").await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn superuser_bypasses_capability_checks() -> Result<()> {
    let app = test_app().await?;
    let root = bearer_for(&[], true)?;
    let (cookie, token) = establish_session(&app).await?;

    let resp = create_book(&app, &root, &cookie, &token, "Root Access").await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let book = json_body(resp).await?;
    let book_id = book["id"].as_str().expect("book id").to_string();

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/books/{}", book_id))
        .header(header::AUTHORIZATION, &root)
        .header(header::COOKIE, &cookie)
        .header("X-CSRFToken", &token)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn missing_or_stale_authorization_is_rejected() -> Result<()> {
    let app = test_app().await?;

    // No bearer token at all
    let req = Request::builder().uri("/books").body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A role that no longer exists grants nothing
    let stale = bearer_for(&["Archivists"], false)?;
    let req = Request::builder()
        .uri("/books")
        .header(header::AUTHORIZATION, &stale)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn search_filters_books_by_title_and_author() -> Result<()> {
    let app = test_app().await?;
    let editor = bearer_for(&["Editors"], false)?;
    let (cookie, token) = establish_session(&app).await?;

    let resp = create_book(&app, &editor, &cookie, &token, "The Dispossessed").await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = create_book(&app, &editor, &cookie, &token, "Rocannon's World").await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
        .uri("/books?q=dispossessed")
        .header(header::AUTHORIZATION, &editor)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let books = json_body(resp).await?;
    let books = books.as_array().expect("book list");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"].as_str(), Some("The Dispossessed"));

    Ok(())
}

#[tokio::test]
async fn invalid_book_payload_is_rejected() -> Result<()> {
    let app = test_app().await?;
    let editor = bearer_for(&["Editors"], false)?;
    let (cookie, token) = establish_session(&app).await?;

    let payload = json!({"title": "   ", "author": "Someone", "publication_year": 2001});
    let req = Request::builder()
        .method("POST")
        .uri("/books")
        .header("content-type", "application/json")
        .header(header::AUTHORIZATION, &editor)
        .header(header::COOKIE, &cookie)
        .header("X-CSRFToken", &token)
        .body(Body::from(payload.to_string()))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn rbac_introspection_reports_roles_and_effective_capabilities() -> Result<()> {
    let app = test_app().await?;
    let editor = bearer_for(&["Editors"], false)?;

    // Role table
    let req = Request::builder()
        .uri("/rbac/roles")
        .header(header::AUTHORIZATION, &editor)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let roles = json_body(resp).await?;
    let names: Vec<&str> = roles
        .as_array()
        .expect("role list")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Admins", "Editors", "Viewers"]);

    // Single role
    let req = Request::builder()
        .uri("/rbac/roles/Admins")
        .header(header::AUTHORIZATION, &editor)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let admins = json_body(resp).await?;
    assert_eq!(admins["capabilities"].as_array().map(Vec::len), Some(4));

    // Unknown role is a 404, not a server error
    let req = Request::builder()
        .uri("/rbac/roles/Nobody")
        .header(header::AUTHORIZATION, &editor)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Effective capabilities for the caller
    let req = Request::builder()
        .uri("/rbac/me")
        .header(header::AUTHORIZATION, &editor)
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await?;
    assert_eq!(me["roles"].as_array().map(Vec::len), Some(1));
    assert_eq!(me["superuser"], false);
    let caps: Vec<&str> = me["capabilities"]
        .as_array()
        .expect("capability list")
        .iter()
        .filter_map(|c| c.as_str())
        .collect();
    assert_eq!(caps, vec!["book.create", "book.edit", "book.view"]);

    Ok(())
}
