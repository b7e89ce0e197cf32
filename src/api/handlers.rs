//! HTTP handlers. Each one resolves the caller, parses its input, and runs the
//! service call on the blocking pool since sled I/O is synchronous.
use super::AppState;
use super::error::ApiError;
use super::extract::{AuthUser, json_body, query};
use crate::book::{Book, BookDraft, BookPatch};
use crate::catalog::BookFilter;
use crate::error::Result as LedgerResult;
use crate::ledger::NewRequest;
use crate::types::{BookId, RequestId, UserId};
use crate::users::{ProfileUpdate, UserProfile};
use crate::view::RequestView;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> LedgerResult<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

#[derive(Deserialize, Debug, Default)]
pub struct StatusBody {
    pub status: Option<String>,
}

// books

pub async fn list_books(
    State(state): State<AppState>,
    params: Result<Query<BookFilter>, QueryRejection>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let filter = query(params)?;
    let books = blocking(move || state.catalog.list_books(&filter)).await?;
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = blocking(move || state.catalog.get_book(&BookId::from(id))).await?;
    Ok(Json(book))
}

pub async fn add_book(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    payload: Result<Json<BookDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let draft = json_body(payload)?;
    let book = blocking(move || state.catalog.add_book(draft, &caller)).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let patch = json_body(payload)?;
    let book =
        blocking(move || state.catalog.update_book(&BookId::from(id), patch, &caller)).await?;
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    blocking(move || state.catalog.delete_book(&BookId::from(id), &caller)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// requests

pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    payload: Result<Json<NewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RequestView>), ApiError> {
    let input = json_body(payload)?;
    let view = blocking(move || {
        let request = state.ledger.create_request(input, &caller)?;
        state.ledger.resolve(request)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn incoming_requests(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    let views = blocking(move || {
        let requests = state.ledger.list_incoming(&caller)?;
        state.ledger.resolve_all(requests)
    })
    .await?;
    Ok(Json(views))
}

pub async fn outgoing_requests(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    let views = blocking(move || {
        let requests = state.ledger.list_outgoing(&caller)?;
        state.ledger.resolve_all(requests)
    })
    .await?;
    Ok(Json(views))
}

pub async fn update_request_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<RequestView>, ApiError> {
    let status = json_body(payload)?.status.unwrap_or_default();
    let view = blocking(move || {
        let request = state
            .ledger
            .update_status(&RequestId::from(id), &status, &caller)?;
        state.ledger.resolve(request)
    })
    .await?;
    Ok(Json(view))
}

// users

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = blocking(move || state.profiles.get_profile(&UserId::from(id))).await?;
    Ok(Json(profile))
}

pub async fn my_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = blocking(move || state.profiles.get_profile(caller.user_id())).await?;
    Ok(Json(profile))
}

pub async fn upsert_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let update = json_body(payload)?;
    let profile = blocking(move || state.profiles.upsert_profile(&caller, update)).await?;
    Ok(Json(profile))
}

pub async fn my_listings(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = blocking(move || state.catalog.list_owned_by(caller.user_id())).await?;
    Ok(Json(books))
}

pub async fn wishlist(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = blocking(move || state.wishlist.list(&caller)).await?;
    Ok(Json(books))
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(book_id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = blocking(move || state.wishlist.add(&caller, &BookId::from(book_id))).await?;
    Ok(Json(book))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(book_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    blocking(move || state.wishlist.remove(&caller, &BookId::from(book_id))).await?;
    Ok(StatusCode::NO_CONTENT)
}
