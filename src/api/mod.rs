//! HTTP/JSON surface of the marketplace.
//!
//! | Route | Auth |
//! |---|---|
//! | `GET /api/books`, `GET /api/books/{id}` | public |
//! | `POST /api/books`, `PUT`/`DELETE /api/books/{id}` | bearer |
//! | `POST /api/requests`, `GET /api/requests/incoming`, `GET /api/requests/outgoing` | bearer |
//! | `PUT /api/requests/{id}` | bearer |
//! | `GET /api/users/{id}` | public |
//! | `GET`/`PUT /api/users/me`, `GET /api/users/me/listings` | bearer |
//! | `GET /api/users/me/wishlist`, `POST`/`DELETE /api/users/me/wishlist/{bookId}` | bearer |

pub mod error;
pub mod extract;
pub mod handlers;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::gateway::AccessGateway;
use crate::ledger::RequestLedger;
use crate::users::Profiles;
use crate::wishlist::Wishlist;
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub ledger: Arc<RequestLedger>,
    pub profiles: Arc<Profiles>,
    pub wishlist: Arc<Wishlist>,
    pub gateway: Arc<dyn AccessGateway>,
}

impl AppState {
    /// Wire every service onto the same database
    pub fn open(instance: Arc<sled::Db>, gateway: Arc<dyn AccessGateway>) -> Result<Self> {
        let catalog = Arc::new(Catalog::new(instance.clone())?);
        let profiles = Arc::new(Profiles::new(instance.clone())?);
        let ledger = Arc::new(RequestLedger::new(
            instance.clone(),
            catalog.clone(),
            profiles.clone(),
        )?);
        let wishlist = Arc::new(Wishlist::new(instance, catalog.clone())?);

        Ok(Self {
            catalog,
            ledger,
            profiles,
            wishlist,
            gateway,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/books",
            get(handlers::list_books).post(handlers::add_book),
        )
        .route(
            "/api/books/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/api/requests", post(handlers::create_request))
        .route("/api/requests/incoming", get(handlers::incoming_requests))
        .route("/api/requests/outgoing", get(handlers::outgoing_requests))
        .route("/api/requests/{id}", put(handlers::update_request_status))
        .route(
            "/api/users/me",
            get(handlers::my_profile).put(handlers::upsert_profile),
        )
        .route("/api/users/me/listings", get(handlers::my_listings))
        .route("/api/users/me/wishlist", get(handlers::wishlist))
        .route(
            "/api/users/me/wishlist/{book_id}",
            post(handlers::add_to_wishlist).delete(handlers::remove_from_wishlist),
        )
        .route("/api/users/{id}", get(handlers::get_profile))
        .with_state(state)
}
