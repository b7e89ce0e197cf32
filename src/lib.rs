pub mod api;
pub mod book;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod request;
pub mod types;
pub mod users;
pub mod utils;
pub mod view;
pub mod wishlist;
