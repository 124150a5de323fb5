//! QR code web service
//!
//! Users register, log in and turn URLs into QR code images fetched from a
//! remote generation API. Generated codes are stored per user and can be
//! listed, viewed and deleted.
//!
//! The binary in `main.rs` wires the PostgreSQL stores, the configured
//! session backend and the HTTP gateway into [`create_router`]. Tests build
//! the same router over the in-memory stores.

pub mod auth;
pub mod codes;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod validation;
pub mod views;

pub use routes::create_router;
pub use state::AppState;
