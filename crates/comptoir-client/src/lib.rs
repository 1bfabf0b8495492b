//! Asynchronous client for the Comptoir store management API.
//!
//! The backend is a conventional REST service (paginated collections,
//! cookie-based JWT sessions). This crate owns the two pieces of behavior
//! every caller shares: transparent session refresh on expiry, and the
//! optimistic cache protocol used by create/delete mutations so listings
//! reflect changes before the server confirms them.

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod invoices;
pub mod ledger;
pub mod model;
pub mod reports;
pub mod resource;

pub use client::ComptoirClient;
pub use config::ApiConfig;
pub use error::{ApiError, ValidationErrors};
