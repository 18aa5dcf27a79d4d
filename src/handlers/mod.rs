//! # HTTP Request Handlers
//!
//! Routes of the demo server. The interesting part is which gate sits in
//! front of each of them, see [`crate::app::build_router`].
//!
//! ## Submodules
//! - `health`: Health check endpoint (for monitoring)
//! - `auth`: Sign-in, sign-out and session status
//! - `pages`: Public landing page and the protected dashboard

pub mod auth;
pub mod health;
pub mod pages;
