//! # Bootstrapper API
//!
//! HTTP surface over the bootstrap package wizard, the template catalog and
//! the template repositories.
//!
//! Every handler shares one [`AppState`]. Errors are returned as
//! `{"error": "..."}` with a status derived from the failing component; a
//! finished wizard hands the generated package back as an attachment.

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::{ApiConfig, ApiServer};
pub use state::AppState;
