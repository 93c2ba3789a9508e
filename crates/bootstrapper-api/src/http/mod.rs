//! HTTP routes and handlers.

pub mod health;
pub mod repositories;
pub mod routes;
pub mod templates;
pub mod wizard;
