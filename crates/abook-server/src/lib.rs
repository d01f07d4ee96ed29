//! HTTP server for the addressbook registry.
//!
//! Exposes addressbooks, contacts, orgs, and their addresses as a JSON REST
//! API under `/api`. The caller identity is read from a configurable
//! request header and stamped into audit metadata; there is no
//! authentication.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use router::build_router;
pub use server::AbookServer;
