//! HTTP server for the Le Boudoir du Boubou marketplace
//!
//! Exposes [`boudoir_lib::Marketplace`] as the JSON API under `/api`.

pub mod config;
pub mod error;
pub mod http;
pub mod paths;
pub mod routes;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::Server;
pub use server::open_marketplace;
