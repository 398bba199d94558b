//! Le Boudoir du Boubou marketplace library
//!
//! Data-table state (filters, pagination, sorting, selection), the SQLite
//! store and marketplace services behind the HTTP API, plus the client-side
//! pieces the dashboards use: a typed API client, a TTL cache, article
//! drafts and the last-request-wins fetch state machine.

pub mod cache;
pub mod client;
pub mod drafts;
pub mod error;
pub mod fetch;
pub mod images;
pub mod model;
pub mod retry;
pub mod service;
pub mod store;
pub mod table;

pub use client::BoudoirClient;
pub use service::Marketplace;
pub use service::MarketplaceConfig;
pub use store::Database;
