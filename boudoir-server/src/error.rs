//! Errors of the server binary's commands.

use boudoir_lib::error::Error;
use boudoir_lib::error::StoreError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Marketplace(#[from] Error),

    #[error("Unknown role '{0}' (expected BUYER, SELLER, MODERATOR or ADMIN)")]
    UnknownRole(String),
}
