//! Error types

mod client;
mod draft;
mod marketplace;
mod store;
mod validation;

pub use client::*;
pub use draft::*;
pub use marketplace::*;
pub use store::*;
pub use validation::*;
