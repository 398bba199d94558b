//! Data model
//!
//! Dynamic rows ([`Value`], [`Record`]) for the table engine and the typed
//! marketplace entities persisted by [`crate::store`].

mod analytics;
mod article;
mod category;
mod order;
mod paged;
mod record;
mod social;
mod user;
mod value;

pub use analytics::*;
pub use article::*;
pub use category::*;
pub use order::*;
pub use paged::*;
pub use record::*;
pub use social::*;
pub use user::*;
pub use value::*;
