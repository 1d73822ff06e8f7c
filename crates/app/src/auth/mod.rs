//! API tokens
//!
//! Issuance, validation, status transitions and lazy expiry of opaque bearer
//! credentials. The service composes the codec and the repository; the
//! repository is the only layer that talks to the store.

mod authenticator;
mod codename;
mod errors;
mod models;
mod query;
mod reaper;
mod repository;
mod service;
mod token;

pub use authenticator::*;
pub use codename::*;
pub use errors::*;
pub use models::*;
pub use query::*;
pub use service::*;
pub use token::*;
