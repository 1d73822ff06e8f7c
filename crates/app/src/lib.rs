//! API token lifecycle: issuance, validation, expiry and the document store
//! behind them.

pub mod auth;
pub mod clock;
pub mod context;
pub mod database;
pub mod store;
pub mod uuids;

#[cfg(test)]
mod test;
