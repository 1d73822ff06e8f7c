//! Shared test fixtures.

pub(crate) mod context;
