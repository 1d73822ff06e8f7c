//! Document store
//!
//! The narrow set of operations the token repository needs from a document
//! database. Filters and sorts are abstract shapes ([`Filter`], [`Sort`]); only
//! the repository names fields. Every call takes a [`Context`] and honours its
//! cancellation and deadline. Writes are never retried.

mod context;
mod errors;
pub mod memory;
pub mod postgres;
mod query;

#[cfg(test)]
pub(crate) mod conformance;

use async_trait::async_trait;

pub use context::Context;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::*;

#[async_trait]
pub trait Store: Send + Sync {
    /// Count documents matching `filter`.
    async fn count(&self, ctx: &Context, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Insert a document. It must carry a string `_id`.
    async fn insert_one(&self, ctx: &Context, collection: &str, document: Document)
    -> StoreResult<()>;

    /// Merge `patch` into the first document matching `filter`. No match is not an error.
    async fn update_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> StoreResult<()>;

    /// Remove the first document matching `filter`. No match is not an error.
    async fn delete_one(&self, ctx: &Context, collection: &str, filter: &Filter)
    -> StoreResult<()>;

    /// Remove every document matching `filter`, returning how many went.
    async fn delete_many(&self, ctx: &Context, collection: &str, filter: &Filter)
    -> StoreResult<u64>;

    /// Fetch the first document matching `filter`.
    ///
    /// Fails with [`StoreError::NotFound`] when nothing matches.
    async fn find_one(&self, ctx: &Context, collection: &str, filter: &Filter)
    -> StoreResult<Document>;

    /// Fetch matching documents with sort, skip and limit applied.
    async fn find(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Cursor>;
}
