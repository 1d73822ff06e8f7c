//! In-memory document store.
//!
//! Backs tests and the server's `--store memory` mode. Documents live in
//! insertion order per collection, so sorting is stable and ties fall back to
//! the order documents were written. Nothing is persisted.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::store::{
    Context, Cursor, Document, Filter, FindOptions, ID_FIELD, Store, StoreError, StoreResult,
    string_field,
};

/// Thread-safe in-memory [`Store`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<FxHashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`, ignoring filters.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Snapshot of every document in `collection`, in insertion order.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn count(&self, ctx: &Context, collection: &str, filter: &Filter) -> StoreResult<u64> {
        ctx.guard(async {
            let collections = self.collections.read();

            let count = collections
                .get(collection)
                .map_or(0, |documents| {
                    documents.iter().filter(|doc| filter.matches(doc)).count()
                });

            Ok(u64::try_from(count).unwrap_or(u64::MAX))
        })
        .await
    }

    async fn insert_one(
        &self,
        ctx: &Context,
        collection: &str,
        document: Document,
    ) -> StoreResult<()> {
        ctx.guard(async {
            let id = string_field(&document, ID_FIELD).ok_or(StoreError::MissingId)?;

            let mut collections = self.collections.write();
            let documents = collections.entry(collection.to_owned()).or_default();

            if documents
                .iter()
                .any(|existing| string_field(existing, ID_FIELD) == Some(id))
            {
                return Err(StoreError::AlreadyExists);
            }

            documents.push(document);

            Ok(())
        })
        .await
    }

    async fn update_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> StoreResult<()> {
        ctx.guard(async {
            let mut collections = self.collections.write();

            let target = collections
                .get_mut(collection)
                .and_then(|documents| documents.iter_mut().find(|doc| filter.matches(doc)));

            if let Some(document) = target {
                for (field, value) in patch {
                    if field != ID_FIELD {
                        document.insert(field, value);
                    }
                }
            }

            Ok(())
        })
        .await
    }

    async fn delete_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<()> {
        ctx.guard(async {
            let mut collections = self.collections.write();

            if let Some(documents) = collections.get_mut(collection)
                && let Some(position) = documents.iter().position(|doc| filter.matches(doc))
            {
                documents.remove(position);
            }

            Ok(())
        })
        .await
    }

    async fn delete_many(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<u64> {
        ctx.guard(async {
            let mut collections = self.collections.write();

            let Some(documents) = collections.get_mut(collection) else {
                return Ok(0);
            };

            let before = documents.len();

            documents.retain(|doc| !filter.matches(doc));

            Ok(u64::try_from(before - documents.len()).unwrap_or(u64::MAX))
        })
        .await
    }

    async fn find_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Document> {
        ctx.guard(async {
            self.collections
                .read()
                .get(collection)
                .and_then(|documents| documents.iter().find(|doc| filter.matches(doc)))
                .cloned()
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn find(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Cursor> {
        ctx.guard(async {
            let mut matched: Vec<Document> = self
                .collections
                .read()
                .get(collection)
                .map(|documents| {
                    documents
                        .iter()
                        .filter(|doc| filter.matches(doc))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            if let Some(sort) = options.sort {
                matched.sort_by(|left, right| sort.compare(left, right));
            }

            let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
            let limit = options
                .limit
                .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

            Ok(Cursor::new(matched.into_iter().skip(skip).take(limit)))
        })
        .await
    }
}
