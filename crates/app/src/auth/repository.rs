//! API token repository.
//!
//! The only place that knows the collection name and document field names.

use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    auth::{
        ApiToken, ApiTokenDocument, ApiTokenOrder, ApiTokenPatch, ApiTokenQuery, ApiTokenUuid,
        OwnerUuid, TokenLifetime, TokenStatus, ValueHash, format_timestamp,
    },
    store::{
        Context, Document, Filter, FindOptions, ID_FIELD, Sort, Store, StoreError, StoreResult,
    },
};

pub(crate) const API_TOKENS_COLLECTION: &str = "api_tokens";

const STATUS: &str = "status";
const DESCRIPTION: &str = "description";
const CREATED_AT: &str = "created_at";
const LAST_USED_AT: &str = "last_used_at";
const UPDATED_AT: &str = "updated_at";
const CREATED_BY_ID: &str = "created_by_id";
const CREATED_BY_NID: &str = "created_by_nid";
const TTL_EXPIRES_AT: &str = "ttl_expires_at";

/// Inputs for a new record. Identity, timestamps and status are filled in on create.
#[derive(Debug, Clone)]
pub(crate) struct NewApiTokenRecord {
    pub value_hash: ValueHash,
    pub description: String,
    pub owner_uuid: OwnerUuid,
    pub owner_nano_id: Option<String>,
    pub ttl_expires_at: Option<Timestamp>,
}

#[derive(Clone)]
pub(crate) struct ApiTokensRepository {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for ApiTokensRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokensRepository").finish_non_exhaustive()
    }
}

impl ApiTokensRepository {
    #[must_use]
    pub(crate) fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub(crate) async fn create(
        &self,
        ctx: &Context,
        record: NewApiTokenRecord,
        now: Timestamp,
    ) -> StoreResult<ApiToken> {
        let token = ApiToken {
            uuid: ApiTokenUuid::new(),
            value_hash: record.value_hash,
            status: TokenStatus::Active,
            description: record.description,
            created_at: now,
            updated_at: now,
            last_used_at: None,
            lifetime: record
                .ttl_expires_at
                .map_or(TokenLifetime::Permanent, TokenLifetime::Ephemeral),
            owner_uuid: record.owner_uuid,
            owner_nano_id: record.owner_nano_id,
        };

        self.store
            .insert_one(ctx, API_TOKENS_COLLECTION, to_document(&token)?)
            .await?;

        Ok(token)
    }

    /// Patch a record by id, stamping `updated_at`.
    pub(crate) async fn update(
        &self,
        ctx: &Context,
        uuid: ApiTokenUuid,
        patch: ApiTokenPatch,
        now: Timestamp,
    ) -> StoreResult<()> {
        let mut document = Document::new();

        document.insert(UPDATED_AT.to_owned(), format_timestamp(now).into());

        if let Some(status) = patch.status {
            document.insert(STATUS.to_owned(), status.as_str().into());
        }

        if let Some(last_used_at) = patch.last_used_at {
            document.insert(LAST_USED_AT.to_owned(), format_timestamp(last_used_at).into());
        }

        self.store
            .update_one(ctx, API_TOKENS_COLLECTION, &by_id(uuid), document)
            .await
    }

    pub(crate) async fn delete(&self, ctx: &Context, uuid: ApiTokenUuid) -> StoreResult<()> {
        self.store
            .delete_one(ctx, API_TOKENS_COLLECTION, &by_id(uuid))
            .await
    }

    /// Delete a record only if `owner` owns it.
    pub(crate) async fn delete_owned(
        &self,
        ctx: &Context,
        owner: OwnerUuid,
        uuid: ApiTokenUuid,
    ) -> StoreResult<()> {
        let filter = by_id(uuid).equals(CREATED_BY_ID, owner.to_string());

        self.store
            .delete_one(ctx, API_TOKENS_COLLECTION, &filter)
            .await
    }

    pub(crate) async fn delete_all_by_owner(
        &self,
        ctx: &Context,
        owner: OwnerUuid,
    ) -> StoreResult<u64> {
        let filter = Filter::new().equals(CREATED_BY_ID, owner.to_string());

        self.store
            .delete_many(ctx, API_TOKENS_COLLECTION, &filter)
            .await
    }

    /// Ephemeral records whose stored expiry sorts before `now`.
    ///
    /// The string comparison only narrows the candidates; callers still
    /// decide expiry from the parsed lifetime.
    pub(crate) async fn list_expiry_candidates(
        &self,
        ctx: &Context,
        now: Timestamp,
    ) -> StoreResult<Vec<ApiToken>> {
        let filter = Filter::new()
            .exists(TTL_EXPIRES_AT, true)
            .lt(TTL_EXPIRES_AT, format_timestamp(now));

        self.find(ctx, &filter, FindOptions::default()).await
    }

    pub(crate) async fn get_by_id(
        &self,
        ctx: &Context,
        uuid: ApiTokenUuid,
    ) -> StoreResult<ApiToken> {
        let document = self
            .store
            .find_one(ctx, API_TOKENS_COLLECTION, &by_id(uuid))
            .await?;

        from_document(document)
    }

    pub(crate) async fn count(&self, ctx: &Context, query: &ApiTokenQuery) -> StoreResult<u64> {
        self.store
            .count(ctx, API_TOKENS_COLLECTION, &query_filter(query))
            .await
    }

    /// One page of records in the query's order.
    pub(crate) async fn list(
        &self,
        ctx: &Context,
        query: &ApiTokenQuery,
    ) -> StoreResult<Vec<ApiToken>> {
        let options = FindOptions {
            sort: Some(order_sort(query.order)),
            limit: Some(query.pagination.per_page()),
            skip: query.pagination.skip(),
        };

        self.find(ctx, &query_filter(query), options).await
    }

    /// Every record presented under `nano_id`, most recently used first.
    pub(crate) async fn list_by_nano_id(
        &self,
        ctx: &Context,
        nano_id: &str,
    ) -> StoreResult<Vec<ApiToken>> {
        let options = FindOptions {
            sort: Some(Sort::descending(LAST_USED_AT)),
            ..FindOptions::default()
        };

        self.find(ctx, &Filter::new().equals(CREATED_BY_NID, nano_id), options)
            .await
    }

    async fn find(
        &self,
        ctx: &Context,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<ApiToken>> {
        let mut cursor = self
            .store
            .find(ctx, API_TOKENS_COLLECTION, filter, options)
            .await?;

        let mut documents: Vec<ApiTokenDocument> = Vec::with_capacity(cursor.remaining());
        cursor.drain_into(&mut documents)?;

        documents.into_iter().map(ApiToken::try_from).collect()
    }
}

fn by_id(uuid: ApiTokenUuid) -> Filter {
    Filter::new().equals(ID_FIELD, uuid.to_string())
}

fn query_filter(query: &ApiTokenQuery) -> Filter {
    let mut filter = Filter::new();

    if let Some(owner) = query.owner_uuid {
        filter = filter.equals(CREATED_BY_ID, owner.to_string());
    }

    if let Some(nano_id) = &query.owner_nano_id {
        filter = filter.equals(CREATED_BY_NID, nano_id.clone());
    }

    if let Some(description) = query.description.as_deref().filter(|value| !value.is_empty()) {
        filter = filter.contains(DESCRIPTION, description);
    }

    if let Some(status) = query.status.as_deref().filter(|value| !value.is_empty()) {
        filter = filter.contains(STATUS, status);
    }

    if query.only_ephemeral {
        filter = filter.exists(TTL_EXPIRES_AT, true);
    }

    if query.only_permanent {
        filter = filter.exists(TTL_EXPIRES_AT, false);
    }

    if let Some(from) = query.created_from {
        filter = filter.gte(CREATED_AT, format_timestamp(from));
    }

    if let Some(to) = query.created_to {
        filter = filter.lt(CREATED_AT, format_timestamp(to));
    }

    filter
}

const fn order_sort(order: ApiTokenOrder) -> Sort {
    match order {
        ApiTokenOrder::CreatedAtAsc => Sort::ascending(CREATED_AT),
        ApiTokenOrder::CreatedAtDesc => Sort::descending(CREATED_AT),
        ApiTokenOrder::LastUsedAtAsc => Sort::ascending(LAST_USED_AT),
        ApiTokenOrder::LastUsedAtDesc => Sort::descending(LAST_USED_AT),
        ApiTokenOrder::UpdatedAtAsc => Sort::ascending(UPDATED_AT),
        ApiTokenOrder::UpdatedAtDesc => Sort::descending(UPDATED_AT),
    }
}

fn to_document(token: &ApiToken) -> StoreResult<Document> {
    match serde_json::to_value(ApiTokenDocument::from(token))? {
        serde_json::Value::Object(document) => Ok(document),
        _ => Err(StoreError::Decode(
            "api token did not serialise to an object".to_owned(),
        )),
    }
}

fn from_document(document: Document) -> StoreResult<ApiToken> {
    let document: ApiTokenDocument = serde_json::from_value(serde_json::Value::Object(document))?;

    ApiToken::try_from(document)
}
