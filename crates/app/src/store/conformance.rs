//! Behaviour every [`Store`] backend must share.
//!
//! Each backend's test module calls [`run_all`] against a fresh, empty store.

use serde_json::{Value, json};
use testresult::TestResult;

use crate::store::{
    Context, Document, Filter, FindOptions, ID_FIELD, Sort, Store, StoreError, string_field,
};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

async fn seed(store: &impl Store, collection: &str, documents: Vec<Value>) -> TestResult {
    let ctx = Context::background();

    for document in documents {
        store.insert_one(&ctx, collection, doc(document)).await?;
    }

    Ok(())
}

async fn ids(
    store: &impl Store,
    collection: &str,
    filter: &Filter,
    options: FindOptions,
) -> TestResult<Vec<String>> {
    let mut cursor = store
        .find(&Context::background(), collection, filter, options)
        .await?;

    let mut documents: Vec<Document> = Vec::new();
    cursor.drain_into(&mut documents)?;

    Ok(documents
        .iter()
        .filter_map(|document| string_field(document, ID_FIELD).map(str::to_owned))
        .collect())
}

pub(crate) async fn run_all(store: &impl Store) -> TestResult {
    insert_and_find_one(store).await?;
    rejects_duplicate_and_missing_ids(store).await?;
    update_merges_into_first_match(store).await?;
    deletes_remove_matches(store).await?;
    filters_compose(store).await?;
    sorting_places_missing_fields(store).await?;
    skip_and_limit_page_results(store).await?;
    cancelled_context_is_refused(store).await?;

    Ok(())
}

async fn insert_and_find_one(store: &impl Store) -> TestResult {
    let ctx = Context::background();
    seed(store, "c_find", vec![json!({ "_id": "a", "owner": "o1" })]).await?;

    let found = store
        .find_one(&ctx, "c_find", &Filter::new().equals("owner", "o1"))
        .await?;

    assert_eq!(string_field(&found, ID_FIELD), Some("a"), "found wrong document");

    let missing = store
        .find_one(&ctx, "c_find", &Filter::new().equals("owner", "o2"))
        .await;

    assert!(
        matches!(missing, Err(StoreError::NotFound)),
        "expected NotFound, got {missing:?}"
    );

    Ok(())
}

async fn rejects_duplicate_and_missing_ids(store: &impl Store) -> TestResult {
    let ctx = Context::background();
    seed(store, "c_ids", vec![json!({ "_id": "a" })]).await?;

    let duplicate = store
        .insert_one(&ctx, "c_ids", doc(json!({ "_id": "a" })))
        .await;

    assert!(
        matches!(duplicate, Err(StoreError::AlreadyExists)),
        "expected AlreadyExists, got {duplicate:?}"
    );

    let missing = store
        .insert_one(&ctx, "c_ids", doc(json!({ "name": "no id" })))
        .await;

    assert!(
        matches!(missing, Err(StoreError::MissingId)),
        "expected MissingId, got {missing:?}"
    );

    // Same id in another collection is fine.
    store
        .insert_one(&ctx, "c_ids_other", doc(json!({ "_id": "a" })))
        .await?;

    Ok(())
}

async fn update_merges_into_first_match(store: &impl Store) -> TestResult {
    let ctx = Context::background();
    seed(
        store,
        "c_update",
        vec![
            json!({ "_id": "a", "group": "g", "status": "ACTIVE", "note": "keep" }),
            json!({ "_id": "b", "group": "g", "status": "ACTIVE" }),
        ],
    )
    .await?;

    store
        .update_one(
            &ctx,
            "c_update",
            &Filter::new().equals("group", "g"),
            doc(json!({ "status": "REVOKED" })),
        )
        .await?;

    let first = store
        .find_one(&ctx, "c_update", &Filter::new().equals(ID_FIELD, "a"))
        .await?;
    let second = store
        .find_one(&ctx, "c_update", &Filter::new().equals(ID_FIELD, "b"))
        .await?;

    assert_eq!(string_field(&first, "status"), Some("REVOKED"), "first match not patched");
    assert_eq!(string_field(&first, "note"), Some("keep"), "patch must merge, not replace");
    assert_eq!(string_field(&second, "status"), Some("ACTIVE"), "only one document may change");

    store
        .update_one(
            &ctx,
            "c_update",
            &Filter::new().equals(ID_FIELD, "nope"),
            doc(json!({ "status": "REVOKED" })),
        )
        .await?;

    Ok(())
}

async fn deletes_remove_matches(store: &impl Store) -> TestResult {
    let ctx = Context::background();
    seed(
        store,
        "c_delete",
        vec![
            json!({ "_id": "a", "owner": "o1" }),
            json!({ "_id": "b", "owner": "o1" }),
            json!({ "_id": "c", "owner": "o1" }),
            json!({ "_id": "d", "owner": "o2" }),
        ],
    )
    .await?;

    let owner = Filter::new().equals("owner", "o1");

    store.delete_one(&ctx, "c_delete", &owner).await?;
    assert_eq!(store.count(&ctx, "c_delete", &owner).await?, 2, "delete_one removes one");

    store
        .delete_one(&ctx, "c_delete", &Filter::new().equals("owner", "nobody"))
        .await?;

    let removed = store.delete_many(&ctx, "c_delete", &owner).await?;

    assert_eq!(removed, 2, "delete_many reports removed count");
    assert_eq!(
        store.count(&ctx, "c_delete", &Filter::new()).await?,
        1,
        "other owner untouched"
    );

    Ok(())
}

async fn filters_compose(store: &impl Store) -> TestResult {
    let ctx = Context::background();
    seed(
        store,
        "c_filter",
        vec![
            json!({
                "_id": "a",
                "description": "Brave-Otter",
                "created_at": "2026-01-01T00:00:00Z"
            }),
            json!({
                "_id": "b",
                "description": "calm-otter",
                "created_at": "2026-01-02T00:00:00Z",
                "ttl": "2026-02-01T00:00:00Z"
            }),
            json!({
                "_id": "c",
                "description": "shy-badger",
                "created_at": "2026-01-03T00:00:00Z",
                "ttl": null
            }),
            json!({
                "_id": "d",
                "description": "quiet-moth",
                "created_at": "2026-01-04T00:00:00Z",
                "ttl": ""
            }),
        ],
    )
    .await?;

    let otters = Filter::new().contains("description", "OTTER");
    assert_eq!(store.count(&ctx, "c_filter", &otters).await?, 2, "contains ignores case");

    let permanent = Filter::new().exists("ttl", false);
    assert_eq!(
        ids(store, "c_filter", &permanent, FindOptions::default()).await?,
        vec!["a", "c", "d"],
        "null and empty count as absent"
    );

    let ephemeral = Filter::new().exists("ttl", true);
    assert_eq!(
        ids(store, "c_filter", &ephemeral, FindOptions::default()).await?,
        vec!["b"],
        "only non-empty strings count as present"
    );

    let window = Filter::new()
        .gte("created_at", "2026-01-02T00:00:00Z")
        .lt("created_at", "2026-01-03T00:00:00Z");
    assert_eq!(
        ids(store, "c_filter", &window, FindOptions::default()).await?,
        vec!["b"],
        "range is half-open"
    );

    Ok(())
}

async fn sorting_places_missing_fields(store: &impl Store) -> TestResult {
    seed(
        store,
        "c_sort",
        vec![
            json!({ "_id": "a", "used": "2026-01-02" }),
            json!({ "_id": "b" }),
            json!({ "_id": "c", "used": "2026-01-01" }),
            json!({ "_id": "d", "used": "2026-01-02" }),
        ],
    )
    .await?;

    let ascending = FindOptions {
        sort: Some(Sort::ascending("used")),
        ..FindOptions::default()
    };
    assert_eq!(
        ids(store, "c_sort", &Filter::new(), ascending).await?,
        vec!["b", "c", "a", "d"],
        "ascending puts missing first and keeps ties stable"
    );

    let descending = FindOptions {
        sort: Some(Sort::descending("used")),
        ..FindOptions::default()
    };
    assert_eq!(
        ids(store, "c_sort", &Filter::new(), descending).await?,
        vec!["a", "d", "c", "b"],
        "descending puts missing last and keeps ties stable"
    );

    Ok(())
}

async fn skip_and_limit_page_results(store: &impl Store) -> TestResult {
    seed(
        store,
        "c_page",
        (1..=5)
            .map(|n| json!({ "_id": format!("t{n}"), "n": format!("{n}") }))
            .collect(),
    )
    .await?;

    let page = FindOptions {
        sort: Some(Sort::ascending("n")),
        limit: Some(2),
        skip: 2,
    };
    assert_eq!(
        ids(store, "c_page", &Filter::new(), page).await?,
        vec!["t3", "t4"],
        "skip then limit"
    );

    let past_end = FindOptions {
        sort: Some(Sort::ascending("n")),
        limit: Some(2),
        skip: 10,
    };
    assert!(
        ids(store, "c_page", &Filter::new(), past_end).await?.is_empty(),
        "skipping past the end yields nothing"
    );

    Ok(())
}

async fn cancelled_context_is_refused(store: &impl Store) -> TestResult {
    let ctx = Context::background();
    ctx.cancel();

    let result = store
        .insert_one(&ctx, "c_cancel", doc(json!({ "_id": "a" })))
        .await;

    assert!(
        matches!(result, Err(StoreError::Cancelled)),
        "expected Cancelled, got {result:?}"
    );
    assert_eq!(
        store
            .count(&Context::background(), "c_cancel", &Filter::new())
            .await?,
        0,
        "cancelled insert must not write"
    );

    Ok(())
}
