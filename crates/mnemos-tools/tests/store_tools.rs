// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The store tool surface, exercised through the registry dispatcher.

use std::sync::Arc;

use mnemos_memory::{HashEmbedder, StoreFactory, StoreSettings};
use mnemos_tools::{ToolRegistry, store_registry};
use serde_json::json;

fn setup() -> (tempfile::TempDir, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(StoreFactory::new(
        dir.path(),
        StoreSettings::default(),
        Arc::new(HashEmbedder::new(384).unwrap()),
    ));
    (dir, store_registry(factory))
}

async fn call(registry: &ToolRegistry, name: &str, args: serde_json::Value) -> serde_json::Value {
    let envelope = registry.dispatch(name, &args.to_string()).await;
    assert!(envelope.success, "{name} failed: {:?}", envelope.error);
    envelope.data.unwrap()
}

#[tokio::test]
async fn publishes_the_full_surface() {
    let (_dir, registry) = setup();
    let names: Vec<&str> = registry.list().into_iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        vec![
            "add_document",
            "delete_document",
            "get_database_stats",
            "get_user_directory_info",
            "list_users",
            "load_database",
            "load_documents_only",
            "save_database",
            "save_documents_only",
            "search_documents",
            "update_document",
        ]
    );
}

#[tokio::test]
async fn crud_round_trip() {
    let (_dir, registry) = setup();

    let added = call(
        &registry,
        "add_document",
        json!({ "user_id": "alice", "document": "hello world", "metadata": { "source": "chat" } }),
    )
    .await;
    assert_eq!(added["doc_id"], "doc_0");
    call(&registry, "add_document", json!({ "user_id": "alice", "document": "goodbye" })).await;

    let found = call(
        &registry,
        "search_documents",
        json!({ "user_id": "alice", "query": "hello", "top_k": 1 }),
    )
    .await;
    assert_eq!(found["num_results"], 1);
    assert_eq!(found["results"][0]["doc_id"], "doc_0");
    assert_eq!(found["results"][0]["metadata"]["source"], "chat");

    let updated = call(
        &registry,
        "update_document",
        json!({ "user_id": "alice", "doc_id": "doc_0", "new_document": "hello there" }),
    )
    .await;
    assert_eq!(updated["updated"], true);

    let missing = call(
        &registry,
        "delete_document",
        json!({ "user_id": "alice", "doc_id": "doc_9" }),
    )
    .await;
    assert_eq!(missing["deleted"], false);

    call(&registry, "delete_document", json!({ "user_id": "alice", "doc_id": "doc_1" })).await;
    let stats = call(&registry, "get_database_stats", json!({ "user_id": "alice" })).await;
    assert_eq!(stats["stats"]["document_count"], 1);
    assert_eq!(stats["stats"]["variant"], "exact");
}

#[tokio::test]
async fn search_defaults_and_bounds_top_k() {
    let (_dir, registry) = setup();
    for i in 0..8 {
        call(
            &registry,
            "add_document",
            json!({ "user_id": "bob", "document": format!("note number {i}") }),
        )
        .await;
    }

    let default_k = call(&registry, "search_documents", json!({ "user_id": "bob", "query": "note" })).await;
    assert_eq!(default_k["num_results"], 5);

    for bad in [0, 51] {
        let envelope = registry
            .dispatch(
                "search_documents",
                &json!({ "user_id": "bob", "query": "note", "top_k": bad }).to_string(),
            )
            .await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("top_k"));
    }
}

#[tokio::test]
async fn bad_arguments_become_failure_envelopes() {
    let (_dir, registry) = setup();

    let cases = [
        ("add_document", json!({ "user_id": "carol" })),
        ("add_document", json!({ "user_id": "carol", "document": "x", "tags": [] })),
        ("add_document", json!({ "user_id": "../escape", "document": "x" })),
        ("list_users", json!({ "user_id": "carol" })),
        ("search_documents", json!({ "user_id": "carol", "query": "x", "top_k": -1 })),
    ];
    for (name, args) in cases {
        let envelope = registry.dispatch(name, &args.to_string()).await;
        assert!(!envelope.success, "{name} {args}");
        assert!(envelope.data.is_none());
        assert!(envelope.error.unwrap().starts_with("validation error"));
    }
}

#[tokio::test]
async fn admin_tools() {
    let (dir, registry) = setup();

    let none = call(&registry, "list_users", json!({})).await;
    assert_eq!(none["num_users"], 0);

    let info = call(&registry, "get_user_directory_info", json!({ "user_id": "dave" })).await;
    assert_eq!(info["found"], false);

    call(&registry, "add_document", json!({ "user_id": "dave", "document": "first" })).await;
    call(&registry, "add_document", json!({ "user_id": "erin", "document": "second" })).await;

    let users = call(&registry, "list_users", json!({})).await;
    assert_eq!(users["users"], json!(["dave", "erin"]));

    let saved = call(&registry, "save_documents_only", json!({ "user_id": "dave" })).await;
    let path = saved["file_path"].as_str().unwrap().to_string();
    assert!(path.ends_with("documents_only_dave.json"));

    let loaded = call(&registry, "load_documents_only", json!({ "file_path": path })).await;
    assert_eq!(loaded["loaded"], true);
    assert_eq!(loaded["document_ids"], json!(["doc_0"]));
    assert_eq!(loaded["documents"]["doc_0"], "first");

    let absent = dir.path().join("nothing.json");
    let loaded = call(
        &registry,
        "load_documents_only",
        json!({ "file_path": absent.display().to_string() }),
    )
    .await;
    assert_eq!(loaded["loaded"], false);

    let info = call(&registry, "get_user_directory_info", json!({ "user_id": "dave" })).await;
    assert_eq!(info["found"], true);
    assert_eq!(info["info"]["files"].as_array().unwrap().len(), 2);

    let saved = call(&registry, "save_database", json!({ "user_id": "dave" })).await;
    assert!(saved["file_path"].as_str().unwrap().ends_with("store_dave.json"));

    let reloaded = call(&registry, "load_database", json!({ "user_id": "dave" })).await;
    assert_eq!(reloaded["loaded"], true);
    assert_eq!(reloaded["stats"]["document_count"], 1);

    let never = call(&registry, "load_database", json!({ "user_id": "frank" })).await;
    assert_eq!(never["loaded"], false);
}

#[tokio::test]
async fn malformed_export_is_a_storage_failure() {
    let (dir, registry) = setup();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"[1, 2").unwrap();

    let envelope = registry
        .dispatch(
            "load_documents_only",
            &json!({ "file_path": path.display().to_string() }).to_string(),
        )
        .await;
    assert!(!envelope.success);
    assert!(envelope.error.unwrap().starts_with("storage error"));
}
