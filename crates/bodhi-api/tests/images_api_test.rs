//! Image listings, category updates, and batch classification.

mod common;

use bodhi_db::{MemoryRowStore, StoreOp};
use common::{ids, seeded_store, spawn, spawn_with, Options, ADMIN_KEY};
use serde_json::json;

#[tokio::test]
async fn test_imgs_newest_first_with_default_limit() {
    let server = spawn(seeded_store()).await;
    let (status, body) = server.get("/imgs").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["images"], "id"), vec![4, 2, 3, 1]);
}

#[tokio::test]
async fn test_imgs_cursor_limit_and_category() {
    let server = spawn(seeded_store()).await;

    let (_, body) = server.get("/imgs?cursor=3").await;
    assert_eq!(ids(&body["images"], "id"), vec![2, 3, 1]);

    // zero and malformed cursors are ignored
    let (_, body) = server.get("/imgs?cursor=0").await;
    assert_eq!(body["images"].as_array().unwrap().len(), 4);
    let (_, body) = server.get("/imgs?cursor=abc").await;
    assert_eq!(body["images"].as_array().unwrap().len(), 4);

    let (_, body) = server.get("/imgs?limit=2").await;
    assert_eq!(ids(&body["images"], "id"), vec![4, 2]);

    let (_, body) = server.get("/imgs?category=art").await;
    assert_eq!(ids(&body["images"], "id"), vec![3, 1]);
}

#[tokio::test]
async fn test_imgs_backend_failure() {
    let server = spawn(seeded_store()).await;
    server.store.fail_on("bodhi_img_assets_k_v", StoreOp::Select);
    let (status, body) = server.get("/imgs").await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"error": "Failed to fetch images"}));
}

#[tokio::test]
async fn test_imgs_page_defaults() {
    let server = spawn(seeded_store()).await;
    let (status, body) = server.get("/imgs_page").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["images"], "id"), vec![4, 3, 2, 1]);
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["limit"], json!(10));

    let (_, body) = server.get("/imgs_page?page=0&limit=-1").await;
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["limit"], json!(10));

    let (_, body) = server.get("/imgs_page?page=x&limit=").await;
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["limit"], json!(10));
}

#[tokio::test]
async fn test_imgs_page_offsets() {
    let server = spawn(seeded_store()).await;

    let (_, body) = server.get("/imgs_page?page=1&limit=3").await;
    assert_eq!(ids(&body["images"], "id"), vec![4, 3, 2]);

    let (_, body) = server.get("/imgs_page?page=2&limit=3").await;
    assert_eq!(ids(&body["images"], "id"), vec![1]);
    assert_eq!(body["page"], json!(2));
    assert_eq!(body["limit"], json!(3));

    let (_, body) = server.get("/imgs_page?page=5&limit=3").await;
    assert_eq!(body["images"], json!([]));

    let (_, body) = server.get("/imgs_page?category=art").await;
    assert_eq!(ids(&body["images"], "id"), vec![3, 1]);
}

#[tokio::test]
async fn test_imgs_latest_id() {
    let server = spawn(seeded_store()).await;
    let (status, body) = server.get("/imgs_latest_id").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"latestId": 4}));

    let store = MemoryRowStore::new();
    store.seed("bodhi_img_assets_k_v", vec![]);
    let server = spawn(store).await;
    let (status, body) = server.get("/imgs_latest_id").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"latestId": null}));
}

#[tokio::test]
async fn test_set_img_wrong_key_makes_no_backend_call() {
    let server = spawn(seeded_store()).await;
    let before_rows = server.store.rows("bodhi_img_assets_k_v");
    let before_calls = server.store.call_count();

    for path in [
        "/set_img?asset_id=50&category=photo&admin_key=wrong",
        "/set_img?asset_id=50&category=photo",
        "/set_img",
    ] {
        let (status, body) = server.get(path).await;
        assert_eq!(status, 403, "{}", path);
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }

    assert_eq!(server.store.call_count(), before_calls);
    assert_eq!(server.store.rows("bodhi_img_assets_k_v"), before_rows);
}

#[tokio::test]
async fn test_set_img_refused_without_configured_key() {
    let server = spawn_with(
        seeded_store(),
        Options {
            admin_key: None,
            ..Options::default()
        },
    )
    .await;
    let before_calls = server.store.call_count();

    let (status, _) = server
        .get("/set_img?asset_id=50&category=photo&admin_key=")
        .await;
    assert_eq!(status, 403);
    let (status, _) = server
        .get("/set_img?asset_id=50&category=photo&admin_key=anything")
        .await;
    assert_eq!(status, 403);
    assert_eq!(server.store.call_count(), before_calls);
}

#[tokio::test]
async fn test_set_img_missing_params() {
    let server = spawn(seeded_store()).await;
    for query in ["category=photo", "asset_id=50", "asset_id=0&category=photo", "asset_id=x&category=photo"] {
        let (status, body) = server
            .get(&format!("/set_img?{}&admin_key={}", query, ADMIN_KEY))
            .await;
        assert_eq!(status, 400, "{}", query);
        assert_eq!(body, json!({"error": "Missing required parameters"}));
    }
}

#[tokio::test]
async fn test_set_img_updates_category() {
    let server = spawn(seeded_store()).await;
    let (status, body) = server
        .get(&format!(
            "/set_img?asset_id=50&category=photo&admin_key={}",
            ADMIN_KEY
        ))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], json!("Category updated successfully"));
    assert_eq!(body["data"][0]["category"], json!("photo"));

    let rows = server.store.rows("bodhi_img_assets_k_v");
    let updated: Vec<_> = rows.iter().filter(|r| r["category"] == json!("photo")).collect();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0]["id_on_chain"], json!(50));
}

#[tokio::test]
async fn test_batch_to_img_classifies_and_is_idempotent() {
    let server = spawn(seeded_store()).await;
    let (status, body) = server.get("/batch_to_img").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"result": "batch to img done"}));

    let kv = server.store.rows("bodhi_text_assets_k_v");
    let flag = |id: i64| {
        kv.iter()
            .find(|r| r["id"] == json!(id))
            .map(|r| r["if_to_img_assets"].clone())
            .unwrap()
    };
    assert_eq!(flag(10), json!(2));
    assert_eq!(flag(11), json!(1));
    assert_eq!(flag(12), json!(1));

    let images = server.store.rows("bodhi_img_assets_k_v");
    assert_eq!(images.len(), 5);
    let new_image = images.iter().find(|r| r["id_on_chain"] == json!(1)).unwrap();
    assert_eq!(new_image["link"], json!("https://arweave.net/abc"));
    assert_eq!(new_image["created_at"], json!("2024-05-01"));
    assert_eq!(new_image["metadata"], json!({"title": "g"}));

    // a second pass only reads
    let before = server.store.call_count();
    let (status, _) = server.get("/batch_to_img").await;
    assert_eq!(status, 200);
    assert_eq!(server.store.call_count(), before + 1);
    assert_eq!(server.store.rows("bodhi_img_assets_k_v").len(), 5);
}

#[tokio::test]
async fn test_batch_to_img_insert_failure_still_flags_row() {
    let server = spawn(seeded_store()).await;
    server.store.fail_on("bodhi_img_assets_k_v", StoreOp::Insert);

    let (status, body) = server.get("/batch_to_img").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"result": "batch to img done"}));

    let kv = server.store.rows("bodhi_text_assets_k_v");
    assert_eq!(kv[0]["if_to_img_assets"], json!(2));
    assert_eq!(kv[1]["if_to_img_assets"], json!(1));
    assert_eq!(server.store.rows("bodhi_img_assets_k_v").len(), 4);
}

#[tokio::test]
async fn test_batch_to_img_selection_failure() {
    let server = spawn(seeded_store()).await;
    server.store.fail_on("bodhi_text_assets_k_v", StoreOp::Select);
    let (status, body) = server.get("/batch_to_img").await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"error": "Failed to fetch text assets"}));
}
