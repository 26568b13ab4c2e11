//! Shared harness: serves the real router over the in-memory store on an
//! ephemeral port, with a stubbed share balance.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bodhi_api::{build_router, AllowedOrigins, AppState};
use bodhi_chain::{Address, BalanceReader, ChainGate, U256};
use bodhi_db::MemoryRowStore;
use serde_json::{json, Value};

pub const ADMIN_KEY: &str = "test-admin-key";

pub struct FixedBalance(pub U256);

#[async_trait]
impl BalanceReader for FixedBalance {
    async fn balance_of(&self, _owner: &Address, _id: U256) -> bodhi_core::Result<U256> {
        Ok(self.0)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryRowStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }
}

pub struct Options {
    pub admin_key: Option<&'static str>,
    pub balance: U256,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            admin_key: Some(ADMIN_KEY),
            balance: U256::zero(),
        }
    }
}

pub async fn spawn(store: MemoryRowStore) -> TestServer {
    spawn_with(store, Options::default()).await
}

pub async fn spawn_with(store: MemoryRowStore, options: Options) -> TestServer {
    let store = Arc::new(store);
    let state = AppState::new(
        store.clone(),
        ChainGate::bodhi(Arc::new(FixedBalance(options.balance))),
        options.admin_key.map(str::to_string),
    );
    let router = build_router(state, &AllowedOrigins::Any);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        store,
        client: reqwest::Client::new(),
    }
}

/// A store seeded with every Bodhi table.
pub fn seeded_store() -> MemoryRowStore {
    let store = MemoryRowStore::new();
    store.seed(
        "bodhi_spaces",
        vec![
            json!({"id": 1, "contract_addr": "0xspace1", "name": "Readers"}),
            json!({"id": 2, "contract_addr": "0xspace2", "name": null}),
            json!({"id": 3, "contract_addr": "0xspace3", "name": "Writers"}),
        ],
    );
    store.seed(
        "bodhi_collections",
        vec![json!({"id": 1, "name": "Featured", "assets": [1, 2]})],
    );
    store.seed(
        "bodhi_constants",
        vec![
            json!({"id": 1, "key": "fee", "value": "0.05"}),
            json!({"id": 2, "key": "dup", "value": "a"}),
            json!({"id": 3, "key": "dup", "value": "b"}),
        ],
    );
    store.seed(
        "bodhi_text_assets",
        vec![
            json!({"id": 1, "id_on_chain": 1, "creator": "0xspace1",
                   "content": "Genesis post\nbody of genesis", "embedding": [0.1, 0.2]}),
            json!({"id": 2, "id_on_chain": 2, "creator": "0xspace1",
                   "content": "Second thoughts on bodhi", "embedding": [0.3]}),
            json!({"id": 3, "id_on_chain": 3, "creator": "0xother",
                   "content": "Bodhi spaces explained\nlong form", "embedding": [0.4]}),
            json!({"id": 4, "id_on_chain": 4, "creator": "0xother", "embedding": [0.5]}),
        ],
    );
    store.seed(
        "bodhi_text_assets_k_v",
        vec![
            json!({"id": 10, "id_on_chain": 1, "creator": "0xspace1", "created_at": "2024-05-01",
                   "metadata": {"title": "g"}, "data": "![cover](https://arweave.net/abc)",
                   "if_to_img_assets": 0}),
            json!({"id": 11, "id_on_chain": 2, "creator": "0xspace1", "data": "plain text",
                   "if_to_img_assets": 0}),
            json!({"id": 12, "id_on_chain": 3, "data": "bodhi notes", "if_to_img_assets": 1}),
        ],
    );
    store.seed(
        "bodhi_img_assets_k_v",
        vec![
            json!({"id": 1, "id_on_chain": 50, "created_at": "2024-01-01", "category": "art",
                   "link": "https://img/1"}),
            json!({"id": 2, "id_on_chain": 51, "created_at": "2024-01-03", "category": "meme",
                   "link": "https://img/2"}),
            json!({"id": 3, "id_on_chain": 52, "created_at": "2024-01-02", "category": "art",
                   "link": "https://img/3"}),
            json!({"id": 4, "id_on_chain": 53, "created_at": "2024-01-04", "category": null,
                   "link": "https://img/4"}),
        ],
    );
    store.seed(
        "bodhi_indexer",
        vec![
            json!({"id": 1, "name": "bodhi", "index": 14500}),
            json!({"id": 2, "name": "other", "index": 3}),
        ],
    );
    store.seed(
        "0xspace1_indexer",
        vec![
            json!({"id": 1, "id_on_chain": 1, "category": "essay", "type": "post"}),
            json!({"id": 2, "id_on_chain": 2, "category": "note", "type": "reply"}),
            json!({"id": 3, "id_on_chain": 999, "category": "ghost", "type": "post"}),
        ],
    );
    store
}

pub fn ids(rows: &Value, column: &str) -> Vec<i64> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|r| r[column].as_i64().unwrap())
        .collect()
}
