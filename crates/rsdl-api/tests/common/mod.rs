//! Shared test utilities for loader API tests.
//!
//! Provides an in-memory account store that records every batch query, an
//! account loader backed by it, and router builders.

// Each test file uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceExt;

use rsdl_api::{ApiError, Loader, LoaderLayer, RequestLoaders};
use rsdl_domain::{Identified, LoadError, LoadResult, QueryLoader};
use rsdl_server::{NamedLoader, ProviderRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub name: String,
}

impl Identified for Account {
    type Id = String;

    fn identity(&self) -> &String {
        &self.id
    }
}

/// In-memory account table. Returns rows in storage order and skips
/// unknown ids, like a real `WHERE id IN (...)` query.
#[derive(Default)]
pub struct AccountStore {
    rows: HashMap<String, Account>,
    queries: Mutex<Vec<Vec<String>>>,
    offline: AtomicBool,
}

impl AccountStore {
    pub fn with_accounts(ids: &[&str]) -> Arc<Self> {
        let rows = ids
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    Account {
                        id: id.to_string(),
                        name: format!("Account {id}"),
                    },
                )
            })
            .collect();
        Arc::new(Self {
            rows,
            ..Default::default()
        })
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Account>> {
        // Keys reach a batch in no fixed order; record them sorted.
        let mut batch = ids.to_vec();
        batch.sort();
        self.queries.lock().unwrap().push(batch);
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("account database is offline");
        }
        tokio::task::yield_now().await;
        let mut found: Vec<Account> = ids.iter().filter_map(|id| self.rows.get(id).cloned()).collect();
        found.reverse();
        Ok(found)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every batch query issued so far, in order.
    pub fn queries(&self) -> Vec<Vec<String>> {
        self.queries.lock().unwrap().clone()
    }
}

pub struct AccountLoader {
    store: Arc<AccountStore>,
}

#[async_trait]
impl QueryLoader for AccountLoader {
    type Key = String;
    type Value = Account;

    async fn query(&self, keys: &[String]) -> LoadResult<Vec<Account>> {
        let accounts = self
            .store
            .find_by_ids(keys)
            .await
            .map_err(LoadError::fetch)?;
        self.check_and_order(keys, accounts)
    }
}

impl NamedLoader for AccountLoader {
    const TYPE_ID: &'static str = "AccountLoader";
    type Key = String;
    type Value = Account;
}

pub fn account_registry(store: Arc<AccountStore>) -> ProviderRegistry {
    ProviderRegistry::new().register_query(AccountLoader::TYPE_ID, move |_scope| AccountLoader {
        store: Arc::clone(&store),
    })
}

async fn get_account(
    Path(id): Path<String>,
    accounts: Loader<AccountLoader>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(accounts.load(id).await?))
}

/// Two independent resolution steps of one request, each asking the
/// registry for the account loader on its own.
async fn get_pair(
    Path((first, second)): Path<(String, String)>,
    RequestLoaders(loaders): RequestLoaders,
) -> Result<Json<Vec<Account>>, ApiError> {
    let step_one = async {
        let accounts = loaders.loader::<AccountLoader>().await?;
        Ok::<_, ApiError>(accounts.load(first).await?)
    };
    let step_two = async {
        let accounts = loaders.loader::<AccountLoader>().await?;
        Ok::<_, ApiError>(accounts.load(second).await?)
    };
    let (one, two) = tokio::join!(step_one, step_two);
    Ok(Json(vec![one?, two?]))
}

fn routes() -> Router {
    Router::new()
        .route("/accounts/:id", get(get_account))
        .route("/pairs/:first/:second", get(get_pair))
}

/// Router with the loader install hook applied globally.
pub fn create_router(store: Arc<AccountStore>) -> Router {
    routes().layer(LoaderLayer::new(account_registry(store)))
}

/// Router where the install hook was forgotten.
pub fn create_router_without_layer() -> Router {
    routes()
}

/// Sends a GET request and returns the status and parsed JSON body.
pub async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
