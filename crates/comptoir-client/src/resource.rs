use crate::api::{encode, ApiClient, ApiRequest};
use crate::cache::{CollectionCache, ListQuery, Paginated, Record};
use crate::error::ApiError;
use crate::model::{Account, AccountTransaction, Product, ProductStock, StockFilter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A backend entity with a collection endpoint.
pub trait Resource: Record + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path segment, e.g. `products`.
    const PATH: &'static str;
    /// Payload accepted by the create endpoint.
    type Draft: Serialize + Send + Sync;
    /// Payload accepted by the partial-update endpoint.
    type Patch: Serialize + Send + Sync;

    /// Builds the placeholder record shown while a create round trip is
    /// pending. Values the server assigns are filled with loading markers.
    fn provisional(id: i64, draft: &Self::Draft) -> Self;
}

/// Some endpoints answer with the pagination envelope, others with a bare
/// array; both decode to the same thing.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Enveloped(Paginated<T>),
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    fn into_page(self) -> Paginated<T> {
        match self {
            ListBody::Enveloped(page) => page,
            ListBody::Bare(results) => Paginated::from_results(results),
        }
    }
}

/// CRUD client for one entity collection, wrapping the shared API client
/// and this collection's cache.
///
/// `create` and `delete` follow the optimistic protocol: the cache is
/// patched before the call is dispatched, then reconciled on the outcome.
/// `update` defers to the authoritative response instead.
pub struct ResourceClient<T: Resource> {
    api: Arc<ApiClient>,
    cache: CollectionCache<T>,
}

impl<T: Resource> ResourceClient<T> {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            cache: CollectionCache::new(),
        }
    }

    pub fn cache(&self) -> &CollectionCache<T> {
        &self.cache
    }

    fn collection_path() -> String {
        format!("{}/", T::PATH)
    }

    fn detail_path(id: i64) -> String {
        format!("{}/{id}/", T::PATH)
    }

    /// Serves the cached page when it is still fresh, otherwise refetches.
    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<T>, ApiError> {
        if let Some(page) = self.cache.fresh_page(&query.cache_key()) {
            return Ok(page);
        }
        self.refetch(query).await
    }

    pub async fn refetch(&self, query: &ListQuery) -> Result<Paginated<T>, ApiError> {
        let request = ApiRequest::get(Self::collection_path()).with_query(query.to_query());
        let body: ListBody<T> = self.api.request(request).await?.json()?;
        let page = body.into_page();
        self.cache.store_page(&query.cache_key(), page.clone());
        Ok(page)
    }

    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        let entity: T = self.api.get_json(&Self::detail_path(id)).await?;
        self.cache.store_detail(id, entity.clone());
        Ok(entity)
    }

    /// Last known detail record, if any, without touching the network.
    pub fn cached(&self, id: i64) -> Option<T> {
        self.cache.detail(id)
    }

    pub async fn create(&self, draft: T::Draft) -> Result<T, ApiError> {
        let body = encode(&draft)?;
        let provisional = T::provisional(self.cache.provisional_id(), &draft);
        let mutation = self.cache.begin_insert(provisional);

        let outcome = self
            .api
            .request(ApiRequest::post(Self::collection_path(), body))
            .await
            .and_then(|response| response.json::<T>());
        match outcome {
            Ok(entity) => {
                tracing::debug!(
                    target: "comptoir::resource",
                    resource = T::PATH,
                    id = entity.record_id(),
                    "create confirmed"
                );
                mutation.commit(entity.clone());
                Ok(entity)
            }
            Err(err) => {
                tracing::warn!(
                    target: "comptoir::resource",
                    resource = T::PATH,
                    error = %err,
                    "create failed, rolling back optimistic insert"
                );
                mutation.rollback();
                Err(err)
            }
        }
    }

    pub async fn update(&self, id: i64, patch: T::Patch) -> Result<T, ApiError> {
        let entity: T = self.api.patch_json(&Self::detail_path(id), &patch).await?;
        self.cache.absorb(id, entity.clone());
        Ok(entity)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let mutation = self.cache.begin_remove(id);
        match self.api.delete(&Self::detail_path(id)).await {
            Ok(()) => {
                mutation.commit();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    target: "comptoir::resource",
                    resource = T::PATH,
                    id,
                    error = %err,
                    "delete failed, restoring cached pages"
                );
                mutation.rollback();
                Err(err)
            }
        }
    }

    pub async fn search(&self, term: &str, limit: u32) -> Result<Vec<T>, ApiError> {
        let request = ApiRequest::get(format!("{}/search/", T::PATH)).with_query(vec![
            ("search".to_string(), term.to_string()),
            ("limit".to_string(), limit.to_string()),
        ]);
        let body: ListBody<T> = self.api.request(request).await?.json()?;
        Ok(body.into_page().results)
    }
}

impl ResourceClient<Product> {
    /// Products whose total stock sits below their alert threshold.
    pub async fn low_stock(&self) -> Result<Vec<Product>, ApiError> {
        let body: ListBody<Product> = self.api.get_json("products/low-stock/").await?;
        Ok(body.into_page().results)
    }

    pub async fn stocks(&self, filter: &StockFilter) -> Result<Vec<ProductStock>, ApiError> {
        let body: ListBody<ProductStock> = self
            .api
            .get_query_json("product-stocks/", filter.to_query())
            .await?;
        Ok(body.into_page().results)
    }

    /// Per-warehouse stock lines for one product.
    pub async fn stock_of(&self, product_id: i64) -> Result<Vec<ProductStock>, ApiError> {
        self.api
            .get_json(&format!("products/{product_id}/stock/"))
            .await
    }
}

impl ResourceClient<Account> {
    /// The movement ledger recorded against one account.
    pub async fn transactions(
        &self,
        account_id: i64,
        query: &ListQuery,
    ) -> Result<Paginated<AccountTransaction>, ApiError> {
        self.api
            .get_query_json(
                &format!("accounts/{account_id}/transactions/"),
                query.to_query(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HttpBackend, HttpResponse};
    use crate::config::ApiConfig;
    use crate::model::{Account, AccountDraft, AccountPatch, AccountType};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use url::Url;

    /// Serves a two-account collection; create and delete outcomes are
    /// scripted per test.
    struct ScriptedBackend {
        create_response: (StatusCode, serde_json::Value),
        delete_status: StatusCode,
    }

    #[async_trait]
    impl HttpBackend for ScriptedBackend {
        async fn execute(
            &self,
            _base_url: &Url,
            request: &ApiRequest,
        ) -> Result<HttpResponse, ApiError> {
            let (status, body) = if request.method == Method::GET && request.path == "accounts/" {
                (
                    StatusCode::OK,
                    json!({
                        "count": 2,
                        "next": null,
                        "previous": null,
                        "results": [account_json(1, "Caisse"), account_json(2, "Banque")],
                    }),
                )
            } else if request.method == Method::POST && request.path == "accounts/" {
                self.create_response.clone()
            } else if request.method == Method::DELETE && request.path.starts_with("accounts/") {
                (self.delete_status, json!({}))
            } else if request.method == Method::PATCH && request.path == "accounts/2/" {
                let name = request
                    .body
                    .as_ref()
                    .and_then(|body| body.get("name"))
                    .and_then(|value| value.as_str())
                    .unwrap_or("Banque");
                (StatusCode::OK, account_json(2, name))
            } else {
                panic!("unexpected request: {} {}", request.method, request.path);
            };
            Ok(HttpResponse {
                status,
                body: Bytes::from(serde_json::to_vec(&body).unwrap()),
            })
        }
    }

    fn account_json(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "account_type": "cash",
            "balance": "0.00",
            "store": 1,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
        })
    }

    fn client(backend: ScriptedBackend) -> ResourceClient<Account> {
        let config = ApiConfig::new("http://mock.server/api").unwrap();
        let api = Arc::new(ApiClient::with_backend(config, Arc::new(backend)));
        ResourceClient::new(api)
    }

    fn draft(name: &str) -> AccountDraft {
        AccountDraft {
            name: name.to_string(),
            account_type: AccountType::Cash,
            balance: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn rejected_create_rolls_the_cache_back() {
        let accounts = client(ScriptedBackend {
            create_response: (StatusCode::BAD_REQUEST, json!({"name": ["obligatoire"]})),
            delete_status: StatusCode::NO_CONTENT,
        });

        let query = ListQuery::new();
        let before = accounts.list(&query).await.unwrap();
        assert_eq!(before.count, 2);

        let err = accounts.create(draft("")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // The page content is byte-for-byte the pre-mutation snapshot.
        assert_eq!(accounts.cache().page(&query.cache_key()).unwrap(), before);
    }

    #[tokio::test]
    async fn confirmed_create_replaces_the_placeholder() {
        let accounts = client(ScriptedBackend {
            create_response: (StatusCode::CREATED, account_json(42, "Compte Courant")),
            delete_status: StatusCode::NO_CONTENT,
        });

        let query = ListQuery::new();
        accounts.list(&query).await.unwrap();
        let created = accounts.create(draft("Compte Courant")).await.unwrap();
        assert_eq!(created.id, 42);

        let page = accounts.cache().page(&query.cache_key()).unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results[0].id, 42);
        assert_eq!(page.results[1].id, 1);
        assert_eq!(accounts.cached(42).map(|account| account.name), Some("Compte Courant".into()));
    }

    #[tokio::test]
    async fn failed_delete_restores_the_record() {
        let accounts = client(ScriptedBackend {
            create_response: (StatusCode::CREATED, account_json(42, "unused")),
            delete_status: StatusCode::INTERNAL_SERVER_ERROR,
        });

        let query = ListQuery::new();
        let before = accounts.list(&query).await.unwrap();

        let err = accounts.delete(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
        assert_eq!(accounts.cache().page(&query.cache_key()).unwrap(), before);
    }

    #[tokio::test]
    async fn update_absorbs_the_authoritative_record() {
        let accounts = client(ScriptedBackend {
            create_response: (StatusCode::CREATED, account_json(42, "unused")),
            delete_status: StatusCode::NO_CONTENT,
        });

        let query = ListQuery::new();
        accounts.list(&query).await.unwrap();

        let updated = accounts
            .update(
                2,
                AccountPatch {
                    name: Some("Banque BOA".to_string()),
                    ..AccountPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Banque BOA");

        // The cached list row is replaced in place and the detail entry
        // overwritten; the page itself is due for a refetch.
        let page = accounts.cache().page(&query.cache_key()).unwrap();
        assert_eq!(page.results[1].name, "Banque BOA");
        assert_eq!(accounts.cached(2).map(|account| account.name), Some("Banque BOA".into()));
        assert!(accounts.cache().fresh_page(&query.cache_key()).is_none());
    }

    #[tokio::test]
    async fn successful_delete_marks_pages_stale() {
        let accounts = client(ScriptedBackend {
            create_response: (StatusCode::CREATED, account_json(42, "unused")),
            delete_status: StatusCode::NO_CONTENT,
        });

        let query = ListQuery::new();
        accounts.list(&query).await.unwrap();
        accounts.delete(1).await.unwrap();

        let page = accounts.cache().page(&query.cache_key()).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results.len(), 1);
        // Stale: the next list() goes back to the server.
        assert!(accounts.cache().fresh_page(&query.cache_key()).is_none());
    }
}
