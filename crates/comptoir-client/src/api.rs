use crate::config::ApiConfig;
use crate::error::{classify_failure, ApiError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Refresh exchange endpoint. Cookie-authenticated, empty body.
const REFRESH_PATH: &str = "jwt/refresh/";

/// An outbound call before transport concerns are applied.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| ApiError::InvalidResponse(format!("malformed response body: {err}")))
    }
}

/// Transport seam. The production implementation rides on reqwest; tests
/// substitute in-memory backends.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn execute(&self, base_url: &Url, request: &ApiRequest) -> Result<HttpResponse, ApiError>;
}

pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        // The cookie store carries the access/refresh pair; call sites
        // never thread tokens through explicitly.
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::InvalidConfig(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, base_url: &Url, request: &ApiRequest) -> Result<HttpResponse, ApiError> {
        let endpoint = base_url.join(&request.path).map_err(|err| {
            ApiError::InvalidConfig(format!("invalid endpoint path '{}': {err}", request.path))
        })?;
        let mut builder = self.client.request(request.method.clone(), endpoint);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body })
    }
}

/// HTTP client with transparent session recovery.
///
/// A request that comes back 401 is retried exactly once, after a refresh
/// exchange coordinated through a shared gate: the first task to observe the
/// expiry performs the refresh, every other 401'd task waits for that single
/// exchange to settle instead of starting its own.
pub struct ApiClient {
    config: ApiConfig,
    backend: Arc<dyn HttpBackend>,
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let backend = Arc::new(ReqwestBackend::new(&config)?);
        Ok(Self::build(config, backend))
    }

    #[cfg(test)]
    pub(crate) fn with_backend(config: ApiConfig, backend: Arc<dyn HttpBackend>) -> Self {
        Self::build(config, backend)
    }

    fn build(config: ApiConfig, backend: Arc<dyn HttpBackend>) -> Self {
        Self {
            config,
            backend,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn request(&self, request: ApiRequest) -> Result<HttpResponse, ApiError> {
        let response = self.backend.execute(self.config.base_url(), &request).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return finalize(response);
        }

        tracing::debug!(
            target: "comptoir::api",
            path = %request.path,
            "unauthorized response, coordinating session refresh"
        );
        self.await_refresh().await;

        // Whatever the refresh outcome, the original request gets exactly
        // one more attempt with the credentials now current.
        let retried = self.backend.execute(self.config.base_url(), &request).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        finalize(retried)
    }

    async fn await_refresh(&self) {
        match self.refresh_gate.try_lock() {
            Ok(_guard) => {
                // Refresh failure is absorbed here: the retry below will
                // surface the resulting 401 on its own.
                if let Err(err) = self.refresh_session().await {
                    tracing::debug!(
                        target: "comptoir::api",
                        error = %err,
                        "session refresh failed, retrying request regardless"
                    );
                }
            }
            Err(_) => {
                // A refresh is already in flight; wait for it to settle.
                let _guard = self.refresh_gate.lock().await;
            }
        }
    }

    async fn refresh_session(&self) -> Result<(), ApiError> {
        let request = ApiRequest::post(REFRESH_PATH, Value::Object(Default::default()));
        let response = self.backend.execute(self.config.base_url(), &request).await?;
        if response.status.is_success() {
            tracing::debug!(target: "comptoir::api", "session refreshed");
            Ok(())
        } else {
            Err(ApiError::Status {
                status: response.status,
                message: "refresh exchange rejected".into(),
            })
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::get(path)).await?.json()
    }

    pub async fn get_query_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.request(ApiRequest::get(path).with_query(query)).await?.json()
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = encode(body)?;
        self.request(ApiRequest::post(path, body)).await?.json()
    }

    /// POST discarding whatever body the server answers with.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = encode(body)?;
        self.request(ApiRequest::post(path, body)).await?;
        Ok(())
    }

    pub async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = encode(body)?;
        self.request(ApiRequest::patch(path, body)).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(ApiRequest::delete(path)).await?;
        Ok(())
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, ApiError> {
        Ok(self.request(ApiRequest::get(path)).await?.body)
    }
}

pub(crate) fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Serialization(err.to_string()))
}

fn finalize(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(classify_failure(response.status, &response.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as SyncMutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_client(backend: Arc<dyn HttpBackend>) -> ApiClient {
        let config = ApiConfig::new("http://mock.server/api").unwrap();
        ApiClient::with_backend(config, backend)
    }

    /// Answers 401 to every data request until the refresh endpoint has been
    /// hit, then 200. Counts attempts per path and refresh calls.
    struct ExpiredSessionBackend {
        refreshed: AtomicBool,
        refresh_calls: AtomicUsize,
        attempts: SyncMutex<HashMap<String, usize>>,
        refresh_succeeds: bool,
    }

    impl ExpiredSessionBackend {
        fn new(refresh_succeeds: bool) -> Self {
            Self {
                refreshed: AtomicBool::new(false),
                refresh_calls: AtomicUsize::new(0),
                attempts: SyncMutex::new(HashMap::new()),
                refresh_succeeds,
            }
        }

        fn attempts_for(&self, path: &str) -> usize {
            self.attempts.lock().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl HttpBackend for ExpiredSessionBackend {
        async fn execute(
            &self,
            _base_url: &Url,
            request: &ApiRequest,
        ) -> Result<HttpResponse, ApiError> {
            if request.path == REFRESH_PATH {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                // Keep the exchange in flight long enough for concurrent
                // 401 handlers to find the gate held.
                tokio::time::sleep(Duration::from_millis(20)).await;
                if self.refresh_succeeds {
                    self.refreshed.store(true, Ordering::SeqCst);
                    return Ok(HttpResponse {
                        status: StatusCode::OK,
                        body: Bytes::from_static(b"{}"),
                    });
                }
                return Ok(HttpResponse {
                    status: StatusCode::UNAUTHORIZED,
                    body: Bytes::from_static(b"{\"detail\": \"refresh token expired\"}"),
                });
            }

            *self.attempts.lock().entry(request.path.clone()).or_insert(0) += 1;
            // Yield before answering so concurrently issued requests all
            // observe the expired session.
            tokio::task::yield_now().await;
            if self.refreshed.load(Ordering::SeqCst) {
                Ok(HttpResponse {
                    status: StatusCode::OK,
                    body: Bytes::from_static(b"{\"ok\": true}"),
                })
            } else {
                Ok(HttpResponse {
                    status: StatusCode::UNAUTHORIZED,
                    body: Bytes::from_static(b"{\"detail\": \"expired\"}"),
                })
            }
        }
    }

    #[tokio::test]
    async fn concurrent_expiries_trigger_a_single_refresh() {
        let backend = Arc::new(ExpiredSessionBackend::new(true));
        let client = test_client(backend.clone());

        let (a, b, c) = tokio::join!(
            client.request(ApiRequest::get("products/")),
            client.request(ApiRequest::get("customers/")),
            client.request(ApiRequest::get("accounts/")),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
        // Each original request was retried exactly once.
        assert_eq!(backend.attempts_for("products/"), 2);
        assert_eq!(backend.attempts_for("customers/"), 2);
        assert_eq!(backend.attempts_for("accounts/"), 2);
    }

    #[tokio::test]
    async fn second_unauthorized_is_permanent() {
        let backend = Arc::new(ExpiredSessionBackend::new(false));
        let client = test_client(backend.clone());

        let err = client.request(ApiRequest::get("products/")).await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        // Original attempt plus one retry, never a third.
        assert_eq!(backend.attempts_for("products/"), 2);
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    }

    struct FailingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpBackend for FailingBackend {
        async fn execute(
            &self,
            _base_url: &Url,
            _request: &ApiRequest,
        ) -> Result<HttpResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::InvalidResponse("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn transport_errors_bypass_refresh_logic() {
        let backend = Arc::new(FailingBackend { calls: AtomicUsize::new(0) });
        let client = test_client(backend.clone());

        let err = client.request(ApiRequest::get("products/")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    struct CannedBackend {
        status: StatusCode,
        body: &'static [u8],
    }

    #[async_trait]
    impl HttpBackend for CannedBackend {
        async fn execute(
            &self,
            _base_url: &Url,
            _request: &ApiRequest,
        ) -> Result<HttpResponse, ApiError> {
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from_static(self.body),
            })
        }
    }

    #[tokio::test]
    async fn validation_bodies_surface_field_messages() {
        let backend = Arc::new(CannedBackend {
            status: StatusCode::BAD_REQUEST,
            body: b"{\"name\": [\"obligatoire\"]}",
        });
        let client = test_client(backend);

        let err = client
            .request(ApiRequest::post("accounts/", Value::Object(Default::default())))
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields["name"], vec!["obligatoire".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
