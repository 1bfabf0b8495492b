//! Optimistic create/delete flows over the wire: the cached page must show
//! the change immediately, then either absorb the server's record or revert
//! to the pre-mutation snapshot.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use comptoir_client::cache::ListQuery;
use comptoir_client::error::ApiError;
use comptoir_client::model::{AccountDraft, AccountType};
use comptoir_client::{ApiConfig, ComptoirClient};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

struct BackendState {
    delete_status: StatusCode,
}

fn account_json(id: i64, name: &str, balance: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "account_type": "cash",
        "balance": balance,
        "store": 1,
        "is_active": true,
        "created_at": "2024-01-01T00:00:00Z",
    })
}

async fn list_accounts() -> impl IntoResponse {
    Json(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            account_json(1, "Caisse", "12000.00"),
            account_json(2, "Banque", "250000.00"),
        ],
    }))
}

async fn create_account(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let name = body.get("name").and_then(|value| value.as_str()).unwrap_or("");
    if name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"name": ["obligatoire"]})),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(account_json(42, name, "0.00"))).into_response()
}

async fn delete_account(
    State(state): State<Arc<BackendState>>,
    Path(_id): Path<i64>,
) -> impl IntoResponse {
    if state.delete_status.is_success() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (state.delete_status, Json(json!({"error": "indisponible"}))).into_response()
    }
}

async fn spawn_backend(state: Arc<BackendState>) -> String {
    let app = Router::new()
        .route("/api/accounts/", get(list_accounts).post(create_account))
        .route("/api/accounts/:id/", delete(delete_account))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn connected_client(delete_status: StatusCode) -> ComptoirClient {
    let state = Arc::new(BackendState { delete_status });
    let base = spawn_backend(state).await;
    ComptoirClient::new(ApiConfig::new(base).unwrap()).unwrap()
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
async fn rejected_create_reverts_to_the_snapshot_with_field_errors() {
    let client = connected_client(StatusCode::NO_CONTENT).await;
    let query = ListQuery::new();
    let before = client.accounts.list(&query).await.unwrap();
    assert_eq!(before.count, 2);

    let err = client.accounts.create(draft("  ")).await.unwrap_err();
    match err {
        ApiError::Validation(fields) => {
            assert_eq!(fields["name"], vec!["obligatoire".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let after = client.accounts.cache().page(&query.cache_key()).unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn confirmed_create_lands_at_the_head_of_the_page() {
    let client = connected_client(StatusCode::NO_CONTENT).await;
    let query = ListQuery::new();
    client.accounts.list(&query).await.unwrap();

    let created = client.accounts.create(draft("Compte Courant")).await.unwrap();
    assert_eq!(created.id, 42);

    let page = client.accounts.cache().page(&query.cache_key()).unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.results[0].id, 42);
    assert_eq!(page.results[0].name, "Compte Courant");
    assert_eq!(page.results[1].name, "Caisse");
}

#[tokio::test]
async fn failed_delete_restores_the_page() {
    let client = connected_client(StatusCode::INTERNAL_SERVER_ERROR).await;
    let query = ListQuery::new();
    let before = client.accounts.list(&query).await.unwrap();

    let err = client.accounts.delete(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { .. }));

    let after = client.accounts.cache().page(&query.cache_key()).unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn successful_delete_trims_the_page_and_count() {
    let client = connected_client(StatusCode::NO_CONTENT).await;
    let query = ListQuery::new();
    client.accounts.list(&query).await.unwrap();

    client.accounts.delete(1).await.unwrap();

    let page = client.accounts.cache().page(&query.cache_key()).unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].name, "Banque");
}
