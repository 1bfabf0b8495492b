use crate::api::ApiClient;
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct MovementRange {
    pub start_date: String,
    pub end_date: String,
    pub product: Option<i64>,
    pub warehouse: Option<i64>,
}

impl MovementRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            product: None,
            warehouse: None,
        }
    }

    fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("start_date".to_string(), self.start_date.clone()),
            ("end_date".to_string(), self.end_date.clone()),
        ];
        if let Some(product) = self.product {
            pairs.push(("product".to_string(), product.to_string()));
        }
        if let Some(warehouse) = self.warehouse {
            pairs.push(("warehouse".to_string(), warehouse.to_string()));
        }
        pairs
    }
}

/// Aggregated stock reporting. Payload shapes are backend-defined, so each
/// call is generic over the caller's expected type.
pub struct ReportsClient {
    api: Arc<ApiClient>,
}

impl ReportsClient {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn stock_movements<T: DeserializeOwned>(
        &self,
        range: &MovementRange,
    ) -> Result<T, ApiError> {
        self.api
            .get_query_json("stock-movements/", range.to_query())
            .await
    }

    pub async fn stock_stats<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.api.get_json("stock-stats/").await
    }

    pub async fn stock_value<T: DeserializeOwned>(
        &self,
        warehouse: Option<i64>,
    ) -> Result<T, ApiError> {
        let query = warehouse
            .map(|id| vec![("warehouse".to_string(), id.to_string())])
            .unwrap_or_default();
        self.api.get_query_json("stock-value/", query).await
    }
}
