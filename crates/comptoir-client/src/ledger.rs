use crate::api::ApiClient;
use crate::cache::{ListQuery, Paginated};
use crate::error::ApiError;
use crate::model::{FinancialTransaction, TransactionFilter};
use std::sync::Arc;

/// Read side of the financial transaction ledger. Postings are created by
/// the backend when stock moves or transfers are recorded; the client only
/// lists them.
pub struct LedgerClient {
    api: Arc<ApiClient>,
}

impl LedgerClient {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(
        &self,
        filter: &TransactionFilter,
        query: &ListQuery,
    ) -> Result<Paginated<FinancialTransaction>, ApiError> {
        let mut pairs = query.to_query();
        pairs.extend(filter.to_query());
        self.api.get_query_json("transactions/", pairs).await
    }
}
