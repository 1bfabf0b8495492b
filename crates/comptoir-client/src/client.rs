use crate::api::ApiClient;
use crate::auth::AuthClient;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::invoices::InvoicesClient;
use crate::ledger::LedgerClient;
use crate::model::{Account, Customer, Product, StockEntry, StockExit, Supplier, Warehouse};
use crate::reports::ReportsClient;
use crate::resource::ResourceClient;
use std::sync::Arc;

/// Root handle for one backend session.
///
/// Constructed once and passed around explicitly; all sub-clients share the
/// same underlying HTTP client, so the cookie session and the refresh gate
/// are common to every call made through it.
pub struct ComptoirClient {
    api: Arc<ApiClient>,
    pub auth: AuthClient,
    pub products: ResourceClient<Product>,
    pub customers: ResourceClient<Customer>,
    pub suppliers: ResourceClient<Supplier>,
    pub warehouses: ResourceClient<Warehouse>,
    pub accounts: ResourceClient<Account>,
    pub stock_entries: ResourceClient<StockEntry>,
    pub stock_exits: ResourceClient<StockExit>,
    pub invoices: InvoicesClient,
    pub ledger: LedgerClient,
    pub reports: ReportsClient,
}

impl ComptoirClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let api = Arc::new(ApiClient::new(config)?);
        Ok(Self::from_api(api))
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ApiConfig::from_env()?)
    }

    fn from_api(api: Arc<ApiClient>) -> Self {
        Self {
            auth: AuthClient::new(api.clone()),
            products: ResourceClient::new(api.clone()),
            customers: ResourceClient::new(api.clone()),
            suppliers: ResourceClient::new(api.clone()),
            warehouses: ResourceClient::new(api.clone()),
            accounts: ResourceClient::new(api.clone()),
            stock_entries: ResourceClient::new(api.clone()),
            stock_exits: ResourceClient::new(api.clone()),
            invoices: InvoicesClient::new(api.clone()),
            ledger: LedgerClient::new(api.clone()),
            reports: ReportsClient::new(api.clone()),
            api,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
