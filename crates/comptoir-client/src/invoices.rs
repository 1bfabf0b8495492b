use crate::api::ApiClient;
use crate::error::ApiError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceProduct {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub product: InvoiceProduct,
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub total_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCustomer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceStore {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceWarehouse {
    pub id: i64,
    pub name: String,
    pub store: InvoiceStore,
}

/// The stock exit an invoice bills, embedded with enough context to render
/// the document without further lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceStockExit {
    pub id: i64,
    pub warehouse: InvoiceWarehouse,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub customer: Option<InvoiceCustomer>,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub stock_exit: InvoiceStockExit,
    pub total_amount: String,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub stock_exit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InvoicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
}

/// Flattened document payload the print endpoint prepares server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePrintData {
    pub invoice: PrintHeader,
    pub store: PrintStore,
    pub customer: PrintCustomer,
    pub items: Vec<PrintLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintHeader {
    pub invoice_number: String,
    pub date: String,
    pub time: String,
    pub total_amount: String,
    pub warehouse: String,
    pub created_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintLine {
    pub product_reference: String,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: String,
    pub total_price: String,
}

/// Invoice operations. Invoices are generated from stock exits and listed
/// as a bare array; there is no optimistic path here, the backend numbers
/// and totals them.
pub struct InvoicesClient {
    api: Arc<ApiClient>,
}

impl InvoicesClient {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, ApiError> {
        self.api.get_json("invoices/").await
    }

    pub async fn get(&self, id: i64) -> Result<Invoice, ApiError> {
        self.api.get_json(&format!("invoices/{id}/")).await
    }

    pub async fn create(&self, draft: &InvoiceDraft) -> Result<Invoice, ApiError> {
        self.api.post_json("invoices/", draft).await
    }

    pub async fn update(&self, id: i64, patch: &InvoicePatch) -> Result<Invoice, ApiError> {
        self.api.patch_json(&format!("invoices/{id}/"), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("invoices/{id}/")).await
    }

    pub async fn print_data(&self, id: i64) -> Result<InvoicePrintData, ApiError> {
        self.api.get_json(&format!("invoices/{id}/print_data/")).await
    }

    /// The rendered PDF, as served by the backend.
    pub async fn download_pdf(&self, id: i64) -> Result<Bytes, ApiError> {
        self.api.get_bytes(&format!("invoices/{id}/download-pdf/")).await
    }
}
