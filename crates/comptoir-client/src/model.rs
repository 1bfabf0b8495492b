//! Wire types for the Comptoir backend.
//!
//! Monetary amounts and timestamps travel as strings, matching the
//! backend's decimal/datetime serialization; nothing here re-parses them.

use crate::cache::Record;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Placeholder shown for names the server has not confirmed yet.
pub const LOADING_PLACEHOLDER: &str = "Chargement...";

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn lines_total<'a>(lines: impl Iterator<Item = (f64, &'a str)>) -> String {
    let total: f64 = lines
        .map(|(quantity, price)| quantity * price.parse::<f64>().unwrap_or(0.0))
        .sum();
    format!("{total:.2}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    pub fullname: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub is_staff: bool,
    #[serde(default)]
    pub last_login: Option<String>,
    pub store: Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Bank,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Sale,
    Transfer,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Sale => "sale",
            TransactionType::Transfer => "transfer",
            TransactionType::Adjustment => "adjustment",
        }
    }
}

// ---------------------------------------------------------------------------
// Products

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit: String,
    pub min_stock_alert: f64,
    pub store: i64,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub total_stock: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDraft {
    pub reference: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit: String,
    pub min_stock_alert: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock_alert: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Record for Product {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for Product {
    const PATH: &'static str = "products";
    type Draft = ProductDraft;
    type Patch = ProductPatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            reference: draft.reference.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            unit: draft.unit.clone(),
            min_stock_alert: draft.min_stock_alert,
            store: 0,
            is_active: true,
            created_at: now_rfc3339(),
            total_stock: None,
        }
    }
}

/// One product's stock level in one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
    pub id: i64,
    pub product: Product,
    pub warehouse: Warehouse,
    pub quantity: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockFilter {
    pub search: Option<String>,
    pub warehouse: Option<i64>,
    pub product: Option<i64>,
    pub low_stock: Option<bool>,
}

impl StockFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(warehouse) = self.warehouse {
            pairs.push(("warehouse".to_string(), warehouse.to_string()));
        }
        if let Some(product) = self.product {
            pairs.push(("product".to_string(), product.to_string()));
        }
        if let Some(low_stock) = self.low_stock {
            pairs.push(("low_stock".to_string(), low_stock.to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Customers, suppliers, warehouses

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub store: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Record for Customer {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for Customer {
    const PATH: &'static str = "customers";
    type Draft = CustomerDraft;
    type Patch = CustomerPatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
            address: draft.address.clone(),
            store: 0,
            is_active: true,
            created_at: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub store: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SupplierPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Record for Supplier {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for Supplier {
    const PATH: &'static str = "suppliers";
    type Draft = SupplierDraft;
    type Patch = SupplierPatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
            address: draft.address.clone(),
            store: 0,
            is_active: true,
            created_at: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub store: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WarehousePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Record for Warehouse {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for Warehouse {
    const PATH: &'static str = "warehouses";
    type Draft = WarehouseDraft;
    type Patch = WarehousePatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            address: draft.address.clone(),
            store: 0,
            is_active: draft.is_active.unwrap_or(true),
            created_at: now_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub balance: String,
    #[serde(default)]
    pub store: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountDraft {
    pub name: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Record for Account {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for Account {
    const PATH: &'static str = "accounts";
    type Draft = AccountDraft;
    type Patch = AccountPatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            account_type: draft.account_type,
            balance: draft.balance.clone().unwrap_or_else(|| "0.00".to_string()),
            store: 0,
            is_active: draft.is_active.unwrap_or(true),
            created_at: now_rfc3339(),
        }
    }
}

/// One ledger line as rendered in an account's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTransaction {
    pub id: i64,
    pub transaction_number: String,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub transaction_type_display: String,
    pub amount: String,
    pub movement_type: MovementType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub from_account_name: Option<String>,
    #[serde(default)]
    pub to_account_name: Option<String>,
    #[serde(default)]
    pub stock_exit_number: Option<String>,
    #[serde(default)]
    pub stock_entry_number: Option<String>,
    pub created_by_name: String,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Stock entries and exits

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntryItem {
    pub id: i64,
    pub stock_entry: i64,
    pub product: Product,
    pub quantity: f64,
    pub purchase_price: String,
    pub total_price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: i64,
    pub entry_number: String,
    pub supplier: i64,
    pub supplier_name: String,
    pub warehouse: i64,
    pub warehouse_name: String,
    pub total_amount: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_by: i64,
    pub created_by_name: String,
    pub created_at: String,
    #[serde(default)]
    pub items: Option<Vec<StockEntryItem>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockEntryLineDraft {
    pub product: i64,
    pub quantity: f64,
    pub purchase_price: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockEntryDraft {
    pub supplier: i64,
    pub warehouse: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<StockEntryLineDraft>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StockEntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<StockEntryLineDraft>>,
}

impl Record for StockEntry {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for StockEntry {
    const PATH: &'static str = "stock-entries";
    type Draft = StockEntryDraft;
    type Patch = StockEntryPatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            entry_number: format!("EN-{}", id.unsigned_abs()),
            supplier: draft.supplier,
            supplier_name: LOADING_PLACEHOLDER.to_string(),
            warehouse: draft.warehouse,
            warehouse_name: LOADING_PLACEHOLDER.to_string(),
            total_amount: lines_total(
                draft
                    .items
                    .iter()
                    .map(|line| (line.quantity, line.purchase_price.as_str())),
            ),
            notes: draft.notes.clone(),
            created_by: 0,
            created_by_name: "Vous".to_string(),
            created_at: now_rfc3339(),
            items: Some(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockExitItem {
    pub id: i64,
    pub stock_exit: i64,
    pub product: Product,
    pub quantity: f64,
    pub sale_price: String,
    pub total_price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockExit {
    pub id: i64,
    pub exit_number: String,
    #[serde(default)]
    pub customer: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub warehouse: i64,
    pub warehouse_name: String,
    pub total_amount: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_by: i64,
    pub created_by_name: String,
    pub created_at: String,
    #[serde(default)]
    pub items: Option<Vec<StockExitItem>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockExitLineDraft {
    pub product: i64,
    pub quantity: f64,
    pub sale_price: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockExitDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub warehouse: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<StockExitLineDraft>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StockExitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<StockExitLineDraft>>,
}

impl Record for StockExit {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Resource for StockExit {
    const PATH: &'static str = "stock-exits";
    type Draft = StockExitDraft;
    type Patch = StockExitPatch;

    fn provisional(id: i64, draft: &Self::Draft) -> Self {
        Self {
            id,
            exit_number: format!("TMP-{}", id.unsigned_abs()),
            customer: draft.customer,
            customer_name: Some(LOADING_PLACEHOLDER.to_string()),
            warehouse: draft.warehouse,
            warehouse_name: LOADING_PLACEHOLDER.to_string(),
            total_amount: lines_total(
                draft
                    .items
                    .iter()
                    .map(|line| (line.quantity, line.sale_price.as_str())),
            ),
            notes: draft.notes.clone(),
            created_by: 0,
            created_by_name: "Vous".to_string(),
            created_at: now_rfc3339(),
            items: Some(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Financial transactions

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: i64,
    pub transaction_number: String,
    pub transaction_type: TransactionType,
    pub amount: String,
    #[serde(default)]
    pub from_account: Option<Account>,
    #[serde(default)]
    pub to_account: Option<Account>,
    #[serde(default)]
    pub stock_entry: Option<i64>,
    #[serde(default)]
    pub stock_exit: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: User,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub account: Option<i64>,
}

impl TransactionFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(start_date) = &self.start_date {
            pairs.push(("start_date".to_string(), start_date.clone()));
        }
        if let Some(end_date) = &self.end_date {
            pairs.push(("end_date".to_string(), end_date.clone()));
        }
        if let Some(transaction_type) = self.transaction_type {
            pairs.push((
                "transaction_type".to_string(),
                transaction_type.as_str().to_string(),
            ));
        }
        if let Some(account) = self.account {
            pairs.push(("account".to_string(), account.to_string()));
        }
        pairs
    }
}
