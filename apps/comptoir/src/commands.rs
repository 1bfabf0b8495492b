use crate::{
    AccountsCommand, Cli, Command, CustomersCommand, InvoicesCommand, ProductsCommand,
    StockEntriesCommand, StockExitsCommand, SuppliersCommand, WarehousesCommand,
};
use anyhow::{bail, Context};
use comptoir_client::auth::Credentials;
use comptoir_client::cache::ListQuery;
use comptoir_client::model::{
    AccountDraft, AccountType, CustomerDraft, ProductDraft, SupplierDraft, TransactionFilter,
    WarehouseDraft,
};
use comptoir_client::{ApiConfig, ComptoirClient};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.api_url {
        Some(url) => ApiConfig::new(url)?,
        None => ApiConfig::from_env()?,
    };
    tracing::debug!(base_url = %config.base_url(), command = ?cli.command, "dispatching");
    let client = ComptoirClient::new(config)?;

    // The session cookie lives and dies with this process, so sign in up
    // front whenever credentials are on hand.
    let credentials = match (&cli.store, &cli.username, &cli.password) {
        (Some(store), Some(username), Some(password)) => Some(Credentials {
            store_name: store.clone(),
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };
    if let Some(credentials) = &credentials {
        client.auth.login(credentials).await.context("login failed")?;
    } else if matches!(cli.command, Command::Login) {
        bail!("--store, --username and --password are required to log in");
    }

    match cli.command {
        Command::Login | Command::Whoami => {
            let user = client.auth.me().await?;
            println!("{} ({}) — {}", user.fullname, user.username, user.store.name);
        }
        Command::Logout => {
            client.auth.logout().await?;
            println!("session closed");
        }
        Command::Products(command) => run_products(&client, command).await?,
        Command::Customers(command) => run_customers(&client, command).await?,
        Command::Suppliers(command) => run_suppliers(&client, command).await?,
        Command::Warehouses(command) => run_warehouses(&client, command).await?,
        Command::Accounts(command) => run_accounts(&client, command).await?,
        Command::StockEntries(command) => run_stock_entries(&client, command).await?,
        Command::StockExits(command) => run_stock_exits(&client, command).await?,
        Command::Invoices(command) => run_invoices(&client, command).await?,
        Command::Transactions { account, page } => {
            let filter = TransactionFilter {
                account,
                ..TransactionFilter::default()
            };
            let mut query = ListQuery::new();
            if let Some(page) = page {
                query = query.page(page);
            }
            let ledger = client.ledger.list(&filter, &query).await?;
            for transaction in &ledger.results {
                println!(
                    "{:>6}  {:<12} {:<10} {:>14}  {}",
                    transaction.id,
                    transaction.transaction_number,
                    transaction.transaction_type.as_str(),
                    transaction.amount,
                    transaction.description.as_deref().unwrap_or("-"),
                );
            }
            println!("{} transactions", ledger.count);
        }
        Command::Stats => {
            let stats: serde_json::Value = client.reports.stock_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

async fn run_products(client: &ComptoirClient, command: ProductsCommand) -> anyhow::Result<()> {
    match command {
        ProductsCommand::List { search, page } => {
            let mut query = ListQuery::new();
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(page) = page {
                query = query.page(page);
            }
            let listing = client.products.list(&query).await?;
            for product in &listing.results {
                let stock = product
                    .total_stock
                    .map(|quantity| quantity.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:>6}  {:<12} {:<32} {:>8} {}",
                    product.id, product.reference, product.name, stock, product.unit,
                );
            }
            println!("{} products", listing.count);
        }
        ProductsCommand::Create {
            reference,
            name,
            unit,
            min_stock_alert,
            description,
        } => {
            let product = client
                .products
                .create(ProductDraft {
                    reference,
                    name,
                    description,
                    unit,
                    min_stock_alert,
                })
                .await?;
            println!("created product {} ({})", product.id, product.reference);
        }
        ProductsCommand::Delete { id } => {
            client.products.delete(id).await?;
            println!("deleted product {id}");
        }
        ProductsCommand::LowStock => {
            for product in client.products.low_stock().await? {
                println!(
                    "{:>6}  {:<32} stock {} (alert {})",
                    product.id,
                    product.name,
                    product
                        .total_stock
                        .map(|quantity| quantity.to_string())
                        .unwrap_or_else(|| "-".into()),
                    product.min_stock_alert,
                );
            }
        }
    }
    Ok(())
}

async fn run_customers(client: &ComptoirClient, command: CustomersCommand) -> anyhow::Result<()> {
    match command {
        CustomersCommand::List { search, page } => {
            let mut query = ListQuery::new();
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(page) = page {
                query = query.page(page);
            }
            let listing = client.customers.list(&query).await?;
            for customer in &listing.results {
                println!(
                    "{:>6}  {:<32} {}",
                    customer.id,
                    customer.name,
                    customer.phone.as_deref().unwrap_or("-"),
                );
            }
            println!("{} customers", listing.count);
        }
        CustomersCommand::Create {
            name,
            phone,
            email,
            address,
        } => {
            let customer = client
                .customers
                .create(CustomerDraft {
                    name,
                    phone,
                    email,
                    address,
                })
                .await?;
            println!("created customer {} ({})", customer.id, customer.name);
        }
        CustomersCommand::Delete { id } => {
            client.customers.delete(id).await?;
            println!("deleted customer {id}");
        }
    }
    Ok(())
}

async fn run_suppliers(client: &ComptoirClient, command: SuppliersCommand) -> anyhow::Result<()> {
    match command {
        SuppliersCommand::List { search, page } => {
            let mut query = ListQuery::new();
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(page) = page {
                query = query.page(page);
            }
            let listing = client.suppliers.list(&query).await?;
            for supplier in &listing.results {
                println!(
                    "{:>6}  {:<32} {}",
                    supplier.id,
                    supplier.name,
                    supplier.phone.as_deref().unwrap_or("-"),
                );
            }
            println!("{} suppliers", listing.count);
        }
        SuppliersCommand::Create {
            name,
            phone,
            email,
            address,
        } => {
            let supplier = client
                .suppliers
                .create(SupplierDraft {
                    name,
                    phone,
                    email,
                    address,
                })
                .await?;
            println!("created supplier {} ({})", supplier.id, supplier.name);
        }
        SuppliersCommand::Delete { id } => {
            client.suppliers.delete(id).await?;
            println!("deleted supplier {id}");
        }
    }
    Ok(())
}

async fn run_warehouses(client: &ComptoirClient, command: WarehousesCommand) -> anyhow::Result<()> {
    match command {
        WarehousesCommand::List => {
            let listing = client.warehouses.list(&ListQuery::new()).await?;
            for warehouse in &listing.results {
                println!(
                    "{:>6}  {:<32} {}",
                    warehouse.id,
                    warehouse.name,
                    warehouse.address.as_deref().unwrap_or("-"),
                );
            }
            println!("{} warehouses", listing.count);
        }
        WarehousesCommand::Create { name, address } => {
            let warehouse = client
                .warehouses
                .create(WarehouseDraft {
                    name,
                    address,
                    is_active: None,
                })
                .await?;
            println!("created warehouse {} ({})", warehouse.id, warehouse.name);
        }
        WarehousesCommand::Delete { id } => {
            client.warehouses.delete(id).await?;
            println!("deleted warehouse {id}");
        }
    }
    Ok(())
}

async fn run_accounts(client: &ComptoirClient, command: AccountsCommand) -> anyhow::Result<()> {
    match command {
        AccountsCommand::List => {
            let listing = client.accounts.list(&ListQuery::new()).await?;
            for account in &listing.results {
                println!(
                    "{:>6}  {:<24} {:<6} {:>16}",
                    account.id,
                    account.name,
                    match account.account_type {
                        AccountType::Bank => "bank",
                        AccountType::Cash => "cash",
                    },
                    account.balance,
                );
            }
            println!("{} accounts", listing.count);
        }
        AccountsCommand::Create {
            name,
            account_type,
            balance,
        } => {
            let account_type = match account_type.as_str() {
                "bank" => AccountType::Bank,
                "cash" => AccountType::Cash,
                other => bail!("unknown account type '{other}', expected bank or cash"),
            };
            let account = client
                .accounts
                .create(AccountDraft {
                    name,
                    account_type,
                    balance,
                    is_active: None,
                })
                .await?;
            println!("created account {} ({})", account.id, account.name);
        }
        AccountsCommand::Delete { id } => {
            client.accounts.delete(id).await?;
            println!("deleted account {id}");
        }
        AccountsCommand::Ledger { id, page } => {
            let mut query = ListQuery::new();
            if let Some(page) = page {
                query = query.page(page);
            }
            let ledger = client.accounts.transactions(id, &query).await?;
            for line in &ledger.results {
                println!(
                    "{:>6}  {:<12} {:<7} {:>14}  {}",
                    line.id,
                    line.transaction_number,
                    match line.movement_type {
                        comptoir_client::model::MovementType::Credit => "credit",
                        comptoir_client::model::MovementType::Debit => "debit",
                    },
                    line.amount,
                    line.description,
                );
            }
            println!("{} movements", ledger.count);
        }
    }
    Ok(())
}

async fn run_stock_entries(
    client: &ComptoirClient,
    command: StockEntriesCommand,
) -> anyhow::Result<()> {
    match command {
        StockEntriesCommand::List {
            page,
            supplier,
            warehouse,
        } => {
            let mut query = ListQuery::new();
            if let Some(page) = page {
                query = query.page(page);
            }
            if let Some(supplier) = supplier {
                query = query.with("supplier", supplier);
            }
            if let Some(warehouse) = warehouse {
                query = query.with("warehouse", warehouse);
            }
            let listing = client.stock_entries.list(&query).await?;
            for entry in &listing.results {
                println!(
                    "{:>6}  {:<12} {:<24} {:<18} {:>14}",
                    entry.id,
                    entry.entry_number,
                    entry.supplier_name,
                    entry.warehouse_name,
                    entry.total_amount,
                );
            }
            println!("{} stock entries", listing.count);
        }
        StockEntriesCommand::Show { id } => {
            let entry = client.stock_entries.get(id).await?;
            println!(
                "{} — {} from {} into {} ({})",
                entry.entry_number,
                entry.total_amount,
                entry.supplier_name,
                entry.warehouse_name,
                entry.created_at,
            );
            for line in entry.items.unwrap_or_default() {
                println!(
                    "  {:<32} {:>8} x {:>12} = {}",
                    line.product.name, line.quantity, line.purchase_price, line.total_price,
                );
            }
        }
        StockEntriesCommand::Delete { id } => {
            client.stock_entries.delete(id).await?;
            println!("deleted stock entry {id}");
        }
    }
    Ok(())
}

async fn run_stock_exits(
    client: &ComptoirClient,
    command: StockExitsCommand,
) -> anyhow::Result<()> {
    match command {
        StockExitsCommand::List {
            page,
            customer,
            warehouse,
        } => {
            let mut query = ListQuery::new();
            if let Some(page) = page {
                query = query.page(page);
            }
            if let Some(customer) = customer {
                query = query.with("customer", customer);
            }
            if let Some(warehouse) = warehouse {
                query = query.with("warehouse", warehouse);
            }
            let listing = client.stock_exits.list(&query).await?;
            for exit in &listing.results {
                println!(
                    "{:>6}  {:<12} {:<24} {:<18} {:>14}",
                    exit.id,
                    exit.exit_number,
                    exit.customer_name.as_deref().unwrap_or("-"),
                    exit.warehouse_name,
                    exit.total_amount,
                );
            }
            println!("{} stock exits", listing.count);
        }
        StockExitsCommand::Show { id } => {
            let exit = client.stock_exits.get(id).await?;
            println!(
                "{} — {} to {} from {} ({})",
                exit.exit_number,
                exit.total_amount,
                exit.customer_name.as_deref().unwrap_or("-"),
                exit.warehouse_name,
                exit.created_at,
            );
            for line in exit.items.unwrap_or_default() {
                println!(
                    "  {:<32} {:>8} x {:>12} = {}",
                    line.product.name, line.quantity, line.sale_price, line.total_price,
                );
            }
        }
        StockExitsCommand::Delete { id } => {
            client.stock_exits.delete(id).await?;
            println!("deleted stock exit {id}");
        }
    }
    Ok(())
}

async fn run_invoices(client: &ComptoirClient, command: InvoicesCommand) -> anyhow::Result<()> {
    match command {
        InvoicesCommand::List => {
            let invoices = client.invoices.list().await?;
            for invoice in &invoices {
                println!(
                    "{:>6}  {:<14} {:<24} {:>14}",
                    invoice.id,
                    invoice.invoice_number,
                    invoice
                        .customer
                        .as_ref()
                        .map(|customer| customer.name.as_str())
                        .or(invoice.customer_name.as_deref())
                        .unwrap_or("-"),
                    invoice.total_amount,
                );
            }
            println!("{} invoices", invoices.len());
        }
        InvoicesCommand::Show { id } => {
            let data = client.invoices.print_data(id).await?;
            println!(
                "{} — {} {} ({})",
                data.invoice.invoice_number, data.invoice.date, data.invoice.time, data.store.name,
            );
            println!("customer: {}", data.customer.name);
            for line in &data.items {
                println!(
                    "  {:<12} {:<28} {:>6} x {:>12} = {}",
                    line.product_reference,
                    line.product_name,
                    line.quantity,
                    line.unit_price,
                    line.total_price,
                );
            }
            println!("total: {}", data.invoice.total_amount);
        }
        InvoicesCommand::Pdf { id, out } => {
            let bytes = client.invoices.download_pdf(id).await?;
            std::fs::write(&out, &bytes)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} ({} bytes)", out.display(), bytes.len());
        }
    }
    Ok(())
}
