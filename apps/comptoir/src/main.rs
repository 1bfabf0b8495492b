mod commands;
mod telemetry;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "comptoir",
    about = "Inventory, sales and accounting client for the Comptoir backend"
)]
pub struct Cli {
    /// Backend base URL, e.g. http://localhost:8000/api
    #[arg(long, env = "COMPTOIR_API_URL")]
    pub api_url: Option<String>,

    /// Store the session belongs to
    #[arg(long, env = "COMPTOIR_STORE")]
    pub store: Option<String>,

    #[arg(long, env = "COMPTOIR_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "COMPTOIR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a session and print the signed-in user
    Login,
    /// Close the current session
    Logout,
    /// Print the signed-in user
    Whoami,
    #[command(subcommand)]
    Products(ProductsCommand),
    #[command(subcommand)]
    Customers(CustomersCommand),
    #[command(subcommand)]
    Suppliers(SuppliersCommand),
    #[command(subcommand)]
    Warehouses(WarehousesCommand),
    #[command(subcommand)]
    Accounts(AccountsCommand),
    #[command(subcommand)]
    StockEntries(StockEntriesCommand),
    #[command(subcommand)]
    StockExits(StockExitsCommand),
    #[command(subcommand)]
    Invoices(InvoicesCommand),
    /// List financial transactions
    Transactions {
        #[arg(long)]
        account: Option<i64>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Print aggregated stock statistics
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum ProductsCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Create {
        #[arg(long)]
        reference: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "piece")]
        unit: String,
        #[arg(long, default_value_t = 0.0)]
        min_stock_alert: f64,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Products below their stock alert threshold
    LowStock,
}

#[derive(Subcommand, Debug)]
pub enum CustomersCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum SuppliersCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum WarehousesCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        /// bank or cash
        #[arg(long = "type")]
        account_type: String,
        #[arg(long)]
        balance: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Movement ledger for one account
    Ledger {
        id: i64,
        #[arg(long)]
        page: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StockEntriesCommand {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        supplier: Option<i64>,
        #[arg(long)]
        warehouse: Option<i64>,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum StockExitsCommand {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        customer: Option<i64>,
        #[arg(long)]
        warehouse: Option<i64>,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum InvoicesCommand {
    List,
    Show {
        id: i64,
    },
    /// Download the rendered PDF
    Pdf {
        id: i64,
        #[arg(long, default_value = "facture.pdf")]
        out: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    telemetry::init_tracing(&filter);

    if let Err(err) = commands::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
