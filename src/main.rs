use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use transfer_ledger::application::context::AppContext;
use transfer_ledger::application::dispatcher::Dispatcher;
use transfer_ledger::config::{Config, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_WORKERS};
use transfer_ledger::interfaces::csv::account_writer::{AccountWriter, LedgerWriter};
use transfer_ledger::interfaces::csv::command_reader::CommandReader;
use transfer_ledger::telemetry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "LEDGER_DB_PATH")]
    db_path: Option<PathBuf>,

    /// How long a transfer waits for an account lock, in milliseconds.
    #[arg(long, global = true, env = "LEDGER_LOCK_TIMEOUT_MS", default_value_t = DEFAULT_LOCK_TIMEOUT_MS)]
    lock_timeout_ms: u64,

    /// Maximum number of transfers processed concurrently.
    #[arg(long, global = true, env = "LEDGER_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Emit logs as JSON.
    #[arg(long, global = true, env = "LEDGER_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a CSV command file and print the resulting accounts
    Process {
        /// Input CSV with columns type, account, destination, amount
        input: PathBuf,
    },
    /// Open an account with an initial balance
    CreateAccount {
        account_id: i64,
        initial_balance: String,
    },
    /// Print an account as JSON
    GetAccount { account_id: i64 },
    /// Move funds between two accounts
    Transfer {
        source_id: i64,
        destination_id: i64,
        amount: String,
    },
    /// Print every committed transfer as CSV
    Ledger,
}

impl Cli {
    fn config(&self) -> Config {
        Config::default()
            .with_db_path(self.db_path.clone())
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
            .with_workers(self.workers)
            .with_log_json(self.log_json)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    telemetry::init(config.log_json);

    let ctx = AppContext::build(config).into_diagnostic()?;

    match cli.command {
        Commands::Process { input } => process(ctx, input).await,
        Commands::CreateAccount {
            account_id,
            initial_balance,
        } => {
            let account = ctx
                .accounts
                .create_account(account_id, &initial_balance)
                .await
                .into_diagnostic()?;
            print_json(&account)
        }
        Commands::GetAccount { account_id } => {
            let account = ctx.accounts.get_account(account_id).await.into_diagnostic()?;
            print_json(&account)
        }
        Commands::Transfer {
            source_id,
            destination_id,
            amount,
        } => {
            let record = ctx
                .transactions
                .submit_transfer(source_id, destination_id, &amount)
                .await
                .into_diagnostic()?;
            print_json(&record)
        }
        Commands::Ledger => {
            let transfers = ctx.transactions.list_transfers().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = LedgerWriter::new(stdout.lock());
            writer.write_transfers(transfers).into_diagnostic()
        }
    }
}

async fn process(ctx: AppContext, input: PathBuf) -> Result<()> {
    let file = File::open(&input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut dispatcher = Dispatcher::new(ctx.clone());

    for command in reader.commands() {
        match command {
            Ok(command) => dispatcher.dispatch(command).await,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable command");
                dispatcher.record_rejected();
            }
        }
    }

    let summary = dispatcher.finish().await;
    tracing::info!(
        applied = summary.applied,
        rejected = summary.rejected,
        input = %input.display(),
        "command file processed"
    );

    let accounts = ctx.accounts.list_accounts().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).into_diagnostic()?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").into_diagnostic()
}
