//! `gerencia`: command-line caller for the credential store and order ledger.
//!
//! Logs go to stderr; each subcommand prints its result as JSON on stdout.
//! The exit status is non-zero when the operation failed or found nothing.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gerencia_core::payload::{NewAccount, NewOrderBatch};
use gerencia_core::types::DbId;
use gerencia_db::{CredentialStore, DbPool, OrderLedger};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;

use cli::{Cli, Command, CreateAccountArgs, InsertOrderArgs};
use config::{AppConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);
    tracing::debug!(db = ?config.db, rounds = config.hash_params.rounds, "Loaded configuration");

    // --- Database ---
    let pool = gerencia_db::connect_with_retry(&config.db)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let credentials = CredentialStore::with_params(pool.clone(), config.hash_params);
    let ledger = OrderLedger::new(pool.clone());

    credentials
        .initialize()
        .await
        .context("Failed to create the funcionario table")?;
    ledger
        .initialize()
        .await
        .context("Failed to create the gerencia_pedidos table")?;

    let succeeded = run(cli.command, &pool, &credentials, &ledger).await?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gerencia=info,gerencia_db=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Dispatch one subcommand. Returns `false` when the target was absent or
/// the credentials did not match.
async fn run(
    command: Command,
    pool: &DbPool,
    credentials: &CredentialStore,
    ledger: &OrderLedger,
) -> Result<bool> {
    match command {
        Command::Init => {
            print_json(&json!({ "tables": ["funcionario", "gerencia_pedidos"] }))?;
            Ok(true)
        }
        Command::Health => {
            let version = gerencia_db::health_check(pool).await?;
            print_json(&json!({ "version": version }))?;
            Ok(true)
        }
        Command::CreateAccount(args) => {
            let id = create_account(credentials, args).await?;
            print_json(&json!({ "id": id }))?;
            Ok(true)
        }
        Command::LookupEmail { usuario } => {
            let email = credentials.find_email(&usuario).await?;
            print_json(&json!({ "usuario": usuario, "email": email }))?;
            Ok(email.is_some())
        }
        Command::Verify { usuario, senha } => {
            let valid = credentials.check_credentials(&usuario, &senha).await?;
            print_json(&json!({ "usuario": usuario, "valid": valid }))?;
            Ok(valid)
        }
        Command::ResetPassword { email } => {
            let reset = credentials.reset_password(&email).await?;
            print_json(&reset)?;
            Ok(reset.is_some())
        }
        Command::ChangePassword { usuario, senha } => {
            credentials.change_password(&usuario, &senha).await?;
            print_json(&json!({ "usuario": usuario, "changed": true }))?;
            Ok(true)
        }
        Command::InsertOrder(args) => {
            let id = insert_order(ledger, args).await?;
            print_json(&json!({ "id": id }))?;
            Ok(true)
        }
        Command::GetOrder { id } => {
            let batch = ledger.find_by_id(id).await?;
            print_json(&batch)?;
            Ok(batch.is_some())
        }
        Command::ListOrders => {
            let batches = ledger.get_all().await?;
            print_json(&batches)?;
            Ok(true)
        }
    }
}

async fn create_account(credentials: &CredentialStore, args: CreateAccountArgs) -> Result<DbId> {
    let id = match args.json {
        Some(raw) => credentials.create_account_json(&raw).await?,
        None => {
            let account = NewAccount {
                username: args.usuario.context("--usuario is required")?,
                password: args.senha.context("--senha is required")?,
                email: args.email.context("--email is required")?,
            };
            credentials.create_account(&account).await?
        }
    };
    Ok(id)
}

async fn insert_order(ledger: &OrderLedger, args: InsertOrderArgs) -> Result<DbId> {
    let id = match args.json {
        Some(raw) => ledger.insert_json(&raw).await?,
        None => {
            let batch = NewOrderBatch {
                item_ids: args.pedidos,
                date: args.data.context("--data is required")?,
                time: args.hora.context("--hora is required")?,
            };
            ledger.insert(&batch).await?
        }
    };
    Ok(id)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
