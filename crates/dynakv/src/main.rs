//! dynakv CLI entry point.

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynakv::cli::table::TableAction;
use dynakv::cli::{Cli, Commands, OutputFormat};
use dynakv::output::{json, pretty};
use dynakv::storage::dynamodb::table;
use dynakv::{AwsClient, DriverConfig, DriverResolver, ServiceRegistry, DEFAULT_AWS_CLIENT_KEY};
use dynakv_core::kv::{HashFields, KvValue, WriteOutcome};

fn emit(format: OutputFormat, value: Value, text: String) {
    match format {
        OutputFormat::Json => println!("{}", json::format_json(&value)),
        OutputFormat::Pretty => println!("{text}"),
    }
}

fn emit_outcome(format: OutputFormat, outcome: WriteOutcome) -> anyhow::Result<()> {
    emit(format, json::outcome_json(&outcome), pretty::format_outcome(&outcome));
    outcome.into_result().context("write failed")
}

fn load_config(cli: &Cli) -> anyhow::Result<DriverConfig> {
    let config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DriverConfig::from_json(&contents)?
        }
        None => DriverConfig::from_env(),
    };
    Ok(cli.apply_overrides(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynakv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let registry = ServiceRegistry::new().with_client(
        DEFAULT_AWS_CLIENT_KEY,
        AwsClient::from_options(&cli.client_options()).await,
    );
    let connected = DriverResolver::new(&registry).connect(&config).await?;
    let driver = connected.driver;
    let format = cli.format;

    match cli.command {
        Commands::Get { key } => {
            let lookup = driver.get(&key).await?;
            emit(format, json::lookup_json(&lookup), pretty::format_lookup(&lookup));
        }
        Commands::Set { key, value, int } => {
            let value = if int {
                KvValue::Int(
                    value
                        .parse()
                        .with_context(|| format!("`{value}` is not an integer"))?,
                )
            } else {
                KvValue::from(value)
            };
            emit_outcome(format, driver.set(&key, &value, None).await)?;
        }
        Commands::Exists { key } => {
            let exists = driver.exists(&key).await?;
            emit(format, Value::Bool(exists), exists.to_string());
        }
        Commands::Del { key } => {
            emit_outcome(format, driver.del(&key).await)?;
        }
        Commands::Incr { key } => {
            let value = driver.incr(&key).await?;
            emit(format, Value::from(value), format!("(integer) {value}"));
        }
        Commands::Hget { key, field } => {
            let value = driver.h_get(&key, &field).await?;
            emit(
                format,
                json::field_json(value.as_deref()),
                pretty::format_field(value.as_deref()),
            );
        }
        Commands::Hset { key, field, value } => {
            emit_outcome(format, driver.h_set(&key, &field, value.as_bytes()).await)?;
        }
        Commands::Hmset { key, fields } => {
            let fields: HashFields = fields
                .into_iter()
                .map(|(field, value)| (field, value.into_bytes()))
                .collect();
            emit_outcome(format, driver.hm_set(&key, &fields).await)?;
        }
        Commands::Hgetall { key } => {
            let fields = driver.h_get_all(&key).await?;
            emit(format, json::fields_json(&fields), pretty::format_fields(&fields));
        }
        Commands::Hexists { key, field } => {
            let exists = driver.h_exists(&key, &field).await?;
            emit(format, Value::Bool(exists), exists.to_string());
        }
        Commands::Keys { pattern } => {
            let keys = driver.keys(&pattern).await?;
            emit(format, Value::from(keys.clone()), pretty::format_keys(&keys));
        }
        Commands::Table(table_cmd) => match table_cmd.action {
            TableAction::Create => {
                table::create_table(&connected.client, &connected.table_name).await?;
                emit(
                    format,
                    serde_json::json!({ "created": connected.table_name }),
                    format!("Created table {}", connected.table_name),
                );
            }
            TableAction::Describe => {
                match table::describe_table(&connected.client, &connected.table_name).await? {
                    Some(summary) => emit(
                        format,
                        serde_json::to_value(&summary)?,
                        pretty::format_table(&summary),
                    ),
                    None => bail!("table {} does not exist", connected.table_name),
                }
            }
        },
    }

    Ok(())
}
