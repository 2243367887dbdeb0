//! CLI entry point for Graphwatch.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use graphwatch_client::{ConnectionRegistry, ProfileStore};
use graphwatch_core::{ConnectConfig, Params, Scheme};
use graphwatch_query::{run_read, run_write, QueryPhase};

#[derive(Parser)]
#[command(name = "graphwatch")]
#[command(about = "Observable Cypher queries against Neo4j")]
struct Cli {
    /// Config file prefix (default: graphwatch).
    #[arg(short, long, default_value = "graphwatch")]
    config: String,

    /// Path of the saved connection profile.
    #[arg(long, default_value = ".graphwatch/profile.json")]
    profile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify connectivity and save the connection profile.
    Connect {
        /// Connection scheme: neo4j, neo4j+s, neo4j+ssc, bolt, bolt+s, bolt+ssc.
        #[arg(long)]
        scheme: Option<Scheme>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        /// Ambient default database for later queries.
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Run a Cypher query and print its rows as JSON lines.
    Run {
        cypher: String,

        /// Target database (falls back to the saved ambient default).
        #[arg(long)]
        database: Option<String>,

        /// Open the session for read-write use.
        #[arg(long)]
        write: bool,

        /// Query parameter as key=value; the value is parsed as JSON,
        /// falling back to a plain string.
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },

    /// List populated roles with their members.
    Roles,

    /// List user accounts.
    Users,

    /// List databases.
    Databases,

    /// Print the normalized graph schema as JSON.
    Schema {
        #[arg(long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let store = ProfileStore::new(&cli.profile);

    match cli.command {
        Command::Connect {
            scheme,
            host,
            port,
            username,
            password,
            database,
        } => {
            let mut config = ConnectConfig::load(&cli.config);
            if let Some(scheme) = scheme {
                config.scheme = scheme;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(username) = username {
                config.username = username;
            }
            if let Some(password) = password {
                config.password = password;
            }
            if database.is_some() {
                config.database = database;
            }

            let uri = config.uri();
            let registry = ConnectionRegistry::with_profile_store(store);
            registry.establish(config).await?;
            println!("connected to {uri}; profile saved to {}", cli.profile);
        }

        command => {
            let registry = Arc::new(reconnect(&cli.config, &store).await?);
            match command {
                Command::Run {
                    cypher,
                    database,
                    write,
                    params,
                } => {
                    let params = parse_params(&params)?;
                    let mut handle = if write {
                        run_write(&registry, cypher, params, database)?
                    } else {
                        run_read(&registry, cypher, params, database)?
                    };

                    let state = handle.settled().await;
                    if state.phase() == QueryPhase::Failed {
                        let error = state
                            .error()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "unknown failure".into());
                        anyhow::bail!("query failed: {error}");
                    }
                    if let Some(rows) = state.rows() {
                        for row in rows {
                            println!("{}", row.to_object());
                        }
                    }
                }
                Command::Roles => print_json(&graphwatch_views::list_roles(&registry).await?)?,
                Command::Users => print_json(&graphwatch_views::list_users(&registry).await?)?,
                Command::Databases => {
                    print_json(&graphwatch_views::list_databases(&registry).await?)?
                }
                Command::Schema { database } => {
                    print_json(&graphwatch_views::fetch_schema(&registry, database).await?)?
                }
                Command::Connect { .. } => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}

/// Re-establish a connection for a query command: the saved profile from
/// the last successful connect wins, then file/env configuration.
async fn reconnect(
    config_prefix: &str,
    store: &ProfileStore,
) -> anyhow::Result<ConnectionRegistry> {
    let config = match store.load() {
        Ok(Some(profile)) => profile.config,
        Ok(None) => ConnectConfig::load(config_prefix),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable connection profile");
            ConnectConfig::load(config_prefix)
        }
    };

    let registry = ConnectionRegistry::new();
    registry.establish(config).await?;
    Ok(registry)
}

fn parse_params(raw: &[String]) -> anyhow::Result<Params> {
    let mut params = Params::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid parameter {pair:?}: expected key=value"))?;
        let value: serde_json::Value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        params = params.with(key, value);
    }
    Ok(params)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
