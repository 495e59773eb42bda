//! `queuectl`: the operator binary for the durable shell-command job queue.
//!
//! Owns everything spec.md §1 carves out of the core engine: argument
//! parsing, pretty-printing, process spawning, signal handling, and log
//! transport. All of it talks to `queuectl-core`/`queuectl-sqlite` through
//! the `Store` trait — this crate adds no persistence logic of its own.

mod cli;
mod commands;
mod error;
mod paths;
mod worker;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands, ConfigAction, DlqAction, WorkerAction};
use error::CliError;
use queuectl_sqlite::SqliteStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = cli.db_path.clone().unwrap_or_else(paths::default_db_path);
    paths::ensure_parent(&db_path).map_err(CliError::Other)?;
    let store = SqliteStore::connect(&db_path)
        .await
        .map_err(CliError::Other)?;
    let store: Arc<dyn queuectl_core::Store> = Arc::new(store);

    match cli.command {
        Commands::Enqueue { job_json } => {
            let msg = commands::enqueue(store.as_ref(), &job_json).await?;
            println!("{msg}");
        }

        Commands::Status { json } => {
            let report = commands::status(store.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report).expect("status serializes"));
            } else {
                print!("{}", commands::render_status(&report));
            }
        }

        Commands::List { state, json } => {
            let jobs = commands::list(store.as_ref(), state.as_deref()).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&commands::jobs_to_json(&jobs)).expect("jobs serialize")
                );
            } else {
                for job in &jobs {
                    println!("{}", commands::render_job_line(job));
                }
            }
        }

        Commands::Dlq { action } => match action {
            DlqAction::List { json } => {
                let dead = commands::dlq_list(store.as_ref()).await?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&commands::jobs_to_json(&dead))
                            .expect("jobs serialize")
                    );
                } else if dead.is_empty() {
                    println!("DLQ empty");
                } else {
                    for job in &dead {
                        println!("{}", commands::render_dlq_line(job));
                    }
                }
            }
            DlqAction::Retry { id } => {
                let ok = commands::dlq_retry(store.as_ref(), &id).await?;
                println!("{}", if ok { "OK" } else { "Not found in DLQ" });
            }
        },

        Commands::Worker { action } => match action {
            WorkerAction::Start { count } => {
                println!("Starting {count} worker(s) (Ctrl+C to stop here)...");
                worker::supervise(&db_path, count).await.map_err(CliError::Other)?;
            }
            WorkerAction::Stop => {
                commands::worker_stop(store.as_ref()).await?;
                println!("Stop flag set. Workers will exit gracefully.");
            }
            WorkerAction::ClearStop => {
                commands::worker_clear_stop(store.as_ref()).await?;
                println!("Cleared stop flag. You can start workers again.");
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Get { key } => match key {
                Some(key) => {
                    let val = commands::config_get_one(store.as_ref(), &key).await?;
                    println!("{}", val.as_deref().unwrap_or("(not set)"));
                }
                None => {
                    for (k, v) in commands::config_get_all(store.as_ref()).await? {
                        println!("{k}={v}");
                    }
                }
            },
            ConfigAction::Set { key, value } => {
                let msg = commands::config_set(store.as_ref(), &key, &value).await?;
                println!("{msg}");
            }
        },

        Commands::WorkerRun => {
            worker::run(store).await.map_err(CliError::Other)?;
        }
    }

    Ok(())
}
