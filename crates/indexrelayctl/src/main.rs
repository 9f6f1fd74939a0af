/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! indexrelayctl - Command-line tools for indexrelay pending-index messages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexrelay::IndexRelayConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// indexrelayctl - Inspect, build and dry-run pending-index messages
#[derive(Parser)]
#[command(name = "indexrelayctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and inspect pending-index payloads
    Payload {
        #[command(subcommand)]
        command: PayloadCommands,
    },

    /// Print the re-queue backoff for every retry budget value
    Backoff,

    /// Run the matching handler against a scripted indexer without touching
    /// any real queue
    Simulate {
        /// Message file, or "-" for stdin
        input: String,

        /// Indexer state to report: running, success or retrigger
        #[arg(long)]
        status: String,

        /// Start time of the indexer's last run (RFC 3339)
        #[arg(long)]
        started: Option<String>,
    },
}

#[derive(Subcommand)]
enum PayloadCommands {
    /// Print a fresh trigger payload
    New {
        /// Name of the indexer to run
        #[arg(long)]
        indexer: String,

        /// URL of the blob to index
        #[arg(long)]
        blob_url: String,

        /// Producer identifier value
        #[arg(long, requires = "id_name")]
        id_field: Option<i64>,

        /// Producer identifier name
        #[arg(long, requires = "id_field")]
        id_name: Option<String>,

        /// Producer document type
        #[arg(long)]
        data_type: Option<String>,
    },

    /// Decode a message and summarise its header, backoff and error trail
    Inspect {
        /// Message file, or "-" for stdin
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = IndexRelayConfig::from_env().context("Invalid indexrelay configuration")?;

    match cli.command {
        Commands::Payload { command } => match command {
            PayloadCommands::New {
                indexer,
                blob_url,
                id_field,
                id_name,
                data_type,
            } => {
                let request = commands::payload::NewPayload {
                    indexer,
                    blob_url,
                    id: id_field.zip(id_name),
                    data_type,
                };
                commands::payload::new(request, &config)?;
            }
            PayloadCommands::Inspect { input } => {
                commands::payload::inspect(&input, &config)?;
            }
        },
        Commands::Backoff => commands::backoff::run(&config),
        Commands::Simulate {
            input,
            status,
            started,
        } => {
            commands::simulate::run(&input, &status, started.as_deref(), config).await?;
        }
    }

    Ok(())
}
