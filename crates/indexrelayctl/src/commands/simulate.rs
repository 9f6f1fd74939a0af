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

//! Implementation of the `simulate` command.
//!
//! Feeds a message to the handler for its task with the indexer control API
//! replaced by a [`ScriptedIndexer`] and the queue by an [`InMemoryQueue`],
//! then reports what the handler decided and what it would have published.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use indexrelay::handlers::{completion, trigger};
use indexrelay::{
    codec, HandlerError, HandlerOutcome, IndexRelayConfig, IndexerState, IndexerStatus, Payload,
    PendingIndexDispatcher,
};
use indexrelay_testing::{raw_status, InMemoryQueue, PublishedMessage, ScriptedIndexer};
use std::sync::Arc;
use tracing::info;

use super::read_input;

/// Parses a `--status` argument.
fn parse_state(s: &str) -> Result<IndexerState> {
    match s.trim().to_lowercase().as_str() {
        "running" => Ok(IndexerState::Running),
        "success" => Ok(IndexerState::Success),
        "retrigger" => Ok(IndexerState::Retrigger),
        other => Err(anyhow!(
            "Unknown indexer status '{}'. Use running, success or retrigger",
            other
        )),
    }
}

fn parse_started(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid --started timestamp '{}', expected RFC 3339", s))
}

/// What a simulated invocation did.
#[derive(Debug)]
pub struct Simulation {
    pub decision: String,
    pub triggered: bool,
    pub published: Vec<PublishedMessage>,
    pub result: Result<HandlerOutcome, HandlerError>,
}

/// Runs the handler for `payload` against the given indexer state.
pub async fn simulate(
    payload: Payload,
    status: IndexerStatus,
    config: IndexRelayConfig,
) -> Simulation {
    let decision = match &payload {
        Payload::Trigger(p) => format!("{:?}", trigger::decide(&p.header, &status)),
        Payload::Completion(p) => format!("{:?}", completion::decide(&p.header, &status)),
    };

    let indexer = Arc::new(ScriptedIndexer::new());
    indexer.set_execution(
        payload.indexer(),
        raw_status(status.state),
        status.last_start_time,
    );
    let queue = Arc::new(InMemoryQueue::new());
    let dispatcher = PendingIndexDispatcher::new(indexer.clone(), queue.clone(), config);

    let name = payload.indexer().to_string();
    let result = dispatcher.handle(payload).await;

    Simulation {
        decision,
        triggered: indexer.run_count(&name) > 0,
        published: queue.messages(),
        result,
    }
}

/// Run the simulate command.
pub async fn run(
    input: &str,
    status: &str,
    started: Option<&str>,
    config: IndexRelayConfig,
) -> Result<()> {
    let state = parse_state(status)?;
    let started = started.map(parse_started).transpose()?;
    let raw = read_input(input)?;
    let payload = codec::decode(&raw).context("Failed to decode message")?;

    info!(
        task = %payload.kind(),
        indexer = payload.indexer(),
        %state,
        "Simulating handler"
    );

    let simulation = simulate(payload, IndexerStatus::new(state, started), config).await;

    println!("decision:  {}", simulation.decision);
    println!("triggered: {}", simulation.triggered);
    match &simulation.result {
        Ok(HandlerOutcome::Completed { indexer }) => {
            println!("outcome:   completed, indexer '{}' finished a covering run", indexer);
        }
        Ok(HandlerOutcome::Forwarded(_)) => {
            println!("outcome:   forwarded {} message(s)", simulation.published.len());
        }
        Err(HandlerError::DelayProcessing { errors, .. }) => {
            println!(
                "outcome:   terminal failure with {} error(s) in the trail",
                errors.len()
            );
        }
        Err(e) => println!("outcome:   failed: {}", e),
    }

    for message in &simulation.published {
        let visible = message
            .visible_after
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "immediately".to_string());
        println!();
        println!("queue: {}  visible: {}", message.queue, visible);
        let payload = message.payload().context("Published message did not decode")?;
        println!("{}", codec::encode_pretty(&payload)?);
    }

    Ok(())
}
