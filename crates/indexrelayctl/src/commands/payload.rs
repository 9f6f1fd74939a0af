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

//! Implementation of the `payload new` and `payload inspect` commands.

use anyhow::{Context, Result};
use indexrelay::{codec, IndexRelayConfig, Payload, PendingIndexRequest, RetryPolicy};
use std::fmt::Write;

use super::read_input;

/// Arguments of `payload new`.
#[derive(Debug, Clone)]
pub struct NewPayload {
    pub indexer: String,
    pub blob_url: String,
    pub id: Option<(i64, String)>,
    pub data_type: Option<String>,
}

impl NewPayload {
    fn into_request(self) -> PendingIndexRequest {
        let mut request = PendingIndexRequest::new(self.indexer, self.blob_url);
        if let Some((id_field, id_name)) = self.id {
            request = request.id(id_field, id_name);
        }
        if let Some(data_type) = self.data_type {
            request = request.data_type(data_type);
        }
        request
    }
}

/// Run the `payload new` command.
pub fn new(args: NewPayload, config: &IndexRelayConfig) -> Result<()> {
    let payload = Payload::Trigger(args.into_request().into_payload(&config.retry_policy()));
    let json = codec::encode_pretty(&payload).context("Failed to encode payload")?;
    println!("{}", json);
    Ok(())
}

/// Run the `payload inspect` command.
pub fn inspect(input: &str, config: &IndexRelayConfig) -> Result<()> {
    let raw = read_input(input)?;
    let payload = codec::decode(&raw).context("Failed to decode message")?;
    print!("{}", describe(&payload, &config.retry_policy())?);
    Ok(())
}

/// Human-readable summary of a payload.
fn describe(payload: &Payload, policy: &RetryPolicy) -> Result<String, std::fmt::Error> {
    let header = payload.header();
    let mut out = String::new();

    writeln!(out, "task:               {}", header.task)?;
    writeln!(out, "indexer:            {}", payload.indexer())?;
    writeln!(out, "blob_storage_url:   {}", payload.blob_storage_url())?;
    if let Some(data_type) = &header.data_type {
        writeln!(out, "data_type:          {}", data_type)?;
    }
    writeln!(out, "created:            {}", header.creation_timestamp)?;
    writeln!(out, "last processed:     {}", header.last_processed_timestamp)?;
    if let Payload::Completion(completion) = payload {
        writeln!(
            out,
            "indexer started:    {}",
            completion.body.indexer_start_time
        )?;
    }
    writeln!(out, "retries remaining:  {}", header.retries_remaining)?;

    if header.has_retries() {
        let remaining = header.retries_remaining;
        writeln!(
            out,
            "next backoff:       {} minutes (visible at {} if re-queued now)",
            policy.backoff_minutes(remaining),
            policy.scheduled_time(remaining, chrono::Utc::now())
        )?;
    } else {
        writeln!(out, "next backoff:       none, budget exhausted")?;
    }

    writeln!(out, "errors:             {}", payload.errors().len())?;
    for error in payload.errors() {
        writeln!(
            out,
            "  {}  {:<24} {}",
            error.timestamp, error.code, error.message
        )?;
    }
    Ok(out)
}
