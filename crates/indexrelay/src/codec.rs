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

//! Wire codec for pending-index messages.
//!
//! Messages travel as JSON objects with `header`, `body` and `errors` keys.
//! Timestamps are RFC 3339 in UTC. The body shape is chosen by
//! `header.task`, and unknown keys anywhere in the document are ignored.
//!
//! ```json
//! {
//!   "header": {
//!     "creation_timestamp": "2025-06-01T10:00:00Z",
//!     "last_processed_timestamp": "2025-06-01T10:00:00Z",
//!     "retries_remaining": 10,
//!     "data_type": null,
//!     "task": "pending_index_trigger"
//!   },
//!   "body": {
//!     "indexer": "docs-indexer",
//!     "blob_storage_url": "https://acct.blob.core.windows.net/docs/a.pdf",
//!     "id_field": null,
//!     "id_name": null
//!   },
//!   "errors": []
//! }
//! ```

use serde::Deserialize;
use std::borrow::Cow;

use crate::error::CodecError;
use crate::models::{Envelope, Header, Payload, PayloadError, Task};

#[derive(Deserialize)]
struct RawEnvelope {
    header: Header,
    body: serde_json::Value,
    #[serde(default)]
    errors: Vec<PayloadError>,
}

/// Returns `payload` with `header.task` matching its variant.
fn tagged(payload: &Payload) -> Cow<'_, Payload> {
    if payload.header().task == payload.kind() {
        Cow::Borrowed(payload)
    } else {
        let mut owned = payload.clone();
        owned.header_mut().task = payload.kind();
        Cow::Owned(owned)
    }
}

/// Encodes a payload as compact JSON.
///
/// The `task` written is always the one matching the body shape, so decoding
/// the result yields the same variant.
pub fn encode(payload: &Payload) -> Result<String, CodecError> {
    Ok(serde_json::to_string(tagged(payload).as_ref())?)
}

/// Encodes a payload as indented JSON, for humans.
pub fn encode_pretty(payload: &Payload) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(tagged(payload).as_ref())?)
}

/// Decodes a payload, selecting the body shape from `header.task`.
pub fn decode(raw: &str) -> Result<Payload, CodecError> {
    let raw: RawEnvelope = serde_json::from_str(raw)?;
    let task = raw.header.task;

    let payload = match task {
        Task::PendingIndexTrigger => Payload::Trigger(Envelope {
            header: raw.header,
            body: serde_json::from_value(raw.body)
                .map_err(|source| CodecError::Body { task, source })?,
            errors: raw.errors,
        }),
        Task::PendingIndexCompletion => Payload::Completion(Envelope {
            header: raw.header,
            body: serde_json::from_value(raw.body)
                .map_err(|source| CodecError::Body { task, source })?,
            errors: raw.errors,
        }),
    };

    Ok(payload)
}
