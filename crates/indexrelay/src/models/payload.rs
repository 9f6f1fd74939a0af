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

//! Payload Model
//!
//! A payload is an [`Envelope`] (header, body, error trail) over one of two
//! body shapes. [`Payload`] is the sum of the two; the variant always agrees
//! with `header.task` once the payload has been sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::header::{Header, Task};

/// Breadcrumb codes appended when a request is re-queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The indexer had not finished a run covering the request
    IndexerNotCompleted,
    /// An older indexer run was still in flight
    IndexerAlreadyRunning,
    /// The last successful run predates the request
    IndexerNotTriggered,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IndexerNotCompleted => "IndexerNotCompleted",
            ErrorCode::IndexerAlreadyRunning => "IndexerAlreadyRunning",
            ErrorCode::IndexerNotTriggered => "IndexerNotTriggered",
        }
    }

    /// Parses a code from its wire representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IndexerNotCompleted" => Some(ErrorCode::IndexerNotCompleted),
            "IndexerAlreadyRunning" => Some(ErrorCode::IndexerAlreadyRunning),
            "IndexerNotTriggered" => Some(ErrorCode::IndexerNotTriggered),
            _ => None,
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a payload's error trail.
///
/// The code stays a plain string on the wire so codes written by a newer
/// producer survive a decode/encode cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadError {
    pub code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl PayloadError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// The typed code, if it is one this version knows about.
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_str(&self.code)
    }
}

/// Body of a trigger message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerBody {
    /// Name of the external indexer resource
    pub indexer: String,
    /// Source document the request is about
    pub blob_storage_url: String,
    #[serde(default)]
    pub id_field: Option<i64>,
    #[serde(default)]
    pub id_name: Option<String>,
}

impl TriggerBody {
    pub fn new(indexer: impl Into<String>, blob_storage_url: impl Into<String>) -> Self {
        Self {
            indexer: indexer.into(),
            blob_storage_url: blob_storage_url.into(),
            id_field: None,
            id_name: None,
        }
    }

    /// Converts into a completion body waiting on a run started at
    /// `indexer_start_time`.
    pub fn into_completion(self, indexer_start_time: DateTime<Utc>) -> CompletionBody {
        CompletionBody {
            indexer: self.indexer,
            blob_storage_url: self.blob_storage_url,
            id_field: self.id_field,
            id_name: self.id_name,
            indexer_start_time,
        }
    }
}

/// Body of a completion message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionBody {
    pub indexer: String,
    pub blob_storage_url: String,
    #[serde(default)]
    pub id_field: Option<i64>,
    #[serde(default)]
    pub id_name: Option<String>,
    /// Recorded when the trigger handler handed the request off
    pub indexer_start_time: DateTime<Utc>,
}

impl CompletionBody {
    /// Drops the recorded start time, returning to the trigger shape.
    pub fn into_trigger(self) -> TriggerBody {
        TriggerBody {
            indexer: self.indexer,
            blob_storage_url: self.blob_storage_url,
            id_field: self.id_field,
            id_name: self.id_name,
        }
    }
}

/// Header, body and error trail of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<B> {
    pub header: Header,
    pub body: B,
    #[serde(default)]
    pub errors: Vec<PayloadError>,
}

impl<B> Envelope<B> {
    pub fn new(header: Header, body: B) -> Self {
        Self {
            header,
            body,
            errors: Vec::new(),
        }
    }

    /// Appends a breadcrumb to the error trail.
    pub fn push_error(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(PayloadError::new(code, message));
    }

    /// Replaces the body, keeping header and error trail untouched.
    ///
    /// `header.task` is not updated; moving between the trigger and
    /// completion shapes goes through [`TriggerPayload::into_completion`] and
    /// [`CompletionPayload::into_trigger`].
    pub fn map_body<C>(self, f: impl FnOnce(B) -> C) -> Envelope<C> {
        Envelope {
            header: self.header,
            body: f(self.body),
            errors: self.errors,
        }
    }
}

pub type TriggerPayload = Envelope<TriggerBody>;
pub type CompletionPayload = Envelope<CompletionBody>;

impl Envelope<TriggerBody> {
    /// Hands the request over to the completion flow.
    pub fn into_completion(self, indexer_start_time: DateTime<Utc>) -> CompletionPayload {
        let mut payload = self.map_body(|body| body.into_completion(indexer_start_time));
        payload.header.task = Task::PendingIndexCompletion;
        payload
    }
}

impl Envelope<CompletionBody> {
    /// Sends the request back to the trigger flow.
    pub fn into_trigger(self) -> TriggerPayload {
        let mut payload = self.map_body(CompletionBody::into_trigger);
        payload.header.task = Task::PendingIndexTrigger;
        payload
    }
}

/// A pending-index message of either kind.
///
/// Decoding goes through [`codec::decode`](crate::codec::decode), which picks
/// the variant from `header.task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Trigger(TriggerPayload),
    Completion(CompletionPayload),
}

impl Payload {
    /// The task this payload's body shape belongs to.
    pub fn kind(&self) -> Task {
        match self {
            Payload::Trigger(_) => Task::PendingIndexTrigger,
            Payload::Completion(_) => Task::PendingIndexCompletion,
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            Payload::Trigger(p) => &p.header,
            Payload::Completion(p) => &p.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut Header {
        match self {
            Payload::Trigger(p) => &mut p.header,
            Payload::Completion(p) => &mut p.header,
        }
    }

    pub fn errors(&self) -> &[PayloadError] {
        match self {
            Payload::Trigger(p) => &p.errors,
            Payload::Completion(p) => &p.errors,
        }
    }

    pub fn indexer(&self) -> &str {
        match self {
            Payload::Trigger(p) => &p.body.indexer,
            Payload::Completion(p) => &p.body.indexer,
        }
    }

    pub fn blob_storage_url(&self) -> &str {
        match self {
            Payload::Trigger(p) => &p.body.blob_storage_url,
            Payload::Completion(p) => &p.body.blob_storage_url,
        }
    }
}

impl From<TriggerPayload> for Payload {
    fn from(payload: TriggerPayload) -> Self {
        Payload::Trigger(payload)
    }
}

impl From<CompletionPayload> for Payload {
    fn from(payload: CompletionPayload) -> Self {
        Payload::Completion(payload)
    }
}

impl std::str::FromStr for Payload {
    type Err = crate::error::CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::codec::decode(s)
    }
}
