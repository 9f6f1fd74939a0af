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

//! Message header shared by every pending-index payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Routing tag identifying which queue and handler a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Ensure the indexer has been started for the request
    PendingIndexTrigger,
    /// Wait for the started indexer run to finish
    PendingIndexCompletion,
}

impl Task {
    /// Returns the wire representation of the task.
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::PendingIndexTrigger => "pending_index_trigger",
            Task::PendingIndexCompletion => "pending_index_completion",
        }
    }

    /// Parses a task from its wire representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_index_trigger" => Some(Task::PendingIndexTrigger),
            "pending_index_completion" => Some(Task::PendingIndexCompletion),
            _ => None,
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Header attached to every message.
///
/// `creation_timestamp` identifies the logical request and never changes.
/// `last_processed_timestamp` and `task` are rewritten by the queue client on
/// every send, and `retries_remaining` only ever goes down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// When the original request was created
    pub creation_timestamp: DateTime<Utc>,
    /// When the message was last sent
    pub last_processed_timestamp: DateTime<Utc>,
    /// How many more times the request may be re-queued
    pub retries_remaining: u32,
    /// Producer-defined document type, carried through verbatim
    #[serde(default)]
    pub data_type: Option<String>,
    /// Queue the message is destined for
    pub task: Task,
}

impl Header {
    /// Creates a header for a brand new request.
    pub fn new(task: Task, retries_remaining: u32) -> Self {
        Self::created_at(task, retries_remaining, Utc::now())
    }

    /// Creates a header for a request created at `now`.
    pub fn created_at(task: Task, retries_remaining: u32, now: DateTime<Utc>) -> Self {
        Self {
            creation_timestamp: now,
            last_processed_timestamp: now,
            retries_remaining,
            data_type: None,
            task,
        }
    }

    /// Returns true if at least one more re-queue is allowed.
    pub fn has_retries(&self) -> bool {
        self.retries_remaining > 0
    }

    /// Marks the header as processed at `now` for delivery to `task`.
    ///
    /// The processed timestamp never falls behind the creation timestamp,
    /// even if the local clock does.
    pub(crate) fn stamp(&mut self, task: Task, now: DateTime<Utc>) {
        self.task = task;
        self.last_processed_timestamp = now.max(self.creation_timestamp);
    }

    /// Spends one retry. Returns false, leaving the header untouched, when
    /// the budget is already zero.
    pub(crate) fn consume_retry(&mut self) -> bool {
        match self.retries_remaining.checked_sub(1) {
            Some(remaining) => {
                self.retries_remaining = remaining;
                true
            }
            None => false,
        }
    }
}
