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

//! Creating new pending-index requests.

use tracing::info;

use crate::error::QueueError;
use crate::models::{Envelope, Header, Payload, Task, TriggerBody, TriggerPayload};
use crate::queue::{MessageQueueClient, OutgoingMessage};
use crate::retry::RetryPolicy;

/// A request to get a document indexed.
///
/// ```rust
/// use indexrelay::{PendingIndexRequest, RetryPolicy};
///
/// let payload = PendingIndexRequest::new("docs-indexer", "https://acct.blob/docs/a.pdf")
///     .id(7, "contract_id")
///     .into_payload(&RetryPolicy::default());
///
/// assert_eq!(payload.header.retries_remaining, 10);
/// assert!(payload.errors.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIndexRequest {
    body: TriggerBody,
    data_type: Option<String>,
}

impl PendingIndexRequest {
    pub fn new(indexer: impl Into<String>, blob_storage_url: impl Into<String>) -> Self {
        Self {
            body: TriggerBody::new(indexer, blob_storage_url),
            data_type: None,
        }
    }

    /// Attaches producer identifiers, passed through untouched.
    pub fn id(mut self, id_field: i64, id_name: impl Into<String>) -> Self {
        self.body.id_field = Some(id_field);
        self.body.id_name = Some(id_name.into());
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Builds the initial trigger payload with a full retry budget.
    pub fn into_payload(self, policy: &RetryPolicy) -> TriggerPayload {
        let mut header = Header::new(Task::PendingIndexTrigger, policy.initial_budget());
        header.data_type = self.data_type;
        Envelope::new(header, self.body)
    }

    /// Publishes the initial trigger message, immediately and without
    /// spending a retry.
    pub async fn submit(self, queue: &MessageQueueClient) -> Result<OutgoingMessage, QueueError> {
        let payload = self.into_payload(&queue.config().retry_policy());
        info!(
            indexer = %payload.body.indexer,
            blob_storage_url = %payload.body.blob_storage_url,
            "Submitting pending index request"
        );
        queue
            .deliver(OutgoingMessage::immediate(Payload::Trigger(payload)))
            .await
    }
}
