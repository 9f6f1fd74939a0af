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

//! # indexrelay
//!
//! Message-driven reconciliation between a document pipeline and an external
//! search indexer.
//!
//! When a document lands in storage, an indexer has to run before the
//! document becomes searchable. indexrelay drives that through two queues:
//!
//! - **`pending_index_trigger`** makes sure a run covering the request has
//!   been started ([`PendingIndexTriggerHandler`]).
//! - **`pending_index_completion`** waits for that run to finish
//!   ([`PendingIndexCompletionHandler`]).
//!
//! Messages move between the queues with delayed delivery. Every re-queue
//! spends one unit of a retry budget and waits `2^(11 - budget)` minutes;
//! when the budget is gone the handler fails with
//! [`HandlerError::DelayProcessing`] and the runtime dead-letters the
//! message, error trail included.
//!
//! The indexer control API and the message queue are injected through the
//! [`IndexerStatusService`] and [`QueuePublisher`] traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use indexrelay::{IndexRelayConfig, PendingIndexDispatcher, PendingIndexRequest};
//! use std::sync::Arc;
//!
//! let config = IndexRelayConfig::from_env()?;
//! let dispatcher = PendingIndexDispatcher::new(Arc::new(search), Arc::new(bus), config);
//!
//! // On blob created:
//! PendingIndexRequest::new("docs-indexer", blob_url)
//!     .submit(dispatcher.queue())
//!     .await?;
//!
//! // On every delivered message:
//! dispatcher.dispatch(&body).await?;
//! ```

pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod indexer;
pub mod models;
pub mod queue;
pub mod request;
pub mod retry;

pub use config::{IndexRelayConfig, IndexRelayConfigBuilder};
pub use dispatcher::PendingIndexDispatcher;
pub use error::{CodecError, ConfigError, HandlerError, IndexerError, QueueError};
pub use handlers::{
    CompletionDecision, HandlerOutcome, PendingIndexCompletionHandler, PendingIndexTriggerHandler,
    TriggerDecision,
};
pub use indexer::{
    IndexerExecution, IndexerState, IndexerStatus, IndexerStatusProbe, IndexerStatusService,
};
pub use models::{
    CompletionBody, CompletionPayload, Envelope, ErrorCode, Header, Payload, PayloadError, Task,
    TriggerBody, TriggerPayload,
};
pub use queue::{MessageQueueClient, OutgoingMessage, QueuePublisher};
pub use request::PendingIndexRequest;
pub use retry::{RetryPolicy, BACKOFF_BASE_EXPONENT, INITIAL_RETRY_BUDGET};
