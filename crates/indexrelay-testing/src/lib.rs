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

//! Test utilities for indexrelay.
//!
//! In-memory stand-ins for the indexer control API and the message queue,
//! plus a harness that loops published messages back into the dispatcher so
//! a request can be driven through its whole lifecycle without any cloud
//! service.
//!
//! ```rust,ignore
//! let harness = LoopbackHarness::new();
//! harness.indexer.on_run(RunBehavior::StartRun);
//! harness.submit(PendingIndexRequest::new("docs", url)).await?;
//! let results = harness.run_until_settled(20).await;
//! ```

pub mod harness;
pub mod indexer;
pub mod queue;

pub use harness::LoopbackHarness;
pub use indexer::{raw_status, RunBehavior, ScriptedIndexer};
pub use queue::{InMemoryQueue, PublishedMessage};
