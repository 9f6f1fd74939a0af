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

//! Indexer status probing.
//!
//! [`IndexerStatusService`] is the seam to the managed search-indexer control
//! API. [`IndexerStatusProbe`] wraps it and reduces the raw last-execution
//! status to the three states the handlers reason about. Status lookups
//! never fail: service errors are logged and folded into a conservative
//! answer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::IndexerError;

/// Raw status string of a run that is still going.
pub const STATUS_IN_PROGRESS: &str = "inProgress";
/// Raw status string of a completed run.
pub const STATUS_SUCCESS: &str = "success";
/// Raw status string of a run that hit transient errors but finished.
pub const STATUS_TRANSIENT_FAILURE: &str = "transientFailure";

/// Last execution of an indexer as reported by the control API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerExecution {
    /// Raw status, e.g. `inProgress`, `success`, `transientFailure`, `error`
    pub status: String,
    pub start_time: Option<DateTime<Utc>>,
}

impl IndexerExecution {
    pub fn new(status: impl Into<String>, start_time: Option<DateTime<Utc>>) -> Self {
        Self {
            status: status.into(),
            start_time,
        }
    }
}

/// Control API of a managed search indexer.
#[async_trait]
pub trait IndexerStatusService: Send + Sync {
    /// Returns the indexer's most recent execution, or `None` if it has
    /// never run.
    async fn last_execution(&self, indexer: &str) -> Result<Option<IndexerExecution>, IndexerError>;

    /// Asks the service to start a run. Returns once the request is
    /// accepted, not when the run finishes.
    async fn run(&self, indexer: &str) -> Result<(), IndexerError>;
}

/// Classified state of an indexer's last run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexerState {
    /// A run is in progress
    Running,
    /// The last run finished (transient failures included)
    Success,
    /// The last run failed hard; the indexer must be started again
    Retrigger,
}

impl IndexerState {
    /// Classifies a raw execution status string.
    pub fn classify(status: &str) -> Self {
        if status.eq_ignore_ascii_case(STATUS_IN_PROGRESS) {
            IndexerState::Running
        } else if status.eq_ignore_ascii_case(STATUS_SUCCESS)
            || status.eq_ignore_ascii_case(STATUS_TRANSIENT_FAILURE)
        {
            IndexerState::Success
        } else {
            IndexerState::Retrigger
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerState::Running => "running",
            IndexerState::Success => "success",
            IndexerState::Retrigger => "retrigger",
        }
    }
}

impl std::fmt::Display for IndexerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the probe learned about an indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerStatus {
    pub state: IndexerState,
    pub last_start_time: Option<DateTime<Utc>>,
}

impl IndexerStatus {
    pub fn new(state: IndexerState, last_start_time: Option<DateTime<Utc>>) -> Self {
        Self {
            state,
            last_start_time,
        }
    }

    /// True if the observed run started strictly after `reference`. An
    /// unknown start time never counts as newer.
    pub fn started_after(&self, reference: DateTime<Utc>) -> bool {
        self.last_start_time
            .map(|started| started > reference)
            .unwrap_or(false)
    }
}

/// Best-effort view of an [`IndexerStatusService`].
#[derive(Clone)]
pub struct IndexerStatusProbe {
    service: Arc<dyn IndexerStatusService>,
}

impl IndexerStatusProbe {
    pub fn new(service: Arc<dyn IndexerStatusService>) -> Self {
        Self { service }
    }

    /// Queries and classifies the indexer's last run.
    ///
    /// An indexer that has never run is reported as `Retrigger`. If the
    /// service cannot be reached the indexer is reported as `Running` with
    /// an unknown start time, which makes both handlers re-queue.
    pub async fn get_status(&self, indexer: &str) -> IndexerStatus {
        match self.service.last_execution(indexer).await {
            Ok(Some(execution)) => {
                let status = IndexerStatus::new(
                    IndexerState::classify(&execution.status),
                    execution.start_time,
                );
                debug!(
                    indexer,
                    raw_status = %execution.status,
                    state = %status.state,
                    start_time = ?status.last_start_time,
                    "Probed indexer status"
                );
                status
            }
            Ok(None) => {
                debug!(indexer, "Indexer has no recorded execution");
                IndexerStatus::new(IndexerState::Retrigger, None)
            }
            Err(e) => {
                warn!(
                    indexer,
                    error = %e,
                    "Failed to read indexer status; treating as still running"
                );
                IndexerStatus::new(IndexerState::Running, None)
            }
        }
    }

    /// Starts the indexer.
    ///
    /// Failures are logged and handed back for the caller to record; the
    /// retry loop is what eventually recovers from them.
    pub async fn trigger(&self, indexer: &str) -> Result<(), IndexerError> {
        match self.service.run(indexer).await {
            Ok(()) => {
                debug!(indexer, "Indexer run requested");
                Ok(())
            }
            Err(e) => {
                warn!(indexer, error = %e, "Failed to trigger indexer");
                Err(e)
            }
        }
    }
}
