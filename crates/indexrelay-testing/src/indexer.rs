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

//! Scripted [`IndexerStatusService`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexrelay::indexer::{STATUS_IN_PROGRESS, STATUS_SUCCESS, STATUS_TRANSIENT_FAILURE};
use indexrelay::{IndexerError, IndexerExecution, IndexerState, IndexerStatusService};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};

/// What [`ScriptedIndexer`] does when asked to run an indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunBehavior {
    /// Only record the call
    #[default]
    Record,
    /// Record the call and report a run in progress from now on
    StartRun,
    /// Reject the call
    Fail,
}

/// Raw status string a real service would report for `state`.
pub fn raw_status(state: IndexerState) -> &'static str {
    match state {
        IndexerState::Running => STATUS_IN_PROGRESS,
        IndexerState::Success => STATUS_SUCCESS,
        IndexerState::Retrigger => "error",
    }
}

/// An indexer control API whose answers are set by the test.
///
/// Lookups first drain any answers queued with
/// [`ScriptedIndexer::push_execution`], then fall back to the current
/// execution set with [`ScriptedIndexer::set_execution`].
#[derive(Debug, Default)]
pub struct ScriptedIndexer {
    current: Mutex<HashMap<String, IndexerExecution>>,
    scripted: Mutex<HashMap<String, VecDeque<IndexerExecution>>>,
    failing_lookups: Mutex<HashSet<String>>,
    runs: Mutex<Vec<(String, DateTime<Utc>)>>,
    run_behavior: Mutex<RunBehavior>,
}

impl ScriptedIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the execution reported for `indexer` from now on.
    pub fn set_execution(
        &self,
        indexer: &str,
        status: impl Into<String>,
        start_time: Option<DateTime<Utc>>,
    ) {
        self.current.lock().insert(
            indexer.to_string(),
            IndexerExecution::new(status, start_time),
        );
    }

    /// Shorthand for [`ScriptedIndexer::set_execution`] with a classified state.
    pub fn set_state(&self, indexer: &str, state: IndexerState, start_time: Option<DateTime<Utc>>) {
        self.set_execution(indexer, raw_status(state), start_time);
    }

    /// Reports a finished run that hit transient errors.
    pub fn set_transient_failure(&self, indexer: &str, start_time: DateTime<Utc>) {
        self.set_execution(indexer, STATUS_TRANSIENT_FAILURE, Some(start_time));
    }

    /// Forgets the indexer's execution history.
    pub fn clear_execution(&self, indexer: &str) {
        self.current.lock().remove(indexer);
        self.scripted.lock().remove(indexer);
    }

    /// Queues a one-shot answer for the next lookup of `indexer`.
    pub fn push_execution(
        &self,
        indexer: &str,
        status: impl Into<String>,
        start_time: Option<DateTime<Utc>>,
    ) {
        self.scripted
            .lock()
            .entry(indexer.to_string())
            .or_default()
            .push_back(IndexerExecution::new(status, start_time));
    }

    /// Makes lookups of `indexer` fail.
    pub fn fail_lookups(&self, indexer: &str) {
        self.failing_lookups.lock().insert(indexer.to_string());
    }

    pub fn restore_lookups(&self, indexer: &str) {
        self.failing_lookups.lock().remove(indexer);
    }

    pub fn on_run(&self, behavior: RunBehavior) {
        *self.run_behavior.lock() = behavior;
    }

    /// Every run request received, with the time it arrived.
    pub fn runs(&self) -> Vec<(String, DateTime<Utc>)> {
        self.runs.lock().clone()
    }

    pub fn run_count(&self, indexer: &str) -> usize {
        self.runs.lock().iter().filter(|(name, _)| name == indexer).count()
    }
}

#[async_trait]
impl IndexerStatusService for ScriptedIndexer {
    async fn last_execution(&self, indexer: &str) -> Result<Option<IndexerExecution>, IndexerError> {
        if self.failing_lookups.lock().contains(indexer) {
            return Err(IndexerError::Service(format!(
                "status lookup for '{}' failed",
                indexer
            )));
        }

        let scripted = self
            .scripted
            .lock()
            .get_mut(indexer)
            .and_then(|answers| answers.pop_front());
        if scripted.is_some() {
            return Ok(scripted);
        }

        Ok(self.current.lock().get(indexer).cloned())
    }

    async fn run(&self, indexer: &str) -> Result<(), IndexerError> {
        let behavior = *self.run_behavior.lock();
        if behavior == RunBehavior::Fail {
            return Err(IndexerError::Service(format!(
                "run request for '{}' rejected",
                indexer
            )));
        }

        let now = Utc::now();
        self.runs.lock().push((indexer.to_string(), now));
        if behavior == RunBehavior::StartRun {
            self.set_execution(indexer, STATUS_IN_PROGRESS, Some(now));
        }
        Ok(())
    }
}
