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

//! Configuration types for the pending-index handlers.
//!
//! Holds the queue names each [`Task`] is published to and the retry policy
//! parameters.

use crate::error::ConfigError;
use crate::models::Task;
use crate::retry::{RetryPolicy, BACKOFF_BASE_EXPONENT, INITIAL_RETRY_BUDGET};

/// Environment variable overriding the trigger queue name.
pub const TRIGGER_QUEUE_ENV: &str = "INDEXRELAY_TRIGGER_QUEUE";
/// Environment variable overriding the completion queue name.
pub const COMPLETION_QUEUE_ENV: &str = "INDEXRELAY_COMPLETION_QUEUE";
/// Environment variable overriding the initial retry budget.
pub const RETRY_BUDGET_ENV: &str = "INDEXRELAY_RETRY_BUDGET";
/// Environment variable overriding the backoff base exponent.
pub const BACKOFF_EXPONENT_ENV: &str = "INDEXRELAY_BACKOFF_EXPONENT";

/// Configuration for the pending-index handlers
///
/// # Construction
///
/// ```rust
/// use indexrelay::IndexRelayConfig;
///
/// let config = IndexRelayConfig::builder()
///     .trigger_queue("adi-pending-trigger")
///     .initial_retry_budget(6)
///     .build();
///
/// assert_eq!(config.trigger_queue(), "adi-pending-trigger");
/// assert_eq!(config.retry_policy().initial_budget(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct IndexRelayConfig {
    trigger_queue: String,
    completion_queue: String,
    initial_retry_budget: u32,
    backoff_base_exponent: u32,
}

impl Default for IndexRelayConfig {
    fn default() -> Self {
        Self {
            trigger_queue: Task::PendingIndexTrigger.as_str().to_string(),
            completion_queue: Task::PendingIndexCompletion.as_str().to_string(),
            initial_retry_budget: INITIAL_RETRY_BUDGET,
            backoff_base_exponent: BACKOFF_BASE_EXPONENT,
        }
    }
}

impl IndexRelayConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> IndexRelayConfigBuilder {
        IndexRelayConfigBuilder::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(queue) = lookup(TRIGGER_QUEUE_ENV) {
            builder = builder.trigger_queue(queue);
        }
        if let Some(queue) = lookup(COMPLETION_QUEUE_ENV) {
            builder = builder.completion_queue(queue);
        }
        if let Some(raw) = lookup(RETRY_BUDGET_ENV) {
            builder = builder.initial_retry_budget(parse_u32(RETRY_BUDGET_ENV, &raw)?);
        }
        if let Some(raw) = lookup(BACKOFF_EXPONENT_ENV) {
            builder = builder.backoff_base_exponent(parse_u32(BACKOFF_EXPONENT_ENV, &raw)?);
        }

        Ok(builder.build())
    }

    /// Queue that trigger messages are published to.
    pub fn trigger_queue(&self) -> &str {
        &self.trigger_queue
    }

    /// Queue that completion messages are published to.
    pub fn completion_queue(&self) -> &str {
        &self.completion_queue
    }

    /// Queue name for the given task.
    pub fn queue_for(&self, task: Task) -> &str {
        match task {
            Task::PendingIndexTrigger => &self.trigger_queue,
            Task::PendingIndexCompletion => &self.completion_queue,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.initial_retry_budget, self.backoff_base_exponent)
    }
}

fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Builder for [`IndexRelayConfig`].
#[derive(Debug, Clone, Default)]
pub struct IndexRelayConfigBuilder {
    config: IndexRelayConfig,
}

impl IndexRelayConfigBuilder {
    pub fn trigger_queue(mut self, name: impl Into<String>) -> Self {
        self.config.trigger_queue = name.into();
        self
    }

    pub fn completion_queue(mut self, name: impl Into<String>) -> Self {
        self.config.completion_queue = name.into();
        self
    }

    pub fn initial_retry_budget(mut self, budget: u32) -> Self {
        self.config.initial_retry_budget = budget;
        self
    }

    pub fn backoff_base_exponent(mut self, exponent: u32) -> Self {
        self.config.backoff_base_exponent = exponent;
        self
    }

    pub fn build(self) -> IndexRelayConfig {
        self.config
    }
}
