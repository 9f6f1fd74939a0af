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

//! Retry budget and backoff schedule.
//!
//! Delays are `2^(base_exponent - retries_remaining)` minutes, computed from
//! the budget *before* the re-queue spends it. With the defaults a fresh
//! request waits 2 minutes on its first re-queue and 1024 minutes on its
//! last, so the whole loop can span several days.

use chrono::{DateTime, Duration, Utc};

/// Retry budget given to every new request.
pub const INITIAL_RETRY_BUDGET: u32 = 10;

/// Exponent base of the backoff curve.
pub const BACKOFF_BASE_EXPONENT: u32 = 11;

// 2^40 minutes is already two million years.
const MAX_EXPONENT: u32 = 40;

/// Backoff policy shared by both handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    initial_budget: u32,
    base_exponent: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(INITIAL_RETRY_BUDGET, BACKOFF_BASE_EXPONENT)
    }
}

impl RetryPolicy {
    pub fn new(initial_budget: u32, base_exponent: u32) -> Self {
        Self {
            initial_budget,
            base_exponent,
        }
    }

    /// Budget assigned to a brand new request.
    pub fn initial_budget(&self) -> u32 {
        self.initial_budget
    }

    pub fn base_exponent(&self) -> u32 {
        self.base_exponent
    }

    /// Minutes to wait before a message re-queued with `retries_remaining`
    /// becomes visible again.
    ///
    /// The exponent is floored at zero, so budgets above the base exponent
    /// wait one minute.
    pub fn backoff_minutes(&self, retries_remaining: u32) -> i64 {
        let exponent = self
            .base_exponent
            .saturating_sub(retries_remaining)
            .min(MAX_EXPONENT);
        1i64 << exponent
    }

    pub fn backoff(&self, retries_remaining: u32) -> Duration {
        Duration::minutes(self.backoff_minutes(retries_remaining))
    }

    /// When a message re-queued at `now` should become visible.
    pub fn scheduled_time(&self, retries_remaining: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.backoff(retries_remaining)
    }

    /// `(retries_remaining, backoff_minutes)` for every re-queue a fresh
    /// request can make, in the order they happen.
    pub fn schedule(&self) -> Vec<(u32, i64)> {
        (1..=self.initial_budget)
            .rev()
            .map(|remaining| (remaining, self.backoff_minutes(remaining)))
            .collect()
    }

    /// Worst-case time from the first to the last re-queue.
    pub fn total_backoff(&self) -> Duration {
        Duration::minutes(self.schedule().iter().map(|(_, minutes)| minutes).sum())
    }
}
