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

//! Implementation of the `backoff` command.

use indexrelay::{IndexRelayConfig, RetryPolicy};

/// Renders the backoff table for `policy`, one line per budget value.
fn render(policy: &RetryPolicy) -> String {
    let mut out = format!("{:>17}  {:>8}\n", "retries_remaining", "minutes");
    for (retries_remaining, minutes) in policy.schedule() {
        out.push_str(&format!("{:>17}  {:>8}\n", retries_remaining, minutes));
    }
    out.push_str(&format!(
        "total: {} minutes over {} re-queues\n",
        policy.total_backoff().num_minutes(),
        policy.initial_budget()
    ));
    out
}

/// Run the backoff command.
pub fn run(config: &IndexRelayConfig) {
    print!("{}", render(&config.retry_policy()));
}
