// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Deadline-bound polling waits shared by discovery and deployment.

use crate::infrastructure::constants::{FOUNDATION_KIND, STATE_ERROR, STATE_READY};
use crate::infrastructure::kubernetes::client::FabricKubeClient;
use crate::infrastructure::kubernetes::resources::policy_status;
use crate::shared::error::{FabricError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Poll `check` at a fixed interval until it yields a value, fails, or the
/// deadline passes. The probe runs once immediately; the wait between probes
/// is a timer, not a busy loop, so callers can layer a tighter deadline on
/// top with `tokio::time::timeout`.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    timeout: Duration,
    what: &str,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::time::sleep_until(deadline) => {
                return Err(FabricError::Timeout(what.to_string()));
            }
        }
    }
}

/// Wait for a policy to report the ready state. An error state aborts the
/// wait immediately with the policy's own reason; a missing object or a
/// transient read failure keeps polling until the deadline.
pub async fn wait_policy_ready(
    client: &dyn FabricKubeClient,
    name: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<()> {
    let what = format!("waiting for {} '{}' to become ready", FOUNDATION_KIND, name);

    poll_until(interval, timeout, &what, move || async move {
        let policy = match client.get_policy(name).await {
            Ok(policy) => policy,
            Err(_) => return Ok(None),
        };

        match policy_status(&policy) {
            Some((state, _)) if state == STATE_READY => {
                info!(policy = name, "policy is ready");
                Ok(Some(()))
            }
            Some((state, reason)) if state == STATE_ERROR => {
                Err(FabricError::error_state(FOUNDATION_KIND, name, reason))
            }
            _ => Ok(None),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_value_on_first_probe() {
        let result = poll_until(
            Duration::from_secs(3),
            Duration::from_secs(10),
            "test condition",
            || async { Ok(Some(7)) },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_condition_never_holds() {
        let result: Result<()> = poll_until(
            Duration::from_secs(3),
            Duration::from_secs(10),
            "test condition",
            || async { Ok(None) },
        )
        .await;
        assert!(matches!(result, Err(FabricError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn propagates_probe_errors_immediately() {
        let started = tokio::time::Instant::now();
        let result: Result<()> = poll_until(
            Duration::from_secs(3),
            Duration::from_secs(300),
            "test condition",
            || async { Err(FabricError::config_error("boom")) },
        )
        .await;
        assert!(matches!(result, Err(FabricError::ConfigError(_))));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
