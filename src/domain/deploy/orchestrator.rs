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

//! Ordered application of a deployment's manifest set.
//!
//! At most one manifest in the set may be of the foundation kind. When
//! present it is applied first and must report ready before anything else is
//! touched, because the remaining objects assume the foundation controller
//! has brought up its per-node daemons.

use crate::domain::deploy::manifest::Manifest;
use crate::infrastructure::constants::{
    DEPLOY_READY_TIMEOUT, POD_APPLY_ATTEMPTS, POD_APPLY_RETRY_DELAY, POLL_INTERVAL,
};
use crate::infrastructure::kubernetes::client::FabricKubeClient;
use crate::infrastructure::kubernetes::poll::wait_policy_ready;
use crate::shared::error::{FabricError, Result};
use backon::{ConstantBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            ready_timeout: DEPLOY_READY_TIMEOUT,
            retry_attempts: POD_APPLY_ATTEMPTS,
            retry_delay: POD_APPLY_RETRY_DELAY,
        }
    }
}

/// Partition a manifest set into the optional foundation document and the
/// remainder in its original (sorted) order. Two or more foundation documents
/// are rejected before any cluster mutation.
pub fn partition(manifests: Vec<Manifest>) -> Result<(Option<Manifest>, Vec<Manifest>)> {
    let mut foundation = Vec::new();
    let mut rest = Vec::new();

    for manifest in manifests {
        if manifest.is_foundation() {
            foundation.push(manifest);
        } else {
            rest.push(manifest);
        }
    }

    if foundation.len() > 1 {
        return Err(FabricError::MultipleFoundationManifests(foundation.len()));
    }

    Ok((foundation.pop(), rest))
}

pub struct DeploymentOrchestrator {
    client: Arc<dyn FabricKubeClient>,
    settings: DeploySettings,
}

impl DeploymentOrchestrator {
    pub fn new(client: Arc<dyn FabricKubeClient>, settings: DeploySettings) -> Self {
        Self { client, settings }
    }

    /// Apply the manifest set: foundation first with a readiness wait, then
    /// the rest in partition order. Pod-kind apply failures are retried up to
    /// the configured budget; any other failure aborts the sequence.
    pub async fn deploy(&self, manifests: Vec<Manifest>) -> Result<()> {
        let (foundation, rest) = partition(manifests)?;

        if let Some(ref foundation) = foundation {
            info!(name = %foundation.name, "applying foundation policy");
            self.client
                .apply_manifest(foundation)
                .await
                .map_err(|e| apply_error(foundation, e))?;

            info!(name = %foundation.name, "waiting for foundation policy to be ready");
            wait_policy_ready(
                self.client.as_ref(),
                &foundation.name,
                self.settings.poll_interval,
                self.settings.ready_timeout,
            )
            .await?;
        }

        info!(count = rest.len(), "applying remaining manifests");
        for manifest in &rest {
            self.apply_one(manifest).await?;
        }

        Ok(())
    }

    async fn apply_one(&self, manifest: &Manifest) -> Result<()> {
        info!(
            kind = %manifest.kind,
            name = %manifest.name,
            source = %manifest.source,
            "applying object"
        );

        if !manifest.is_retryable() {
            return self
                .client
                .apply_manifest(manifest)
                .await
                .map_err(|e| apply_error(manifest, e));
        }

        let backoff = ConstantBuilder::default()
            .with_delay(self.settings.retry_delay)
            .with_max_times(self.settings.retry_attempts.saturating_sub(1) as usize);

        let client = self.client.as_ref();
        (move || async move { client.apply_manifest(manifest).await })
            .retry(&backoff)
            .notify(|err: &FabricError, delay: Duration| {
                warn!(
                    name = %manifest.name,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "pod apply failed, retrying"
                );
            })
            .await
            .map_err(|e| FabricError::TransientApply {
                kind: manifest.kind.clone(),
                name: manifest.name.clone(),
                attempts: self.settings.retry_attempts,
                message: e.to_string(),
            })
    }
}

fn apply_error(manifest: &Manifest, err: FabricError) -> FabricError {
    FabricError::Apply {
        kind: manifest.kind.clone(),
        name: manifest.name.clone(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(kind: &str, name: &str) -> Manifest {
        Manifest {
            source: "test.yaml".to_string(),
            index: 0,
            api_version: "v1".to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: None,
            body: serde_json::json!({}),
        }
    }

    #[test]
    fn partition_separates_foundation_from_rest() {
        let set = vec![
            manifest("ConfigMap", "a"),
            manifest("FabricClusterPolicy", "policy"),
            manifest("Pod", "b"),
        ];

        let (foundation, rest) = partition(set).unwrap();
        assert_eq!(foundation.unwrap().name, "policy");
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].name, "a");
        assert_eq!(rest[1].name, "b");
    }

    #[test]
    fn partition_rejects_duplicate_foundations() {
        let set = vec![
            manifest("FabricClusterPolicy", "one"),
            manifest("FabricClusterPolicy", "two"),
        ];

        let err = partition(set).unwrap_err();
        assert!(matches!(err, FabricError::MultipleFoundationManifests(2)));
    }

    #[test]
    fn partition_without_foundation_keeps_order() {
        let set = vec![manifest("ConfigMap", "a"), manifest("Pod", "b")];
        let (foundation, rest) = partition(set).unwrap();
        assert!(foundation.is_none());
        assert_eq!(rest.len(), 2);
    }
}
