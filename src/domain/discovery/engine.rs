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

//! Cluster capability discovery via a temporary probe policy.
//!
//! Lifecycle: create the thin probe policy (refusing to run next to an
//! existing one), wait for it to report ready, check the per-node agent pods,
//! wait for device inventory to appear, aggregate it, and delete the probe.
//! Deletion runs no matter how the earlier steps ended.

use crate::domain::config::{ClusterConfig, FabricOperatorConf};
use crate::domain::discovery::aggregate::{aggregate, device_status, DeviceStatus};
use crate::infrastructure::constants::{
    AGENT_DAEMONSET_NAME, DEFAULT_TRAFFIC_CLASS, DEVICE_KIND, DISCOVERY_READY_TIMEOUT,
    FOUNDATION_KIND, POLL_INTERVAL, PROBE_POLICY_NAME,
};
use crate::infrastructure::kubernetes::client::FabricKubeClient;
use crate::infrastructure::kubernetes::poll::{poll_until, wait_policy_ready};
use crate::infrastructure::kubernetes::resources::build_probe_policy;
use crate::shared::error::{FabricError, Result};
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub operator: FabricOperatorConf,
    pub traffic: String,
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
}

impl DiscoverySettings {
    pub fn new(operator: FabricOperatorConf) -> Self {
        Self {
            operator,
            traffic: DEFAULT_TRAFFIC_CLASS.to_string(),
            poll_interval: POLL_INTERVAL,
            ready_timeout: DISCOVERY_READY_TIMEOUT,
        }
    }
}

pub struct DiscoveryEngine {
    client: Arc<dyn FabricKubeClient>,
    settings: DiscoverySettings,
}

impl DiscoveryEngine {
    pub fn new(client: Arc<dyn FabricKubeClient>, settings: DiscoverySettings) -> Self {
        Self { client, settings }
    }

    /// Run the full discovery lifecycle and return the aggregated capability
    /// model. Once the probe policy exists it is deleted before returning no
    /// matter how the run ended; a cleanup failure is logged and never masks
    /// the primary outcome.
    pub async fn discover(&self) -> Result<ClusterConfig> {
        self.ensure_no_probe_exists().await?;

        info!("deploying a thin probe policy for cluster config discovery");
        let policy = build_probe_policy(&self.settings.operator)?;
        self.client.create_policy(&policy).await?;

        let outcome = self.run_probe().await;

        match self.client.delete_policy(PROBE_POLICY_NAME).await {
            Ok(()) => info!("probe policy deleted after discovery"),
            Err(e) => warn!(error = %e, "failed to delete probe policy after discovery"),
        }

        outcome
    }

    /// Refuse to run while any policy already exists: two concurrent
    /// discovery runs would corrupt each other's aggregation. The existing
    /// policy belongs to someone else and is left alone.
    async fn ensure_no_probe_exists(&self) -> Result<()> {
        let existing = self.client.list_policies().await?;
        if let Some(policy) = existing.first() {
            let name = policy
                .metadata
                .name
                .clone()
                .unwrap_or_else(|| "<unnamed>".to_string());
            return Err(FabricError::conflict(
                FOUNDATION_KIND,
                name,
                "Wait for the in-flight run to finish or delete the policy manually before retrying discovery.",
            ));
        }
        Ok(())
    }

    async fn run_probe(&self) -> Result<ClusterConfig> {
        wait_policy_ready(
            self.client.as_ref(),
            PROBE_POLICY_NAME,
            self.settings.poll_interval,
            self.settings.ready_timeout,
        )
        .await?;

        self.collect().await
    }

    async fn collect(&self) -> Result<ClusterConfig> {
        let namespace = &self.settings.operator.namespace;

        self.check_agents_ready(namespace).await?;

        let mut devices = self.client.list_devices(namespace).await?;
        if devices.is_empty() {
            info!(namespace = %namespace, "no device inventory found yet; waiting for discovery");
            self.wait_devices_discovered(namespace).await?;
            devices = self.client.list_devices(namespace).await?;
            info!(count = devices.len(), "device inventory discovered");
        }

        let reports: Vec<DeviceStatus> = devices
            .iter()
            .map(device_status)
            .collect::<Result<Vec<_>>>()?;

        Ok(aggregate(&reports, &self.settings.traffic))
    }

    /// Verify that all pods owned by the agent DaemonSet are ready. This is a
    /// single snapshot, not a poll; callers needing eventual consistency must
    /// re-invoke.
    async fn check_agents_ready(&self, namespace: &str) -> Result<()> {
        let pods = self.client.list_pods(namespace).await?;

        let agent_pods: Vec<&Pod> = pods
            .iter()
            .filter(|pod| {
                pod.metadata.owner_references.as_ref().is_some_and(|owners| {
                    owners
                        .iter()
                        .any(|o| o.kind == "DaemonSet" && o.name == AGENT_DAEMONSET_NAME)
                })
            })
            .collect();

        if agent_pods.is_empty() {
            return Err(FabricError::NoAgents {
                daemon_set: AGENT_DAEMONSET_NAME.to_string(),
                namespace: namespace.to_string(),
            });
        }

        for pod in agent_pods {
            if !is_pod_ready(pod) {
                return Err(FabricError::AgentNotReady {
                    pod: pod.metadata.name.clone().unwrap_or_default(),
                    daemon_set: AGENT_DAEMONSET_NAME.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Poll until at least one device inventory object exists.
    async fn wait_devices_discovered(&self, namespace: &str) -> Result<()> {
        let what = format!(
            "waiting for {} resources in namespace '{}'",
            DEVICE_KIND, namespace
        );

        let client = self.client.as_ref();
        poll_until(
            self.settings.poll_interval,
            self.settings.ready_timeout,
            &what,
            move || async move {
                let devices = client.list_devices(namespace).await?;
                Ok((!devices.is_empty()).then_some(()))
            },
        )
        .await
    }
}

fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}
