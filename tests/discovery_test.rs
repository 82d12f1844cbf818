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

//! Discovery engine lifecycle tests against a mock cluster.

use fabric_kube::domain::config::FabricOperatorConf;
use fabric_kube::domain::deploy::Manifest;
use fabric_kube::domain::discovery::{DiscoveryEngine, DiscoverySettings};
use fabric_kube::shared::error::FabricError;
use fabric_kube::FabricKubeClient;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use std::sync::{Arc, Mutex};

/// What the mock reports as the probe policy's status once it exists.
#[derive(Clone, Copy)]
enum ProbeState {
    Ready,
    Error,
}

struct MockCluster {
    log: Mutex<Vec<String>>,
    existing_policies: Vec<String>,
    probe_state: ProbeState,
    created: Mutex<Vec<String>>,
    pods: Vec<Pod>,
    devices: Vec<DynamicObject>,
}

impl MockCluster {
    fn new(probe_state: ProbeState) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            existing_policies: Vec::new(),
            probe_state,
            created: Mutex::new(Vec::new()),
            pods: vec![agent_pod("fabric-config-daemon-x1", true)],
            devices: vec![device("dev1", "node-b", &[("mlx5_0", "0000:08:00.0", "ib0")])],
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }
}

fn policy_object(name: &str, state: &str) -> DynamicObject {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "fabricoperator.io/v1alpha1",
        "kind": "FabricClusterPolicy",
        "metadata": { "name": name },
        "status": { "state": state, "reason": if state == "error" { "daemon rollout failed" } else { "" } },
    }))
    .unwrap()
}

fn device(name: &str, node: &str, ports: &[(&str, &str, &str)]) -> DynamicObject {
    let ports: Vec<serde_json::Value> = ports
        .iter()
        .map(|(rdma, pci, netif)| {
            serde_json::json!({
                "rdmaDevice": rdma,
                "pciAddress": pci,
                "networkInterface": netif,
            })
        })
        .collect();

    serde_json::from_value(serde_json::json!({
        "apiVersion": "fabricoperator.io/v1alpha1",
        "kind": "FabricDevice",
        "metadata": { "name": name, "namespace": "fabric-operator" },
        "status": { "node": node, "ports": ports },
    }))
    .unwrap()
}

fn agent_pod(name: &str, ready: bool) -> Pod {
    let mut pod: Pod = serde_json::from_value(serde_json::json!({
        "metadata": { "name": name },
        "status": {
            "conditions": [
                { "type": "Ready", "status": if ready { "True" } else { "False" } }
            ]
        }
    }))
    .unwrap();

    pod.metadata.owner_references = Some(vec![OwnerReference {
        kind: "DaemonSet".to_string(),
        name: "fabric-config-daemon".to_string(),
        ..Default::default()
    }]);
    pod
}

#[async_trait::async_trait]
impl FabricKubeClient for MockCluster {
    async fn create_policy(&self, policy: &DynamicObject) -> Result<(), FabricError> {
        let name = policy.metadata.name.clone().unwrap_or_default();
        self.record(format!("create:{}", name));
        self.created.lock().unwrap().push(name);
        Ok(())
    }

    async fn get_policy(&self, name: &str) -> Result<DynamicObject, FabricError> {
        self.record(format!("get:{}", name));
        if !self.created.lock().unwrap().contains(&name.to_string()) {
            return Err(FabricError::not_found("FabricClusterPolicy", name));
        }
        match self.probe_state {
            ProbeState::Ready => Ok(policy_object(name, "ready")),
            ProbeState::Error => Ok(policy_object(name, "error")),
        }
    }

    async fn list_policies(&self) -> Result<Vec<DynamicObject>, FabricError> {
        self.record("list-policies");
        Ok(self
            .existing_policies
            .iter()
            .map(|name| policy_object(name, "ready"))
            .collect())
    }

    async fn delete_policy(&self, name: &str) -> Result<(), FabricError> {
        self.record(format!("delete:{}", name));
        Ok(())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, FabricError> {
        self.record(format!("list-pods:{}", namespace));
        Ok(self.pods.clone())
    }

    async fn list_devices(&self, namespace: &str) -> Result<Vec<DynamicObject>, FabricError> {
        self.record(format!("list-devices:{}", namespace));
        Ok(self.devices.clone())
    }

    async fn apply_manifest(&self, manifest: &Manifest) -> Result<(), FabricError> {
        self.record(format!("apply:{}", manifest.name));
        Ok(())
    }
}

fn engine(cluster: Arc<MockCluster>) -> DiscoveryEngine {
    let settings = DiscoverySettings::new(FabricOperatorConf {
        version: "v25.1.0".to_string(),
        component_version: "v1.0.3".to_string(),
        repository: "ghcr.io/fabric-operator".to_string(),
        namespace: "fabric-operator".to_string(),
    });
    DiscoveryEngine::new(cluster, settings)
}

#[tokio::test]
async fn discovery_aggregates_and_cleans_up() {
    let cluster = Arc::new(MockCluster::new(ProbeState::Ready));
    let result = engine(cluster.clone()).discover().await.unwrap();

    assert!(result.capabilities.nodes.rdma);
    assert!(result.capabilities.nodes.sriov);
    assert!(result.capabilities.nodes.ib);
    assert_eq!(result.worker_nodes, vec!["node-b"]);
    assert_eq!(result.pfs.len(), 1);
    assert_eq!(result.pfs[0].pci_address, "0000:08:00.0");

    let log = cluster.log();
    assert!(log.contains(&"create:fabric-cluster-policy".to_string()));
    assert_eq!(log.last().unwrap(), "delete:fabric-cluster-policy");
}

#[tokio::test]
async fn existing_policy_is_a_conflict_and_is_left_alone() {
    let mut cluster = MockCluster::new(ProbeState::Ready);
    cluster.existing_policies = vec!["someone-elses-policy".to_string()];
    let cluster = Arc::new(cluster);

    let err = engine(cluster.clone()).discover().await.unwrap_err();
    assert!(matches!(err, FabricError::Conflict { .. }));

    let log = cluster.log();
    assert!(!log.iter().any(|e| e.starts_with("create:")));
    assert!(!log.iter().any(|e| e.starts_with("delete:")));
}

#[tokio::test]
async fn probe_error_state_aborts_and_still_deletes_the_probe() {
    let cluster = Arc::new(MockCluster::new(ProbeState::Error));

    let err = engine(cluster.clone()).discover().await.unwrap_err();
    match err {
        FabricError::ResourceErrorState { reason, .. } => {
            assert_eq!(reason, "daemon rollout failed");
        }
        other => panic!("unexpected error: {}", other),
    }

    let log = cluster.log();
    assert_eq!(log.last().unwrap(), "delete:fabric-cluster-policy");
    // no inventory was touched after the error
    assert!(!log.iter().any(|e| e.starts_with("list-devices:")));
}

#[tokio::test]
async fn missing_agent_pods_fail_discovery_after_cleanup() {
    let mut cluster = MockCluster::new(ProbeState::Ready);
    cluster.pods = Vec::new();
    let cluster = Arc::new(cluster);

    let err = engine(cluster.clone()).discover().await.unwrap_err();
    assert!(matches!(err, FabricError::NoAgents { .. }));
    assert_eq!(cluster.log().last().unwrap(), "delete:fabric-cluster-policy");
}

#[tokio::test]
async fn non_ready_agent_pod_is_named_in_the_error() {
    let mut cluster = MockCluster::new(ProbeState::Ready);
    cluster.pods = vec![
        agent_pod("fabric-config-daemon-ok", true),
        agent_pod("fabric-config-daemon-bad", false),
    ];
    let cluster = Arc::new(cluster);

    let err = engine(cluster.clone()).discover().await.unwrap_err();
    match err {
        FabricError::AgentNotReady { pod, .. } => assert_eq!(pod, "fabric-config-daemon-bad"),
        other => panic!("unexpected error: {}", other),
    }
}
