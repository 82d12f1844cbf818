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

use std::time::Duration;

/// Fabric operator API group and version
pub const FABRIC_API_GROUP: &str = "fabricoperator.io";
pub const FABRIC_API_VERSION: &str = "v1alpha1";

/// Foundation resource kind: the one cluster object every other manifest in a
/// deployment set depends on. The discovery probe is a thin instance of it.
pub const FOUNDATION_KIND: &str = "FabricClusterPolicy";
pub const FOUNDATION_PLURAL: &str = "fabricclusterpolicies";

/// Device inventory kind, reported per NIC by the configuration daemon
pub const DEVICE_KIND: &str = "FabricDevice";
pub const DEVICE_PLURAL: &str = "fabricdevices";

/// Name of the temporary policy created during discovery
pub const PROBE_POLICY_NAME: &str = "fabric-cluster-policy";

/// Per-node agent workload deployed by the foundation controller
pub const AGENT_DAEMONSET_NAME: &str = "fabric-config-daemon";

/// Operator component images referenced by the probe policy
pub const OPERATOR_IMAGE: &str = "fabric-configuration-operator";
pub const CONFIG_DAEMON_IMAGE: &str = "fabric-configuration-daemon";

/// Field manager identity for server-side apply
pub const FIELD_MANAGER: &str = "fabric-kube";

/// Policy status states
pub const STATE_READY: &str = "ready";
pub const STATE_ERROR: &str = "error";

/// Manifest kind whose apply is retried on transient failures
pub const RETRYABLE_KIND: &str = "Pod";

/// Polling and timeout policy
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DISCOVERY_READY_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEPLOY_READY_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Retry budget for pod-kind manifests
pub const POD_APPLY_ATTEMPTS: u32 = 3;
pub const POD_APPLY_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Default file locations
pub const DEFAULT_LAUNCH_CONFIG: &str = "fabric-kube.yaml";
pub const DEFAULT_CLUSTER_CONFIG_OUT: &str = "cluster-config.yaml";
pub const DEFAULT_DEPLOYMENT_DIR: &str = "deployment";
pub const DEFAULT_PROFILES_DIR: &str = "profiles";

/// Catalog entry manifest file name
pub const PROFILE_MANIFEST: &str = "profile.yaml";

/// Default traffic class recorded for discovered physical functions
pub const DEFAULT_TRAFFIC_CLASS: &str = "east-west";
