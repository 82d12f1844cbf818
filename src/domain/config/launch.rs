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

//! Type definitions for the fabric-kube launch configuration file.
//!
//! The same structure serves as the defaults file read before discovery and
//! as the cluster-config file written after discovery (defaults echoed plus
//! the discovered `clusterConfig` section), so the two stay round-trippable.

use crate::shared::error::{FabricError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::read_to_string;

// ============================================================================
// Launch configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchConfig {
    pub fabric_operator: FabricOperatorConf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipam: Option<IpamConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sriov: Option<SriovConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostdev: Option<HostdevConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdma_shared: Option<RdmaSharedConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipoib: Option<IpoibConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macvlan: Option<MacvlanConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<DeploymentIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_config: Option<ClusterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FabricOperatorConf {
    pub version: String,
    pub component_version: String,
    pub repository: String,
    pub namespace: String,
}

impl Default for FabricOperatorConf {
    fn default() -> Self {
        Self {
            version: String::new(),
            component_version: String::new(),
            repository: String::new(),
            namespace: "fabric-operator".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpamConf {
    pub pool_name: String,
    pub subnets: Vec<IpamSubnetConf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpamSubnetConf {
    pub subnet: String,
    pub gateway: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SriovConf {
    pub mtu: u32,
    pub num_vfs: u32,
    pub priority: i32,
    pub resource_name: String,
    pub network_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostdevConf {
    pub resource_name: String,
    pub network_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RdmaSharedConf {
    pub resource_name: String,
    pub hca_max: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpoibConf {
    pub network_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacvlanConf {
    pub network_name: String,
}

// ============================================================================
// Deployment intent
// ============================================================================

/// The caller's desired deployment characteristics, used to select a profile.
///
/// Built from CLI flags or from an inference outcome, never merged per-field
/// from both sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentIntent {
    pub fabric: String,
    pub deployment: String,
    pub multirail: bool,
    pub spectrum_x: bool,
    pub ai: bool,
}

// ============================================================================
// Discovered cluster capabilities
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    pub capabilities: ClusterCapabilities,
    pub pfs: Vec<PfDescriptor>,
    pub worker_nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterCapabilities {
    pub nodes: NodeCapabilities,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeCapabilities {
    pub sriov: bool,
    pub rdma: bool,
    pub ib: bool,
}

/// One discovered physical function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PfDescriptor {
    pub rdma_device: String,
    pub pci_address: String,
    pub network_interface: String,
    pub traffic: String,
}

// PCI address is the stable sort key; the remaining fields only break ties so
// the ordering stays total.
impl Ord for PfDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pci_address
            .cmp(&other.pci_address)
            .then_with(|| self.rdma_device.cmp(&other.rdma_device))
            .then_with(|| self.network_interface.cmp(&other.network_interface))
            .then_with(|| self.traffic.cmp(&other.traffic))
    }
}

impl PartialOrd for PfDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl LaunchConfig {
    /// Load configuration from a YAML file
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            FabricError::config_error(format!(
                "Failed to read config file {}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let conf: Self = serde_yaml::from_str(&content).map_err(|e| {
            FabricError::config_error(format!("Failed to parse {}: {}", path.as_ref(), e))
        })?;

        Ok(conf)
    }

    /// Validate that essential fields are present for the selected deployment type.
    pub fn validate(&self, deployment: &str) -> Result<()> {
        if self.fabric_operator.repository.is_empty() {
            return Err(FabricError::config_error(
                "fabricOperator.repository is required",
            ));
        }

        if self.fabric_operator.component_version.is_empty() {
            return Err(FabricError::config_error(
                "fabricOperator.componentVersion is required",
            ));
        }

        if self.fabric_operator.namespace.is_empty() {
            return Err(FabricError::config_error(
                "fabricOperator.namespace is required",
            ));
        }

        if deployment == "hostdevice" {
            let hostdev = self.hostdev.as_ref().ok_or_else(|| {
                FabricError::config_error("hostdev section is required for hostdevice profiles")
            })?;
            if hostdev.resource_name.is_empty() {
                return Err(FabricError::config_error(
                    "hostdev.resourceName is required for hostdevice profiles",
                ));
            }
            if hostdev.network_name.is_empty() {
                return Err(FabricError::config_error(
                    "hostdev.networkName is required for hostdevice profiles",
                ));
            }
        }

        if deployment == "sriov" {
            let sriov = self.sriov.as_ref().ok_or_else(|| {
                FabricError::config_error("sriov section is required for SR-IOV profiles")
            })?;
            if sriov.resource_name.is_empty() {
                return Err(FabricError::config_error(
                    "sriov.resourceName is required for SR-IOV profiles",
                ));
            }
            if sriov.network_name.is_empty() {
                return Err(FabricError::config_error(
                    "sriov.networkName is required for SR-IOV profiles",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
fabricOperator:
  version: v25.1.0
  componentVersion: v1.0.3
  repository: ghcr.io/fabric-operator
  namespace: fabric-operator
hostdev:
  resourceName: fabric_pf
  networkName: fabric-hostdev-net
profile:
  fabric: infiniband
  deployment: hostdevice
"#;

    #[test]
    fn load_parses_sections_and_defaults() {
        let conf: LaunchConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(conf.fabric_operator.repository, "ghcr.io/fabric-operator");
        assert_eq!(conf.hostdev.as_ref().unwrap().resource_name, "fabric_pf");
        let intent = conf.profile.as_ref().unwrap();
        assert_eq!(intent.fabric, "infiniband");
        assert!(!intent.multirail);
        assert!(conf.cluster_config.is_none());
    }

    #[test]
    fn validate_requires_operator_fields() {
        let mut conf: LaunchConfig = serde_yaml::from_str(SAMPLE).unwrap();
        conf.fabric_operator.component_version.clear();
        let err = conf.validate("hostdevice").unwrap_err();
        assert!(err.to_string().contains("componentVersion"));
    }

    #[test]
    fn validate_requires_hostdev_names_for_hostdevice() {
        let mut conf: LaunchConfig = serde_yaml::from_str(SAMPLE).unwrap();
        conf.hostdev.as_mut().unwrap().network_name.clear();
        assert!(conf.validate("hostdevice").is_err());
        assert!(conf.validate("rdma-shared").is_ok());
    }

    #[test]
    fn cluster_config_round_trips_byte_identical() {
        let cluster = ClusterConfig {
            capabilities: ClusterCapabilities {
                nodes: NodeCapabilities {
                    sriov: false,
                    rdma: true,
                    ib: true,
                },
            },
            pfs: vec![
                PfDescriptor {
                    rdma_device: "mlx5_0".into(),
                    pci_address: "0000:08:00.0".into(),
                    network_interface: "ib0".into(),
                    traffic: "east-west".into(),
                },
                PfDescriptor {
                    rdma_device: "mlx5_1".into(),
                    pci_address: "0000:08:00.1".into(),
                    network_interface: "ib1".into(),
                    traffic: "east-west".into(),
                },
            ],
            worker_nodes: vec!["node-a".into(), "node-b".into()],
        };

        let first = serde_yaml::to_string(&cluster).unwrap();
        let reread: ClusterConfig = serde_yaml::from_str(&first).unwrap();
        let second = serde_yaml::to_string(&reread).unwrap();
        assert_eq!(first, second);
        assert_eq!(cluster, reread);
    }

    #[test]
    fn pf_descriptors_order_by_pci_address() {
        let a = PfDescriptor {
            pci_address: "0000:3b:00.0".into(),
            ..Default::default()
        };
        let b = PfDescriptor {
            pci_address: "0000:08:00.1".into(),
            ..Default::default()
        };
        assert!(b < a);
    }
}
