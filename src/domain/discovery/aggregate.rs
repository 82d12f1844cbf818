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

//! Aggregation of device inventory into the cluster capability model.

use crate::domain::config::{ClusterCapabilities, ClusterConfig, NodeCapabilities, PfDescriptor};
use crate::shared::error::Result;
use kube::api::DynamicObject;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Reported status of one device inventory object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStatus {
    pub node: String,
    pub ports: Vec<DevicePort>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevicePort {
    pub rdma_device: String,
    pub pci_address: String,
    pub network_interface: String,
}

/// Extract the reported status from a device object. An object without a
/// status section yields an empty report, not an error.
pub fn device_status(device: &DynamicObject) -> Result<DeviceStatus> {
    match device.data.get("status") {
        Some(status) => Ok(serde_json::from_value(status.clone())?),
        None => Ok(DeviceStatus::default()),
    }
}

/// Fold device reports into a capability model. Each port field that is
/// populated turns on the matching capability bit: rdma device -> rdma,
/// PCI address -> sriov, network interface -> ib. Physical functions and
/// worker nodes are collected into sets and emitted sorted (PCI address;
/// node name), so permuted or duplicated input yields identical output.
pub fn aggregate(devices: &[DeviceStatus], traffic: &str) -> ClusterConfig {
    let mut nodes = NodeCapabilities::default();
    let mut pfs: BTreeSet<PfDescriptor> = BTreeSet::new();
    let mut worker_nodes: BTreeSet<String> = BTreeSet::new();

    for device in devices {
        for port in &device.ports {
            if !port.rdma_device.is_empty() {
                nodes.rdma = true;
            }
            if !port.pci_address.is_empty() {
                nodes.sriov = true;
            }
            if !port.network_interface.is_empty() {
                nodes.ib = true;
            }

            if port.rdma_device.is_empty()
                && port.pci_address.is_empty()
                && port.network_interface.is_empty()
            {
                continue;
            }

            pfs.insert(PfDescriptor {
                rdma_device: port.rdma_device.clone(),
                pci_address: port.pci_address.clone(),
                network_interface: port.network_interface.clone(),
                traffic: traffic.to_string(),
            });
        }

        if !device.node.is_empty() {
            worker_nodes.insert(device.node.clone());
        }
    }

    ClusterConfig {
        capabilities: ClusterCapabilities { nodes },
        pfs: pfs.into_iter().collect(),
        worker_nodes: worker_nodes.into_iter().collect(),
    }
}
