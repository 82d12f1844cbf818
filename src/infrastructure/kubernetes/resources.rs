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

//! Construction and inspection of fabric operator cluster objects.

use crate::domain::config::FabricOperatorConf;
use crate::infrastructure::constants::{
    CONFIG_DAEMON_IMAGE, FABRIC_API_GROUP, FABRIC_API_VERSION, FOUNDATION_KIND, OPERATOR_IMAGE,
    PROBE_POLICY_NAME,
};
use crate::shared::error::{FabricError, Result};
use kube::api::DynamicObject;

/// Build the thin probe policy used for capability discovery. It enables only
/// the configuration operator and its per-node daemon, nothing else.
pub fn build_probe_policy(conf: &FabricOperatorConf) -> Result<DynamicObject> {
    let policy = serde_json::json!({
        "apiVersion": format!("{}/{}", FABRIC_API_GROUP, FABRIC_API_VERSION),
        "kind": FOUNDATION_KIND,
        "metadata": {
            "name": PROBE_POLICY_NAME,
        },
        "spec": {
            "configurationOperator": {
                "operator": {
                    "repository": conf.repository,
                    "image": OPERATOR_IMAGE,
                    "version": conf.component_version,
                },
                "configurationDaemon": {
                    "repository": conf.repository,
                    "image": CONFIG_DAEMON_IMAGE,
                    "version": conf.component_version,
                },
            },
        },
    });

    serde_json::from_value(policy).map_err(FabricError::JsonParse)
}

/// Read `(state, reason)` from a policy's status. Returns None when the
/// controller has not reported a state yet.
pub fn policy_status(policy: &DynamicObject) -> Option<(String, String)> {
    let status = policy.data.get("status")?;
    let state = status.get("state")?.as_str()?.to_string();
    let reason = status
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or("")
        .to_string();
    Some((state, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_policy_carries_component_images() {
        let conf = FabricOperatorConf {
            version: "v25.1.0".into(),
            component_version: "v1.0.3".into(),
            repository: "ghcr.io/fabric-operator".into(),
            namespace: "fabric-operator".into(),
        };

        let policy = build_probe_policy(&conf).unwrap();
        assert_eq!(policy.metadata.name.as_deref(), Some(PROBE_POLICY_NAME));
        let operator = &policy.data["spec"]["configurationOperator"]["operator"];
        assert_eq!(operator["repository"], "ghcr.io/fabric-operator");
        assert_eq!(operator["version"], "v1.0.3");
    }

    #[test]
    fn policy_status_reads_state_and_reason() {
        let mut policy = DynamicObject::new("p", &super::super::client::foundation_resource());
        policy.data = serde_json::json!({
            "status": { "state": "error", "reason": "daemon rollout failed" }
        });

        let (state, reason) = policy_status(&policy).unwrap();
        assert_eq!(state, "error");
        assert_eq!(reason, "daemon rollout failed");

        policy.data = serde_json::json!({});
        assert!(policy_status(&policy).is_none());
    }
}
