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

//! Deterministic profile resolution.
//!
//! Resolution is a pure function of the catalog, the intent, and the
//! capability model: candidates owned by the requesting plugin are evaluated
//! in catalog order and the first one whose every specified predicate holds
//! wins. When nothing matches, the failure carries one reason per rejected
//! candidate, naming the first predicate that failed.

use crate::domain::config::{DeploymentIntent, NodeCapabilities};
use crate::domain::profile::catalog::{load_catalog, ProfileDefinition, ResolvedProfile};
use crate::shared::error::{FabricError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Load the catalog fresh and resolve against it, binding the winning
/// profile's paths to the catalog directory.
pub fn find_applicable_profile(
    catalog_dir: &Path,
    intent: &DeploymentIntent,
    capabilities: &NodeCapabilities,
    plugin: &str,
) -> Result<ResolvedProfile> {
    info!(?intent, plugin, "finding applicable profile");
    let catalog = load_catalog(catalog_dir)?;
    debug!(count = catalog.len(), "loaded profile catalog");

    let profile = resolve(&catalog, intent, capabilities, plugin)?;
    info!(profile = %profile.name, "found applicable profile");
    Ok(profile.clone().resolve(catalog_dir))
}

/// The pure resolution core: first candidate passing every specified
/// predicate, in catalog order.
pub fn resolve<'a>(
    catalog: &'a [ProfileDefinition],
    intent: &DeploymentIntent,
    capabilities: &NodeCapabilities,
    plugin: &str,
) -> Result<&'a ProfileDefinition> {
    let mut reasons = Vec::new();

    for profile in catalog.iter().filter(|p| p.plugin == plugin) {
        match matches(profile, intent, capabilities) {
            Ok(()) => return Ok(profile),
            Err(reason) => reasons.push(format!(
                "profile {} is not applicable: {}",
                profile.name, reason
            )),
        }
    }

    Err(FabricError::NoApplicableProfile { reasons })
}

/// Evaluate a single candidate. Returns the first failing predicate as a
/// human-readable reason. An empty-string requirement counts as unspecified,
/// matching the catalog format's "absent means don't care" rule.
fn matches(
    profile: &ProfileDefinition,
    intent: &DeploymentIntent,
    capabilities: &NodeCapabilities,
) -> std::result::Result<(), String> {
    let req = &profile.profile_requirements;

    if let Some(fabric) = req.fabric.as_deref() {
        if !fabric.is_empty() && fabric != intent.fabric {
            return Err(format!(
                "selected fabric type does not match profile requirements: {}",
                fabric
            ));
        }
    }

    if let Some(deployment) = req.deployment.as_deref() {
        if !deployment.is_empty() && deployment != intent.deployment {
            return Err(format!(
                "selected deployment type does not match profile requirements: {}",
                deployment
            ));
        }
    }

    if let Some(multirail) = req.multirail {
        if multirail != intent.multirail {
            return Err(format!(
                "selected multirail setting does not match profile requirements: {}",
                multirail
            ));
        }
    }

    if let Some(spectrum_x) = req.spectrum_x {
        if spectrum_x && !intent.spectrum_x {
            return Err("profile can only be deployed on Spectrum-X clusters".to_string());
        }
        if !spectrum_x && intent.spectrum_x {
            return Err("profile is not applicable to Spectrum-X clusters".to_string());
        }
    }

    if let Some(ai) = req.ai {
        if ai && !intent.ai {
            return Err("profile can only be deployed on AI clusters".to_string());
        }
        if !ai && intent.ai {
            return Err("profile is not applicable to AI clusters".to_string());
        }
    }

    let caps = &profile.node_capabilities;

    if let Some(sriov) = caps.sriov {
        if sriov != capabilities.sriov {
            return Err(format!(
                "cluster sriov capability does not match profile requirements: {}",
                sriov
            ));
        }
    }
    if let Some(rdma) = caps.rdma {
        if rdma != capabilities.rdma {
            return Err(format!(
                "cluster rdma capability does not match profile requirements: {}",
                rdma
            ));
        }
    }
    if let Some(ib) = caps.ib {
        if ib != capabilities.ib {
            return Err(format!(
                "cluster ib capability does not match profile requirements: {}",
                ib
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::catalog::{CapabilityRequirements, IntentRequirements};

    fn profile(name: &str, req: IntentRequirements, caps: CapabilityRequirements) -> ProfileDefinition {
        ProfileDefinition {
            name: name.to_string(),
            plugin: "fabric-operator".to_string(),
            description: String::new(),
            profile_requirements: req,
            node_capabilities: caps,
            deployment_guide: "guide.md".to_string(),
            templates: vec![],
        }
    }

    fn ib_rdma_capabilities() -> NodeCapabilities {
        NodeCapabilities {
            sriov: false,
            rdma: true,
            ib: true,
        }
    }

    fn infiniband_hostdevice_intent() -> DeploymentIntent {
        DeploymentIntent {
            fabric: "infiniband".to_string(),
            deployment: "hostdevice".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_matching_infiniband_profile() {
        let catalog = vec![profile(
            "hostdevice-rdma",
            IntentRequirements {
                fabric: Some("infiniband".to_string()),
                ..Default::default()
            },
            CapabilityRequirements {
                rdma: Some(true),
                ..Default::default()
            },
        )];

        let found = resolve(
            &catalog,
            &infiniband_hostdevice_intent(),
            &ib_rdma_capabilities(),
            "fabric-operator",
        )
        .unwrap();
        assert_eq!(found.name, "hostdevice-rdma");
    }

    #[test]
    fn fabric_requirement_never_matches_other_fabric() {
        let catalog = vec![profile(
            "eth-only",
            IntentRequirements {
                fabric: Some("ethernet".to_string()),
                ..Default::default()
            },
            CapabilityRequirements::default(),
        )];

        let err = resolve(
            &catalog,
            &infiniband_hostdevice_intent(),
            &ib_rdma_capabilities(),
            "fabric-operator",
        )
        .unwrap_err();

        match err {
            FabricError::NoApplicableProfile { reasons } => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("fabric type"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn profile_without_requirements_matches_any_capabilities() {
        let catalog = vec![profile(
            "catch-all",
            IntentRequirements::default(),
            CapabilityRequirements::default(),
        )];

        for capabilities in [
            NodeCapabilities::default(),
            ib_rdma_capabilities(),
            NodeCapabilities {
                sriov: true,
                rdma: true,
                ib: false,
            },
        ] {
            let found = resolve(
                &catalog,
                &infiniband_hostdevice_intent(),
                &capabilities,
                "fabric-operator",
            )
            .unwrap();
            assert_eq!(found.name, "catch-all");
        }
    }

    #[test]
    fn sriov_only_catalog_rejects_with_one_reason_per_candidate() {
        let sriov_caps = CapabilityRequirements {
            sriov: Some(true),
            ..Default::default()
        };
        let catalog = vec![
            profile("sriov-rdma", IntentRequirements::default(), sriov_caps.clone()),
            profile("sriov-ib-rdma", IntentRequirements::default(), sriov_caps),
        ];

        let err = resolve(
            &catalog,
            &infiniband_hostdevice_intent(),
            &ib_rdma_capabilities(),
            "fabric-operator",
        )
        .unwrap_err();

        match err {
            FabricError::NoApplicableProfile { reasons } => {
                assert_eq!(reasons.len(), 2);
                assert!(reasons[0].contains("sriov-rdma"));
                assert!(reasons[1].contains("sriov-ib-rdma"));
                assert!(reasons.iter().all(|r| r.contains("sriov capability")));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn first_matching_candidate_wins_in_catalog_order() {
        let catalog = vec![
            profile("aa", IntentRequirements::default(), CapabilityRequirements::default()),
            profile("bb", IntentRequirements::default(), CapabilityRequirements::default()),
        ];

        let intent = infiniband_hostdevice_intent();
        let caps = ib_rdma_capabilities();
        for _ in 0..3 {
            let found = resolve(&catalog, &intent, &caps, "fabric-operator").unwrap();
            assert_eq!(found.name, "aa");
        }
    }

    #[test]
    fn other_plugins_profiles_are_ignored() {
        let mut foreign = profile(
            "foreign",
            IntentRequirements::default(),
            CapabilityRequirements::default(),
        );
        foreign.plugin = "other-plugin".to_string();
        let catalog = vec![foreign];

        let err = resolve(
            &catalog,
            &infiniband_hostdevice_intent(),
            &ib_rdma_capabilities(),
            "fabric-operator",
        )
        .unwrap_err();

        match err {
            FabricError::NoApplicableProfile { reasons } => assert!(reasons.is_empty()),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn spectrum_x_requirement_is_exact() {
        let sx_profile = |value| {
            profile(
                "sx",
                IntentRequirements {
                    spectrum_x: Some(value),
                    ..Default::default()
                },
                CapabilityRequirements::default(),
            )
        };

        let mut sx_intent = infiniband_hostdevice_intent();
        sx_intent.spectrum_x = true;
        let plain_intent = infiniband_hostdevice_intent();
        let caps = ib_rdma_capabilities();

        assert!(resolve(&[sx_profile(true)], &sx_intent, &caps, "fabric-operator").is_ok());
        assert!(resolve(&[sx_profile(true)], &plain_intent, &caps, "fabric-operator").is_err());
        assert!(resolve(&[sx_profile(false)], &sx_intent, &caps, "fabric-operator").is_err());
        assert!(resolve(&[sx_profile(false)], &plain_intent, &caps, "fabric-operator").is_ok());
    }

    #[test]
    fn multirail_requirement_is_exact() {
        let catalog = vec![profile(
            "multirail-only",
            IntentRequirements {
                multirail: Some(true),
                ..Default::default()
            },
            CapabilityRequirements::default(),
        )];

        let mut intent = infiniband_hostdevice_intent();
        let caps = ib_rdma_capabilities();
        assert!(resolve(&catalog, &intent, &caps, "fabric-operator").is_err());
        intent.multirail = true;
        assert!(resolve(&catalog, &intent, &caps, "fabric-operator").is_ok());
    }
}
