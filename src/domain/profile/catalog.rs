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

//! Profile catalog: one directory per profile, each holding a `profile.yaml`
//! plus the manifest templates it references.

use crate::infrastructure::constants::PROFILE_MANIFEST;
use crate::shared::error::{FabricError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Intent predicates of a profile. Absent fields mean "don't care".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentRequirements {
    pub fabric: Option<String>,
    pub deployment: Option<String>,
    pub multirail: Option<bool>,
    pub spectrum_x: Option<bool>,
    pub ai: Option<bool>,
}

/// Cluster capability predicates of a profile. Absent fields mean "don't care".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityRequirements {
    pub sriov: Option<bool>,
    pub rdma: Option<bool>,
    pub ib: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDefinition {
    /// Catalog directory entry name, set by the loader
    #[serde(skip)]
    pub name: String,
    pub plugin: String,
    pub description: String,
    pub profile_requirements: IntentRequirements,
    pub node_capabilities: CapabilityRequirements,
    pub deployment_guide: String,
    pub templates: Vec<String>,
}

/// A profile bound to its catalog directory, with template and guide paths
/// made concrete.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub definition: ProfileDefinition,
    pub templates: Vec<PathBuf>,
    pub deployment_guide: PathBuf,
}

impl ProfileDefinition {
    pub fn resolve(self, catalog_dir: &Path) -> ResolvedProfile {
        let dir = catalog_dir.join(&self.name);
        let templates = self.templates.iter().map(|t| dir.join(t)).collect();
        let deployment_guide = dir.join(&self.deployment_guide);

        ResolvedProfile {
            definition: self,
            templates,
            deployment_guide,
        }
    }
}

/// Load every catalog entry under `dir`, sorted by entry name so that
/// resolution order does not depend on directory-listing order.
pub fn load_catalog(dir: &Path) -> Result<Vec<ProfileDefinition>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        FabricError::config_error(format!(
            "Failed to read profiles directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let mut catalog = Vec::with_capacity(names.len());
    for name in names {
        let manifest_path = dir.join(&name).join(PROFILE_MANIFEST);
        let content = fs::read_to_string(&manifest_path).map_err(|e| {
            FabricError::config_error(format!(
                "Failed to read profile manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;

        let mut profile: ProfileDefinition = serde_yaml::from_str(&content).map_err(|e| {
            FabricError::config_error(format!(
                "Failed to parse profile manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        profile.name = name;
        catalog.push(profile);
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_profile(dir: &Path, name: &str, body: &str) {
        let profile_dir = dir.join(name);
        fs::create_dir_all(&profile_dir).unwrap();
        fs::write(profile_dir.join(PROFILE_MANIFEST), body).unwrap();
    }

    #[test]
    fn loads_entries_sorted_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_profile(
            tmp.path(),
            "zz-last",
            "plugin: fabric-operator\ndescription: z\n",
        );
        write_profile(
            tmp.path(),
            "aa-first",
            "plugin: fabric-operator\ndescription: a\n",
        );

        let catalog = load_catalog(tmp.path()).unwrap();
        let names: Vec<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["aa-first", "zz-last"]);
    }

    #[test]
    fn parses_requirements_and_capabilities() {
        let tmp = tempfile::tempdir().unwrap();
        write_profile(
            tmp.path(),
            "hostdevice-rdma",
            r#"
plugin: fabric-operator
description: Host-device RDMA over InfiniBand
profileRequirements:
  fabric: infiniband
  deployment: hostdevice
  multirail: false
nodeCapabilities:
  rdma: true
deploymentGuide: guide.md
templates:
  - 10-policy.yaml
  - 20-network.yaml
"#,
        );

        let catalog = load_catalog(tmp.path()).unwrap();
        let profile = &catalog[0];
        assert_eq!(profile.profile_requirements.fabric.as_deref(), Some("infiniband"));
        assert_eq!(profile.profile_requirements.multirail, Some(false));
        assert_eq!(profile.profile_requirements.spectrum_x, None);
        assert_eq!(profile.node_capabilities.rdma, Some(true));
        assert_eq!(profile.node_capabilities.sriov, None);

        let resolved = profile.clone().resolve(tmp.path());
        assert!(resolved.templates[0].ends_with("hostdevice-rdma/10-policy.yaml"));
        assert!(resolved.deployment_guide.ends_with("hostdevice-rdma/guide.md"));
    }

    #[test]
    fn missing_manifest_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("empty-entry")).unwrap();

        let err = load_catalog(tmp.path()).unwrap_err();
        assert!(matches!(err, FabricError::ConfigError(_)));
    }
}
