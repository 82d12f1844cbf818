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

//! Manifest rendering seam.
//!
//! The workflow treats rendering as an opaque function from a profile's
//! template paths and the launch configuration to concrete manifest text.
//! The default implementation substitutes `${a.b.c}` placeholders with
//! scalar values from the YAML-flattened configuration.

use crate::domain::config::LaunchConfig;
use crate::domain::profile::ResolvedProfile;
use crate::shared::error::{FabricError, Result};
use std::collections::BTreeMap;
use std::fs;

pub trait ManifestRenderer: Send + Sync {
    /// Render every template of the profile. Keys of the returned map are
    /// template file names; values are manifest text ready for decoding.
    fn render(
        &self,
        profile: &ResolvedProfile,
        config: &LaunchConfig,
    ) -> Result<BTreeMap<String, String>>;
}

#[derive(Debug, Default)]
pub struct SubstitutionRenderer;

impl ManifestRenderer for SubstitutionRenderer {
    fn render(
        &self,
        profile: &ResolvedProfile,
        config: &LaunchConfig,
    ) -> Result<BTreeMap<String, String>> {
        let vars = flatten_config(config)?;
        let mut rendered = BTreeMap::new();

        for template in &profile.templates {
            let content = fs::read_to_string(template).map_err(|e| {
                FabricError::config_error(format!(
                    "Failed to read template file {}: {}",
                    template.display(),
                    e
                ))
            })?;

            let file_name = template
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    FabricError::config_error(format!(
                        "Template path has no file name: {}",
                        template.display()
                    ))
                })?;

            let output = substitute(&content, &vars).map_err(|e| {
                FabricError::config_error(format!(
                    "Failed to render template {}: {}",
                    template.display(),
                    e
                ))
            })?;

            rendered.insert(file_name, output);
        }

        Ok(rendered)
    }
}

/// Flatten the configuration into dotted scalar paths, e.g.
/// `fabricOperator.repository` or `sriov.numVfs`.
fn flatten_config(config: &LaunchConfig) -> Result<BTreeMap<String, String>> {
    let value = serde_yaml::to_value(config)?;
    let mut vars = BTreeMap::new();
    flatten_value(&value, String::new(), &mut vars);
    Ok(vars)
}

fn flatten_value(value: &serde_yaml::Value, prefix: String, out: &mut BTreeMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for (key, child) in mapping {
                if let Some(key) = key.as_str() {
                    let path = if prefix.is_empty() {
                        key.to_string()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    flatten_value(child, path, out);
                }
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_value(child, format!("{}.{}", prefix, index), out);
            }
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        serde_yaml::Value::Number(n) => {
            out.insert(prefix, n.to_string());
        }
        serde_yaml::Value::Bool(b) => {
            out.insert(prefix, b.to_string());
        }
        serde_yaml::Value::Null | serde_yaml::Value::Tagged(_) => {}
    }
}

/// Replace `${path}` placeholders. An unresolved placeholder is an error so
/// that a template referencing a missing config field fails loudly instead of
/// producing a manifest with a hole in it.
fn substitute(content: &str, vars: &BTreeMap<String, String>) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| "unterminated placeholder".to_string())?;
        let key = &after[..end];
        let value = vars
            .get(key)
            .ok_or_else(|| format!("unresolved placeholder '{}'", key))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
