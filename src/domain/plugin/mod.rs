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

//! Plugin seam for resource-family behavior.
//!
//! A plugin owns the discovery, rendering, and deployment behavior for one
//! resource family. Registration is an explicit name-to-implementation map
//! resolved once at workflow start.

pub mod fabric_operator;

use crate::domain::config::{DeploymentIntent, LaunchConfig};
use crate::domain::launcher::LaunchOptions;
use crate::domain::profile::ResolvedProfile;
use crate::infrastructure::kubernetes::client::FabricKubeClient;
use crate::infrastructure::render::ManifestRenderer;
use crate::shared::error::{FabricError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

pub use fabric_operator::FabricOperatorPlugin;

#[async_trait::async_trait]
pub trait FabricPlugin: Send + Sync {
    /// Plugin name, used to enable plugins and match catalog entries.
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str;

    /// True when the options carry enough flags to build this plugin's intent.
    fn intent_configured(&self, options: &LaunchOptions) -> bool;

    fn intent_from_options(&self, options: &LaunchOptions, intent: &mut DeploymentIntent);

    fn intent_from_inference(
        &self,
        fields: &HashMap<String, String>,
        intent: &mut DeploymentIntent,
    );

    /// Discover this plugin's part of the cluster configuration and record it
    /// on the given config. Must edit `config.cluster_config`, not replace
    /// the surrounding config.
    async fn discover(
        &self,
        client: Arc<dyn FabricKubeClient>,
        config: &mut LaunchConfig,
    ) -> Result<()>;

    fn render(
        &self,
        renderer: &dyn ManifestRenderer,
        profile: &ResolvedProfile,
        config: &LaunchConfig,
    ) -> Result<BTreeMap<String, String>>;

    /// Apply the rendered manifests under `manifests_dir` to the cluster.
    async fn deploy(
        &self,
        client: Arc<dyn FabricKubeClient>,
        manifests_dir: &Path,
    ) -> Result<()>;
}

/// Build the plugin registry from the enabled-plugin names. Unknown names are
/// a configuration error, not silently skipped.
pub fn build_registry(enabled: &[String]) -> Result<BTreeMap<String, Box<dyn FabricPlugin>>> {
    let mut registry: BTreeMap<String, Box<dyn FabricPlugin>> = BTreeMap::new();

    for name in enabled {
        match name.as_str() {
            fabric_operator::PLUGIN_NAME => {
                registry.insert(name.clone(), Box::new(FabricOperatorPlugin));
            }
            unknown => {
                return Err(FabricError::config_error(format!(
                    "unknown plugin: {}",
                    unknown
                )));
            }
        }
    }

    Ok(registry)
}
