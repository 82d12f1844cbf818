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

use crate::domain::config::{DeploymentIntent, LaunchConfig};
use crate::domain::deploy::manifest::{decode_manifests, read_manifest_dir};
use crate::domain::deploy::orchestrator::{DeploySettings, DeploymentOrchestrator};
use crate::domain::discovery::engine::{DiscoveryEngine, DiscoverySettings};
use crate::domain::launcher::LaunchOptions;
use crate::domain::plugin::FabricPlugin;
use crate::domain::profile::ResolvedProfile;
use crate::infrastructure::kubernetes::client::FabricKubeClient;
use crate::infrastructure::render::ManifestRenderer;
use crate::shared::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const PLUGIN_NAME: &str = "fabric-operator";
pub const PLUGIN_VERSION: &str = "1.0.0";

pub struct FabricOperatorPlugin;

#[async_trait::async_trait]
impl FabricPlugin for FabricOperatorPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn version(&self) -> &'static str {
        PLUGIN_VERSION
    }

    fn intent_configured(&self, options: &LaunchOptions) -> bool {
        options.fabric.is_some() || options.deployment_type.is_some()
    }

    fn intent_from_options(&self, options: &LaunchOptions, intent: &mut DeploymentIntent) {
        intent.fabric = options.fabric.clone().unwrap_or_default();
        intent.deployment = options.deployment_type.clone().unwrap_or_default();
        intent.multirail = options.multirail;
        intent.spectrum_x = options.spectrum_x;
        intent.ai = options.ai;

        debug!(plugin = PLUGIN_NAME, ?intent, "built profile intent from options");
    }

    fn intent_from_inference(
        &self,
        fields: &HashMap<String, String>,
        intent: &mut DeploymentIntent,
    ) {
        intent.fabric = fields.get("fabric").cloned().unwrap_or_default();
        intent.deployment = fields.get("deploymentType").cloned().unwrap_or_default();
        intent.multirail = fields.get("multirail").map(String::as_str) == Some("true");
        intent.spectrum_x = fields.get("spectrumX").map(String::as_str) == Some("true");
        intent.ai = fields.get("ai").map(String::as_str) == Some("true");

        debug!(plugin = PLUGIN_NAME, ?intent, "built profile intent from inference");
    }

    async fn discover(
        &self,
        client: Arc<dyn FabricKubeClient>,
        config: &mut LaunchConfig,
    ) -> Result<()> {
        let settings = DiscoverySettings::new(config.fabric_operator.clone());
        let engine = DiscoveryEngine::new(client, settings);

        let cluster = engine.discover().await?;
        config.cluster_config = Some(cluster);
        Ok(())
    }

    fn render(
        &self,
        renderer: &dyn ManifestRenderer,
        profile: &ResolvedProfile,
        config: &LaunchConfig,
    ) -> Result<BTreeMap<String, String>> {
        renderer.render(profile, config)
    }

    async fn deploy(
        &self,
        client: Arc<dyn FabricKubeClient>,
        manifests_dir: &Path,
    ) -> Result<()> {
        let files = read_manifest_dir(manifests_dir)?;
        let manifests = decode_manifests(&files)?;

        let orchestrator = DeploymentOrchestrator::new(client, DeploySettings::default());
        orchestrator.deploy(manifests).await
    }
}
