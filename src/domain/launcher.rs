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

//! The three-phase launch workflow: discover cluster capabilities, generate
//! deployment files for the resolved profile, and deploy them to the cluster.
//! Each phase failure aborts the workflow; nothing is silently skipped.

use crate::domain::config::{ClusterConfig, DeploymentIntent, LaunchConfig, NodeCapabilities};
use crate::domain::plugin::{build_registry, FabricPlugin};
use crate::domain::profile::{find_applicable_profile, ResolvedProfile};
use crate::infrastructure::inference::{InferenceOutcome, IntentInference, OpenAiInference};
use crate::infrastructure::kubernetes::client::{FabricKubeClient, FabricKubeClientImpl};
use crate::infrastructure::render::{ManifestRenderer, SubstitutionRenderer};
use crate::shared::error::{FabricError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// All workflow parameters, threaded explicitly from the CLI into the
/// launcher. There is no process-global options state.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    // Phase 1: cluster discovery
    pub discover: bool,
    /// Defaults file loaded before discovery
    pub launch_config: String,
    /// Where the discovered cluster config is written
    pub save_cluster_config: String,
    /// User-provided cluster config (skips discovery)
    pub user_config: Option<String>,

    // Phase 2: deployment generation
    pub fabric: Option<String>,
    pub deployment_type: Option<String>,
    pub multirail: bool,
    pub spectrum_x: bool,
    pub ai: bool,
    /// Path to a prompt file for LLM-assisted intent selection
    pub prompt: Option<String>,
    pub output_dir: String,
    pub profiles_dir: String,
    pub enabled_plugins: Vec<String>,

    pub llm_api_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,

    // Phase 3: cluster deployment
    pub deploy: bool,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
}

pub struct Launcher {
    options: LaunchOptions,
    plugins: BTreeMap<String, Box<dyn FabricPlugin>>,
    client: Option<Arc<dyn FabricKubeClient>>,
    renderer: Box<dyn ManifestRenderer>,
    inference: Option<Box<dyn IntentInference>>,
}

impl Launcher {
    pub fn new(options: LaunchOptions) -> Result<Self> {
        let plugins = build_registry(&options.enabled_plugins)?;

        let inference: Option<Box<dyn IntentInference>> =
            options.llm_api_url.as_ref().map(|url| {
                Box::new(OpenAiInference::new(
                    url.clone(),
                    options.llm_api_key.clone(),
                    options.llm_model.clone(),
                )) as Box<dyn IntentInference>
            });

        Ok(Self {
            options,
            plugins,
            client: None,
            renderer: Box::new(SubstitutionRenderer),
            inference,
        })
    }

    /// Inject a cluster client instead of building one from kubeconfig.
    pub fn with_client(mut self, client: Arc<dyn FabricKubeClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Inject an inference implementation.
    pub fn with_inference(mut self, inference: Box<dyn IntentInference>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("starting fabric-kube workflow");

        // Phase 1: cluster discovery
        let config_path = if self.options.discover {
            self.discover_cluster_config().await?;
            self.options.save_cluster_config.clone()
        } else {
            self.options.user_config.clone().ok_or_else(|| {
                FabricError::config_error(
                    "either --cluster-config or --discover must be provided",
                )
            })?
        };

        let intent_in_cmd = self
            .plugins
            .values()
            .all(|plugin| plugin.intent_configured(&self.options));

        if !intent_in_cmd && self.options.prompt.is_none() {
            info!("profile intent is not configured for every plugin, skipping deployment file generation");
            return Ok(());
        }

        let mut full_config = LaunchConfig::from(&config_path)?;

        if full_config.profile.is_none() {
            let mut intent = DeploymentIntent::default();

            if intent_in_cmd {
                for plugin in self.plugins.values() {
                    plugin.intent_from_options(&self.options, &mut intent);
                }
            } else {
                info!("selecting a profile using the LLM-assisted prompt");
                let outcome = self.infer_intent(&full_config).await?;

                if outcome.confidence == "low" {
                    return Err(FabricError::config_error(format!(
                        "couldn't select a deployment profile based on the prompt; try a \
                         different prompt or select the profile manually with --fabric, \
                         --deployment-type and --multirail. Reason: {}",
                        outcome.reasoning
                    )));
                }

                for plugin in self.plugins.values() {
                    plugin.intent_from_inference(&outcome.fields, &mut intent);
                }
                info!(
                    fabric = %intent.fabric,
                    deployment = %intent.deployment,
                    multirail = intent.multirail,
                    spectrum_x = intent.spectrum_x,
                    ai = intent.ai,
                    reasoning = %outcome.reasoning,
                    "selected options"
                );
            }

            full_config.profile = Some(intent);
        }

        let intent = full_config.profile.clone().unwrap_or_default();
        full_config.validate(&intent.deployment)?;

        let capabilities: NodeCapabilities = full_config
            .cluster_config
            .as_ref()
            .map(|c| c.capabilities.nodes)
            .unwrap_or_default();
        debug!(?capabilities, "resolving against cluster capabilities");

        // Phase 2: profile resolution and deployment file generation
        let mut resolved: Vec<(String, ResolvedProfile)> = Vec::new();
        for name in self.plugins.keys() {
            let profile = find_applicable_profile(
                Path::new(&self.options.profiles_dir),
                &intent,
                &capabilities,
                name,
            )?;
            resolved.push((name.clone(), profile));
        }

        for (plugin_name, profile) in &resolved {
            info!(profile = %profile.definition.name, plugin = %plugin_name, "generating deployment files");
            let plugin = self.plugin(plugin_name)?;
            let rendered = plugin.render(self.renderer.as_ref(), profile, &full_config)?;

            let out_dir = Path::new(&self.options.output_dir).join(plugin_name);
            save_deployment_files(&rendered, &out_dir)?;
        }

        // Phase 3: cluster deployment
        if self.options.deploy {
            let client = self
                .ensure_client(&full_config.fabric_operator.namespace)
                .await?;

            for (plugin_name, profile) in &resolved {
                info!(profile = %profile.definition.name, plugin = %plugin_name, "deploying profile to cluster");
                let manifests_dir = Path::new(&self.options.output_dir).join(plugin_name);
                self.plugin(plugin_name)?
                    .deploy(client.clone(), &manifests_dir)
                    .await?;
                info!(profile = %profile.definition.name, "deployment profile applied successfully");
            }
        }

        info!("fabric-kube workflow completed successfully");
        Ok(())
    }

    /// Run discovery for every plugin and write the merged configuration
    /// (echoed defaults plus discovered cluster config) to the save path.
    async fn discover_cluster_config(&mut self) -> Result<()> {
        if self.options.save_cluster_config.is_empty() {
            return Err(FabricError::config_error(
                "no output path provided for the discovered cluster config",
            ));
        }

        info!(path = %self.options.launch_config, "loading discovery defaults");
        let mut defaults = LaunchConfig::from(&self.options.launch_config)?;
        defaults.cluster_config = Some(ClusterConfig::default());
        defaults.profile = None;

        let client = self.ensure_client(&defaults.fabric_operator.namespace).await?;
        for plugin in self.plugins.values() {
            plugin.discover(client.clone(), &mut defaults).await?;
        }

        let data = serde_yaml::to_string(&defaults)?;
        let save_path = Path::new(&self.options.save_cluster_config);
        if let Some(parent) = save_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(save_path, data)?;

        info!(path = %save_path.display(), "discovered cluster config saved");
        Ok(())
    }

    async fn infer_intent(&self, config: &LaunchConfig) -> Result<InferenceOutcome> {
        let prompt_path = self.options.prompt.as_ref().ok_or_else(|| {
            FabricError::config_error("no profile configured on the command line and no prompt provided")
        })?;
        let prompt = fs::read_to_string(prompt_path).map_err(|e| {
            FabricError::config_error(format!(
                "Failed to read prompt file {}: {}",
                prompt_path, e
            ))
        })?;

        let inference = self.inference.as_ref().ok_or_else(|| {
            FabricError::config_error("--llm-api-url is required when using --prompt")
        })?;

        let capabilities = config.cluster_config.clone().unwrap_or_default();
        inference.infer(&prompt, &capabilities).await
    }

    async fn ensure_client(&mut self, namespace: &str) -> Result<Arc<dyn FabricKubeClient>> {
        if let Some(ref client) = self.client {
            return Ok(client.clone());
        }

        let client = FabricKubeClientImpl::new_with_config(
            namespace.to_string(),
            self.options.kubeconfig.clone(),
            self.options.context.clone(),
        )
        .await?;
        let client: Arc<dyn FabricKubeClient> = Arc::new(client);
        self.client = Some(client.clone());
        Ok(client)
    }

    fn plugin(&self, name: &str) -> Result<&dyn FabricPlugin> {
        self.plugins
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| FabricError::config_error(format!("plugin {} not found", name)))
    }
}

/// Write the rendered files, replacing the directory's previous contents so
/// stale manifests from an earlier profile cannot leak into the apply set.
pub fn save_deployment_files(files: &BTreeMap<String, String>, out_dir: &Path) -> Result<()> {
    info!(directory = %out_dir.display(), "saving deployment files");

    match fs::remove_dir_all(out_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(FabricError::config_error(format!(
                "Failed to clean output directory {}: {}",
                out_dir.display(),
                e
            )));
        }
    }
    fs::create_dir_all(out_dir)?;

    for (name, content) in files {
        let path = out_dir.join(name);
        fs::write(&path, content)?;
        debug!(file = %path.display(), "saved deployment file");
    }

    info!(
        directory = %out_dir.display(),
        file_count = files.len(),
        "all deployment files saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_replaces_previous_directory_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("out");

        let mut first = BTreeMap::new();
        first.insert("stale.yaml".to_string(), "kind: Old\n".to_string());
        save_deployment_files(&first, &out_dir).unwrap();

        let mut second = BTreeMap::new();
        second.insert("fresh.yaml".to_string(), "kind: New\n".to_string());
        save_deployment_files(&second, &out_dir).unwrap();

        assert!(!out_dir.join("stale.yaml").exists());
        assert_eq!(
            fs::read_to_string(out_dir.join("fresh.yaml")).unwrap(),
            "kind: New\n"
        );
    }
}
