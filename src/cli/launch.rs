//! Workflow commands

use crate::domain::config::LaunchConfig;
use crate::domain::launcher::{LaunchOptions, Launcher};
use crate::domain::plugin::fabric_operator::PLUGIN_NAME;
use crate::domain::profile::catalog::load_catalog;
use crate::infrastructure::constants::{
    DEFAULT_CLUSTER_CONFIG_OUT, DEFAULT_DEPLOYMENT_DIR, DEFAULT_LAUNCH_CONFIG,
    DEFAULT_PROFILES_DIR,
};
use clap::Parser;
use std::path::Path;

#[derive(Parser, Debug, Clone)]
pub struct DiscoverCommand {
    /// Defaults file loaded before discovery (operator images, namespace)
    #[arg(long, default_value = DEFAULT_LAUNCH_CONFIG)]
    pub config: String,

    /// Path the discovered cluster configuration is written to
    #[arg(long, short = 'o', default_value = DEFAULT_CLUSTER_CONFIG_OUT)]
    pub output: String,

    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Enabled plugins (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = PLUGIN_NAME)]
    pub plugins: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateCommand {
    /// Cluster configuration file, produced by 'discover' or written by hand
    #[arg(long, value_name = "PATH")]
    pub cluster_config: String,

    /// Fabric type the deployment targets (ethernet, infiniband)
    #[arg(long)]
    pub fabric: Option<String>,

    /// Deployment type (sriov, hostdevice, rdma-shared, ipoib, macvlan)
    #[arg(long)]
    pub deployment_type: Option<String>,

    /// Deploy with multirail support
    #[arg(long)]
    pub multirail: bool,

    /// Deploy on a Spectrum-X cluster
    #[arg(long)]
    pub spectrum_x: bool,

    /// Deploy with AI workload settings
    #[arg(long)]
    pub ai: bool,

    /// File with a prompt for LLM-assisted profile selection
    /// (alternative to --fabric/--deployment-type)
    #[arg(long, value_name = "FILE")]
    pub prompt: Option<String>,

    /// Base URL of an OpenAI-compatible chat completions API
    #[arg(long, env = "FABRIC_KUBE_LLM_API_URL")]
    pub llm_api_url: Option<String>,

    /// API key for the LLM API
    #[arg(long, env = "FABRIC_KUBE_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model requested from the LLM API
    #[arg(long, default_value = "model-router")]
    pub llm_model: String,

    /// Directory the generated deployment files are written to
    /// (its previous contents are replaced)
    #[arg(long, short = 'o', default_value = DEFAULT_DEPLOYMENT_DIR)]
    pub output_dir: String,

    /// Profile catalog directory
    #[arg(long, default_value = DEFAULT_PROFILES_DIR)]
    pub profiles_dir: String,

    /// Enabled plugins (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = PLUGIN_NAME)]
    pub plugins: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeployCommand {
    /// Run capability discovery before generating
    /// (mutually exclusive with --cluster-config)
    #[arg(long)]
    pub discover: bool,

    /// Defaults file loaded before discovery
    #[arg(long, default_value = DEFAULT_LAUNCH_CONFIG)]
    pub config: String,

    /// Where the discovered cluster configuration is saved when using --discover
    #[arg(long, default_value = DEFAULT_CLUSTER_CONFIG_OUT)]
    pub save_cluster_config: String,

    /// Cluster configuration file (skips discovery)
    #[arg(long, value_name = "PATH")]
    pub cluster_config: Option<String>,

    /// Fabric type the deployment targets (ethernet, infiniband)
    #[arg(long)]
    pub fabric: Option<String>,

    /// Deployment type (sriov, hostdevice, rdma-shared, ipoib, macvlan)
    #[arg(long)]
    pub deployment_type: Option<String>,

    /// Deploy with multirail support
    #[arg(long)]
    pub multirail: bool,

    /// Deploy on a Spectrum-X cluster
    #[arg(long)]
    pub spectrum_x: bool,

    /// Deploy with AI workload settings
    #[arg(long)]
    pub ai: bool,

    /// File with a prompt for LLM-assisted profile selection
    #[arg(long, value_name = "FILE")]
    pub prompt: Option<String>,

    #[arg(long, env = "FABRIC_KUBE_LLM_API_URL")]
    pub llm_api_url: Option<String>,

    #[arg(long, env = "FABRIC_KUBE_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    #[arg(long, default_value = "model-router")]
    pub llm_model: String,

    /// Directory the generated deployment files are written to
    #[arg(long, short = 'o', default_value = DEFAULT_DEPLOYMENT_DIR)]
    pub output_dir: String,

    /// Profile catalog directory
    #[arg(long, default_value = DEFAULT_PROFILES_DIR)]
    pub profiles_dir: String,

    /// Enabled plugins (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = PLUGIN_NAME)]
    pub plugins: Vec<String>,

    /// Path to kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long)]
    pub context: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ProfilesCommand {
    /// Profile catalog directory
    #[arg(long, default_value = DEFAULT_PROFILES_DIR)]
    pub profiles_dir: String,
}

impl DiscoverCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let options = LaunchOptions {
            discover: true,
            launch_config: self.config.clone(),
            save_cluster_config: self.output.clone(),
            enabled_plugins: self.plugins.clone(),
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
            ..Default::default()
        };

        let mut launcher = Launcher::new(options)?;
        launcher
            .run()
            .await
            .map_err(|e| anyhow::anyhow!("Discovery failed: {}", e))?;

        // Show what was found
        let saved = LaunchConfig::from(&self.output)?;
        if let Some(ref cluster) = saved.cluster_config {
            use crate::cli::display::TableRenderer;
            println!("{}", TableRenderer::new().render_capabilities(cluster));
        }
        println!("Cluster configuration saved to {}", self.output);

        Ok(())
    }
}

impl GenerateCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        validate_intent_flags(
            self.fabric.is_some() || self.deployment_type.is_some(),
            self.prompt.as_deref(),
            self.llm_api_url.is_some(),
        )?;

        let options = LaunchOptions {
            user_config: Some(self.cluster_config.clone()),
            fabric: self.fabric.clone(),
            deployment_type: self.deployment_type.clone(),
            multirail: self.multirail,
            spectrum_x: self.spectrum_x,
            ai: self.ai,
            prompt: self.prompt.clone(),
            llm_api_url: self.llm_api_url.clone(),
            llm_api_key: self.llm_api_key.clone(),
            llm_model: self.llm_model.clone(),
            output_dir: self.output_dir.clone(),
            profiles_dir: self.profiles_dir.clone(),
            enabled_plugins: self.plugins.clone(),
            ..Default::default()
        };

        let mut launcher = Launcher::new(options)?;
        launcher
            .run()
            .await
            .map_err(|e| anyhow::anyhow!("Deployment file generation failed: {}", e))?;

        println!("Deployment files written to {}", self.output_dir);
        Ok(())
    }
}

impl DeployCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        if self.discover && self.cluster_config.is_some() {
            anyhow::bail!("--discover and --cluster-config cannot be used together");
        }
        if !self.discover && self.cluster_config.is_none() {
            anyhow::bail!("either --discover or --cluster-config must be provided");
        }
        validate_intent_flags(
            self.fabric.is_some() || self.deployment_type.is_some(),
            self.prompt.as_deref(),
            self.llm_api_url.is_some(),
        )?;

        let options = LaunchOptions {
            discover: self.discover,
            launch_config: self.config.clone(),
            save_cluster_config: self.save_cluster_config.clone(),
            user_config: self.cluster_config.clone(),
            fabric: self.fabric.clone(),
            deployment_type: self.deployment_type.clone(),
            multirail: self.multirail,
            spectrum_x: self.spectrum_x,
            ai: self.ai,
            prompt: self.prompt.clone(),
            llm_api_url: self.llm_api_url.clone(),
            llm_api_key: self.llm_api_key.clone(),
            llm_model: self.llm_model.clone(),
            output_dir: self.output_dir.clone(),
            profiles_dir: self.profiles_dir.clone(),
            enabled_plugins: self.plugins.clone(),
            deploy: true,
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        };

        let mut launcher = Launcher::new(options)?;
        launcher
            .run()
            .await
            .map_err(|e| anyhow::anyhow!("Deployment failed: {}", e))?;

        println!("Profile deployed successfully!");
        Ok(())
    }
}

impl ProfilesCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        use crate::cli::display::TableRenderer;

        let catalog = load_catalog(Path::new(&self.profiles_dir))
            .map_err(|e| anyhow::anyhow!("Failed to load profile catalog: {}", e))?;

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_profiles_list(&catalog));

        Ok(())
    }
}

fn validate_intent_flags(
    intent_in_flags: bool,
    prompt: Option<&str>,
    has_llm_url: bool,
) -> anyhow::Result<()> {
    if intent_in_flags && prompt.is_some() {
        anyhow::bail!("--prompt cannot be combined with --fabric/--deployment-type");
    }
    if !intent_in_flags && prompt.is_none() {
        anyhow::bail!(
            "select a profile with --fabric/--deployment-type or provide --prompt for \
             LLM-assisted selection"
        );
    }
    if prompt.is_some() && !has_llm_url {
        anyhow::bail!("--prompt requires --llm-api-url (or FABRIC_KUBE_LLM_API_URL)");
    }
    Ok(())
}
