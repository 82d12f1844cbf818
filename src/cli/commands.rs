// CLI command definitions

use super::launch::{DeployCommand, DiscoverCommand, GenerateCommand, ProfilesCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fabric-kube",
    version,
    about = "Network fabric deployment and configuration tool for Kubernetes",
    long_about = "fabric-kube provisions network fabric configuration on a Kubernetes cluster \
in three phases: discover the cluster's fabric capabilities with a temporary probe policy, \
generate deployment files for the profile matching your intent, and apply them to the cluster \
with foundation-first ordering."
)]
pub struct CliArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Discover cluster fabric capabilities via a temporary probe policy
    Discover(DiscoverCommand),

    /// Resolve a profile and generate its deployment files
    Generate(GenerateCommand),

    /// Generate deployment files and apply them to the cluster
    Deploy(DeployCommand),

    /// List the profiles available in the catalog
    Profiles(ProfilesCommand),
}
