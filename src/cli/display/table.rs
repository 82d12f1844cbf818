//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::config::ClusterConfig;
use crate::domain::profile::ProfileDefinition;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render the profile catalog as a formatted table
    pub fn render_profiles_list(&self, profiles: &[ProfileDefinition]) -> String {
        if profiles.is_empty() {
            return "No profiles found in the catalog".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("PROFILE").set_alignment(CellAlignment::Left),
                Cell::new("PLUGIN").set_alignment(CellAlignment::Left),
                Cell::new("FABRIC").set_alignment(CellAlignment::Center),
                Cell::new("DEPLOYMENT").set_alignment(CellAlignment::Center),
                Cell::new("DESCRIPTION").set_alignment(CellAlignment::Left),
            ]);

        for profile in profiles {
            let fabric = profile
                .profile_requirements
                .fabric
                .as_deref()
                .filter(|f| !f.is_empty())
                .unwrap_or("any");
            let deployment = profile
                .profile_requirements
                .deployment
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("any");

            table.add_row(vec![
                Cell::new(&profile.name),
                Cell::new(&profile.plugin),
                Cell::new(fabric),
                Cell::new(deployment),
                Cell::new(&profile.description),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Fabric Profiles {} ─╮\n",
            format!("[{} profiles]", profiles.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');

        output
    }

    /// Render a discovered capability model
    pub fn render_capabilities(&self, cluster: &ClusterConfig) -> String {
        let nodes = &cluster.capabilities.nodes;

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("CAPABILITY").set_alignment(CellAlignment::Left),
                Cell::new("AVAILABLE").set_alignment(CellAlignment::Center),
            ]);

        for (name, enabled) in [
            ("SR-IOV", nodes.sriov),
            ("RDMA", nodes.rdma),
            ("InfiniBand", nodes.ib),
        ] {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::get_capability_icon(enabled),
                    if enabled { "yes" } else { "no" }
                ))
                .fg(self.theme.get_capability_color(enabled)),
            ]);
        }

        let mut pf_table = Table::new();
        pf_table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("PCI ADDRESS"),
                Cell::new("RDMA DEVICE"),
                Cell::new("INTERFACE"),
                Cell::new("TRAFFIC"),
            ]);
        for pf in &cluster.pfs {
            pf_table.add_row(vec![
                Cell::new(&pf.pci_address),
                Cell::new(&pf.rdma_device),
                Cell::new(&pf.network_interface),
                Cell::new(&pf.traffic),
            ]);
        }

        let mut output = String::new();
        output.push_str("Cluster capabilities:\n");
        output.push_str(&table.to_string());
        output.push('\n');

        if !cluster.pfs.is_empty() {
            output.push_str(&format!(
                "\nPhysical functions {}:\n",
                format!("[{}]", cluster.pfs.len()).bright_black()
            ));
            output.push_str(&pf_table.to_string());
            output.push('\n');
        }

        if !cluster.worker_nodes.is_empty() {
            output.push_str(&format!(
                "\nWorker nodes: {}\n",
                cluster.worker_nodes.join(", ")
            ));
        }

        output
    }
}
