use crate::config::ConfigurationState;
use crate::manifest::{AdapterConfig, HardwareKind, PartId};

/// The one adapter mesh that takes its owner part's finish while a hardware
/// variant is attached (e.g. the hub under a suppressor). With the "none"
/// variant the adapter is an ordinary mesh again.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingRule {
    adapter_mesh: String,
    owner_part: PartId,
    hardware: HardwareKind,
    none_variant: String,
}

impl CouplingRule {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            adapter_mesh: config.mesh.clone(),
            owner_part: config.owner_part.clone(),
            hardware: config.hardware,
            none_variant: config.none_variant.clone(),
        }
    }

    pub fn adapter_mesh(&self) -> &str {
        &self.adapter_mesh
    }

    pub fn owner_part(&self) -> &str {
        &self.owner_part
    }

    pub fn is_engaged(&self, state: &ConfigurationState) -> bool {
        state
            .selected_variant(self.hardware)
            .is_some_and(|id| id != self.none_variant)
    }

    /// Part whose finish `mesh_name` must mirror, if the rule applies now.
    pub fn coupled_part(&self, mesh_name: &str, state: &ConfigurationState) -> Option<&str> {
        (mesh_name == self.adapter_mesh && self.is_engaged(state)).then_some(self.owner_part.as_str())
    }
}
