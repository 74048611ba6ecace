use super::selector;
use crate::manifest::Part;
use std::collections::{BTreeSet, HashSet};

/// Meshes that must not take a configured finish.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    fixed: HashSet<String>,
}

impl ExclusionFilter {
    pub fn new(fixed_meshes: &BTreeSet<String>) -> Self {
        Self {
            fixed: fixed_meshes.iter().cloned().collect(),
        }
    }

    /// Hardware on the fixed list. Checked before part resolution.
    pub fn is_fixed(&self, mesh_name: &str) -> bool {
        self.fixed.contains(mesh_name)
    }

    /// Sub-meshes of a colorable part that keep the dark hardware finish.
    /// They still belong to `part` for picking and highlight.
    pub fn is_excluded_from_color(&self, mesh_name: &str, part: &Part) -> bool {
        part.exclude_from_color
            .iter()
            .any(|pattern| selector::matches(mesh_name, pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> Part {
        Part {
            id: "receiver".to_string(),
            label: "Receiver".to_string(),
            mesh_selectors: vec!["Receiver_*".to_string()],
            exclude_from_color: vec!["Receiver_Screw*".to_string()],
            hosts_caliber: true,
            hosts_suppressor: false,
        }
    }

    #[test]
    fn fixed_list_is_exact() {
        let fixed: BTreeSet<String> = ["CT_1-003_Rail_Screw_91251A192".to_string()].into();
        let filter = ExclusionFilter::new(&fixed);
        assert!(filter.is_fixed("CT_1-003_Rail_Screw_91251A192"));
        assert!(!filter.is_fixed("CT_1-003_Rail_Screw"));
    }

    #[test]
    fn exclude_from_color_uses_selector_rules() {
        let filter = ExclusionFilter::default();
        let part = receiver();
        assert!(filter.is_excluded_from_color("Receiver_Screw_04", &part));
        assert!(filter.is_excluded_from_color("receiver_screw", &part));
        assert!(!filter.is_excluded_from_color("Receiver_Upper", &part));
    }
}
