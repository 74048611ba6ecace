//! Engine tunables that used to be literals: fixed hardware meshes, the
//! adapter coupling, and the colors used for fixed/neutral/highlight finishes.

use crate::manifest::{AdapterConfig, Manifest};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Hardware that always renders as dark metal regardless of configuration.
pub const BUILTIN_FIXED_MESHES: &[&str] = &[
    "CT_1-003_Rail_Screw_91251A192",
    "CT_1-004_Rail_Screw_91251A192",
    "CT_2-001_Trigger_Pin_98381A470",
    "CT_2-002_Hammer_Pin_98381A470",
    "CT_3-001_Bolt_Release_Spring_9657K312",
    "CT_3-002_Magazine_Catch_Spring_9657K313",
    "CT_4-001_Takedown_Pin_90145A512",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    pub fixed_meshes: BTreeSet<String>,
    pub adapter: Option<AdapterConfig>,
    pub fixed_color: [f32; 3],
    pub neutral_color: [f32; 3],
    pub highlight_color: [f32; 3],
    pub highlight_intensity: f32,
    /// Directory texture URLs are resolved against.
    pub texture_root: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fixed_meshes: BUILTIN_FIXED_MESHES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            adapter: None,
            fixed_color: [0.02, 0.02, 0.02],
            neutral_color: [0.55, 0.55, 0.58],
            highlight_color: [1.0, 0.68, 0.24],
            highlight_intensity: 0.35,
            texture_root: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineSettings {
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Folds manifest-provided rules in: fixed lists are unioned and a
    /// manifest adapter replaces the configured one.
    pub fn merged_with(&self, manifest: &Manifest) -> Self {
        let mut merged = self.clone();
        merged
            .fixed_meshes
            .extend(manifest.fixed_meshes.iter().cloned());
        if manifest.adapter.is_some() {
            merged.adapter = manifest.adapter.clone();
        }
        merged
    }

    pub fn fixed_color(&self) -> Vec3 {
        Vec3::from_array(self.fixed_color)
    }

    pub fn neutral_color(&self) -> Vec3 {
        Vec3::from_array(self.neutral_color)
    }

    pub fn highlight_color(&self) -> Vec3 {
        Vec3::from_array(self.highlight_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::load_manifest_from_str;

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{ "highlightIntensity": 0.8 }"#).unwrap();
        assert_eq!(settings.highlight_intensity, 0.8);
        assert!(settings
            .fixed_meshes
            .contains("CT_1-003_Rail_Screw_91251A192"));
        assert_eq!(settings.texture_root, PathBuf::from("public"));
    }

    #[test]
    fn manifest_rules_extend_settings() {
        let manifest =
            load_manifest_from_str(include_str!("../../demos/m200_manifest.json")).unwrap();
        let merged = EngineSettings::default().merged_with(&manifest);
        assert!(merged.fixed_meshes.contains("Bolt_Spring"));
        assert!(merged
            .fixed_meshes
            .contains("CT_1-003_Rail_Screw_91251A192"));
        assert_eq!(
            merged.adapter.as_ref().map(|adapter| adapter.owner_part.as_str()),
            Some("muzzle")
        );
    }

    #[test]
    fn neutral_and_fixed_colors_differ() {
        let settings = EngineSettings::default();
        assert_ne!(settings.fixed_color(), settings.neutral_color());
    }
}
