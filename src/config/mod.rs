pub mod serialization;
pub mod settings;
pub mod summary;

use crate::manifest::{FinishMode, HardwareKind, Manifest, PartId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use settings::EngineSettings;
pub use summary::ConfigurationSummary;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("unknown part '{0}'")]
    UnknownPart(String),
    #[error("part '{0}' is not configurable")]
    NotConfigurable(String),
    #[error("unknown {mode:?} option '{id}'")]
    UnknownFinish { mode: FinishMode, id: String },
    #[error("unknown {kind:?} variant '{id}'")]
    UnknownVariant { kind: HardwareKind, id: String },
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Live configuration for one session.
///
/// Mutators validate against the manifest and leave the state untouched on
/// error. Every accepted mutation bumps [`revision`](Self::revision);
/// hover and selection do not, since they never change base materials.
/// The revision only orders changes within one instance; use
/// [`same_configuration`](Self::same_configuration) to compare two states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationState {
    #[serde(default)]
    finish_mode: FinishMode,
    #[serde(default)]
    selected_pattern: Option<String>,
    #[serde(default)]
    selected_colors: BTreeMap<PartId, String>,
    #[serde(default)]
    part_color_overrides: BTreeMap<PartId, String>,
    #[serde(default)]
    selected_caliber: Option<String>,
    #[serde(default)]
    selected_suppressor: Option<String>,
    #[serde(default)]
    selected_trigger: Option<String>,
    #[serde(skip)]
    hovered_mesh: Option<String>,
    #[serde(skip)]
    selected_mesh: Option<String>,
    #[serde(skip)]
    revision: u64,
}

impl ConfigurationState {
    /// Defaults derived from the manifest: colors mode, the first color on
    /// every configurable part, default hardware variants.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let selected_colors = match manifest.finish_modes.colors.first() {
            Some(first) => manifest
                .configurable()
                .map(|part| (part.id.clone(), first.id.clone()))
                .collect(),
            None => BTreeMap::new(),
        };
        let default_id =
            |kind: HardwareKind| manifest.default_variant(kind).map(|variant| variant.id.clone());
        Self {
            finish_mode: FinishMode::Colors,
            selected_pattern: None,
            selected_colors,
            part_color_overrides: BTreeMap::new(),
            selected_caliber: default_id(HardwareKind::Caliber),
            selected_suppressor: default_id(HardwareKind::Suppressor),
            selected_trigger: default_id(HardwareKind::Trigger),
            hovered_mesh: None,
            selected_mesh: None,
            revision: 0,
        }
    }

    /// Restores manifest defaults. The revision keeps increasing so a
    /// renderer never mistakes the reset state for one it already applied.
    pub fn reset(&mut self, manifest: &Manifest) {
        let revision = self.revision + 1;
        *self = Self::from_manifest(manifest);
        self.revision = revision;
    }

    pub fn finish_mode(&self) -> FinishMode {
        self.finish_mode
    }

    pub fn selected_pattern(&self) -> Option<&str> {
        self.selected_pattern.as_deref()
    }

    pub fn selected_colors(&self) -> &BTreeMap<PartId, String> {
        &self.selected_colors
    }

    pub fn part_color_overrides(&self) -> &BTreeMap<PartId, String> {
        &self.part_color_overrides
    }

    pub fn selected_variant(&self, kind: HardwareKind) -> Option<&str> {
        match kind {
            HardwareKind::Caliber => self.selected_caliber.as_deref(),
            HardwareKind::Suppressor => self.selected_suppressor.as_deref(),
            HardwareKind::Trigger => self.selected_trigger.as_deref(),
        }
    }

    pub fn hovered_mesh(&self) -> Option<&str> {
        self.hovered_mesh.as_deref()
    }

    pub fn selected_mesh(&self) -> Option<&str> {
        self.selected_mesh.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when both states would give every mesh the same base material.
    /// Hover, selection and revision are ignored.
    pub fn same_configuration(&self, other: &Self) -> bool {
        self.finish_mode == other.finish_mode
            && self.selected_pattern == other.selected_pattern
            && self.selected_colors == other.selected_colors
            && self.part_color_overrides == other.part_color_overrides
            && self.selected_caliber == other.selected_caliber
            && self.selected_suppressor == other.selected_suppressor
            && self.selected_trigger == other.selected_trigger
    }

    pub fn set_finish_mode(&mut self, mode: FinishMode) {
        if self.finish_mode != mode {
            self.finish_mode = mode;
            self.touch();
        }
    }

    pub fn select_color(&mut self, manifest: &Manifest, part_id: &str, color_id: &str) -> Result<()> {
        check_configurable(manifest, part_id)?;
        check_finish(manifest, FinishMode::Colors, color_id)?;
        self.selected_colors
            .insert(part_id.to_string(), color_id.to_string());
        self.touch();
        Ok(())
    }

    /// Sets the same color on every configurable part.
    pub fn apply_color_to_all(&mut self, manifest: &Manifest, color_id: &str) -> Result<()> {
        check_finish(manifest, FinishMode::Colors, color_id)?;
        for part in manifest.configurable() {
            self.selected_colors
                .insert(part.id.clone(), color_id.to_string());
        }
        self.touch();
        Ok(())
    }

    pub fn select_pattern(&mut self, manifest: &Manifest, pattern_id: &str) -> Result<()> {
        check_finish(manifest, FinishMode::Patterns, pattern_id)?;
        self.selected_pattern = Some(pattern_id.to_string());
        self.touch();
        Ok(())
    }

    pub fn clear_pattern(&mut self) {
        if self.selected_pattern.take().is_some() {
            self.touch();
        }
    }

    /// Paints one part a solid color on top of the global pattern.
    pub fn set_part_override(
        &mut self,
        manifest: &Manifest,
        part_id: &str,
        color_id: &str,
    ) -> Result<()> {
        check_configurable(manifest, part_id)?;
        check_finish(manifest, FinishMode::Colors, color_id)?;
        self.part_color_overrides
            .insert(part_id.to_string(), color_id.to_string());
        self.touch();
        Ok(())
    }

    pub fn clear_part_override(&mut self, part_id: &str) {
        if self.part_color_overrides.remove(part_id).is_some() {
            self.touch();
        }
    }

    pub fn clear_part_overrides(&mut self) {
        if !self.part_color_overrides.is_empty() {
            self.part_color_overrides.clear();
            self.touch();
        }
    }

    pub fn select_variant(
        &mut self,
        manifest: &Manifest,
        kind: HardwareKind,
        variant_id: &str,
    ) -> Result<()> {
        if manifest.variant(kind, variant_id).is_none() {
            return Err(StateError::UnknownVariant {
                kind,
                id: variant_id.to_string(),
            });
        }
        let slot = match kind {
            HardwareKind::Caliber => &mut self.selected_caliber,
            HardwareKind::Suppressor => &mut self.selected_suppressor,
            HardwareKind::Trigger => &mut self.selected_trigger,
        };
        *slot = Some(variant_id.to_string());
        self.touch();
        Ok(())
    }

    pub fn select_caliber(&mut self, manifest: &Manifest, id: &str) -> Result<()> {
        self.select_variant(manifest, HardwareKind::Caliber, id)
    }

    pub fn select_suppressor(&mut self, manifest: &Manifest, id: &str) -> Result<()> {
        self.select_variant(manifest, HardwareKind::Suppressor, id)
    }

    pub fn select_trigger(&mut self, manifest: &Manifest, id: &str) -> Result<()> {
        self.select_variant(manifest, HardwareKind::Trigger, id)
    }

    pub fn set_hovered_mesh(&mut self, mesh: Option<&str>) {
        self.hovered_mesh = mesh.map(str::to_string);
    }

    pub fn set_selected_mesh(&mut self, mesh: Option<&str>) {
        self.selected_mesh = mesh.map(str::to_string);
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn check_configurable(manifest: &Manifest, part_id: &str) -> Result<()> {
    if manifest.part(part_id).is_none() {
        return Err(StateError::UnknownPart(part_id.to_string()));
    }
    if !manifest.is_configurable(part_id) {
        return Err(StateError::NotConfigurable(part_id.to_string()));
    }
    Ok(())
}

fn check_finish(manifest: &Manifest, mode: FinishMode, id: &str) -> Result<()> {
    match manifest.finish_option(mode, id) {
        Some(_) => Ok(()),
        None => Err(StateError::UnknownFinish {
            mode,
            id: id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::load_manifest_from_str;

    fn manifest() -> Manifest {
        load_manifest_from_str(include_str!("../../demos/m200_manifest.json")).unwrap()
    }

    #[test]
    fn defaults_come_from_manifest() {
        let manifest = manifest();
        let state = ConfigurationState::from_manifest(&manifest);
        assert_eq!(state.finish_mode(), FinishMode::Colors);
        assert_eq!(state.selected_pattern(), None);
        assert_eq!(state.selected_colors().len(), manifest.configurable_parts.len());
        assert!(state.selected_colors().values().all(|id| id == "black"));
        assert!(!state.selected_colors().contains_key("bipod"));
        assert_eq!(state.selected_variant(HardwareKind::Caliber), Some("408-cheytac"));
        assert_eq!(state.selected_variant(HardwareKind::Suppressor), Some("none"));
        assert_eq!(state.selected_variant(HardwareKind::Trigger), Some("standard"));
    }

    #[test]
    fn rejected_mutations_leave_state_unchanged() {
        let manifest = manifest();
        let mut state = ConfigurationState::from_manifest(&manifest);
        let before = state.clone();

        assert_eq!(
            state.select_color(&manifest, "bipod", "fde"),
            Err(StateError::NotConfigurable("bipod".to_string()))
        );
        assert_eq!(
            state.select_color(&manifest, "scope", "fde"),
            Err(StateError::UnknownPart("scope".to_string()))
        );
        assert!(matches!(
            state.set_part_override(&manifest, "barrel", "kryptek-raid"),
            Err(StateError::UnknownFinish { mode: FinishMode::Colors, .. })
        ));
        assert!(matches!(
            state.select_variant(&manifest, HardwareKind::Suppressor, "charlie"),
            Err(StateError::UnknownVariant { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn mutations_bump_revision_but_hover_does_not() {
        let manifest = manifest();
        let mut state = ConfigurationState::from_manifest(&manifest);
        let start = state.revision();

        state.select_color(&manifest, "barrel", "fde").unwrap();
        assert_eq!(state.revision(), start + 1);

        state.set_hovered_mesh(Some("Barrel_Fluted_01"));
        state.set_selected_mesh(Some("Stock"));
        assert_eq!(state.revision(), start + 1);

        // No-op mode switch is not a change.
        state.set_finish_mode(FinishMode::Colors);
        assert_eq!(state.revision(), start + 1);
    }

    #[test]
    fn reset_restores_defaults_and_advances_revision() {
        let manifest = manifest();
        let mut state = ConfigurationState::from_manifest(&manifest);
        state.set_finish_mode(FinishMode::Patterns);
        state.select_pattern(&manifest, "multicam").unwrap();
        state.set_part_override(&manifest, "stock", "fde").unwrap();
        state.set_hovered_mesh(Some("Stock"));
        let revision = state.revision();

        state.reset(&manifest);
        assert!(state.revision() > revision);
        assert_eq!(state.finish_mode(), FinishMode::Colors);
        assert_eq!(state.selected_pattern(), None);
        assert!(state.part_color_overrides().is_empty());
        assert_eq!(state.hovered_mesh(), None);
    }

    #[test]
    fn apply_color_to_all_touches_only_configurable_parts() {
        let manifest = manifest();
        let mut state = ConfigurationState::default();
        state.apply_color_to_all(&manifest, "tungsten").unwrap();
        assert_eq!(state.selected_colors().len(), manifest.configurable_parts.len());
        assert!(state.selected_colors().values().all(|id| id == "tungsten"));
    }

    #[test]
    fn same_configuration_ignores_transient_fields() {
        let manifest = manifest();
        let base = ConfigurationState::from_manifest(&manifest);

        let mut hovered = base.clone();
        hovered.set_hovered_mesh(Some("Stock"));
        hovered.set_finish_mode(FinishMode::Patterns);
        hovered.set_finish_mode(FinishMode::Colors);
        assert_ne!(hovered.revision(), base.revision());
        assert!(base.same_configuration(&hovered));

        // Same revision, different contents.
        let painted: ConfigurationState =
            serde_json::from_str(r#"{ "selectedColors": { "stock": "fde" } }"#).unwrap();
        assert_eq!(painted.revision(), ConfigurationState::default().revision());
        assert!(!painted.same_configuration(&ConfigurationState::default()));
    }

    #[test]
    fn hardware_shortcuts_select_per_kind() {
        let manifest = manifest();
        let mut state = ConfigurationState::from_manifest(&manifest);
        state.select_caliber(&manifest, "375-cheytac").unwrap();
        state.select_suppressor(&manifest, "alpha").unwrap();
        state.select_trigger(&manifest, "match").unwrap();
        assert_eq!(state.selected_variant(HardwareKind::Caliber), Some("375-cheytac"));
        assert_eq!(state.selected_variant(HardwareKind::Suppressor), Some("alpha"));
        assert_eq!(state.selected_variant(HardwareKind::Trigger), Some("match"));
        // Ids are checked against their own list only.
        assert!(state.select_trigger(&manifest, "alpha").is_err());
    }
}
