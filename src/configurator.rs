//! One configurator session: the manifest, the live state and the
//! applicator that keeps a scene's materials in step with both.

use crate::config::{ConfigurationState, ConfigurationSummary, EngineSettings, StateError};
use crate::manifest::{HardwareKind, Manifest};
use crate::render::{ApplyReport, SceneMaterialApplicator, TextureCache, TextureLoader};
use crate::scene::Scene;

pub struct Configurator {
    manifest: Manifest,
    state: ConfigurationState,
    applicator: SceneMaterialApplicator,
    needs_apply: bool,
}

impl Configurator {
    /// Starts from the manifest defaults. Manifest fixed meshes and adapter
    /// rules are merged over `settings`.
    pub fn new(manifest: Manifest, settings: &EngineSettings, loader: Box<dyn TextureLoader>) -> Self {
        let settings = settings.merged_with(&manifest);
        let state = ConfigurationState::from_manifest(&manifest);
        if settings.adapter.is_none() {
            for part in manifest.hardware_hosts(HardwareKind::Suppressor) {
                log::warn!(
                    "Part '{}' hosts the suppressor but no adapter rule is configured; nothing is coupled",
                    part.id
                );
            }
        }
        log::info!(
            "Configurator ready for '{}' ({} parts, {} configurable)",
            manifest.product.name,
            manifest.parts.len(),
            manifest.configurable_parts.len()
        );
        Self {
            applicator: SceneMaterialApplicator::new(&settings, TextureCache::new(loader)),
            manifest,
            state,
            needs_apply: true,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn state(&self) -> &ConfigurationState {
        &self.state
    }

    pub fn applicator(&self) -> &SceneMaterialApplicator {
        &self.applicator
    }

    /// Runs a validated state mutation. Rejected mutations leave the state
    /// untouched and do not schedule a pass.
    pub fn update<T, F>(&mut self, mutate: F) -> Result<T, StateError>
    where
        F: FnOnce(&mut ConfigurationState, &Manifest) -> Result<T, StateError>,
    {
        match mutate(&mut self.state, &self.manifest) {
            Ok(value) => {
                self.needs_apply = true;
                Ok(value)
            }
            Err(err) => {
                log::warn!("Configuration change rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Replaces the whole state, e.g. with a loaded snapshot.
    pub fn restore_state(&mut self, state: ConfigurationState) {
        self.state = state;
        self.needs_apply = true;
    }

    pub fn reset(&mut self) {
        self.state.reset(&self.manifest);
        self.needs_apply = true;
    }

    /// Part that owns `mesh_name`, as a click or hover handler sees it.
    pub fn part_for_mesh(&self, mesh_name: &str) -> Option<&str> {
        self.applicator
            .part_for_mesh(mesh_name, &self.state, &self.manifest)
    }

    pub fn hover_mesh(&mut self, mesh_name: Option<&str>) {
        if self.state.hovered_mesh() != mesh_name {
            self.state.set_hovered_mesh(mesh_name);
            self.needs_apply = true;
        }
    }

    pub fn select_mesh(&mut self, mesh_name: Option<&str>) {
        if self.state.selected_mesh() != mesh_name {
            self.state.set_selected_mesh(mesh_name);
            self.needs_apply = true;
        }
    }

    pub fn hovered_part(&self) -> Option<&str> {
        self.part_for_mesh(self.state.hovered_mesh()?)
    }

    pub fn selected_part(&self) -> Option<&str> {
        self.part_for_mesh(self.state.selected_mesh()?)
    }

    pub fn needs_apply(&self) -> bool {
        self.needs_apply
    }

    /// Per-frame hook: installs finished texture loads and re-applies
    /// materials if anything changed since the last pass.
    pub fn frame(&mut self, scene: &mut Scene) -> Option<ApplyReport> {
        self.applicator.factory_mut().textures_mut().poll_loads();
        if !self.needs_apply {
            return None;
        }
        Some(self.apply(scene))
    }

    /// Unconditional pass, e.g. right after a scene finished loading.
    pub fn apply(&mut self, scene: &mut Scene) -> ApplyReport {
        let hover = self.hovered_part().map(str::to_string);
        let selected = self.selected_part().map(str::to_string);
        let report = self.applicator.apply_materials(
            scene,
            &self.state,
            &self.manifest,
            hover.as_deref(),
            selected.as_deref(),
        );
        if report.resolved {
            log::debug!(
                "Materials applied: {} finished, {} fixed, {} excluded, {} defaulted, {} unmatched",
                report.finished,
                report.fixed,
                report.excluded,
                report.defaulted,
                report.unmatched.len()
            );
        }
        self.needs_apply = false;
        report
    }

    pub fn summary(&self) -> ConfigurationSummary {
        ConfigurationSummary::build(&self.manifest, &self.state)
    }
}
