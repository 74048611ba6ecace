//! Scene material application.
//!
//! Every configuration change triggers a full pass over the scene against
//! one immutable state snapshot. Per mesh:
//!
//! 1. fixed hardware → dark material
//! 2. coupled adapter → owner part's finish
//! 3. part lookup; unmatched meshes keep their material (or a legacy per-mesh finish)
//! 4. excluded-from-color → dark material
//! 5. finish precedence → definition, else neutral default
//! 6. factory → material
//! 7. highlight tint for the hovered/selected part
//!
//! When only hover or selection moved, the base materials from the last
//! pass are reused and just step 7 runs again.

use crate::config::{ConfigurationState, EngineSettings};
use crate::manifest::{Manifest, MaterialDefinition};
use crate::render::material::{MaterialError, MaterialFactory, MaterialHandle};
use crate::render::texture::TextureCache;
use crate::resolve::{self, CouplingRule, ExclusionFilter};
use crate::scene::{MeshNode, Scene};
use glam::Vec3;
use std::rc::Rc;

/// What one pass did, for diagnostics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyReport {
    /// `false` when base materials were reused for a highlight-only pass.
    pub resolved: bool,
    pub finished: usize,
    pub fixed: usize,
    pub excluded: usize,
    pub coupled: usize,
    pub defaulted: usize,
    pub legacy: usize,
    pub highlighted: usize,
    pub unmatched: Vec<String>,
    pub failures: Vec<(String, MaterialError)>,
}

/// What the last full pass resolved against.
#[derive(Debug, Clone)]
struct ResolvedFrame {
    scene_id: u64,
    generation: u64,
    state: ConfigurationState,
}

impl ResolvedFrame {
    fn covers(&self, scene: &Scene, state: &ConfigurationState) -> bool {
        self.scene_id == scene.id()
            && self.generation == scene.generation()
            && self.state.same_configuration(state)
            && scene.meshes().iter().all(|node| node.resolved)
    }
}

/// Owning part and base material decided for one mesh.
struct MeshResolution {
    part: Option<String>,
    base: Option<MaterialHandle>,
}

pub struct SceneMaterialApplicator {
    exclusions: ExclusionFilter,
    coupling: Option<CouplingRule>,
    factory: MaterialFactory,
    highlight_color: Vec3,
    highlight_intensity: f32,
    last_frame: Option<ResolvedFrame>,
}

impl SceneMaterialApplicator {
    pub fn new(settings: &EngineSettings, textures: TextureCache) -> Self {
        Self {
            exclusions: ExclusionFilter::new(&settings.fixed_meshes),
            coupling: settings.adapter.as_ref().map(CouplingRule::new),
            factory: MaterialFactory::new(
                textures,
                settings.fixed_color(),
                settings.neutral_color(),
            ),
            highlight_color: settings.highlight_color(),
            highlight_intensity: settings.highlight_intensity,
            last_frame: None,
        }
    }

    pub fn factory(&self) -> &MaterialFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut MaterialFactory {
        &mut self.factory
    }

    pub fn coupling(&self) -> Option<&CouplingRule> {
        self.coupling.as_ref()
    }

    /// Forces the next pass to resolve from scratch.
    pub fn invalidate(&mut self) {
        self.last_frame = None;
    }

    /// Part a mesh belongs to for picking: the coupled owner while the
    /// adapter is engaged, otherwise the regular part lookup. Fixed hardware
    /// belongs to nothing.
    pub fn part_for_mesh<'m>(
        &self,
        mesh_name: &str,
        state: &ConfigurationState,
        manifest: &'m Manifest,
    ) -> Option<&'m str> {
        if self.exclusions.is_fixed(mesh_name) {
            return None;
        }
        if let Some(owner) = self
            .coupling
            .as_ref()
            .and_then(|rule| rule.coupled_part(mesh_name, state))
        {
            return manifest.part(owner).map(|part| part.id.as_str());
        }
        resolve::resolve_part(mesh_name, manifest).map(|part| part.id.as_str())
    }

    /// Assigns a material to every mesh in `scene`.
    pub fn apply_materials(
        &mut self,
        scene: &mut Scene,
        state: &ConfigurationState,
        manifest: &Manifest,
        hover_part: Option<&str>,
        selected_part: Option<&str>,
    ) -> ApplyReport {
        let reuse = self
            .last_frame
            .as_ref()
            .is_some_and(|frame| frame.covers(scene, state));
        let mut report = ApplyReport {
            resolved: !reuse,
            ..ApplyReport::default()
        };

        for node in scene.meshes_mut() {
            if !reuse {
                let resolution = self.resolve_mesh(node.name(), state, manifest, &mut report);
                let changed = match (&node.base, &resolution.base) {
                    (Some(old), Some(new)) => !Rc::ptr_eq(old, new) && **old != **new,
                    (None, None) => false,
                    _ => true,
                };
                node.part = resolution.part;
                node.base = resolution.base;
                node.resolved = true;
                if let Some(base) = &node.base {
                    let base = Rc::clone(base);
                    self.assign(node, base, hover_part, selected_part, changed, &mut report);
                }
            } else if let Some(base) = node.base.clone() {
                self.assign(node, base, hover_part, selected_part, false, &mut report);
            }
        }

        if report.resolved && !report.unmatched.is_empty() {
            log::debug!(
                "{} meshes matched no part: {:?}",
                report.unmatched.len(),
                report.unmatched
            );
        }
        if !reuse {
            self.last_frame = Some(ResolvedFrame {
                scene_id: scene.id(),
                generation: scene.generation(),
                state: state.clone(),
            });
        }
        report
    }

    fn assign(
        &self,
        node: &mut MeshNode,
        base: MaterialHandle,
        hover_part: Option<&str>,
        selected_part: Option<&str>,
        base_changed: bool,
        report: &mut ApplyReport,
    ) {
        let lit = node
            .part()
            .is_some_and(|part| Some(part) == hover_part || Some(part) == selected_part);
        let material = if lit {
            report.highlighted += 1;
            Rc::new(base.highlighted(self.highlight_color, self.highlight_intensity))
        } else {
            base
        };
        node.assign(material, base_changed);
    }

    fn resolve_mesh(
        &mut self,
        mesh_name: &str,
        state: &ConfigurationState,
        manifest: &Manifest,
        report: &mut ApplyReport,
    ) -> MeshResolution {
        if self.exclusions.is_fixed(mesh_name) {
            report.fixed += 1;
            return MeshResolution {
                part: None,
                base: Some(self.factory.fixed()),
            };
        }

        if let Some(owner) = self
            .coupling
            .as_ref()
            .and_then(|rule| rule.coupled_part(mesh_name, state))
            .map(str::to_string)
        {
            report.coupled += 1;
            let definition = resolve::resolve_material_definition(&owner, state, manifest);
            let base = self.finish_or_neutral(mesh_name, &owner, definition, report);
            return MeshResolution {
                part: Some(owner),
                base: Some(base),
            };
        }

        let Some(part) = resolve::resolve_part(mesh_name, manifest) else {
            report.unmatched.push(mesh_name.to_string());
            let base = manifest.mesh_materials.get(mesh_name).and_then(|definition| {
                match self.factory.get_or_create(definition, mesh_name) {
                    Ok(material) => {
                        report.legacy += 1;
                        Some(material)
                    }
                    Err(err) => {
                        log::warn!("Legacy material for '{}' unusable: {}", mesh_name, err);
                        report.failures.push((mesh_name.to_string(), err));
                        None
                    }
                }
            });
            return MeshResolution { part: None, base };
        };

        if self.exclusions.is_excluded_from_color(mesh_name, part) {
            report.excluded += 1;
            return MeshResolution {
                part: Some(part.id.clone()),
                base: Some(self.factory.fixed()),
            };
        }

        let definition = resolve::resolve_material_definition(&part.id, state, manifest);
        let base = self.finish_or_neutral(mesh_name, &part.id, definition, report);
        MeshResolution {
            part: Some(part.id.clone()),
            base: Some(base),
        }
    }

    /// Builds the finish, falling back to the neutral material when there is
    /// none or it cannot be built. Never aborts the pass.
    fn finish_or_neutral(
        &mut self,
        mesh_name: &str,
        part_id: &str,
        definition: Option<&MaterialDefinition>,
        report: &mut ApplyReport,
    ) -> MaterialHandle {
        let Some(definition) = definition else {
            report.defaulted += 1;
            return self.factory.neutral();
        };
        match self.factory.get_or_create(definition, part_id) {
            Ok(material) => {
                report.finished += 1;
                material
            }
            Err(err) => {
                log::warn!(
                    "Finish for part '{}' on mesh '{}' unusable: {}",
                    part_id,
                    mesh_name,
                    err
                );
                report.failures.push((mesh_name.to_string(), err));
                report.defaulted += 1;
                self.factory.neutral()
            }
        }
    }
}
