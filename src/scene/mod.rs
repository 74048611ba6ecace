pub mod gltf_import;

use crate::manifest::PartId;
use crate::render::MaterialHandle;
use std::sync::atomic::{AtomicU64, Ordering};

pub use gltf_import::{load_scene_from_gltf, SceneImportError};

/// One named mesh node as handed over by the asset loader.
#[derive(Debug, Clone)]
pub struct MeshNode {
    name: String,
    has_uv: bool,
    uv_dirty: bool,
    material: Option<MaterialHandle>,
    // Written by the applicator; reused for highlight-only passes.
    pub(crate) base: Option<MaterialHandle>,
    pub(crate) part: Option<PartId>,
    pub(crate) resolved: bool,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, has_uv: bool) -> Self {
        Self {
            name: name.into(),
            has_uv,
            uv_dirty: false,
            material: None,
            base: None,
            part: None,
            resolved: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_uv(&self) -> bool {
        self.has_uv
    }

    /// Currently assigned material; `None` keeps whatever the asset shipped with.
    pub fn material(&self) -> Option<&MaterialHandle> {
        self.material.as_ref()
    }

    /// Part that owned this mesh in the last resolving pass.
    pub fn part(&self) -> Option<&str> {
        self.part.as_deref()
    }

    pub fn uv_dirty(&self) -> bool {
        self.uv_dirty
    }

    pub(crate) fn assign(&mut self, material: MaterialHandle, base_changed: bool) {
        if base_changed && self.has_uv {
            self.uv_dirty = true;
        }
        self.material = Some(material);
    }
}

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Flat list of mesh nodes. Only names are read; only materials are written.
#[derive(Debug)]
pub struct Scene {
    id: u64,
    meshes: Vec<MeshNode>,
    generation: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            meshes: Vec::new(),
            generation: 0,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mesh_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            meshes: names.into_iter().map(|name| MeshNode::new(name, true)).collect(),
            ..Self::default()
        }
    }

    pub fn add_mesh(&mut self, node: MeshNode) {
        self.meshes.push(node);
        self.generation += 1;
    }

    /// Drops meshes, e.g. when a swapped sub-model is detached.
    pub fn remove_meshes<F>(&mut self, mut remove: F) -> usize
    where
        F: FnMut(&MeshNode) -> bool,
    {
        let before = self.meshes.len();
        self.meshes.retain(|node| !remove(node));
        let removed = before - self.meshes.len();
        if removed > 0 {
            self.generation += 1;
        }
        removed
    }

    pub fn meshes(&self) -> &[MeshNode] {
        &self.meshes
    }

    pub(crate) fn meshes_mut(&mut self) -> &mut [MeshNode] {
        &mut self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<&MeshNode> {
        self.meshes.iter().find(|node| node.name == name)
    }

    pub fn material_of(&self, name: &str) -> Option<&MaterialHandle> {
        self.mesh(name)?.material()
    }

    /// Unique for the life of the process; two scenes never share it.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Changes whenever meshes are added or removed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Names of meshes whose UVs need re-upload; clears the flags.
    pub fn take_uv_dirty(&mut self) -> Vec<String> {
        self.meshes
            .iter_mut()
            .filter(|node| node.uv_dirty)
            .map(|node| {
                node.uv_dirty = false;
                node.name.clone()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
