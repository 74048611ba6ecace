//! Reads mesh node names out of a glTF/GLB file. Geometry is not loaded.

use super::{MeshNode, Scene};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SceneImportError {
    #[error("failed to parse glTF at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to parse glTF: {0}")]
    ParseSlice(#[from] gltf::Error),
}

pub fn load_scene_from_gltf(path: &Path) -> Result<Scene, SceneImportError> {
    let gltf = gltf::Gltf::open(path).map_err(|source| SceneImportError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(scene_from_document(&gltf))
}

pub fn load_scene_from_gltf_slice(bytes: &[u8]) -> Result<Scene, SceneImportError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    Ok(scene_from_document(&gltf))
}

/// One node per mesh instance, named after the node, else its mesh.
fn scene_from_document(gltf: &gltf::Gltf) -> Scene {
    let mut meshes = Vec::new();
    for node in gltf.document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let Some(name) = node.name().or_else(|| mesh.name()) else {
            log::debug!("Skipping unnamed mesh node {}", node.index());
            continue;
        };
        let has_uv = mesh
            .primitives()
            .any(|primitive| primitive.get(&gltf::Semantic::TexCoords(0)).is_some());
        meshes.push(MeshNode::new(name, has_uv));
    }
    log::info!("Imported {} named mesh nodes", meshes.len());

    let mut scene = Scene::new();
    for node in meshes {
        scene.add_mesh(node);
    }
    scene
}
