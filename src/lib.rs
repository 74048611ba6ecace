//! Loadout: mesh-to-part resolution and material assignment for a 3D
//! product configurator.
//!
//! A [`Manifest`] names the parts, their mesh selectors and the finishes
//! on offer. A [`ConfigurationState`] records what the customer picked.
//! [`SceneMaterialApplicator`] walks a [`Scene`] of named meshes and gives
//! every mesh the material those two imply.

pub mod config;
pub mod configurator;
pub mod manifest;
pub mod render;
pub mod resolve;
pub mod scene;

pub use config::{ConfigurationState, ConfigurationSummary, EngineSettings, StateError};
pub use configurator::Configurator;
pub use manifest::{load_manifest_from_file, load_manifest_from_str, Manifest, ManifestError};
pub use render::{ApplyReport, ImageFileLoader, SceneMaterialApplicator, TextureLoader};
pub use scene::{load_scene_from_gltf, MeshNode, Scene};
