pub mod loading;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use loading::{load_manifest_from_file, load_manifest_from_str, ManifestError};

pub type PartId = String;

/// Which finish list a selection refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishMode {
    #[default]
    Colors,
    Patterns,
}

/// Solid finish: base color plus PBR factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpec {
    pub color: Vec3,
    pub metalness: f32,
    pub roughness: f32,
}

/// Per-part repeat factors for a tiled texture, with an optional fallback pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tiling {
    pub default: Option<[f32; 2]>,
    pub per_part: BTreeMap<PartId, [f32; 2]>,
}

impl Tiling {
    /// Repeat pair for `part_id`: the part entry, else `default`, else `[1, 1]`.
    pub fn repeat_for(&self, part_id: &str) -> [f32; 2] {
        self.per_part
            .get(part_id)
            .copied()
            .or(self.default)
            .unwrap_or([1.0, 1.0])
    }
}

/// Tiled image finish (camo patterns).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSpec {
    pub url: String,
    pub metalness: f32,
    pub roughness: f32,
    pub tiling: Tiling,
}

/// Closed set of finishes a part can display. Legacy wire shapes are
/// normalized into this at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialDefinition {
    Color(ColorSpec),
    Texture(TextureSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinishOption {
    pub id: String,
    pub label: String,
    /// `None` when the wire definition could not be normalized.
    pub material: Option<MaterialDefinition>,
    pub price_delta: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinishModes {
    pub colors: Vec<FinishOption>,
    pub patterns: Vec<FinishOption>,
}

impl FinishModes {
    pub fn options(&self, mode: FinishMode) -> &[FinishOption] {
        match mode {
            FinishMode::Colors => &self.colors,
            FinishMode::Patterns => &self.patterns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: PartId,
    pub label: String,
    pub mesh_selectors: Vec<String>,
    pub exclude_from_color: Vec<String>,
    /// Host UI hints: which part's panel offers the hardware pickers.
    /// Material resolution never reads them; coupling comes from the
    /// adapter rule alone.
    pub hosts_caliber: bool,
    pub hosts_suppressor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareKind {
    Caliber,
    Suppressor,
    Trigger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HardwareVariant {
    pub id: String,
    pub label: String,
    pub default: bool,
    pub price_delta: f32,
    /// Sub-model the host swaps into the scene when this variant is chosen.
    /// Loading it is up to the host; the new meshes arrive via `Scene::add_mesh`.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: String,
    pub label: String,
    pub part: PartId,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub name: String,
    pub sku: Option<String>,
    pub base_price: f32,
}

/// Adapter mesh that mirrors another part while a hardware variant is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub mesh: String,
    pub owner_part: PartId,
    #[serde(default = "default_adapter_hardware")]
    pub hardware: HardwareKind,
    #[serde(default = "default_none_variant")]
    pub none_variant: String,
}

fn default_adapter_hardware() -> HardwareKind {
    HardwareKind::Suppressor
}

fn default_none_variant() -> String {
    "none".to_string()
}

/// Validated, immutable product description for one configurator session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub product: Product,
    pub parts: Vec<Part>,
    pub finish_modes: FinishModes,
    /// Ids eligible for finish assignment; every part when the wire list is absent.
    pub configurable_parts: Vec<PartId>,
    pub calibers: Vec<HardwareVariant>,
    pub suppressors: Vec<HardwareVariant>,
    pub triggers: Vec<HardwareVariant>,
    pub hotspots: Vec<Hotspot>,
    /// Legacy per-mesh finishes for meshes no part claims.
    pub mesh_materials: BTreeMap<String, MaterialDefinition>,
    pub fixed_meshes: Vec<String>,
    pub adapter: Option<AdapterConfig>,
}

impl Manifest {
    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.id == id)
    }

    pub fn is_configurable(&self, id: &str) -> bool {
        self.configurable_parts.iter().any(|part_id| part_id == id)
    }

    /// Configurable parts in manifest declaration order.
    pub fn configurable(&self) -> impl Iterator<Item = &Part> + '_ {
        self.parts
            .iter()
            .filter(move |part| self.is_configurable(&part.id))
    }

    pub fn finish_option(&self, mode: FinishMode, id: &str) -> Option<&FinishOption> {
        self.finish_modes
            .options(mode)
            .iter()
            .find(|option| option.id == id)
    }

    pub fn variants(&self, kind: HardwareKind) -> &[HardwareVariant] {
        match kind {
            HardwareKind::Caliber => &self.calibers,
            HardwareKind::Suppressor => &self.suppressors,
            HardwareKind::Trigger => &self.triggers,
        }
    }

    pub fn variant(&self, kind: HardwareKind, id: &str) -> Option<&HardwareVariant> {
        self.variants(kind).iter().find(|variant| variant.id == id)
    }

    /// The variant flagged `default`, else the first one listed.
    pub fn default_variant(&self, kind: HardwareKind) -> Option<&HardwareVariant> {
        let variants = self.variants(kind);
        variants
            .iter()
            .find(|variant| variant.default)
            .or_else(|| variants.first())
    }

    /// Parts flagged as carrying the picker for `kind`.
    pub fn hardware_hosts(&self, kind: HardwareKind) -> impl Iterator<Item = &Part> + '_ {
        self.parts.iter().filter(move |part| match kind {
            HardwareKind::Caliber => part.hosts_caliber,
            HardwareKind::Suppressor => part.hosts_suppressor,
            HardwareKind::Trigger => false,
        })
    }

        pub fn hotspot_for_part(&self, part_id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|hotspot| hotspot.part == part_id)
    }

    pub fn part_for_hotspot(&self, hotspot_id: &str) -> Option<&Part> {
        let hotspot = self.hotspots.iter().find(|hotspot| hotspot.id == hotspot_id)?;
        self.part(&hotspot.part)
    }
}
