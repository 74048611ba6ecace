//! JSON wire format for product manifests.
//!
//! Finish definitions arrive in several historical shapes. They are all
//! normalized into [`MaterialDefinition`] here so nothing downstream has to
//! branch on wire layout.

use super::{
    AdapterConfig, ColorSpec, FinishModes, FinishOption, HardwareVariant, Hotspot, Manifest,
    MaterialDefinition, Part, Product, TextureSpec, Tiling,
};
use glam::Vec3;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const DEFAULT_METALNESS: f32 = 0.0;
const DEFAULT_ROUGHNESS: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate part id '{0}'")]
    DuplicatePart(String),
    #[error("configurableParts references unknown part '{0}'")]
    UnknownConfigurablePart(String),
    #[error("adapter owner part '{0}' is not declared")]
    UnknownAdapterOwner(String),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireManifest {
    #[serde(default)]
    product: WireProduct,
    parts: Vec<WirePart>,
    #[serde(default)]
    finish_modes: WireFinishModes,
    #[serde(default)]
    configurable_parts: Option<Vec<String>>,
    #[serde(default)]
    calibers: Vec<WireVariant>,
    #[serde(default)]
    suppressors: Vec<WireVariant>,
    #[serde(default)]
    triggers: Vec<WireVariant>,
    #[serde(default)]
    hotspots: Vec<WireHotspot>,
    #[serde(default)]
    mesh_materials: BTreeMap<String, Value>,
    #[serde(default)]
    fixed_meshes: Vec<String>,
    #[serde(default)]
    adapter: Option<AdapterConfig>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProduct {
    #[serde(default)]
    name: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    base_price: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, alias = "meshes")]
    mesh_selectors: Vec<String>,
    #[serde(default)]
    exclude_from_color: Vec<String>,
    #[serde(default)]
    hosts_caliber: bool,
    #[serde(default)]
    hosts_suppressor: bool,
}

#[derive(Default, Deserialize)]
struct WireFinishModes {
    #[serde(default)]
    colors: WireFinishList,
    #[serde(default)]
    patterns: WireFinishList,
}

#[derive(Default, Deserialize)]
struct WireFinishList {
    #[serde(default)]
    options: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVariant {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    price_delta: f32,
    #[serde(default, alias = "modelUrl")]
    model: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHotspot {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(alias = "partId")]
    part: String,
    #[serde(default)]
    position: [f32; 3],
}

pub fn load_manifest_from_file(path: &Path) -> Result<Manifest> {
    let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_manifest_from_str(&json)
}

pub fn load_manifest_from_str(json: &str) -> Result<Manifest> {
    let wire: WireManifest = serde_json::from_str(json)?;
    into_manifest(wire)
}

fn into_manifest(wire: WireManifest) -> Result<Manifest> {
    let mut seen = HashSet::new();
    let mut parts = Vec::with_capacity(wire.parts.len());
    for part in wire.parts {
        if !seen.insert(part.id.clone()) {
            return Err(ManifestError::DuplicatePart(part.id));
        }
        parts.push(Part {
            label: part.label.unwrap_or_else(|| part.id.clone()),
            id: part.id,
            mesh_selectors: part.mesh_selectors,
            exclude_from_color: part.exclude_from_color,
            hosts_caliber: part.hosts_caliber,
            hosts_suppressor: part.hosts_suppressor,
        });
    }

    let configurable_parts = match wire.configurable_parts {
        Some(ids) => {
            if let Some(unknown) = ids.iter().find(|id| !seen.contains(id.as_str())) {
                return Err(ManifestError::UnknownConfigurablePart(unknown.clone()));
            }
            ids
        }
        None => parts.iter().map(|part| part.id.clone()).collect(),
    };

    if let Some(adapter) = &wire.adapter {
        if !seen.contains(adapter.owner_part.as_str()) {
            return Err(ManifestError::UnknownAdapterOwner(adapter.owner_part.clone()));
        }
    }

    let hotspots = wire
        .hotspots
        .into_iter()
        .filter_map(|hotspot| {
            if !seen.contains(hotspot.part.as_str()) {
                log::warn!(
                    "Dropping hotspot '{}': unknown part '{}'",
                    hotspot.id,
                    hotspot.part
                );
                return None;
            }
            Some(Hotspot {
                label: hotspot.label.unwrap_or_else(|| hotspot.id.clone()),
                id: hotspot.id,
                part: hotspot.part,
                position: hotspot.position,
            })
        })
        .collect();

    let mut mesh_materials = BTreeMap::new();
    for (mesh, value) in &wire.mesh_materials {
        match normalize_material(value) {
            Some(material) => {
                mesh_materials.insert(mesh.clone(), material);
            }
            None => log::warn!("Ignoring unreadable legacy material for mesh '{}'", mesh),
        }
    }

    Ok(Manifest {
        product: Product {
            name: wire.product.name,
            sku: wire.product.sku,
            base_price: wire.product.base_price,
        },
        parts,
        finish_modes: FinishModes {
            colors: finish_options(&wire.finish_modes.colors.options),
            patterns: finish_options(&wire.finish_modes.patterns.options),
        },
        configurable_parts,
        calibers: variants(wire.calibers),
        suppressors: variants(wire.suppressors),
        triggers: variants(wire.triggers),
        hotspots,
        mesh_materials,
        fixed_meshes: wire.fixed_meshes,
        adapter: wire.adapter,
    })
}

fn variants(wire: Vec<WireVariant>) -> Vec<HardwareVariant> {
    wire.into_iter()
        .map(|variant| HardwareVariant {
            label: variant.label.unwrap_or_else(|| variant.id.clone()),
            id: variant.id,
            default: variant.default,
            price_delta: variant.price_delta,
            model: variant.model,
        })
        .collect()
}

fn finish_options(values: &[Value]) -> Vec<FinishOption> {
    values.iter().filter_map(finish_option).collect()
}

fn finish_option(value: &Value) -> Option<FinishOption> {
    let object = value.as_object()?;
    let Some(id) = object.get("id").and_then(Value::as_str) else {
        log::warn!("Skipping finish option without an id");
        return None;
    };
    let label = object
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string();
    let price_delta = object
        .get("priceDelta")
        .and_then(Value::as_f64)
        .unwrap_or(0.0) as f32;

    // Current shape nests the definition; legacy options are flat.
    let material_value = object.get("material").unwrap_or(value);
    let material = normalize_material(material_value);
    if material.is_none() {
        log::warn!("Finish option '{}' has no usable material definition", id);
    }

    Some(FinishOption {
        id: id.to_string(),
        label,
        material,
        price_delta,
    })
}

/// Normalizes any supported wire shape into a [`MaterialDefinition`].
///
/// A texture-typed definition without a URL is kept (with an empty URL) so
/// the material factory can report it per mesh.
pub(crate) fn normalize_material(value: &Value) -> Option<MaterialDefinition> {
    let object = value.as_object()?;
    let tag = object.get("type").and_then(Value::as_str);
    let url = texture_url(object);

    let is_texture = match tag {
        Some("texture") | Some("pattern") => true,
        Some("color") => false,
        Some(other) => {
            log::warn!("Unknown material type '{}'", other);
            return None;
        }
        None => url.is_some(),
    };

    let metalness = number(object, &["metalness", "metallic"]).unwrap_or(DEFAULT_METALNESS);
    let roughness = number(object, &["roughness"]).unwrap_or(DEFAULT_ROUGHNESS);

    if is_texture {
        return Some(MaterialDefinition::Texture(TextureSpec {
            url: url.unwrap_or_default(),
            metalness,
            roughness,
            tiling: tiling(object),
        }));
    }

    let color = object.get("color").and_then(parse_color)?;
    Some(MaterialDefinition::Color(ColorSpec {
        color,
        metalness,
        roughness,
    }))
}

fn texture_url(object: &Map<String, Value>) -> Option<String> {
    ["url", "textureUrl", "map", "texture"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

fn number(object: &Map<String, Value>, keys: &[&str]) -> Option<f32> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_f64))
        .map(|value| value as f32)
}

fn pair(value: &Value) -> Option<[f32; 2]> {
    match value.as_array()?.as_slice() {
        [u, v] => Some([u.as_f64()? as f32, v.as_f64()? as f32]),
        _ => None,
    }
}

fn tiling(object: &Map<String, Value>) -> Tiling {
    let mut tiling = Tiling::default();
    if let Some(map) = object.get("tiling").and_then(Value::as_object) {
        for (key, value) in map {
            let Some(repeat) = pair(value) else {
                log::warn!("Ignoring malformed tiling entry '{}'", key);
                continue;
            };
            if key == "default" {
                tiling.default = Some(repeat);
            } else {
                tiling.per_part.insert(key.clone(), repeat);
            }
        }
    }
    // Legacy single repeat pair.
    if tiling.default.is_none() {
        tiling.default = object.get("repeat").and_then(pair);
    }
    tiling
}

/// Accepts `#RRGGBB`, `#RGB` (hash optional) or a 3-element array in either
/// 0-1 or 0-255 range.
fn parse_color(value: &Value) -> Option<Vec3> {
    match value {
        Value::String(hex) => parse_hex(hex),
        Value::Array(items) => {
            let channels = items
                .iter()
                .map(|item| item.as_f64().map(|v| v as f32))
                .collect::<Option<Vec<f32>>>()?;
            let [r, g, b] = channels.as_slice() else {
                return None;
            };
            let rgb = Vec3::new(*r, *g, *b);
            if rgb.max_element() > 1.0 {
                Some(rgb / 255.0)
            } else {
                Some(rgb)
            }
        }
        _ => None,
    }
}

fn parse_hex(text: &str) -> Option<Vec3> {
    let digits = text.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(expanded.get(range)?, 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    Some(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
