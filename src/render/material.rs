use crate::manifest::MaterialDefinition;
use crate::render::texture::{Texture, TextureCache};
use glam::Vec3;
use std::rc::Rc;

pub type MaterialHandle = Rc<Material>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Resolved from a finish option or legacy mesh table.
    Finish,
    /// Dark hardware finish for fixed and excluded meshes.
    Fixed,
    /// Configurable mesh with nothing selected.
    Neutral,
}

/// Renderer-facing PBR parameters for one mesh.
#[derive(Debug, Clone)]
pub struct Material {
    pub kind: MaterialKind,
    pub base_color: Vec3,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub map: Option<Rc<Texture>>,
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        let same_map = match (&self.map, &other.map) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_map
            && self.kind == other.kind
            && self.base_color == other.base_color
            && self.metalness == other.metalness
            && self.roughness == other.roughness
            && self.emissive == other.emissive
            && self.emissive_intensity == other.emissive_intensity
    }
}

impl Material {
    fn solid(kind: MaterialKind, color: Vec3, metalness: f32, roughness: f32) -> Self {
        Self {
            kind,
            base_color: color,
            metalness,
            roughness,
            emissive: Vec3::ZERO,
            emissive_intensity: 0.0,
            map: None,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.emissive_intensity > 0.0
    }

    /// Copy of `self` with an emissive tint. The original is left untouched
    /// so repeated highlighting never accumulates.
    pub fn highlighted(&self, tint: Vec3, intensity: f32) -> Self {
        Self {
            emissive: tint,
            emissive_intensity: intensity,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterialError {
    #[error("texture finish has no URL")]
    MissingTextureUrl,
    #[error("{name} {value} outside 0..=1")]
    FactorOutOfRange { name: &'static str, value: f32 },
    #[error("color is not finite")]
    InvalidColor,
}

/// Turns finish definitions into renderable materials.
pub struct MaterialFactory {
    textures: TextureCache,
    fixed: MaterialHandle,
    neutral: MaterialHandle,
}

impl MaterialFactory {
    pub fn new(textures: TextureCache, fixed_color: Vec3, neutral_color: Vec3) -> Self {
        Self {
            textures,
            fixed: Rc::new(Material::solid(MaterialKind::Fixed, fixed_color, 0.6, 0.5)),
            neutral: Rc::new(Material::solid(MaterialKind::Neutral, neutral_color, 0.2, 0.7)),
        }
    }

    /// Shared dark material; the same handle every time.
    pub fn fixed(&self) -> MaterialHandle {
        Rc::clone(&self.fixed)
    }

    /// Shared fallback for configurable meshes without a usable finish.
    pub fn neutral(&self) -> MaterialHandle {
        Rc::clone(&self.neutral)
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// Colors build a fresh material; textures go through the cache keyed
    /// by URL and `part_id`.
    pub fn get_or_create(
        &mut self,
        definition: &MaterialDefinition,
        part_id: &str,
    ) -> Result<MaterialHandle, MaterialError> {
        match definition {
            MaterialDefinition::Color(spec) => {
                if !spec.color.is_finite() {
                    return Err(MaterialError::InvalidColor);
                }
                check_factor("metalness", spec.metalness)?;
                check_factor("roughness", spec.roughness)?;
                Ok(Rc::new(Material::solid(
                    MaterialKind::Finish,
                    spec.color,
                    spec.metalness,
                    spec.roughness,
                )))
            }
            MaterialDefinition::Texture(spec) => {
                if spec.url.is_empty() {
                    return Err(MaterialError::MissingTextureUrl);
                }
                check_factor("metalness", spec.metalness)?;
                check_factor("roughness", spec.roughness)?;
                let texture =
                    self.textures
                        .texture_for_part(&spec.url, part_id, spec.tiling.repeat_for(part_id));
                Ok(Rc::new(Material {
                    map: Some(texture),
                    ..Material::solid(MaterialKind::Finish, Vec3::ONE, spec.metalness, spec.roughness)
                }))
            }
        }
    }
}

fn check_factor(name: &'static str, value: f32) -> Result<(), MaterialError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MaterialError::FactorOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ColorSpec, TextureSpec, Tiling};
    use crate::render::texture::tests::ManualLoader;

    fn factory() -> (MaterialFactory, ManualLoader) {
        let loader = ManualLoader::default();
        let cache = TextureCache::new(Box::new(loader.clone()));
        (
            MaterialFactory::new(cache, Vec3::splat(0.02), Vec3::splat(0.5)),
            loader,
        )
    }

    fn kryptek(tiling: Tiling) -> MaterialDefinition {
        MaterialDefinition::Texture(TextureSpec {
            url: "/t/kryptek.jpg".to_string(),
            metalness: 0.1,
            roughness: 0.7,
            tiling,
        })
    }

    #[test]
    fn color_definition_builds_solid_material() {
        let (mut factory, _) = factory();
        let definition = MaterialDefinition::Color(ColorSpec {
            color: Vec3::new(0.1, 0.1, 0.1),
            metalness: 0.4,
            roughness: 0.6,
        });
        let a = factory.get_or_create(&definition, "barrel").unwrap();
        let b = factory.get_or_create(&definition, "stock").unwrap();
        assert_eq!(a.kind, MaterialKind::Finish);
        assert!(a.map.is_none());
        assert_eq!(a, b);
    }

    #[test]
    fn texture_tiling_falls_back_to_default_pair() {
        let (mut factory, loader) = factory();
        let definition = kryptek(Tiling {
            default: Some([2.0, 2.0]),
            per_part: [("barrel".to_string(), [6.0, 1.0])].into(),
        });

        let barrel = factory.get_or_create(&definition, "barrel").unwrap();
        let stock = factory.get_or_create(&definition, "stock").unwrap();
        assert_eq!(barrel.map.as_ref().unwrap().repeat(), [6.0, 1.0]);
        assert_eq!(stock.map.as_ref().unwrap().repeat(), [2.0, 2.0]);
        assert_eq!(barrel.base_color, Vec3::ONE);
        assert_eq!(loader.requests.borrow().len(), 1);
    }

    #[test]
    fn texture_without_tiling_repeats_once() {
        let (mut factory, _) = factory();
        let material = factory.get_or_create(&kryptek(Tiling::default()), "stock").unwrap();
        assert_eq!(material.map.as_ref().unwrap().repeat(), [1.0, 1.0]);
    }

    #[test]
    fn malformed_definitions_are_errors_not_panics() {
        let (mut factory, loader) = factory();
        let missing_url = MaterialDefinition::Texture(TextureSpec {
            url: String::new(),
            metalness: 0.0,
            roughness: 0.5,
            tiling: Tiling::default(),
        });
        assert_eq!(
            factory.get_or_create(&missing_url, "stock"),
            Err(MaterialError::MissingTextureUrl)
        );
        assert!(loader.requests.borrow().is_empty());

        let too_shiny = MaterialDefinition::Color(ColorSpec {
            color: Vec3::ONE,
            metalness: 1.5,
            roughness: 0.5,
        });
        assert!(matches!(
            factory.get_or_create(&too_shiny, "stock"),
            Err(MaterialError::FactorOutOfRange { name: "metalness", .. })
        ));
    }

    #[test]
    fn highlight_leaves_base_untouched() {
        let (factory, _) = factory();
        let base = factory.neutral();
        let lit = base.highlighted(Vec3::new(1.0, 0.5, 0.0), 0.4);
        assert!(lit.is_highlighted());
        assert!(!base.is_highlighted());
        assert_eq!(lit.base_color, base.base_color);
        assert!(Rc::ptr_eq(&factory.neutral(), &base));
    }
}
