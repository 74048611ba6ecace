use super::selector;
use crate::manifest::{Manifest, Part};

/// Owning configurable part of a mesh: the first part, in manifest order,
/// with any selector matching the name. Later parts never steal a mesh.
pub fn resolve_part<'m>(mesh_name: &str, manifest: &'m Manifest) -> Option<&'m Part> {
    manifest.configurable().find(|part| {
        part.mesh_selectors
            .iter()
            .any(|pattern| selector::matches(mesh_name, pattern))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::load_manifest_from_str;

    fn manifest(json: &str) -> Manifest {
        load_manifest_from_str(json).unwrap()
    }

    #[test]
    fn first_declared_part_wins() {
        let manifest = manifest(
            r#"{
                "parts": [
                    { "id": "receiver", "meshSelectors": ["Upper_*"] },
                    { "id": "rail", "meshSelectors": ["Upper_Rail*"] }
                ]
            }"#,
        );
        let part = resolve_part("Upper_Rail_01", &manifest).unwrap();
        assert_eq!(part.id, "receiver");
    }

    #[test]
    fn non_configurable_parts_are_skipped() {
        let manifest = manifest(
            r#"{
                "parts": [
                    { "id": "bipod", "meshSelectors": ["Bipod_*"] },
                    { "id": "legs", "meshSelectors": ["Bipod_Leg*"] }
                ],
                "configurableParts": ["legs"]
            }"#,
        );
        assert_eq!(
            resolve_part("Bipod_Leg_L", &manifest).map(|p| p.id.as_str()),
            Some("legs")
        );
        assert!(resolve_part("Bipod_Hinge", &manifest).is_none());
    }

    #[test]
    fn sample_meshes_resolve_to_expected_parts() {
        let manifest = manifest(include_str!("../../demos/m200_manifest.json"));
        let owner = |mesh: &str| resolve_part(mesh, &manifest).map(|p| p.id.clone());
        assert_eq!(owner("Barrel_Fluted_01").as_deref(), Some("barrel"));
        assert_eq!(owner("Stock_Buttpad").as_deref(), Some("stock"));
        assert_eq!(owner("Cheek_Rest-4").as_deref(), Some("stock"));
        assert_eq!(owner("Picatinny_Rail_Top").as_deref(), Some("handguard"));
        assert_eq!(
            owner("M200_Rifle_-_Alpha_Suppressor").as_deref(),
            Some("muzzle")
        );
        assert_eq!(owner("M200_Rifle_-_Hub_Adapter").as_deref(), Some("hub"));
        assert_eq!(owner("Bipod_Leg_L"), None);
        assert_eq!(owner("Sling_Swivel"), None);
    }
}
