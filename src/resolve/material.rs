//! Finish precedence for a single part.
//!
//! Patterns mode: a per-part color override beats the global pattern; with
//! no pattern chosen the part keeps its override or its color-mode pick.
//! Colors mode: only the per-part color pick counts.

use crate::config::ConfigurationState;
use crate::manifest::{FinishMode, FinishOption, Manifest, MaterialDefinition};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which layer of the state supplied a part's finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishSource {
    Override,
    Pattern,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFinish<'m> {
    pub option: &'m FinishOption,
    pub source: FinishSource,
}

/// Finish option that applies to `part_id`. Entries that reference unknown
/// parts or options are skipped, never fatal.
pub fn resolve_finish<'m>(
    part_id: &str,
    state: &ConfigurationState,
    manifest: &'m Manifest,
) -> Option<ResolvedFinish<'m>> {
    if !manifest.is_configurable(part_id) {
        return None;
    }

    let color = |map: &BTreeMap<String, String>, source| {
        map.get(part_id)
            .and_then(|id| manifest.finish_option(FinishMode::Colors, id))
            .map(|option| ResolvedFinish { option, source })
    };
    let overridden = || color(state.part_color_overrides(), FinishSource::Override);

    match state.finish_mode() {
        FinishMode::Patterns => {
            if let Some(finish) = overridden() {
                return Some(finish);
            }
            let pattern = state
                .selected_pattern()
                .and_then(|id| manifest.finish_option(FinishMode::Patterns, id));
            match pattern {
                Some(option) => Some(ResolvedFinish {
                    option,
                    source: FinishSource::Pattern,
                }),
                None => color(state.selected_colors(), FinishSource::Color),
            }
        }
        FinishMode::Colors => color(state.selected_colors(), FinishSource::Color),
    }
}

pub fn resolve_material_definition<'m>(
    part_id: &str,
    state: &ConfigurationState,
    manifest: &'m Manifest,
) -> Option<&'m MaterialDefinition> {
    resolve_finish(part_id, state, manifest)?.option.material.as_ref()
}
