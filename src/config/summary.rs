use crate::config::ConfigurationState;
use crate::manifest::{FinishMode, HardwareKind, Manifest};
use crate::resolve::{resolve_finish, FinishSource};
use serde::Serialize;
use std::collections::BTreeSet;

/// Order-ready description of the current configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    pub product: String,
    pub sku: Option<String>,
    pub finish_mode: FinishMode,
    pub pattern: Option<String>,
    pub parts: Vec<PartFinish>,
    pub hardware: Vec<HardwareChoice>,
    pub total_price: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartFinish {
    pub part: String,
    pub label: String,
    pub finish: Option<String>,
    pub source: Option<FinishSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareChoice {
    pub kind: HardwareKind,
    pub id: String,
    pub label: String,
}

impl ConfigurationSummary {
    /// Each distinct finish option is priced once, however many parts wear it.
    pub fn build(manifest: &Manifest, state: &ConfigurationState) -> Self {
        let mut total_price = manifest.product.base_price;
        let mut priced = BTreeSet::new();

        let parts = manifest
            .configurable()
            .map(|part| {
                let finish = resolve_finish(&part.id, state, manifest);
                if let Some(finish) = finish {
                    if priced.insert(finish.option.id.as_str()) {
                        total_price += finish.option.price_delta;
                    }
                }
                PartFinish {
                    part: part.id.clone(),
                    label: part.label.clone(),
                    finish: finish.map(|finish| finish.option.label.clone()),
                    source: finish.map(|finish| finish.source),
                }
            })
            .collect();

        let hardware = [
            HardwareKind::Caliber,
            HardwareKind::Suppressor,
            HardwareKind::Trigger,
        ]
        .into_iter()
        .filter_map(|kind| {
            let variant = manifest.variant(kind, state.selected_variant(kind)?)?;
            total_price += variant.price_delta;
            Some(HardwareChoice {
                kind,
                id: variant.id.clone(),
                label: variant.label.clone(),
            })
        })
        .collect();

        let pattern = match state.finish_mode() {
            FinishMode::Patterns => state
                .selected_pattern()
                .and_then(|id| manifest.finish_option(FinishMode::Patterns, id))
                .map(|option| option.label.clone()),
            FinishMode::Colors => None,
        };

        Self {
            product: manifest.product.name.clone(),
            sku: manifest.product.sku.clone(),
            finish_mode: state.finish_mode(),
            pattern,
            parts,
            hardware,
            total_price,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
