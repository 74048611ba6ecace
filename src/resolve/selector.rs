//! Mesh name ↔ part selector matching.
//!
//! Rules are tried in order and the first hit wins:
//! 1. exact equality
//! 2. `*` wildcards, case-insensitive, anchored at both ends
//! 3. bare keywords (no `_` or `-`): case-insensitive substring
//! 4. normalized fuzzy containment (digit runs collapsed, `-N` suffix dropped)

use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;

const DIGIT_TOKEN: &str = "#";

thread_local! {
    static WILDCARDS: RefCell<HashMap<String, Option<Regex>>> = RefCell::new(HashMap::new());
}

pub fn matches(mesh_name: &str, selector: &str) -> bool {
    if mesh_name == selector {
        return true;
    }
    if selector.is_empty() {
        return false;
    }
    if selector.contains('*') && wildcard_matches(mesh_name, selector) {
        return true;
    }
    if !selector.contains('_')
        && !selector.contains('-')
        && mesh_name.to_lowercase().contains(&selector.to_lowercase())
    {
        return true;
    }
    fuzzy_matches(mesh_name, selector)
}

fn wildcard_matches(mesh_name: &str, selector: &str) -> bool {
    WILDCARDS.with(|cache| {
        cache
            .borrow_mut()
            .entry(selector.to_string())
            .or_insert_with(|| compile_wildcard(selector))
            .as_ref()
            .is_some_and(|regex| regex.is_match(mesh_name))
    })
}

fn compile_wildcard(selector: &str) -> Option<Regex> {
    let body = selector
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("(?is)^{}$", body)) {
        Ok(regex) => Some(regex),
        Err(err) => {
            log::warn!("Unusable wildcard selector '{}': {}", selector, err);
            None
        }
    }
}

fn fuzzy_matches(mesh_name: &str, selector: &str) -> bool {
    let mesh = normalize(mesh_name);
    let pattern = normalize(selector);
    // An empty form would be contained in everything.
    if mesh.is_empty() || pattern.is_empty() {
        return false;
    }
    mesh.contains(&pattern) || pattern.contains(&mesh)
}

/// Lower-cases, strips a trailing `-N` instance suffix and collapses every
/// digit run into a single placeholder.
pub(crate) fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let trimmed = match lower.rsplit_once('-') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => lower.as_str(),
    };

    let mut out = String::with_capacity(trimmed.len());
    let mut in_digits = false;
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            if !in_digits {
                out.push_str(DIGIT_TOKEN);
            }
            in_digits = true;
        } else {
            out.push(ch);
            in_digits = false;
        }
    }
    out
}
