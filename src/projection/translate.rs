//! Virtual-segment translation of prefetch paths.
//!
//! The storage layer traverses virtual (reverse) relations through their
//! accessor names, so `school.teachers` rooted at a model where `teachers` is
//! virtual becomes `school.teacher_set` (or the declared related name).
//! Translation is per-segment best-effort: an unresolvable segment leaves the
//! remainder of that path unchanged and never fails the request.

use crate::meta::{ModelMeta, Registry};
use std::collections::BTreeSet;

/// Translate every candidate path against the registry, starting at `root`.
pub fn translate_paths(
    registry: &Registry,
    root: &ModelMeta,
    paths: &BTreeSet<String>,
) -> Vec<String> {
    paths
        .iter()
        .map(|p| translate_path(registry, root, p))
        .collect()
}

fn translate_path(registry: &Registry, root: &ModelMeta, path: &str) -> String {
    let mut segments: Vec<String> = path.split('.').map(str::to_string).collect();
    let mut current: Option<&ModelMeta> = Some(root);

    for segment in segments.iter_mut() {
        let Some(model) = current else { break };
        if let Some(relation) = model.relation(segment) {
            if !relation.concrete {
                if let Some(accessor) = &relation.accessor {
                    *segment = accessor.clone();
                }
            }
            current = registry.model_by_ref(&relation.related).map(|m| m.as_ref());
        } else if model.scalar(segment).is_some() {
            // Plain field: segment and model both unchanged.
        } else {
            // Unknown name; give up on this path but keep what was already
            // rewritten.
            current = None;
        }
    }

    segments.join(".")
}
