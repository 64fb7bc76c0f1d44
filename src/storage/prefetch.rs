//! Relation stitching along translated prefetch paths.
//!
//! Related rows are batch-loaded level by level and attached to their parent
//! rows under the relation's attach key (accessor name for virtual
//! relations), which is exactly where the serializer reads them. Paths that
//! fail to resolve are skipped; stitching is best-effort by design.

use crate::error::AppError;
use crate::meta::{MatchMode, ModelMeta, Registry, RelationMeta};
use crate::storage::{KeyMatch, Storage};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Default)]
struct PathNode(BTreeMap<String, PathNode>);

fn build_tree(paths: &[String]) -> PathNode {
    let mut root = PathNode::default();
    for path in paths {
        let mut node = &mut root;
        for segment in path.split('.') {
            node = node.0.entry(segment.to_string()).or_default();
        }
    }
    root
}

/// Attach related rows for every path, mutating `rows` in place.
pub async fn attach(
    storage: &dyn Storage,
    registry: &Registry,
    model: &ModelMeta,
    rows: &mut [Value],
    paths: &[String],
) -> Result<(), AppError> {
    if paths.is_empty() || rows.is_empty() {
        return Ok(());
    }
    let tree = build_tree(paths);
    let parents: Vec<&mut Value> = rows.iter_mut().collect();
    attach_node(storage, registry, model, parents, &tree).await
}

fn attach_node<'a>(
    storage: &'a dyn Storage,
    registry: &'a Registry,
    model: &'a ModelMeta,
    mut parents: Vec<&'a mut Value>,
    node: &'a PathNode,
) -> BoxFut<'a, Result<(), AppError>> {
    Box::pin(async move {
        for (segment, child_node) in &node.0 {
            let Some(relation) = model.relation(segment) else {
                continue;
            };
            let Some(related) = registry.model_by_ref(&relation.related).map(|m| m.as_ref()) else {
                continue;
            };

            let keys = collect_keys(&parents, relation);
            let children = if keys.is_empty() {
                Vec::new()
            } else {
                let (column, mode) = match relation.match_mode {
                    MatchMode::RemoteContains => (relation.remote_key.as_str(), KeyMatch::Contains),
                    _ => (relation.remote_key.as_str(), KeyMatch::Eq),
                };
                storage.fetch_by_key_in(related, column, &keys, mode).await?
            };

            let mut next_level: Vec<&mut Value> = Vec::new();
            for parent in parents.iter_mut() {
                let matched: Vec<Value> = children
                    .iter()
                    .filter(|c| matches_parent(parent, c, relation))
                    .cloned()
                    .collect();
                let attached = if relation.to_one {
                    matched.into_iter().next().unwrap_or(Value::Null)
                } else {
                    Value::Array(matched)
                };
                if let Some(obj) = parent.as_object_mut() {
                    obj.insert(relation.attach_key().to_string(), attached);
                    if !child_node.0.is_empty() {
                        match obj.get_mut(relation.attach_key()) {
                            Some(Value::Array(items)) => next_level.extend(items.iter_mut()),
                            Some(v @ Value::Object(_)) => next_level.push(v),
                            _ => {}
                        }
                    }
                }
            }

            if !child_node.0.is_empty() && !next_level.is_empty() {
                attach_node(storage, registry, related, next_level, child_node).await?;
            }
        }
        Ok(())
    })
}

/// Key values the child fetch must cover, from the parent side of the join.
fn collect_keys(parents: &[&mut Value], relation: &RelationMeta) -> Vec<Value> {
    let mut keys = Vec::new();
    for parent in parents {
        match parent.get(&relation.local_key) {
            Some(Value::Array(ids)) if relation.match_mode == MatchMode::LocalContains => {
                for id in ids {
                    if !id.is_null() && !keys.contains(id) {
                        keys.push(id.clone());
                    }
                }
            }
            Some(v) if !v.is_null() => {
                if !keys.contains(v) {
                    keys.push(v.clone());
                }
            }
            _ => {}
        }
    }
    keys
}

fn matches_parent(parent: &Value, child: &Value, relation: &RelationMeta) -> bool {
    let parent_key = parent.get(&relation.local_key);
    let child_key = child.get(&relation.remote_key);
    match relation.match_mode {
        MatchMode::Eq => match (parent_key, child_key) {
            (Some(p), Some(c)) => !p.is_null() && p == c,
            _ => false,
        },
        MatchMode::LocalContains => match (parent_key, child_key) {
            (Some(Value::Array(ids)), Some(c)) => ids.contains(c),
            _ => false,
        },
        MatchMode::RemoteContains => match (parent_key, child_key) {
            (Some(p), Some(Value::Array(ids))) => ids.contains(p),
            _ => false,
        },
    }
}
