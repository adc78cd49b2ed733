use serde_json::Value;

use crate::util::initials;

use super::graph::{GraphState, Link, LinkKind, Node};

/// Placeholder avatar derived from the node label; stable so reconciliation
/// stickiness has a well-defined value to preserve.
pub fn fallback_avatar(label: &str) -> String {
    format!("builtin://initials/{}", initials(label))
}

/// Brings a freshly fetched snapshot into the strict shape GraphStore owns:
/// nodes without a usable id are dropped, link kinds arrive already folded by
/// deserialization, and duplicate node ids keep their first occurrence.
pub fn normalize_snapshot(mut state: GraphState) -> GraphState {
    let mut seen = std::collections::HashSet::new();
    state
        .nodes
        .retain(|node| !node.id.trim().is_empty() && seen.insert(node.id.clone()));
    state.links.retain(|link| !link.id.trim().is_empty());
    state
}

fn required_str(value: &Value, field: &str) -> Result<String, String> {
    match value.get(field).and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(format!("field '{field}' must be a non-empty string")),
        None => Err(format!("missing required field '{field}'")),
    }
}

fn required_f32(value: &Value, field: &str) -> Result<f32, String> {
    value
        .get(field)
        .and_then(Value::as_f64)
        .map(|number| number as f32)
        .ok_or_else(|| format!("field '{field}' must be a number"))
}

fn optional_f32(value: &Value, field: &str) -> Result<Option<f32>, String> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => raw
            .as_f64()
            .map(|number| Some(number as f32))
            .ok_or_else(|| format!("field '{field}' must be a number")),
    }
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Validates a raw node payload at the ingestion boundary. Payloads come from
/// the network and may have any shape at all.
pub fn node_from_value(value: &Value) -> Result<Node, String> {
    Ok(Node {
        id: required_str(value, "id")?,
        label: required_str(value, "label")?,
        group: required_str(value, "group")?,
        x: required_f32(value, "x")?,
        y: required_f32(value, "y")?,
        r: optional_f32(value, "r")?,
        avatar: optional_str(value, "avatar"),
        description: optional_str(value, "description").unwrap_or_default(),
    })
}

pub fn link_from_value(value: &Value) -> Result<Link, String> {
    Ok(Link {
        id: required_str(value, "id")?,
        source: required_str(value, "source")?,
        target: required_str(value, "target")?,
        kind: value
            .get("type")
            .and_then(Value::as_str)
            .map(LinkKind::from_wire)
            .unwrap_or_default(),
    })
}

pub fn note_from_value(value: &Value) -> Result<String, String> {
    match value.get("description").and_then(Value::as_str) {
        Some(text) => Ok(text.to_string()),
        None => Err("missing required field 'description'".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalize_drops_nodes_without_ids() {
        let state: GraphState = serde_json::from_value(json!({
            "groups": {},
            "nodes": [
                {"id": "a", "label": "A", "group": "g", "x": 0, "y": 0},
                {"label": "ghost", "group": "g", "x": 1, "y": 1},
                {"id": "  ", "label": "blank", "group": "g", "x": 2, "y": 2},
                {"id": "a", "label": "dup", "group": "g", "x": 3, "y": 3},
            ],
            "links": []
        }))
        .unwrap();

        let normalized = normalize_snapshot(state);
        assert_eq!(normalized.nodes.len(), 1);
        assert_eq!(normalized.nodes[0].label, "A");
    }

    #[test]
    fn node_payload_requires_core_fields() {
        let ok = node_from_value(&json!({
            "id": "x1", "label": "X", "group": "team", "x": 10, "y": 10
        }))
        .unwrap();
        assert_eq!(ok.id, "x1");
        assert_eq!(ok.description, "");
        assert!(ok.r.is_none());

        let missing = node_from_value(&json!({"id": "x1", "label": "X", "group": "team", "x": 10}));
        assert!(missing.unwrap_err().contains("'y'"));

        let bad_type =
            node_from_value(&json!({"id": "x1", "label": "X", "group": "team", "x": "ten", "y": 0}));
        assert!(bad_type.unwrap_err().contains("'x'"));
    }

    #[test]
    fn link_payload_defaults_kind() {
        let link = link_from_value(&json!({"id": "l1", "source": "a", "target": "b"})).unwrap();
        assert_eq!(link.kind, LinkKind::Solid);

        let curved =
            link_from_value(&json!({"id": "l2", "source": "a", "target": "b", "type": "arc"}))
                .unwrap();
        assert_eq!(curved.kind, LinkKind::Curved);
    }

    #[test]
    fn fallback_avatar_is_deterministic() {
        assert_eq!(fallback_avatar("Ada Lovelace"), fallback_avatar("Ada Lovelace"));
        assert_eq!(fallback_avatar("Ada Lovelace"), "builtin://initials/AL");
    }
}
