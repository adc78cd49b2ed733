use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

pub const DEFAULT_NODE_RADIUS: f32 = 22.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkKind {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Curved,
}

impl LinkKind {
    pub const ALL: [LinkKind; 4] = [Self::Solid, Self::Dashed, Self::Dotted, Self::Curved];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Curved => "curved",
        }
    }

    /// Folds legacy spellings into the canonical kind. Unknown spellings
    /// fall back to the baseline solid style.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dashed" | "dash" | "broken" => Self::Dashed,
            "dotted" | "dot" | "dots" => Self::Dotted,
            "curved" | "curve" | "arc" => Self::Curved,
            _ => Self::Solid,
        }
    }
}

impl Serialize for LinkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for LinkKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Node {
    pub fn radius(&self) -> f32 {
        self.r.unwrap_or(DEFAULT_NODE_RADIUS)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: LinkKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    #[serde(default)]
    pub groups: HashMap<String, Group>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl GraphState {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    pub fn has_link(&self, id: &str) -> bool {
        self.links.iter().any(|link| link.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kind_aliases_fold_to_canonical_values() {
        assert_eq!(LinkKind::from_wire("dash"), LinkKind::Dashed);
        assert_eq!(LinkKind::from_wire("broken"), LinkKind::Dashed);
        assert_eq!(LinkKind::from_wire("DOTS"), LinkKind::Dotted);
        assert_eq!(LinkKind::from_wire("arc"), LinkKind::Curved);
        assert_eq!(LinkKind::from_wire("solid"), LinkKind::Solid);
        assert_eq!(LinkKind::from_wire("zigzag"), LinkKind::Solid);
        assert_eq!(LinkKind::from_wire(""), LinkKind::Solid);
    }

    #[test]
    fn link_deserializes_legacy_type_field() {
        let link: Link =
            serde_json::from_str(r#"{"id":"l1","source":"a","target":"b","type":"dash"}"#).unwrap();
        assert_eq!(link.kind, LinkKind::Dashed);

        let round = serde_json::to_value(&link).unwrap();
        assert_eq!(round["type"], "dashed");
    }

    #[test]
    fn node_radius_defaults_when_absent() {
        let node: Node = serde_json::from_str(r#"{"id":"a","label":"A","group":"g"}"#).unwrap();
        assert_eq!(node.radius(), DEFAULT_NODE_RADIUS);
        assert_eq!(node.description, "");
    }
}
