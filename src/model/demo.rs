use std::collections::HashMap;

use super::graph::{GraphState, Group, Link, LinkKind, Node};

fn node(id: &str, label: &str, group: &str, x: f32, y: f32) -> Node {
    Node {
        id: id.to_string(),
        label: label.to_string(),
        group: group.to_string(),
        x,
        y,
        r: None,
        avatar: None,
        description: String::new(),
    }
}

fn link(id: &str, source: &str, target: &str, kind: LinkKind) -> Link {
    Link {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        kind,
    }
}

/// Read-only content shown when the very first load fails and no real data
/// has ever been fetched in this session.
pub fn demo_graph() -> GraphState {
    let mut groups = HashMap::new();
    groups.insert(
        "team".to_string(),
        Group {
            label: "Team".to_string(),
            color: Some("#4f83cc".to_string()),
        },
    );
    groups.insert(
        "family".to_string(),
        Group {
            label: "Family".to_string(),
            color: Some("#cc8a4f".to_string()),
        },
    );
    groups.insert(
        "friends".to_string(),
        Group {
            label: "Friends".to_string(),
            color: Some("#6fae6f".to_string()),
        },
    );

    let nodes = vec![
        node("ada", "Ada", "team", -160.0, -40.0),
        node("grace", "Grace", "team", 40.0, -140.0),
        node("linus", "Linus", "friends", 220.0, 20.0),
        node("margaret", "Margaret", "team", -40.0, 120.0),
        node("dennis", "Dennis", "family", 160.0, 200.0),
        node("barbara", "Barbara", "friends", -240.0, 160.0),
    ];

    let links = vec![
        link("ada-grace", "ada", "grace", LinkKind::Solid),
        link("ada-margaret", "ada", "margaret", LinkKind::Dashed),
        link("grace-linus", "grace", "linus", LinkKind::Curved),
        link("margaret-dennis", "margaret", "dennis", LinkKind::Solid),
        link("barbara-ada", "barbara", "ada", LinkKind::Dotted),
    ];

    GraphState {
        groups,
        nodes,
        links,
    }
}
