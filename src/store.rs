use std::collections::HashMap;

use crate::model::{GraphState, Link, Node, fallback_avatar, normalize_snapshot};

/// Local edits applied ahead of server confirmation.
#[derive(Clone, Debug)]
pub enum Mutation {
    AddNode(Node),
    AddLink(Link),
    EditNote { id: String, text: String },
}

#[derive(Debug)]
enum Undo {
    RemoveNode(String),
    RemoveLink(String),
    RestoreNote { id: String, previous: String },
    Nothing,
}

/// Two-outcome handle returned by [`GraphStore::apply_optimistic`]: the local
/// state already reflects the edit, so commit is a no-op and rollback reverts
/// exactly the affected entity. A reconciliation replaces the state wholesale,
/// so a rollback that arrives after one is inert; the server's snapshot
/// already settled the outcome.
#[derive(Debug)]
#[must_use = "resolve the optimistic edit with commit() or rollback()"]
pub struct PendingMutation {
    undo: Undo,
    revision: u64,
}

impl PendingMutation {
    pub fn commit(self) {}

    pub fn rollback(self, store: &mut GraphStore) {
        if store.revision != self.revision {
            return;
        }
        match self.undo {
            Undo::RemoveNode(id) => {
                store.state.nodes.retain(|node| node.id != id);
                store.index_dirty = true;
                store.clear_focus_if_missing();
            }
            Undo::RemoveLink(id) => {
                store.state.links.retain(|link| link.id != id);
            }
            Undo::RestoreNote { id, previous } => {
                if let Some(node) = store.state.nodes.iter_mut().find(|node| node.id == id) {
                    node.description = previous;
                }
            }
            Undo::Nothing => {}
        }
    }
}

/// Client-side authoritative cache of the graph. Every other component gets
/// read-only views or goes through the mutation methods here.
pub struct GraphStore {
    state: GraphState,
    /// Resolved avatar per node id; survives reconciliations whose payload
    /// omits the avatar for a node we already resolved one for.
    avatars: HashMap<String, String>,
    focused: Option<String>,
    index: HashMap<String, usize>,
    index_dirty: bool,
    /// Bumped on every reconciliation; stamps optimistic edits so a rollback
    /// that lost the race against a snapshot does nothing.
    revision: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            state: GraphState::default(),
            avatars: HashMap::new(),
            focused: None,
            index: HashMap::new(),
            index_dirty: true,
            revision: 0,
        }
    }

    pub fn load(initial: GraphState) -> Self {
        let mut store = Self::new();
        store.reconcile(initial);
        store
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn set_focus(&mut self, focus: Option<String>) {
        self.focused = focus.filter(|id| self.state.has_node(id));
    }

    pub fn apply_optimistic(&mut self, mutation: Mutation) -> PendingMutation {
        let undo = match mutation {
            Mutation::AddNode(mut node) => {
                let id = node.id.clone();
                self.resolve_avatar(&mut node);
                self.state.nodes.push(node);
                self.index_dirty = true;
                Undo::RemoveNode(id)
            }
            Mutation::AddLink(link) => {
                let id = link.id.clone();
                self.state.links.push(link);
                Undo::RemoveLink(id)
            }
            Mutation::EditNote { id, text } => {
                match self.state.nodes.iter_mut().find(|node| node.id == id) {
                    Some(node) => {
                        let previous = std::mem::replace(&mut node.description, text);
                        Undo::RestoreNote { id, previous }
                    }
                    None => Undo::Nothing,
                }
            }
        };
        PendingMutation {
            undo,
            revision: self.revision,
        }
    }

    /// Replaces local state wholesale with a normalized server snapshot,
    /// preserving locally resolved avatars and clearing a focus that no
    /// longer names a present node.
    pub fn reconcile(&mut self, snapshot: GraphState) {
        let mut state = normalize_snapshot(snapshot);
        for node in &mut state.nodes {
            self.resolve_avatar(node);
        }
        self.state = state;
        self.index_dirty = true;
        self.revision = self.revision.wrapping_add(1);
        self.clear_focus_if_missing();
    }

    /// Additive world-space move of one node during a drag. A node removed
    /// mid-gesture by a concurrent reconciliation makes this a no-op.
    pub fn translate_node(&mut self, id: &str, dx: f32, dy: f32) {
        if let Some(node) = self.state.nodes.iter_mut().find(|node| node.id == id) {
            node.x += dx;
            node.y += dy;
        }
    }

    pub fn nodes_by_id(&mut self) -> &HashMap<String, usize> {
        if self.index_dirty {
            self.index.clear();
            for (position, node) in self.state.nodes.iter().enumerate() {
                self.index.entry(node.id.clone()).or_insert(position);
            }
            self.index_dirty = false;
        }
        &self.index
    }

    fn resolve_avatar(&mut self, node: &mut Node) {
        match &node.avatar {
            Some(avatar) => {
                self.avatars.insert(node.id.clone(), avatar.clone());
            }
            None => {
                let resolved = self
                    .avatars
                    .entry(node.id.clone())
                    .or_insert_with(|| fallback_avatar(&node.label))
                    .clone();
                node.avatar = Some(resolved);
            }
        }
    }

    fn clear_focus_if_missing(&mut self) {
        if let Some(id) = &self.focused
            && !self.state.has_node(id)
        {
            self.focused = None;
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{LinkKind, demo_graph};

    use super::*;

    fn sample_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_string(),
            group: "team".to_string(),
            x: 1.0,
            y: 2.0,
            r: None,
            avatar: None,
            description: String::new(),
        }
    }

    #[test]
    fn rollback_restores_exactly_the_affected_entity() {
        let mut store = GraphStore::load(demo_graph());
        let before = store.state().clone();

        let pending = store.apply_optimistic(Mutation::AddNode(sample_node("x1")));
        assert!(store.state().has_node("x1"));

        // An unrelated concurrent edit must survive the rollback.
        store.translate_node("ada", 5.0, -3.0);
        let moved = store.state().node("ada").unwrap().clone();

        pending.rollback(&mut store);
        assert!(!store.state().has_node("x1"));
        assert_eq!(store.state().node("ada"), Some(&moved));
        assert_eq!(store.state().links, before.links);
    }

    #[test]
    fn note_rollback_reverts_to_previous_text() {
        let mut store = GraphStore::load(demo_graph());
        let original = store.state().node("ada").unwrap().description.clone();

        let pending = store.apply_optimistic(Mutation::EditNote {
            id: "ada".to_string(),
            text: "new note".to_string(),
        });
        assert_eq!(store.state().node("ada").unwrap().description, "new note");

        pending.rollback(&mut store);
        assert_eq!(store.state().node("ada").unwrap().description, original);
    }

    #[test]
    fn note_edit_on_missing_node_is_inert() {
        let mut store = GraphStore::load(demo_graph());
        let before = store.state().clone();
        let pending = store.apply_optimistic(Mutation::EditNote {
            id: "ghost".to_string(),
            text: "hello".to_string(),
        });
        pending.rollback(&mut store);
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn rollback_after_reconcile_is_inert() {
        let mut store = GraphStore::load(demo_graph());
        let pending = store.apply_optimistic(Mutation::AddNode(sample_node("x1")));

        // The server won the race: its snapshot already contains an "x1".
        let mut snapshot = demo_graph();
        snapshot.nodes.push(sample_node("x1"));
        store.reconcile(snapshot);
        let settled = store.state().clone();

        // The late rejection must not delete the server's node.
        pending.rollback(&mut store);
        assert!(store.state().has_node("x1"));
        assert_eq!(store.state(), &settled);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut store = GraphStore::new();
        store.reconcile(demo_graph());
        let first = store.state().clone();
        store.reconcile(demo_graph());
        assert_eq!(store.state(), &first);
    }

    #[test]
    fn avatar_sticks_across_omitting_reconciliations() {
        let mut snapshot = demo_graph();
        snapshot.nodes[0].avatar = Some("https://example.test/ada.png".to_string());
        let id = snapshot.nodes[0].id.clone();

        let mut store = GraphStore::load(snapshot);

        // Second snapshot omits the avatar entirely.
        store.reconcile(demo_graph());
        assert_eq!(
            store.state().node(&id).unwrap().avatar.as_deref(),
            Some("https://example.test/ada.png")
        );

        // An explicit new value replaces the sticky one.
        let mut replacement = demo_graph();
        replacement.nodes[0].avatar = Some("https://example.test/v2.png".to_string());
        store.reconcile(replacement);
        assert_eq!(
            store.state().node(&id).unwrap().avatar.as_deref(),
            Some("https://example.test/v2.png")
        );
    }

    #[test]
    fn missing_avatar_resolves_to_fallback() {
        let store = GraphStore::load(demo_graph());
        let ada = store.state().node("ada").unwrap();
        assert_eq!(ada.avatar.as_deref(), Some("builtin://initials/A"));
    }

    #[test]
    fn focus_clears_when_node_disappears() {
        let mut store = GraphStore::load(demo_graph());
        store.set_focus(Some("ada".to_string()));
        assert_eq!(store.focused(), Some("ada"));

        let mut without_ada = demo_graph();
        without_ada.nodes.retain(|node| node.id != "ada");
        store.reconcile(without_ada);
        assert_eq!(store.focused(), None);
    }

    #[test]
    fn index_recomputes_after_node_list_changes() {
        let mut store = GraphStore::load(demo_graph());
        let count = store.state().nodes.len();
        assert_eq!(store.nodes_by_id().len(), count);

        store
            .apply_optimistic(Mutation::AddNode(sample_node("x1")))
            .commit();
        assert_eq!(store.nodes_by_id().len(), count + 1);
        assert_eq!(store.nodes_by_id().get("x1"), Some(&count));
    }

    #[test]
    fn link_rollback_keeps_other_links() {
        let mut store = GraphStore::load(demo_graph());
        let before = store.state().links.clone();
        let pending = store.apply_optimistic(Mutation::AddLink(Link {
            id: "ada-linus".to_string(),
            source: "ada".to_string(),
            target: "linus".to_string(),
            kind: LinkKind::Solid,
        }));
        assert!(store.state().has_link("ada-linus"));
        pending.rollback(&mut store);
        assert_eq!(store.state().links, before);
    }
}
