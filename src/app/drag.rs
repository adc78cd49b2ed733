use eframe::egui::Pos2;

use crate::store::GraphStore;

/// Moves a single node during a pointer gesture. Grabbing a node wins over
/// panning: the canvas starts a drag instead of a pan when the press lands
/// on a node, so the two gestures never run together.
pub struct DragController {
    active: Option<String>,
    last_pointer: Option<Pos2>,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            active: None,
            last_pointer: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_node_grab(&mut self, id: &str, pointer: Pos2) {
        self.active = Some(id.to_string());
        self.last_pointer = Some(pointer);
    }

    /// Translation is scale-invariant, so the screen delta only needs to be
    /// divided by the current scale to become a world delta.
    pub fn on_pointer_move(&mut self, pointer: Pos2, scale: f32, store: &mut GraphStore) {
        let Some(id) = self.active.clone() else {
            return;
        };
        if let Some(last) = self.last_pointer {
            let dx = (pointer.x - last.x) / scale;
            let dy = (pointer.y - last.y) / scale;
            // No-op when the node was removed by a concurrent reconciliation.
            store.translate_node(&id, dx, dy);
        }
        self.last_pointer = Some(pointer);
    }

    /// Ends the drag without persisting: dragged coordinates are local and
    /// ephemeral; only explicit add/edit actions are synced.
    pub fn on_release(&mut self) {
        self.active = None;
        self.last_pointer = None;
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use crate::model::demo_graph;

    use super::*;

    #[test]
    fn drag_moves_node_by_screen_delta_over_scale() {
        let mut store = GraphStore::load(demo_graph());
        let start = store.state().node("ada").unwrap().clone();

        let mut drag = DragController::new();
        drag.on_node_grab("ada", pos2(100.0, 100.0));
        drag.on_pointer_move(pos2(120.0, 90.0), 2.0, &mut store);

        let moved = store.state().node("ada").unwrap();
        assert_eq!(moved.x, start.x + 10.0);
        assert_eq!(moved.y, start.y - 5.0);

        drag.on_release();
        assert!(!drag.is_dragging());
        drag.on_pointer_move(pos2(500.0, 500.0), 2.0, &mut store);
        assert_eq!(store.state().node("ada").unwrap().x, start.x + 10.0);
    }

    #[test]
    fn drag_of_a_reconciled_away_node_is_inert() {
        let mut store = GraphStore::load(demo_graph());
        let mut drag = DragController::new();
        drag.on_node_grab("ada", pos2(0.0, 0.0));

        let mut without_ada = demo_graph();
        without_ada.nodes.retain(|node| node.id != "ada");
        store.reconcile(without_ada);
        let before = store.state().clone();

        // Still "dragging", but every move is a no-op now.
        drag.on_pointer_move(pos2(50.0, 50.0), 1.0, &mut store);
        assert!(drag.is_dragging());
        assert_eq!(store.state(), &before);
    }
}
