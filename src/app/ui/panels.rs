use std::collections::HashMap;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui, pos2, vec2};

use crate::app::{DragController, ViewPatch, ViewportController};
use crate::model::{LinkKind, Node};
use crate::store::{GraphStore, Mutation};
use crate::sync::{SyncCommand, SyncHandle};
use crate::util::slug;

use super::super::ViewModel;

const OFFLINE_COLOR: Color32 = Color32::from_rgb(235, 165, 80);
const STATUS_COLOR: Color32 = Color32::from_rgb(235, 120, 110);

impl ViewModel {
    pub(in crate::app) fn new(store: GraphStore, offline: bool) -> Self {
        let new_node_group = {
            let mut ids = store.state().groups.keys().cloned().collect::<Vec<_>>();
            ids.sort();
            ids.into_iter().next().unwrap_or_default()
        };

        Self {
            store,
            viewport: ViewportController::default(),
            drag: DragController::new(),
            offline,
            pending: HashMap::new(),
            next_request_id: 0,
            needs_fit: true,
            canvas_size: vec2(0.0, 0.0),
            status: None,
            new_node_label: String::new(),
            new_node_group,
            new_link_source: String::new(),
            new_link_target: String::new(),
            new_link_kind: LinkKind::Solid,
            note_draft: String::new(),
            note_draft_for: None,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, sync: &SyncHandle) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("relmap");
                    ui.separator();
                    ui.label(format!("people: {}", self.store.state().nodes.len()));
                    ui.label(format!("links: {}", self.store.state().links.len()));
                    if self.offline {
                        ui.colored_label(OFFLINE_COLOR, "offline — read-only demo data");
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("Refresh").clicked() {
                            sync.send(SyncCommand::RefreshNow);
                        }
                        if ui.button("Reset view").clicked() {
                            self.viewport.set_view(ViewPatch {
                                scale: Some(1.0),
                                tx: Some(0.0),
                                ty: Some(0.0),
                            });
                        }
                        if ui.button("Fit").clicked() {
                            self.needs_fit = true;
                        }
                        let center =
                            pos2(self.canvas_size.x * 0.5, self.canvas_size.y * 0.5);
                        if ui.button("−").clicked() {
                            self.viewport.zoom_about(center, 1.0 / 1.2);
                        }
                        if ui.button("+").clicked() {
                            self.viewport.zoom_about(center, 1.2);
                        }
                        ui.label(format!("zoom {:.2}", self.viewport.view().scale));
                    });
                });
            });

        egui::SidePanel::left("actions")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_side_panel(ui, sync));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui));
    }

    fn draw_side_panel(&mut self, ui: &mut Ui, sync: &SyncHandle) {
        if self.offline {
            ui.colored_label(
                OFFLINE_COLOR,
                "The shared store is unreachable. Showing built-in demo content; \
                 editing is disabled until a refresh succeeds.",
            );
            ui.separator();
        }

        ui.add_enabled_ui(!self.offline, |ui| {
            self.draw_add_node(ui, sync);
            ui.separator();
            self.draw_add_link(ui, sync);
            ui.separator();
            self.draw_notes(ui, sync);
        });

        if let Some(status) = self.status.clone() {
            ui.separator();
            ui.horizontal(|ui| {
                ui.colored_label(STATUS_COLOR, RichText::new(status).small());
                if ui.small_button("x").clicked() {
                    self.status = None;
                }
            });
        }

        ui.separator();
        ui.collapsing("Groups", |ui| {
            let mut groups = self
                .store
                .state()
                .groups
                .iter()
                .map(|(id, group)| (id.clone(), group.label.clone(), group.color.clone()))
                .collect::<Vec<_>>();
            groups.sort();
            for (id, label, color) in groups {
                ui.horizontal(|ui| {
                    if let Some(color) = color.as_deref().and_then(crate::util::parse_hex_color) {
                        ui.colored_label(color, "●");
                    }
                    ui.label(format!("{label} ({id})"));
                });
            }
        });
    }

    fn draw_add_node(&mut self, ui: &mut Ui, sync: &SyncHandle) {
        ui.heading("Add person");
        ui.horizontal(|ui| {
            ui.label("name");
            ui.text_edit_singleline(&mut self.new_node_label);
        });
        // Free text: a group needs no prior declaration, so the very first
        // person can be added to a brand-new store.
        ui.horizontal(|ui| {
            ui.label("group");
            ui.text_edit_singleline(&mut self.new_node_group);
        });
        let mut ids = self.store.state().groups.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        if !ids.is_empty() {
            ui.horizontal_wrapped(|ui| {
                for id in ids {
                    if ui.small_button(&id).clicked() {
                        self.new_node_group = id;
                    }
                }
            });
        }

        let ready =
            !self.new_node_label.trim().is_empty() && !self.new_node_group.trim().is_empty();
        if ui.add_enabled(ready, egui::Button::new("Add")).clicked() {
            self.submit_add_node(sync);
        }
    }

    fn draw_add_link(&mut self, ui: &mut Ui, sync: &SyncHandle) {
        ui.heading("Add relationship");

        let mut people = self
            .store
            .state()
            .nodes
            .iter()
            .map(|node| (node.id.clone(), node.label.clone()))
            .collect::<Vec<_>>();
        people.sort_by(|a, b| a.1.cmp(&b.1));

        let display = |people: &[(String, String)], id: &str| {
            people
                .iter()
                .find(|(candidate, _)| candidate == id)
                .map(|(_, label)| label.clone())
                .unwrap_or_default()
        };

        ui.horizontal(|ui| {
            ui.label("from");
            egui::ComboBox::from_id_salt("link_source")
                .selected_text(display(&people, &self.new_link_source))
                .show_ui(ui, |ui| {
                    for (id, label) in &people {
                        ui.selectable_value(&mut self.new_link_source, id.clone(), label);
                    }
                });
        });
        ui.horizontal(|ui| {
            ui.label("to");
            egui::ComboBox::from_id_salt("link_target")
                .selected_text(display(&people, &self.new_link_target))
                .show_ui(ui, |ui| {
                    for (id, label) in &people {
                        ui.selectable_value(&mut self.new_link_target, id.clone(), label);
                    }
                });
        });
        ui.horizontal(|ui| {
            ui.label("style");
            egui::ComboBox::from_id_salt("link_kind")
                .selected_text(self.new_link_kind.wire_name())
                .show_ui(ui, |ui| {
                    for kind in LinkKind::ALL {
                        ui.selectable_value(&mut self.new_link_kind, kind, kind.wire_name());
                    }
                });
        });

        let ready = !self.new_link_source.is_empty()
            && !self.new_link_target.is_empty()
            && self.new_link_source != self.new_link_target;
        if ui.add_enabled(ready, egui::Button::new("Link")).clicked() {
            self.submit_add_link(sync);
        }
    }

    fn draw_notes(&mut self, ui: &mut Ui, sync: &SyncHandle) {
        ui.heading("Notes");

        let Some(focused) = self.store.focused().map(str::to_string) else {
            ui.label("Select a person on the canvas to edit their notes.");
            return;
        };

        if self.note_draft_for.as_deref() != Some(focused.as_str()) {
            self.note_draft = self
                .store
                .state()
                .node(&focused)
                .map(|node| node.description.clone())
                .unwrap_or_default();
            self.note_draft_for = Some(focused.clone());
        }

        let label = self
            .store
            .state()
            .node(&focused)
            .map(|node| node.label.clone())
            .unwrap_or_else(|| focused.clone());
        ui.label(RichText::new(label).strong());
        ui.text_edit_multiline(&mut self.note_draft);

        if ui.button("Save note").clicked() {
            self.submit_note(sync, &focused);
        }
    }

    fn submit_add_node(&mut self, sync: &SyncHandle) {
        let label = self.new_node_label.trim().to_string();
        let group = self.new_node_group.trim().to_string();
        if label.is_empty() || group.is_empty() {
            return;
        }

        let base = {
            let candidate = slug(&label);
            if candidate.is_empty() {
                "person".to_string()
            } else {
                candidate
            }
        };
        let mut id = base.clone();
        let mut suffix = 2;
        while self.store.state().has_node(&id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }

        // New nodes appear at the center of the current view.
        let center = self
            .viewport
            .view()
            .screen_to_world(pos2(self.canvas_size.x * 0.5, self.canvas_size.y * 0.5));

        let node = Node {
            id: id.clone(),
            label,
            group,
            x: center.x,
            y: center.y,
            r: None,
            avatar: None,
            description: String::new(),
        };

        let request_id = self.next_request();
        let pending = self.store.apply_optimistic(Mutation::AddNode(node.clone()));
        self.pending.insert(request_id, pending);
        sync.send(SyncCommand::CreateNode { request_id, node });

        self.store.set_focus(Some(id));
        self.new_node_label.clear();
        self.status = None;
    }

    fn submit_add_link(&mut self, sync: &SyncHandle) {
        let source = self.new_link_source.clone();
        let target = self.new_link_target.clone();
        if source.is_empty() || target.is_empty() || source == target {
            return;
        }

        let base = format!("{source}-{target}");
        let mut id = base.clone();
        let mut suffix = 2;
        while self.store.state().has_link(&id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }

        let link = crate::model::Link {
            id,
            source,
            target,
            kind: self.new_link_kind,
        };

        let request_id = self.next_request();
        let pending = self.store.apply_optimistic(Mutation::AddLink(link.clone()));
        self.pending.insert(request_id, pending);
        sync.send(SyncCommand::CreateLink { request_id, link });
        self.status = None;
    }

    fn submit_note(&mut self, sync: &SyncHandle, id: &str) {
        let text = self.note_draft.clone();
        let request_id = self.next_request();
        let pending = self.store.apply_optimistic(Mutation::EditNote {
            id: id.to_string(),
            text: text.clone(),
        });
        self.pending.insert(request_id, pending);
        sync.send(SyncCommand::UpdateNote {
            request_id,
            id: id.to_string(),
            text,
        });
        self.status = None;
    }
}
