use std::collections::HashMap;

use eframe::egui::{self, Context, Vec2};

use crate::model::LinkKind;
use crate::store::{GraphStore, PendingMutation};
use crate::sync::{SyncConfig, SyncError, SyncEvent, SyncHandle};

mod canvas;
mod drag;
mod ui;
mod viewport;

pub use drag::DragController;
pub use viewport::{ViewPatch, ViewportController};

pub struct RelMapApp {
    sync: SyncHandle,
    state: AppState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
}

struct ViewModel {
    store: GraphStore,
    viewport: ViewportController,
    drag: DragController,
    offline: bool,
    pending: HashMap<u64, PendingMutation>,
    next_request_id: u64,
    needs_fit: bool,
    canvas_size: Vec2,
    status: Option<String>,
    new_node_label: String,
    new_node_group: String,
    new_link_source: String,
    new_link_target: String,
    new_link_kind: LinkKind,
    note_draft: String,
    note_draft_for: Option<String>,
}

impl RelMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: SyncConfig) -> Self {
        let sync = SyncHandle::spawn(config, Some(cc.egui_ctx.clone()));
        Self {
            sync,
            state: AppState::Loading,
        }
    }

    fn pump_sync_events(&mut self) {
        while let Some(event) = self.sync.try_event() {
            match event {
                SyncEvent::Loaded { state, offline } => {
                    let model = ViewModel::new(GraphStore::load(state), offline);
                    self.state = AppState::Ready(Box::new(model));
                }
                SyncEvent::Snapshot(snapshot) => {
                    if let AppState::Ready(model) = &mut self.state {
                        model.store.reconcile(snapshot);
                        // Any successful fetch means we are back online.
                        model.offline = false;
                    }
                }
                SyncEvent::MutationDone { request_id, result } => {
                    if let AppState::Ready(model) = &mut self.state {
                        model.finish_mutation(request_id, result);
                    }
                }
            }
        }
    }
}

impl eframe::App for RelMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.pump_sync_events();

        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading relationship map...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Ready(model) => model.show(ctx, &self.sync),
        }
    }
}

impl ViewModel {
    fn finish_mutation(&mut self, request_id: u64, result: Result<(), SyncError>) {
        let Some(pending) = self.pending.remove(&request_id) else {
            return;
        };

        match result {
            Ok(()) => pending.commit(),
            Err(error) => {
                pending.rollback(&mut self.store);
                self.status = Some(if error.is_conflict() {
                    "Rejected: that id already exists on the server".to_string()
                } else if error.is_not_found() {
                    "Rejected: the target no longer exists on the server".to_string()
                } else {
                    format!("Sync failed: {error}")
                });
            }
        }
    }

    fn next_request(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}
