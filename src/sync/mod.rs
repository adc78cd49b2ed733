mod routing;

pub use routing::{BaseRouter, SyncError};

use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::model::{GraphState, Link, Node, demo_graph};

const DEFAULT_BASE: &str = "http://127.0.0.1:8787";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub primary: Option<String>,
    pub alternates: Vec<String>,
    pub token: String,
    pub poll_interval: Duration,
}

#[derive(Debug)]
pub enum SyncCommand {
    CreateNode { request_id: u64, node: Node },
    CreateLink { request_id: u64, link: Link },
    UpdateNote { request_id: u64, id: String, text: String },
    RefreshNow,
}

#[derive(Debug)]
pub enum SyncEvent {
    /// Outcome of the initial load: real data, or demo content flagged
    /// offline when the very first fetch failed.
    Loaded { state: GraphState, offline: bool },
    /// A poll (or manual refresh) fetched a fresh server snapshot.
    Snapshot(GraphState),
    MutationDone {
        request_id: u64,
        result: Result<(), SyncError>,
    },
}

/// UI-thread handle to the sync worker. Commands go in over a channel; the
/// egui update loop drains events with [`SyncHandle::try_event`], mirroring
/// the spawn-thread-plus-try_recv loading pattern the rest of the app uses.
pub struct SyncHandle {
    commands: mpsc::Sender<SyncCommand>,
    events: std_mpsc::Receiver<SyncEvent>,
    cancel: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl SyncHandle {
    pub fn spawn(config: SyncConfig, repaint: Option<eframe::egui::Context>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = std_mpsc::channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(error) => {
                    tracing::error!("failed to start sync runtime: {error}");
                    return;
                }
            };

            let worker = Worker::new(config, worker_cancel, event_tx, repaint);
            runtime.block_on(worker.run(command_rx));
        });

        Self {
            commands: command_tx,
            events: event_rx,
            cancel,
            worker: Some(worker),
        }
    }

    pub fn send(&self, command: SyncCommand) {
        if let Err(error) = self.commands.try_send(command) {
            tracing::warn!("sync command dropped: {error}");
        }
    }

    pub fn try_event(&self) -> Option<SyncEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct Worker {
    http: reqwest::Client,
    router: BaseRouter,
    token: String,
    poll_interval: Duration,
    cancel: CancellationToken,
    events: std_mpsc::Sender<SyncEvent>,
    repaint: Option<eframe::egui::Context>,
}

impl Worker {
    fn new(
        config: SyncConfig,
        cancel: CancellationToken,
        events: std_mpsc::Sender<SyncEvent>,
        repaint: Option<eframe::egui::Context>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            router: BaseRouter::new(config.primary, config.alternates, DEFAULT_BASE),
            token: config.token,
            poll_interval: config.poll_interval,
            cancel,
            events,
            repaint,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SyncCommand>) {
        self.initial_load().await;

        let mut ticker = tokio::time::interval(self.poll_interval);
        // Commands and polls are handled one at a time, so a tick that fires
        // while a poll is still in flight must collapse, not queue up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = ticker.tick() => self.poll().await,
            }
        }
        tracing::debug!("sync worker stopped");
    }

    async fn handle(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::CreateNode { request_id, node } => {
                let body = serde_json::to_value(&node).unwrap_or(Value::Null);
                let result = self.mutate(Method::POST, "nodes", &body).await;
                self.emit(SyncEvent::MutationDone { request_id, result });
            }
            SyncCommand::CreateLink { request_id, link } => {
                let body = serde_json::to_value(&link).unwrap_or(Value::Null);
                let result = self.mutate(Method::POST, "links", &body).await;
                self.emit(SyncEvent::MutationDone { request_id, result });
            }
            SyncCommand::UpdateNote {
                request_id,
                id,
                text,
            } => {
                let path = format!("nodes/{id}");
                let body = json!({ "description": text });
                let result = self.mutate(Method::PATCH, &path, &body).await;
                self.emit(SyncEvent::MutationDone { request_id, result });
            }
            SyncCommand::RefreshNow => self.poll().await,
        }
    }

    async fn initial_load(&mut self) {
        match self.fetch_map().await {
            Ok(state) => {
                self.emit(SyncEvent::Loaded {
                    state,
                    offline: false,
                });
            }
            Err(error) if error.is_cancelled() => {}
            Err(error) => {
                tracing::warn!("initial load failed, serving demo content: {error}");
                self.emit(SyncEvent::Loaded {
                    state: demo_graph(),
                    offline: true,
                });
            }
        }
    }

    async fn poll(&mut self) {
        match self.fetch_map().await {
            Ok(state) => self.emit(SyncEvent::Snapshot(state)),
            Err(error) if error.is_cancelled() => {}
            // A failed poll keeps the last-known-good state; the demo
            // fallback only exists in initial_load and never re-arms.
            Err(error) => tracing::debug!("poll failed: {error}"),
        }
    }

    async fn fetch_map(&mut self) -> Result<GraphState, SyncError> {
        let response = self.request(Method::GET, "map", None).await?;
        response
            .json::<GraphState>()
            .await
            .map_err(|error| SyncError::Network(format!("malformed map payload: {error}")))
    }

    async fn mutate(&mut self, method: Method, path: &str, body: &Value) -> Result<(), SyncError> {
        self.request(method, path, Some(body)).await.map(|_| ())
    }

    /// One logical request. A sweep tries every candidate base in order; a
    /// sweep that died of a transient network condition gets exactly one
    /// more sweep before the failure is surfaced.
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, SyncError> {
        match self.sweep(method.clone(), path, body).await {
            Err(error) if error.is_transient() => {
                tracing::warn!("transient failure on {path}, retrying once: {error}");
                self.sweep(method, path, body).await
            }
            outcome => outcome,
        }
    }

    async fn sweep(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, SyncError> {
        let order = self.router.ordered();
        let attempts = order.len();
        let mut last = SyncError::Network("no API base candidates configured".to_string());

        for index in order {
            let url = self.router.url(index, path);
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.token);
            if let Some(body) = body {
                request = request.json(body);
            }

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return Err(SyncError::Cancelled),
                outcome = request.send() => outcome,
            };

            match outcome {
                Ok(response) if response.status().is_success() => {
                    self.router.mark_success(index);
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let message = error_message(response).await;
                    tracing::debug!("{url} answered {status}: {message}");
                    last = SyncError::Status { status, message };
                }
                Err(error) => {
                    // Tag timeouts and connect failures so the transient
                    // recognizer can classify them from the message alone.
                    let message = if error.is_timeout() {
                        format!("timed out: {error}")
                    } else if error.is_connect() {
                        format!("connection refused or unreachable: {error}")
                    } else {
                        error.to_string()
                    };
                    tracing::debug!("{url} unreachable: {message}");
                    last = SyncError::Network(message);
                }
            }
        }

        Err(SyncError::Exhausted {
            attempts,
            last: Box::new(last),
        })
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}
