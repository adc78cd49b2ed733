use std::path::PathBuf;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::{GraphState, Link, Node, normalize_snapshot};

use super::queue::MutationQueue;

/// CRUD contract every storage engine must provide. Uniqueness violations
/// surface as `Conflict` and missing targets as `NotFound` no matter which
/// engine raises them.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_graph(&self) -> Result<GraphState, ApiError>;
    async fn insert_node(&self, node: Node) -> Result<(), ApiError>;
    async fn insert_link(&self, link: Link) -> Result<(), ApiError>;
    async fn update_node_note(&self, id: &str, text: &str) -> Result<(), ApiError>;
}

/// Flat-file backend. All writes are threaded through the mutation queue,
/// so check-then-insert is atomic with respect to concurrent requests.
pub struct FileStore {
    queue: MutationQueue,
}

impl FileStore {
    pub async fn open(path: PathBuf) -> anyhow::Result<Self> {
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let parsed: GraphState = serde_json::from_slice(&bytes)
                    .with_context(|| format!("corrupt graph file {}", path.display()))?;
                normalize_snapshot(parsed)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                let empty = GraphState::default();
                tokio::fs::write(&path, serde_json::to_vec_pretty(&empty)?)
                    .await
                    .with_context(|| format!("cannot seed graph file {}", path.display()))?;
                tracing::info!("seeded empty graph at {}", path.display());
                empty
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("cannot read graph file {}", path.display()));
            }
        };

        Ok(Self {
            queue: MutationQueue::spawn(doc, path),
        })
    }
}

#[async_trait]
impl Backend for FileStore {
    async fn get_graph(&self) -> Result<GraphState, ApiError> {
        self.queue.read(|doc| doc.clone()).await
    }

    async fn insert_node(&self, node: Node) -> Result<(), ApiError> {
        self.queue
            .mutate(move |doc| {
                if doc.has_node(&node.id) {
                    return Err(ApiError::Conflict(node.id.clone()));
                }
                doc.nodes.push(node);
                Ok(())
            })
            .await
    }

    async fn insert_link(&self, link: Link) -> Result<(), ApiError> {
        self.queue
            .mutate(move |doc| {
                if doc.has_link(&link.id) {
                    return Err(ApiError::Conflict(link.id.clone()));
                }
                // Endpoints are only checked at creation time; links left
                // dangling by a later node removal are tolerated.
                for endpoint in [&link.source, &link.target] {
                    if !doc.has_node(endpoint) {
                        return Err(ApiError::Validation(format!(
                            "link endpoint '{endpoint}' does not name an existing node"
                        )));
                    }
                }
                doc.links.push(link);
                Ok(())
            })
            .await
    }

    async fn update_node_note(&self, id: &str, text: &str) -> Result<(), ApiError> {
        let id = id.to_string();
        let text = text.to_string();
        self.queue
            .mutate(move |doc| match doc.nodes.iter_mut().find(|node| node.id == id) {
                Some(node) => {
                    node.description = text;
                    Ok(())
                }
                None => Err(ApiError::NotFound(id.clone())),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_string(),
            group: "g".to_string(),
            x: 0.0,
            y: 0.0,
            r: None,
            avatar: None,
            description: String::new(),
        }
    }

    fn link(id: &str, source: &str, target: &str) -> Link {
        Link {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: Default::default(),
        }
    }

    #[tokio::test]
    async fn duplicate_node_id_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("graph.json")).await.unwrap();

        store.insert_node(node("x1")).await.unwrap();
        let duplicate = store.insert_node(node("x1")).await;
        assert!(matches!(duplicate, Err(ApiError::Conflict(id)) if id == "x1"));

        let graph = store.get_graph().await.unwrap();
        assert_eq!(graph.nodes.len(), 1);
    }

    #[tokio::test]
    async fn link_requires_existing_endpoints_at_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("graph.json")).await.unwrap();

        store.insert_node(node("a")).await.unwrap();
        let dangling = store.insert_link(link("l1", "a", "ghost")).await;
        assert!(matches!(dangling, Err(ApiError::Validation(_))));

        store.insert_node(node("b")).await.unwrap();
        store.insert_link(link("l1", "a", "b")).await.unwrap();
    }

    #[tokio::test]
    async fn note_update_on_missing_node_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("graph.json")).await.unwrap();

        let missing = store.update_node_note("ghost", "hi").await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        store.insert_node(node("a")).await.unwrap();
        store.update_node_note("a", "hello").await.unwrap();
        let graph = store.get_graph().await.unwrap();
        assert_eq!(graph.node("a").unwrap().description, "hello");
    }

    #[tokio::test]
    async fn reopening_reads_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        {
            let store = FileStore::open(path.clone()).await.unwrap();
            store.insert_node(node("a")).await.unwrap();
        }

        let reopened = FileStore::open(path).await.unwrap();
        let graph = reopened.get_graph().await.unwrap();
        assert!(graph.has_node("a"));
    }
}
