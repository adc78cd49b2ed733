use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::error::ApiError;
use crate::model::GraphState;

type Mutator = Box<dyn FnOnce(&mut GraphState) -> Result<(), ApiError> + Send>;
type Reader = Box<dyn FnOnce(&GraphState) + Send>;

enum Job {
    Mutate {
        apply: Mutator,
        reply: oneshot::Sender<Result<(), ApiError>>,
    },
    Read {
        read: Reader,
    },
}

/// Serializes every operation against the backing document into one logical
/// stream: a dedicated task owns the document, and each queued operation
/// sees the result of every previously queued one. Writes are applied to a
/// scratch copy and only committed once the file is persisted, so a failed
/// mutation leaves both the document and the queue intact.
#[derive(Clone)]
pub struct MutationQueue {
    jobs: mpsc::Sender<Job>,
}

impl MutationQueue {
    pub fn spawn(initial: GraphState, path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(64);

        tokio::spawn(async move {
            let mut doc = initial;
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Mutate { apply, reply } => {
                        let mut next = doc.clone();
                        let result = match apply(&mut next) {
                            Ok(()) => match persist(&path, &next).await {
                                Ok(()) => {
                                    doc = next;
                                    Ok(())
                                }
                                Err(error) => {
                                    tracing::error!("failed to persist graph: {error}");
                                    Err(ApiError::Fatal(format!(
                                        "failed to persist graph: {error}"
                                    )))
                                }
                            },
                            Err(error) => Err(error),
                        };
                        let _ = reply.send(result);
                    }
                    Job::Read { read } => read(&doc),
                }
            }
        });

        Self { jobs: tx }
    }

    pub async fn mutate<F>(&self, apply: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut GraphState) -> Result<(), ApiError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .send(Job::Mutate {
                apply: Box::new(apply),
                reply: reply_tx,
            })
            .await
            .map_err(|_| queue_closed())?;
        reply_rx.await.map_err(|_| queue_closed())?
    }

    pub async fn read<F, R>(&self, read: F) -> Result<R, ApiError>
    where
        F: FnOnce(&GraphState) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .send(Job::Read {
                read: Box::new(move |doc| {
                    let _ = reply_tx.send(read(doc));
                }),
            })
            .await
            .map_err(|_| queue_closed())?;
        reply_rx.await.map_err(|_| queue_closed())
    }
}

fn queue_closed() -> ApiError {
    ApiError::Fatal("mutation queue is closed".to_string())
}

async fn persist(path: &PathBuf, doc: &GraphState) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
mod tests {
    use crate::model::Node;

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

    #[tokio::test]
    async fn queued_operations_see_all_prior_writes() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MutationQueue::spawn(GraphState::default(), dir.path().join("graph.json"));

        for index in 0..20 {
            let id = format!("n{index}");
            queue
                .mutate(move |doc| {
                    // Each write checks the effect of every previous one.
                    assert_eq!(doc.nodes.len(), index);
                    doc.nodes.push(node(&id));
                    Ok(())
                })
                .await
                .unwrap();
        }

        let count = queue.read(|doc| doc.nodes.len()).await.unwrap();
        assert_eq!(count, 20);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_queue_and_document_intact() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MutationQueue::spawn(GraphState::default(), dir.path().join("graph.json"));

        queue
            .mutate(|doc| {
                doc.nodes.push(node("keep"));
                Ok(())
            })
            .await
            .unwrap();

        let failure = queue
            .mutate(|doc| {
                doc.nodes.push(node("discard"));
                Err(ApiError::Conflict("discard".to_string()))
            })
            .await;
        assert!(matches!(failure, Err(ApiError::Conflict(_))));

        // The rejected write must not leak into the document.
        let nodes = queue.read(|doc| doc.nodes.clone()).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "keep");

        // And the queue keeps serving.
        queue
            .mutate(|doc| {
                doc.nodes.push(node("after"));
                Ok(())
            })
            .await
            .unwrap();
        let count = queue.read(|doc| doc.nodes.len()).await.unwrap();
        assert_eq!(count, 2);
    }
}
