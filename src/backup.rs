//! Backup orchestrator: a periodic scheduler plus one worker lane that
//! serializes every backup/restore request.
//!
//! Both the timer and direct callers feed the same FIFO queue, and a single
//! spawned worker drains it. At most one task ever touches the catalog or
//! the artifact directory at a time, so no locks guard either resource.

use crate::catalog::CatalogGateway;
use crate::codec::{self, CodecError};
use crate::store::{artifact_name, ArtifactStore, StoreError, ARTIFACT_EXT};
use chrono::Local;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("catalog access failed: {0}")]
    Catalog(#[source] anyhow::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("task cancelled before completion")]
    Cancelled,
}

enum Task {
    Backup {
        reply: oneshot::Sender<Result<String, BackupError>>,
    },
    Restore {
        artifact: String,
        reply: oneshot::Sender<Result<usize, BackupError>>,
    },
}

/// Awaitable outcome of a submitted task. Dropping the handle does not
/// cancel the task; awaiting a task torn down during shutdown yields
/// [`BackupError::Cancelled`].
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, BackupError>>,
}

impl<T> TaskHandle<T> {
    pub async fn wait(self) -> Result<T, BackupError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(BackupError::Cancelled),
        }
    }
}

pub struct BackupService {
    tx: mpsc::UnboundedSender<Task>,
    store: Arc<ArtifactStore>,
    worker: JoinHandle<()>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl BackupService {
    /// Spawn the worker lane over the given catalog and artifact store.
    pub fn new(catalog: Arc<dyn CatalogGateway>, store: ArtifactStore) -> Self {
        let store = Arc::new(store);
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(rx, catalog, store.clone()));
        Self {
            tx,
            store,
            worker,
            scheduler: Mutex::new(None),
        }
    }

    /// Submit a one-shot backup task: read the full catalog, encode it and
    /// write one timestamped artifact. Resolves to the artifact name.
    pub fn perform_backup(&self) -> TaskHandle<String> {
        let (reply, rx) = oneshot::channel();
        self.submit(Task::Backup { reply });
        TaskHandle { rx }
    }

    /// Submit a one-shot restore task: decode the named artifact and replay
    /// every record through the catalog gateway. A record the catalog
    /// rejects is logged and skipped; the handle resolves to the count of
    /// records actually restored.
    pub fn restore(&self, artifact: impl Into<String>) -> TaskHandle<usize> {
        let (reply, rx) = oneshot::channel();
        self.submit(Task::Restore {
            artifact: artifact.into(),
            reply,
        });
        TaskHandle { rx }
    }

    /// Fire a backup tick now and then every `period` until shutdown. Ticks
    /// enqueue on the worker lane like any caller request; a tick due while
    /// a task is still running simply queues behind it. A failed tick is
    /// logged and the schedule keeps going.
    pub fn schedule_recurring(&self, period: Duration) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let (reply, rx) = oneshot::channel();
                if tx.send(Task::Backup { reply }).is_err() {
                    break;
                }
                tokio::spawn(async move {
                    match rx.await {
                        Ok(Ok(artifact)) => info!(%artifact, "scheduled backup completed"),
                        Ok(Err(err)) => error!(?err, "scheduled backup failed"),
                        // shut down before the tick ran
                        Err(_) => {}
                    }
                });
            }
        });
        info!(?period, "scheduled backup started");
        if let Ok(mut slot) = self.scheduler.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Artifact names sorted so lexical order equals chronological order.
    pub async fn list_artifacts(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self.store.list().await?;
        names.sort();
        Ok(names)
    }

    pub async fn delete_artifact(&self, name: &str) -> Result<(), StoreError> {
        self.store.delete(name).await
    }

    /// Stop the timer, close the queue, and wait up to `timeout` for the
    /// worker to drain in-flight and queued tasks. Work still pending after
    /// the deadline is aborted; its handles resolve as cancelled. Consumes
    /// the service, so shutdown can only happen once.
    pub async fn shutdown(self, timeout: Duration) {
        let BackupService {
            tx,
            store: _,
            worker,
            scheduler,
        } = self;
        if let Ok(Some(sched)) = scheduler.into_inner() {
            sched.abort();
        }
        // Closing the queue lets the worker finish what is already enqueued.
        drop(tx);
        let abort = worker.abort_handle();
        if tokio::time::timeout(timeout, worker).await.is_err() {
            warn!(?timeout, "backup worker did not drain in time; aborting");
            abort.abort();
        }
    }

    fn submit(&self, task: Task) {
        // Fails only if the worker is gone; the dropped reply then resolves
        // the handle as cancelled.
        let _ = self.tx.send(task);
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Task>,
    catalog: Arc<dyn CatalogGateway>,
    store: Arc<ArtifactStore>,
) {
    while let Some(task) = rx.recv().await {
        match task {
            Task::Backup { reply } => {
                let result = run_backup(catalog.as_ref(), &store).await;
                if let Err(err) = &result {
                    warn!(?err, "backup task failed");
                }
                let _ = reply.send(result);
            }
            Task::Restore { artifact, reply } => {
                let result = run_restore(catalog.as_ref(), &store, &artifact).await;
                if let Err(err) = &result {
                    warn!(?err, %artifact, "restore task failed");
                }
                let _ = reply.send(result);
            }
        }
    }
}

async fn run_backup(
    catalog: &dyn CatalogGateway,
    store: &ArtifactStore,
) -> Result<String, BackupError> {
    let books = catalog.list_all().await.map_err(BackupError::Catalog)?;
    let name = next_artifact_name(store).await;
    let bytes = codec::encode(&books)?;
    store.write(&name, &bytes).await?;
    info!(artifact = %name, count = books.len(), "backup completed");
    Ok(name)
}

/// Timestamp names have one-second granularity; a second backup within the
/// same second gets a numeric suffix instead of overwriting. The suffix
/// sorts after the bare name, so listings stay chronological.
async fn next_artifact_name(store: &ArtifactStore) -> String {
    let base = artifact_name(Local::now());
    let mut name = base.clone();
    let mut n = 2;
    while store.exists(&name).await {
        let stem = base.trim_end_matches(ARTIFACT_EXT);
        name = format!("{stem}_{n}{ARTIFACT_EXT}");
        n += 1;
    }
    name
}

async fn run_restore(
    catalog: &dyn CatalogGateway,
    store: &ArtifactStore,
    artifact: &str,
) -> Result<usize, BackupError> {
    let bytes = store.read(artifact).await?;
    let books = codec::decode(&bytes)?;
    let total = books.len();
    let mut restored = 0;
    for book in books {
        let isbn = book.isbn.clone();
        match catalog.upsert(book).await {
            Ok(_) => restored += 1,
            Err(err) => warn!(%isbn, ?err, "failed to restore record; skipping"),
        }
    }
    info!(artifact = %artifact, restored, total, "restore completed");
    Ok(restored)
}
