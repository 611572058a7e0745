//! Managed Resources Example
//!
//! A worker opens a job queue, then a spool file next to it, and streams
//! jobs into the file until it is interrupted. Interrupting the worker
//! closes the file first and the queue second, before `interrupt` returns.
//!
//! Run with: cargo run --example managed_resources

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reservoir::managed::{self, Managed, ManagedExt};
use reservoir::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Clone)]
struct Env {
    spool_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
enum WorkerError {
    Io(String),
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(err: std::io::Error) -> Self {
        WorkerError::Io(err.to_string())
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A job queue fed by a background producer.
#[derive(Debug)]
struct JobQueue {
    jobs: Mutex<mpsc::Receiver<String>>,
    producer: tokio::task::JoinHandle<()>,
}

fn job_queue() -> impl Managed<Output = Arc<JobQueue>, Error = WorkerError, Env = Env> {
    managed::make(
        from_fn(|_: &Env| {
            let (sender, receiver) = mpsc::channel(16);
            let producer = tokio::spawn(async move {
                for n in 0.. {
                    if sender.send(format!("job-{}", n)).await.is_err() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(25)).await;
                }
            });
            tracing::info!("queue opened");
            Ok::<_, WorkerError>(Arc::new(JobQueue {
                jobs: Mutex::new(receiver),
                producer,
            }))
        }),
        |queue: Arc<JobQueue>| async move {
            queue.producer.abort();
            queue.jobs.lock().await.close();
            tracing::info!("queue closed");
        },
    )
}

type SharedFile = Arc<Mutex<tokio::fs::File>>;

/// A spool file the worker appends jobs to.
fn spool_file() -> impl Managed<Output = SharedFile, Error = WorkerError, Env = Env> {
    managed::make_exit(
        from_async(|env: &Env| {
            let path = env.spool_dir.join("reservoir-demo.spool");
            async move {
                let file = tokio::fs::File::create(&path).await?;
                tracing::info!(path = %path.display(), "spool file opened");
                Ok::<_, WorkerError>(Arc::new(Mutex::new(file)))
            }
        }),
        |file: SharedFile, exit: &Exit<(), WorkerError>| {
            let interrupted = exit.is_interrupted();
            async move {
                let mut file = file.lock().await;
                if let Err(err) = file.flush().await {
                    tracing::warn!(%err, "flush failed while closing spool file");
                }
                tracing::info!(interrupted, "spool file closed");
            }
        },
    )
}

// ============================================================================
// Worker
// ============================================================================

fn worker() -> impl Effect<Output = (), Error = WorkerError, Env = Env> {
    // The queue is released after the file, since it was acquired first.
    job_queue()
        .flat_map(|queue| {
            let queue = Arc::clone(queue);
            spool_file().map(move |file| (Arc::clone(&queue), Arc::clone(file)))
        })
        .with(|(queue, file)| {
            let queue = Arc::clone(queue);
            let file = Arc::clone(file);
            from_async(move |_: &Env| async move {
                loop {
                    let Some(job) = queue.jobs.lock().await.recv().await else {
                        return Ok::<(), WorkerError>(());
                    };
                    tracing::info!(%job, "spooling");
                    file.lock().await.write_all(format!("{}\n", job).as_bytes()).await?;
                }
            })
        })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let env = Env {
        spool_dir: std::env::temp_dir(),
    };

    let fiber = reservoir::fiber::Builder::new()
        .name("spooler")
        .fork(worker(), &env);

    tokio::time::sleep(Duration::from_millis(120)).await;
    tracing::info!(fiber = %fiber.id(), "interrupting worker");

    match fiber.interrupt().await {
        Exit::Success(()) => tracing::info!("worker finished on its own"),
        Exit::Failure(cause) if cause.is_interrupted_only() => {
            tracing::info!("worker interrupted; all resources released")
        }
        Exit::Failure(cause) => tracing::error!(%cause, "worker failed"),
    }
}
