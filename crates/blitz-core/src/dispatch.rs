//! Job dispatch: one isolated worker per job, results by message passing.
//!
//! Every job gets a fresh blocking worker that owns its own pipeline and
//! talks to the caller only through a request and a response channel. The
//! worker handles exactly one request and exits, so nothing (bitmaps
//! included) outlives the job. Concurrency across jobs is bounded by a
//! semaphore sized from `processing.parallel_workers`. A job that times out
//! returns at once, but its worker keeps the semaphore slot until it exits.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::config::{Config, LimitsConfig, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::channel::bounded_channel;
use crate::pipeline::{DiscoveredFile, ProcessOptions, TransformPipeline};
use crate::settings::TransformSettings;
use crate::types::{JobOutput, SourceFile};

/// Process-wide job identifier, rendered as `job-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        JobId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Message into a worker.
#[derive(Debug)]
pub struct JobRequest {
    pub id: JobId,
    pub file: SourceFile,
    pub settings: TransformSettings,
}

/// Message out of a worker.
#[derive(Debug)]
pub struct JobResponse {
    pub id: JobId,
    pub outcome: PipelineResult<JobOutput>,
}

/// One finished job of a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Position of the file in the submitted list
    pub index: usize,
    pub file: DiscoveredFile,
    pub result: PipelineResult<JobOutput>,
}

/// Caller-side end of one job.
struct Exchange {
    outcome: PipelineResult<JobOutput>,
    /// Worker abandoned after a timeout, still running
    straggler: Option<JoinHandle<()>>,
}

/// Entry point for running transform jobs.
#[derive(Clone)]
pub struct Dispatcher {
    limits: LimitsConfig,
    pipeline: PipelineConfig,
    options: ProcessOptions,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            limits: config.limits.clone(),
            pipeline: config.pipeline.clone(),
            options: ProcessOptions::default(),
            semaphore: Arc::new(Semaphore::new(config.processing.parallel_workers.max(1))),
        }
    }

    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ProcessOptions {
        self.options
    }

    /// Run one job and wait for its result.
    pub async fn submit(
        &self,
        file: SourceFile,
        settings: TransformSettings,
    ) -> PipelineResult<JobOutput> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::Context {
                job_id: "dispatcher".to_string(),
                message: "dispatcher is shut down".to_string(),
            })?;
        let Exchange { outcome, straggler } = self.execute(file, settings).await;
        release_after(permit, straggler);
        outcome
    }

    /// Run every file and stream results back as they finish.
    ///
    /// Files are read inside their job, so at most `parallel_workers` sources
    /// are in memory at once. A failed job is reported and the batch goes on.
    pub fn run_batch(
        &self,
        files: Vec<DiscoveredFile>,
        settings: TransformSettings,
    ) -> mpsc::Receiver<BatchItem> {
        let (tx, rx) = bounded_channel(&self.pipeline);
        let dispatcher = self.clone();

        tokio::spawn(async move {
            let mut handles = Vec::with_capacity(files.len());

            for (index, file) in files.into_iter().enumerate() {
                let Ok(permit) = dispatcher.semaphore.clone().acquire_owned().await else {
                    tracing::warn!("Dispatcher semaphore closed, stopping batch");
                    break;
                };

                let job = dispatcher.clone();
                let settings = settings.clone();
                let tx = tx.clone();
                let task_file = file.clone();

                let handle = tokio::spawn(async move {
                    let (result, straggler) = match SourceFile::from_path(&task_file.path).await {
                        Ok(source) => {
                            let done = job.execute(source, settings).await;
                            (done.outcome, done.straggler)
                        }
                        Err(e) => (Err(e), None),
                    };
                    // Keep the permit until the consumer has taken the item.
                    let _ = tx
                        .send(BatchItem {
                            index,
                            file: task_file,
                            result,
                        })
                        .await;
                    release_after(permit, straggler);
                });
                handles.push((index, file, handle));
            }

            for (index, file, handle) in handles {
                if let Err(e) = handle.await {
                    tracing::error!("Batch task for {:?} panicked: {e}", file.path);
                    let _ = tx
                        .send(BatchItem {
                            index,
                            file,
                            result: Err(PipelineError::Context {
                                job_id: format!("batch-{index}"),
                                message: e.to_string(),
                            }),
                        })
                        .await;
                }
            }
        });

        rx
    }

    /// Spawn the worker for one job and exchange messages with it.
    async fn execute(&self, file: SourceFile, settings: TransformSettings) -> Exchange {
        let request = JobRequest {
            id: JobId::next(),
            file,
            settings: settings.normalized(),
        };
        let (request_tx, request_rx) = mpsc::channel(1);
        let (response_tx, response_rx) = mpsc::channel(1);

        let pipeline = TransformPipeline::new(self.limits.clone(), self.options);
        let worker =
            tokio::task::spawn_blocking(move || serve_one(pipeline, request_rx, response_tx));

        self.exchange(request, request_tx, response_rx, worker).await
    }

    async fn exchange(
        &self,
        request: JobRequest,
        request_tx: mpsc::Sender<JobRequest>,
        mut response_rx: mpsc::Receiver<JobResponse>,
        worker: JoinHandle<()>,
    ) -> Exchange {
        let id = request.id;
        let name = request.file.name.clone();
        tracing::debug!("Dispatching {} as {}", name, id);

        if request_tx.send(request).await.is_err() {
            let e = worker_failure(id, worker, "worker exited before taking the job").await;
            return Exchange::finished(Err(e));
        }
        drop(request_tx);

        let timeout_ms = self.limits.job_timeout_ms;
        let reply = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            await_reply(id, &mut response_rx),
        )
        .await;

        match reply {
            Ok(Some(outcome)) => {
                if let Err(e) = worker.await {
                    tracing::warn!("{} replied but did not shut down cleanly: {}", id, e);
                }
                Exchange::finished(outcome)
            }
            Ok(None) => {
                let e = worker_failure(id, worker, "worker exited without a reply").await;
                Exchange::finished(Err(e))
            }
            Err(_) => {
                // A blocking worker cannot be interrupted; its late reply is dropped.
                tracing::warn!("{} ({}) timed out after {}ms", id, name, timeout_ms);
                Exchange {
                    outcome: Err(PipelineError::Timeout {
                        name,
                        stage: "job".to_string(),
                        timeout_ms,
                    }),
                    straggler: Some(worker),
                }
            }
        }
    }
}

impl Exchange {
    fn finished(outcome: PipelineResult<JobOutput>) -> Self {
        Self {
            outcome,
            straggler: None,
        }
    }
}

/// Free a concurrency slot, waiting first for an abandoned worker to exit.
fn release_after(permit: OwnedSemaphorePermit, straggler: Option<JoinHandle<()>>) {
    let Some(worker) = straggler else {
        drop(permit);
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = worker.await {
            tracing::warn!("Timed-out worker did not exit cleanly: {}", e);
        }
        drop(permit);
    });
}

/// Wait for the response to `id`, skipping anything addressed elsewhere.
async fn await_reply(
    id: JobId,
    responses: &mut mpsc::Receiver<JobResponse>,
) -> Option<PipelineResult<JobOutput>> {
    while let Some(response) = responses.recv().await {
        if response.id == id {
            return Some(response.outcome);
        }
        tracing::warn!("Ignoring reply for {} while waiting on {}", response.id, id);
    }
    None
}

/// Turn a vanished worker into a context error, with the panic if there was one.
async fn worker_failure(id: JobId, worker: JoinHandle<()>, fallback: &str) -> PipelineError {
    let message = match worker.await {
        Err(e) if e.is_panic() => format!("worker panicked: {e}"),
        Err(e) => e.to_string(),
        Ok(()) => fallback.to_string(),
    };
    PipelineError::Context {
        job_id: id.to_string(),
        message,
    }
}

/// Worker body: take one request, run it, reply, exit.
fn serve_one(
    pipeline: TransformPipeline,
    mut requests: mpsc::Receiver<JobRequest>,
    responses: mpsc::Sender<JobResponse>,
) {
    let Some(JobRequest { id, file, settings }) = requests.blocking_recv() else {
        return;
    };
    let outcome = pipeline.run(&file, &settings);
    drop(file);

    if responses.blocking_send(JobResponse { id, outcome }).is_err() {
        tracing::debug!("{} finished after its caller gave up", id);
    }
}
