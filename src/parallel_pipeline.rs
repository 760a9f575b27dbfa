// THEORY:
// Segmenting one image is strictly sequential, but separate images share nothing,
// so a batch can be spread across cores. The `ParallelPipeline` owns a small pool
// of tokio workers fed round-robin by a dispatcher. Each worker runs the ordinary
// `SegmentationPipeline` on a blocking thread and replies over a oneshot channel.
// Results of a batch come back in submission order; one bad image fails only its
// own job.

use crate::core_modules::error::SegmentError;
use crate::core_modules::grid::PixelGrid;
use crate::pipeline::{SegmentConfig, Segmentation, SegmentationPipeline};
use futures::future::join_all;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Failures of a pooled segmentation job.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Segment(#[from] SegmentError),
    #[error("worker pool has shut down")]
    WorkerUnavailable,
    #[error("segmentation job {0} panicked")]
    WorkerPanicked(u64),
}

/// Worker count used when the caller does not choose one.
pub fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}

pub struct SegmentTask {
    pub job_id: u64,
    pub grid: PixelGrid,
    pub result_sender: oneshot::Sender<Result<Segmentation, PoolError>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<SegmentTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and `worker_count` workers on the current runtime.
    pub fn new(pipeline: Arc<SegmentationPipeline>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SegmentTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<SegmentTask>())
            .unzip();

        // Dispatcher: round-robin over the workers.
        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task.result_sender.send(Err(PoolError::WorkerUnavailable));
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        for (index, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker_pipeline = Arc::clone(&pipeline);

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let SegmentTask {
                        job_id,
                        grid,
                        result_sender,
                    } = task;
                    debug!("worker {index} took job {job_id}");

                    let job_pipeline = Arc::clone(&worker_pipeline);
                    let outcome =
                        tokio::task::spawn_blocking(move || job_pipeline.run(&grid)).await;
                    let result = match outcome {
                        Ok(segmentation) => segmentation.map_err(PoolError::from),
                        Err(join_error) => {
                            warn!("job {job_id} did not complete: {join_error}");
                            Err(PoolError::WorkerPanicked(job_id))
                        }
                    };

                    let _ = result_sender.send(result);
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub async fn submit(&self, job_id: u64, grid: PixelGrid) -> Result<Segmentation, PoolError> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = SegmentTask {
            job_id,
            grid,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| PoolError::WorkerUnavailable)?;

        result_receiver.await.map_err(|_| PoolError::WorkerUnavailable)?
    }

    /// Closes the queue and waits for in-flight jobs to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Segments many independent grids concurrently.
pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    job_counter: AtomicU64,
}

impl ParallelPipeline {
    /// Must be called from inside a tokio runtime. A `worker_count` of 0 is rejected.
    pub fn new(config: SegmentConfig, worker_count: usize) -> Result<Self, SegmentError> {
        if worker_count == 0 {
            return Err(SegmentError::invalid(
                "worker_count",
                worker_count,
                "expected at least one worker",
            ));
        }
        let pipeline = Arc::new(SegmentationPipeline::new(config)?);
        Ok(Self {
            worker_pool: WorkerPool::new(pipeline, worker_count),
            job_counter: AtomicU64::new(0),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    pub async fn process(&self, grid: PixelGrid) -> Result<Segmentation, PoolError> {
        let job_id = self.job_counter.fetch_add(1, Ordering::Relaxed);
        self.worker_pool.submit(job_id, grid).await
    }

    /// Results are returned in the same order as `grids`.
    pub async fn process_batch(
        &self,
        grids: Vec<PixelGrid>,
    ) -> Vec<Result<Segmentation, PoolError>> {
        join_all(grids.into_iter().map(|grid| self.process(grid))).await
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
