//! Runs scoring for stored applications, either inside the request or on a
//! background worker fed by an in-process queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::applications::scoring::{ScoreRequest, ScoringEngine, ScoringError};
use crate::applications::uploads::UploadStore;
use crate::errors::AppError;
use crate::models::application::{Application, ScoreResult};
use crate::models::job::Job;
use crate::store::{ApplicationRepository, JobRepository};

const QUEUE_CAPACITY: usize = 256;
const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);

/// Result of one scoring attempt. The record has been updated either way.
#[derive(Debug)]
pub enum ScoringRun {
    Scored(Application),
    Failed {
        application: Application,
        error: ScoringError,
    },
}

/// Delay before retry number `attempt` (1-based): base, 2 x base, 4 x base, ...
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(2)))
}

#[derive(Clone)]
pub struct Scorer {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    engine: Arc<dyn ScoringEngine>,
    uploads: UploadStore,
    timeout: Duration,
    max_attempts: u32,
    retry_base: Duration,
}

impl Scorer {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        engine: Arc<dyn ScoringEngine>,
        uploads: UploadStore,
        timeout: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            applications,
            jobs,
            engine,
            uploads,
            timeout,
            max_attempts: max_attempts.max(1),
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    async fn call_engine(
        &self,
        application: &Application,
        job: &Job,
    ) -> Result<ScoreResult, ScoringError> {
        let path = self
            .uploads
            .absolute(&application.file_path)
            .await
            .map_err(|e| ScoringError::Input(e.to_string()))?;
        let request = ScoreRequest {
            file_path: path.to_string_lossy().into_owned(),
            requirements: job.requirements.clone(),
        };

        tokio::time::timeout(self.timeout, self.engine.score(&request))
            .await
            .map_err(|_| ScoringError::Timeout(self.timeout))?
    }

    /// One scoring call bounded by the configured timeout, with the outcome persisted.
    pub async fn attempt(&self, application: &Application, job: &Job) -> Result<ScoringRun, AppError> {
        match self.call_engine(application, job).await {
            Ok(result) => {
                let Some(scored) = self
                    .applications
                    .record_score(application.id, &result)
                    .await?
                else {
                    return self.settled(application.id).await;
                };
                info!(
                    "Application {} scored {} ({})",
                    scored.id,
                    scored.similarity_score,
                    scored.classification.as_str()
                );
                Ok(ScoringRun::Scored(scored))
            }
            Err(error) => {
                warn!("Scoring application {} failed: {error}", application.id);
                match self
                    .applications
                    .record_failure(application.id, &error.to_string())
                    .await?
                {
                    Some(updated) => Ok(ScoringRun::Failed {
                        application: updated,
                        error,
                    }),
                    None => self.settled(application.id).await,
                }
            }
        }
    }

    /// A guarded write matched nothing: another attempt classified the record first.
    async fn settled(&self, application_id: Uuid) -> Result<ScoringRun, AppError> {
        let stored = self
            .applications
            .find(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
        info!(
            "Application {} already classified, keeping {}",
            stored.id,
            stored.classification.as_str()
        );
        Ok(ScoringRun::Scored(stored))
    }

    /// Background path: reloads the record and retries transient failures
    /// with exponential backoff.
    pub async fn run_task(&self, application_id: Uuid) -> Result<(), AppError> {
        let Some(application) = self.applications.find(application_id).await? else {
            warn!("Scoring task for unknown application {application_id} dropped");
            return Ok(());
        };
        if !application.is_pending() {
            return Ok(());
        }
        let Some(job) = self.jobs.find(application.job_id).await? else {
            self.applications
                .record_failure(application.id, "job no longer exists")
                .await?;
            return Ok(());
        };

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = backoff(self.retry_base, attempt);
                warn!(
                    "Retrying application {} in {}ms (attempt {attempt}/{})",
                    application.id,
                    delay.as_millis(),
                    self.max_attempts
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&application, &job).await? {
                ScoringRun::Scored(_) => return Ok(()),
                ScoringRun::Failed { error, .. } if error.is_retryable() => continue,
                ScoringRun::Failed { .. } => break,
            }
        }

        warn!("Application {} left pending", application.id);
        Ok(())
    }
}

/// Producer side of the scoring queue.
#[derive(Clone)]
pub struct ScoringQueue {
    sender: mpsc::Sender<Uuid>,
}

impl ScoringQueue {
    /// Spawns the worker. It exits once every queue handle is dropped.
    pub fn start(scorer: Scorer) -> (Self, JoinHandle<()>) {
        Self::with_capacity(scorer, QUEUE_CAPACITY)
    }

    pub fn with_capacity(scorer: Scorer, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Uuid>(capacity);
        let worker = tokio::spawn(async move {
            while let Some(id) = receiver.recv().await {
                if let Err(e) = scorer.run_task(id).await {
                    error!("Scoring task {id} aborted: {e}");
                }
            }
            info!("Scoring worker stopped");
        });
        (Self { sender }, worker)
    }

    /// Hands the record to the worker without waiting. Returns `false` when the
    /// queue is full; the record then stays Pending until the next re-drive.
    pub fn enqueue(&self, application_id: Uuid) -> Result<bool, AppError> {
        match self.sender.try_send(application_id) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                warn!("Scoring queue full, application {application_id} left pending");
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => {
                Err(AppError::Internal(anyhow::anyhow!("scoring queue is closed")))
            }
        }
    }

    /// Re-drives applications still pending, e.g. after a restart. Stops at the
    /// first full queue and returns how many were queued.
    pub async fn requeue_pending(
        &self,
        applications: &dyn ApplicationRepository,
    ) -> Result<usize, AppError> {
        let pending = applications.list_pending().await?;
        let mut queued = 0;
        for application in &pending {
            if !self.enqueue(application.id)? {
                break;
            }
            queued += 1;
        }
        if !pending.is_empty() {
            info!("Re-queued {queued} of {} pending applications", pending.len());
        }
        Ok(queued)
    }
}

/// How submissions get scored.
#[derive(Clone)]
pub enum ScoringDispatch {
    Inline,
    Queued(ScoringQueue),
}
