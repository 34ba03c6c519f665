//! Resume submission: validate, store the file, persist a Pending record, then
//! hand the record to the configured scoring dispatch.

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::applications::dispatch::{ScoringDispatch, ScoringRun};
use crate::applications::scoring::ScoringError;
use crate::applications::uploads::StoredFile;
use crate::errors::AppError;
use crate::models::application::{Application, NewApplication};
use crate::models::job::{Job, JobStatus};
use crate::models::user::User;
use crate::state::AppState;
use crate::store::RepositoryError;

/// Raw submission fields as they arrive from the multipart form.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub job_id: Option<String>,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub use_profile_resume: bool,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Bytes,
}

#[derive(Debug)]
pub enum ResumeSource {
    Upload(UploadedFile),
    Profile,
}

#[derive(Debug)]
pub struct Submission {
    pub job_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: ResumeSource,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

impl SubmissionForm {
    pub fn validate(self) -> Result<Submission, AppError> {
        let job_id = required(self.job_id, "jobId")?;
        let job_id = Uuid::parse_str(&job_id)
            .map_err(|_| AppError::Validation("jobId is not a valid id".to_string()))?;
        let candidate_name = required(self.candidate_name, "candidateName")?;
        let email = required(self.email, "email")?.to_lowercase();

        let source = match (self.use_profile_resume, self.file) {
            (true, _) => ResumeSource::Profile,
            (false, Some(file)) => ResumeSource::Upload(file),
            (false, None) => {
                return Err(AppError::Validation(
                    "Please upload a resume or use your profile resume".to_string(),
                ))
            }
        };

        Ok(Submission {
            job_id,
            candidate_name,
            email,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            source,
        })
    }
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    Scored { application: Application, job: Job },
    ScoringFailed {
        application: Application,
        job: Job,
        error: ScoringError,
    },
    Queued { application: Application, job: Job },
}

async fn resolve_file(
    state: &AppState,
    candidate: &User,
    source: ResumeSource,
) -> Result<StoredFile, AppError> {
    match source {
        ResumeSource::Upload(file) => Ok(state.uploads.save(&file.original_name, &file.bytes).await?),
        ResumeSource::Profile => {
            let profile = candidate.resume.as_ref().ok_or_else(|| {
                AppError::Validation("No profile resume found. Please upload one.".to_string())
            })?;
            Ok(state.uploads.copy_profile(candidate.id, profile).await?)
        }
    }
}

/// Scores (or enqueues) a record that is already persisted.
async fn dispatch(
    state: &AppState,
    application: Application,
    job: Job,
) -> Result<SubmissionOutcome, AppError> {
    match &state.dispatch {
        ScoringDispatch::Inline => match state.scorer.attempt(&application, &job).await? {
            ScoringRun::Scored(application) => Ok(SubmissionOutcome::Scored { application, job }),
            ScoringRun::Failed { application, error } => Ok(SubmissionOutcome::ScoringFailed {
                application,
                job,
                error,
            }),
        },
        ScoringDispatch::Queued(queue) => {
            queue.enqueue(application.id)?;
            Ok(SubmissionOutcome::Queued { application, job })
        }
    }
}

pub async fn submit_application(
    state: &AppState,
    candidate: &User,
    submission: Submission,
) -> Result<SubmissionOutcome, AppError> {
    let job = state
        .jobs
        .find(submission.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    if job.status == JobStatus::Closed {
        return Err(AppError::Validation(
            "This job is no longer accepting applications".to_string(),
        ));
    }

    if state
        .applications
        .find_for(job.id, candidate.id)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyApplied);
    }

    let file = resolve_file(state, candidate, submission.source).await?;

    let inserted = state
        .applications
        .insert(NewApplication {
            job_id: job.id,
            user_id: candidate.id,
            candidate_name: submission.candidate_name,
            email: submission.email,
            phone: submission.phone,
            file_path: file.path.clone(),
            file_name: file.original_name.clone(),
        })
        .await;

    let application = match inserted {
        Ok(application) => application,
        Err(e) => {
            state.uploads.remove(&file.path).await;
            return Err(match e {
                RepositoryError::Conflict => AppError::AlreadyApplied,
                other => other.into(),
            });
        }
    };
    info!(
        "Application {} submitted by {} for job {}",
        application.id, candidate.id, job.id
    );

    dispatch(state, application, job).await
}

/// Re-drives scoring for an application that never got a classification.
pub async fn rescore_application(
    state: &AppState,
    actor: &User,
    application_id: Uuid,
) -> Result<SubmissionOutcome, AppError> {
    let application = state
        .applications
        .find(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    let job = state.jobs.find(application.job_id).await?;

    let allowed = match &job {
        Some(job) => job.is_managed_by(actor),
        None => actor.role.is_admin(),
    };
    if !allowed {
        return Err(AppError::Forbidden(
            "Not authorized to rescore this application".to_string(),
        ));
    }
    let job = job.ok_or_else(|| {
        AppError::Validation("The job for this application no longer exists".to_string())
    })?;
    if !application.is_pending() {
        return Err(AppError::Validation(
            "Application is already classified".to_string(),
        ));
    }

    info!("Rescoring application {} on request of {}", application.id, actor.id);
    dispatch(state, application, job).await
}
