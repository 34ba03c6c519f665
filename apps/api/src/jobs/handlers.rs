use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::Json;
use crate::models::job::{
    Job, JobDetail, JobStatus, NewJob, OwnerSummary, DEFAULT_DEPARTMENT, DEFAULT_JOB_TYPE,
    DEFAULT_PASSING_THRESHOLD,
};
use crate::models::user::User;
use crate::state::AppState;

/// Requirements arrive either as a JSON array or as one newline/comma separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequirementsInput {
    List(Vec<String>),
    Text(String),
}

impl RequirementsInput {
    pub fn into_list(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            RequirementsInput::List(items) => items,
            RequirementsInput::Text(text) => text
                .split(|c| c == '\n' || c == ',')
                .map(str::to_string)
                .collect(),
        };
        raw.into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub requirements: Option<RequirementsInput>,
    pub status: Option<JobStatus>,
    pub passing_threshold: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct DeletedJob {
    pub id: Uuid,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_threshold(threshold: i32) -> Result<i32, AppError> {
    if (0..=100).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(AppError::Validation(
            "passingThreshold must be between 0 and 100".to_string(),
        ))
    }
}

impl JobInput {
    fn into_new_job(self, owner_id: Uuid) -> Result<NewJob, AppError> {
        let title = trimmed(self.title)
            .ok_or_else(|| AppError::Validation("title is required".to_string()))?;
        let description = trimmed(self.description)
            .ok_or_else(|| AppError::Validation("description is required".to_string()))?;

        Ok(NewJob {
            owner_id,
            title,
            description,
            department: trimmed(self.department).unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
            location: trimmed(self.location).unwrap_or_default(),
            job_type: trimmed(self.job_type).unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string()),
            requirements: self
                .requirements
                .map(RequirementsInput::into_list)
                .unwrap_or_default(),
            status: self.status.unwrap_or(JobStatus::Active),
            passing_threshold: check_threshold(
                self.passing_threshold.unwrap_or(DEFAULT_PASSING_THRESHOLD),
            )?,
        })
    }

    /// Partial merge: absent fields keep their stored value.
    fn apply_to(self, job: &mut Job) -> Result<(), AppError> {
        if let Some(title) = trimmed(self.title) {
            job.title = title;
        }
        if let Some(description) = trimmed(self.description) {
            job.description = description;
        }
        if let Some(department) = trimmed(self.department) {
            job.department = department;
        }
        if let Some(location) = self.location {
            job.location = location.trim().to_string();
        }
        if let Some(job_type) = trimmed(self.job_type) {
            job.job_type = job_type;
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements.into_list();
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(threshold) = self.passing_threshold {
            job.passing_threshold = check_threshold(threshold)?;
        }
        Ok(())
    }
}

async fn load_managed(state: &AppState, id: Uuid, actor: &User) -> Result<Job, AppError> {
    let job = state
        .jobs
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    if !job.is_managed_by(actor) {
        return Err(AppError::Forbidden(
            "Not authorized to modify this job".to_string(),
        ));
    }
    Ok(job)
}

/// GET /api/jobs
pub async fn handle_list_active(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.jobs.list_active().await?))
}

/// GET /api/jobs/my-jobs
pub async fn handle_list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.jobs.list_by_owner(user.id).await?))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobDetail>, AppError> {
    let job = state
        .jobs
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    let owner = state.users.find_by_id(job.owner_id).await?;

    Ok(Json(JobDetail {
        job,
        user: owner.map(|o| OwnerSummary {
            id: o.id,
            name: o.name,
            email: o.email,
        }),
    }))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Json(input): Json<JobInput>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    if !user.role.is_reviewer() {
        return Err(AppError::Forbidden(
            "Only recruiters and admins can post jobs".to_string(),
        ));
    }

    let job = state.jobs.insert(input.into_new_job(user.id)?).await?;
    info!("Job {} created by {}", job.id, user.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
    Json(input): Json<JobInput>,
) -> Result<Json<Job>, AppError> {
    let mut job = load_managed(&state, id, &user).await?;
    input.apply_to(&mut job)?;
    Ok(Json(state.jobs.update(&job).await?))
}

/// DELETE /api/jobs/:id
///
/// Applications keep their job id and read as orphans afterwards.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedJob>, AppError> {
    load_managed(&state, id, &user).await?;
    if !state.jobs.delete(id).await? {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    info!("Job {id} deleted by {}", user.id);
    Ok(Json(DeletedJob { id }))
}
