use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::applications::views::{project_all, ApplicationView, Viewer};
use crate::applications::workflow::{
    rescore_application, submit_application, SubmissionForm, SubmissionOutcome, UploadedFile,
};
use crate::auth::handlers::{auth_response, AuthResponse};
use crate::errors::AppError;
use crate::models::user::{ProfileResume, Role, User};
use crate::state::AppState;

/// Submission response. `mlError`/`mlStatus` appear only when scoring failed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub view: ApplicationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_status: Option<u16>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCheck {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<Uuid>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

async fn field_file(field: Field<'_>) -> Result<Option<UploadedFile>, AppError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    if original_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        original_name,
        bytes,
    }))
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => form.file = field_file(field).await?,
            "jobId" => form.job_id = Some(field_text(field).await?),
            "candidateName" => form.candidate_name = Some(field_text(field).await?),
            "email" => form.email = Some(field_text(field).await?),
            "phone" => form.phone = Some(field_text(field).await?),
            "useProfileResume" => {
                form.use_profile_resume = field_text(field).await?.trim() == "true";
            }
            _ => {}
        }
    }
    Ok(form)
}

fn outcome_response(outcome: SubmissionOutcome, scored_status: StatusCode) -> Response {
    match outcome {
        SubmissionOutcome::Scored { application, job } => {
            let view = ApplicationView::new(application, Some(&job), Viewer::Candidate);
            (scored_status, Json(view)).into_response()
        }
        SubmissionOutcome::ScoringFailed {
            application,
            job,
            error,
        } => {
            let body = SubmissionResponse {
                view: ApplicationView::new(application, Some(&job), Viewer::Candidate),
                ml_error: Some(format!("Resume saved but scoring failed: {error}")),
                ml_status: error.status(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        SubmissionOutcome::Queued { application, job } => {
            let view = ApplicationView::new(application, Some(&job), Viewer::Candidate);
            (StatusCode::ACCEPTED, Json(view)).into_response()
        }
    }
}

/// POST /api/resumes/upload
pub async fn handle_submit(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    if user.role != Role::Candidate {
        return Err(AppError::Forbidden(
            "Only candidates can apply to jobs".to_string(),
        ));
    }
    let submission = read_submission(multipart).await?.validate()?;
    let outcome = submit_application(&state, &user, submission).await?;
    Ok(outcome_response(outcome, StatusCode::CREATED))
}

/// POST /api/resumes/:id/rescore
pub async fn handle_rescore(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = rescore_application(&state, &user, id).await?;
    Ok(outcome_response(outcome, StatusCode::OK))
}

/// POST /api/resumes/profile
pub async fn handle_upload_profile(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    mut multipart: Multipart,
) -> Result<Json<AuthResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("resume") {
            upload = field_file(field).await?;
        }
    }
    let upload =
        upload.ok_or_else(|| AppError::Validation("Please upload a resume file".to_string()))?;

    let stored = state
        .uploads
        .save(&upload.original_name, &upload.bytes)
        .await?;

    let mut updated = (*user).clone();
    let previous = updated.resume.replace(ProfileResume {
        path: stored.path.clone(),
        original_name: stored.original_name,
    });
    let updated = match state.users.update_profile(&updated).await {
        Ok(u) => u,
        Err(e) => {
            state.uploads.remove(&stored.path).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous {
        state.uploads.remove(&previous.path).await;
    }
    info!("Profile resume updated for {}", updated.id);

    Ok(Json(auth_response(&state, &updated)?))
}

/// DELETE /api/resumes/profile
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<Value>, AppError> {
    let mut updated = (*user).clone();
    if let Some(previous) = updated.resume.take() {
        state.users.update_profile(&updated).await?;
        state.uploads.remove(&previous.path).await;
    }
    Ok(Json(json!({ "message": "Profile resume deleted" })))
}

/// GET /api/resumes/my-resumes
pub async fn handle_my_resumes(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<Vec<ApplicationView>>, AppError> {
    let mine = state.applications.list_for_user(user.id).await?;
    Ok(Json(
        project_all(state.jobs.as_ref(), mine, Viewer::Candidate).await?,
    ))
}

/// GET /api/resumes/check/:jobId
pub async fn handle_check(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApplicationCheck>, AppError> {
    let existing = state.applications.find_for(job_id, user.id).await?;
    Ok(Json(ApplicationCheck {
        applied: existing.is_some(),
        resume_id: existing.map(|a| a.id),
    }))
}

/// GET /api/resumes/job/:jobId
pub async fn handle_list_for_job(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationView>>, AppError> {
    let job = state
        .jobs
        .find(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    if !job.is_managed_by(&user) {
        return Err(AppError::Forbidden(
            "Not authorized to view applicants for this job".to_string(),
        ));
    }

    let ranked = state.applications.list_for_job(job.id).await?;
    Ok(Json(
        ranked
            .into_iter()
            .map(|a| ApplicationView::new(a, Some(&job), Viewer::Reviewer))
            .collect(),
    ))
}

/// GET /api/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationView>, AppError> {
    let application = state
        .applications
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

    let viewer = if user.role.is_reviewer() {
        Viewer::Reviewer
    } else if application.user_id == user.id {
        Viewer::Candidate
    } else {
        return Err(AppError::Forbidden(
            "Not authorized to view this resume".to_string(),
        ));
    };

    let job = state.jobs.find(application.job_id).await?;
    Ok(Json(ApplicationView::new(application, job.as_ref(), viewer)))
}
