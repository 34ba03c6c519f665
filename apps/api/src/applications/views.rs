//! Read-side projections. Pass/fail is derived here on every read and never stored.

use std::collections::HashMap;

use serde::Serialize;

use crate::applications::uploads::public_url;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::job::{Job, JobSummary, DEFAULT_PASSING_THRESHOLD};
use crate::store::JobRepository;

/// Who is looking decides the label for a failing score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Reviewer,
    Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Shortlist {
    Shortlisted,
    Rejected,
    Reviewed,
}

/// Threshold of the job, or the default once the job is gone.
pub fn threshold_for(job: Option<&Job>) -> i32 {
    job.map(|j| j.passing_threshold)
        .unwrap_or(DEFAULT_PASSING_THRESHOLD)
}

pub fn is_passed(score: f64, job: Option<&Job>) -> bool {
    score >= f64::from(threshold_for(job))
}

pub fn shortlist(passed: bool, viewer: Viewer) -> Shortlist {
    match (passed, viewer) {
        (true, _) => Shortlist::Shortlisted,
        (false, Viewer::Reviewer) => Shortlist::Rejected,
        (false, Viewer::Candidate) => Shortlist::Reviewed,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
    pub passed: bool,
    pub shortlist: Shortlist,
    pub file_url: String,
}

impl ApplicationView {
    pub fn new(application: Application, job: Option<&Job>, viewer: Viewer) -> Self {
        let passed = is_passed(application.similarity_score, job);
        let file_url = public_url(&application.file_path);
        Self {
            job: job.map(JobSummary::from),
            passed,
            shortlist: shortlist(passed, viewer),
            file_url,
            application,
        }
    }
}

/// Projects a batch, loading every referenced job in one query.
pub async fn project_all(
    jobs: &dyn JobRepository,
    applications: Vec<Application>,
    viewer: Viewer,
) -> Result<Vec<ApplicationView>, AppError> {
    let mut ids: Vec<_> = applications.iter().map(|a| a.job_id).collect();
    ids.sort();
    ids.dedup();
    let by_id: HashMap<_, Job> = jobs
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|j| (j.id, j))
        .collect();

    Ok(applications
        .into_iter()
        .map(|a| {
            let job = by_id.get(&a.job_id);
            ApplicationView::new(a, job, viewer)
        })
        .collect())
}
