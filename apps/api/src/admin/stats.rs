use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::Job;
use crate::models::user::RoleKind;
use crate::store::{ApplicationRepository, JobRepository, UserRepository};

pub const CHART_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    pub job_id: Uuid,
    pub name: String,
    pub applications: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub candidates: i64,
    pub recruiters: i64,
    /// Active postings only.
    pub jobs: i64,
    pub applications: i64,
    pub chart_data: Vec<ChartEntry>,
}

/// Most-applied active jobs. `counts` must already be sorted descending.
pub fn top_jobs(counts: &[(Uuid, i64)], active: &[Job], limit: usize) -> Vec<ChartEntry> {
    let titles: HashMap<Uuid, &str> = active.iter().map(|j| (j.id, j.title.as_str())).collect();
    counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .filter_map(|(id, n)| {
            titles.get(id).map(|title| ChartEntry {
                job_id: *id,
                name: (*title).to_string(),
                applications: *n,
            })
        })
        .take(limit)
        .collect()
}

/// Point-in-time counts, computed on every call.
pub async fn compute_stats(
    users: &dyn UserRepository,
    jobs: &dyn JobRepository,
    applications: &dyn ApplicationRepository,
) -> Result<Stats, AppError> {
    let active = jobs.list_active().await?;
    let counts = applications.count_by_job().await?;

    Ok(Stats {
        candidates: users.count_by_role(RoleKind::Candidate).await?,
        recruiters: users.count_by_role(RoleKind::Recruiter).await?,
        jobs: jobs.count_active().await?,
        applications: applications.count().await?,
        chart_data: top_jobs(&counts, &active, CHART_LIMIT),
    })
}
