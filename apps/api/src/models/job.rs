use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::User;

pub const DEFAULT_PASSING_THRESHOLD: i32 = 60;
pub const DEFAULT_DEPARTMENT: &str = "General";
pub const DEFAULT_JOB_TYPE: &str = "Full-time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Closed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(JobStatus::Active),
            "closed" => Some(JobStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub department: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub requirements: Vec<String>,
    pub status: JobStatus,
    pub passing_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Only the owner or an admin may change or remove a posting.
    pub fn is_managed_by(&self, user: &User) -> bool {
        self.owner_id == user.id || user.role.is_admin()
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub department: String,
    pub location: String,
    pub job_type: String,
    pub requirements: Vec<String>,
    pub status: JobStatus,
    pub passing_threshold: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub department: String,
    pub location: String,
    pub job_type: String,
    pub requirements: Vec<String>,
    pub status: String,
    pub passing_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = String;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status)
            .ok_or_else(|| format!("job {} has unknown status '{}'", row.id, row.status))?;
        Ok(Job {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            department: row.department,
            location: row.location,
            job_type: row.job_type,
            requirements: row.requirements,
            status,
            passing_threshold: row.passing_threshold,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Owner fields attached to a single-job read.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub user: Option<OwnerSummary>,
}

/// Job fields embedded in application reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub location: String,
    pub status: JobStatus,
    pub passing_threshold: i32,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        JobSummary {
            id: job.id,
            title: job.title.clone(),
            department: job.department.clone(),
            location: job.location.clone(),
            status: job.status,
            passing_threshold: job.passing_threshold,
        }
    }
}
