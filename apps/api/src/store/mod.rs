//! Storage abstraction: one repository trait per entity.
//!
//! `AppState` carries each repository as an `Arc<dyn ...>`; production wires the
//! PostgreSQL implementations from [`postgres`], tests wire the in-memory ones.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, NewApplication, ScoreResult};
use crate::models::job::{Job, NewJob};
use crate::models::user::{NewUser, Role, RoleKind, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    Conflict,

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
            _ => RepositoryError::Database(e),
        }
    }
}

/// Which slice of the user table an admin listing wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilter {
    Candidates,
    Recruiters,
    PendingRecruiters,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Persists the self-service columns of `user` (name, contact, password,
    /// profile resume). Role and approval are left as stored.
    async fn update_profile(&self, user: &User) -> Result<User, RepositoryError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepositoryError>;
    /// Newest first.
    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, RepositoryError>;
    async fn count_by_role(&self, role: RoleKind) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: NewJob) -> Result<Job, RepositoryError>;
    async fn find(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Job>, RepositoryError>;
    /// Active postings, newest first.
    async fn list_active(&self) -> Result<Vec<Job>, RepositoryError>;
    /// Every posting owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>, RepositoryError>;
    async fn update(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
    async fn count_active(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict` when the candidate already applied to the job.
    async fn insert(&self, application: NewApplication) -> Result<Application, RepositoryError>;
    async fn find(&self, id: Uuid) -> Result<Option<Application>, RepositoryError>;
    async fn find_for(
        &self,
        job_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Ranked by similarity score, highest first.
    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, RepositoryError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, RepositoryError>;
    /// Applications still waiting for a classification, oldest first.
    async fn list_pending(&self) -> Result<Vec<Application>, RepositoryError>;
    /// Only a Pending record takes a score. `None` means the record is gone or
    /// was classified already.
    async fn record_score(
        &self,
        id: Uuid,
        result: &ScoreResult,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Notes a failed attempt on a Pending record. `None` as for `record_score`.
    async fn record_failure(
        &self,
        id: Uuid,
        message: &str,
    ) -> Result<Option<Application>, RepositoryError>;
    async fn count(&self) -> Result<i64, RepositoryError>;
    /// Application count per job id, largest first.
    async fn count_by_job(&self) -> Result<Vec<(Uuid, i64)>, RepositoryError>;
}
