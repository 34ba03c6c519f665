use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::application::{
    Application, Classification, NewApplication, ParsedData, ScoreResult,
};
use crate::models::job::{Job, JobStatus, NewJob};
use crate::models::user::{NewUser, Role, RoleKind, User};
use crate::store::{
    ApplicationRepository, JobRepository, RepositoryError, UserFilter, UserRepository,
};

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<T: Clone>(items: &[T], created: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by_key(|item| std::cmp::Reverse(created(item)));
    out
}

#[derive(Default, Clone)]
pub struct MemoryUsers {
    records: Arc<Mutex<Vec<User>>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut guard = self.records.lock().expect("user store poisoned");
        if guard.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        let now = Utc::now();
        let stored = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            resume: None,
            created_at: now,
            updated_at: now,
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let guard = self.records.lock().expect("user store poisoned");
        Ok(guard.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let guard = self.records.lock().expect("user store poisoned");
        Ok(guard.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, user: &User) -> Result<User, RepositoryError> {
        let mut guard = self.records.lock().expect("user store poisoned");
        if guard.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(RepositoryError::Conflict);
        }
        let slot = guard
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| RepositoryError::Corrupt(format!("user {} vanished", user.id)))?;
        slot.name = user.name.clone();
        slot.email = user.email.clone();
        slot.phone = user.phone.clone();
        slot.password_hash = user.password_hash.clone();
        slot.resume = user.resume.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepositoryError> {
        let mut guard = self.records.lock().expect("user store poisoned");
        Ok(guard.iter_mut().find(|u| u.id == id).map(|slot| {
            slot.role = role;
            slot.updated_at = Utc::now();
            slot.clone()
        }))
    }

    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, RepositoryError> {
        let guard = self.records.lock().expect("user store poisoned");
        let matching: Vec<User> = guard
            .iter()
            .filter(|u| match filter {
                UserFilter::Candidates => u.role.kind() == RoleKind::Candidate,
                UserFilter::Recruiters => u.role.kind() == RoleKind::Recruiter,
                UserFilter::PendingRecruiters => u.role.is_pending(),
            })
            .cloned()
            .collect();
        Ok(newest_first(&matching, |u| u.created_at))
    }

    async fn count_by_role(&self, role: RoleKind) -> Result<i64, RepositoryError> {
        let guard = self.records.lock().expect("user store poisoned");
        Ok(guard.iter().filter(|u| u.role.kind() == role).count() as i64)
    }
}

#[derive(Default, Clone)]
pub struct MemoryJobs {
    records: Arc<Mutex<Vec<Job>>>,
}

#[async_trait]
impl JobRepository for MemoryJobs {
    async fn insert(&self, job: NewJob) -> Result<Job, RepositoryError> {
        let now = Utc::now();
        let stored = Job {
            id: Uuid::new_v4(),
            owner_id: job.owner_id,
            title: job.title,
            description: job.description,
            department: job.department,
            location: job.location,
            job_type: job.job_type,
            requirements: job.requirements,
            status: job.status,
            passing_threshold: job.passing_threshold,
            created_at: now,
            updated_at: now,
        };
        self.records
            .lock()
            .expect("job store poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        let guard = self.records.lock().expect("job store poisoned");
        Ok(guard.iter().find(|j| j.id == id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("job store poisoned");
        Ok(guard.iter().filter(|j| ids.contains(&j.id)).cloned().collect())
    }

    async fn list_active(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("job store poisoned");
        let active: Vec<Job> = guard
            .iter()
            .filter(|j| j.status == JobStatus::Active)
            .cloned()
            .collect();
        Ok(newest_first(&active, |j| j.created_at))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("job store poisoned");
        let owned: Vec<Job> = guard
            .iter()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |j| j.created_at))
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let mut guard = self.records.lock().expect("job store poisoned");
        let slot = guard
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| RepositoryError::Corrupt(format!("job {} vanished", job.id)))?;
        *slot = Job {
            updated_at: Utc::now(),
            ..job.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut guard = self.records.lock().expect("job store poisoned");
        let before = guard.len();
        guard.retain(|j| j.id != id);
        Ok(guard.len() < before)
    }

    async fn count_active(&self) -> Result<i64, RepositoryError> {
        let guard = self.records.lock().expect("job store poisoned");
        Ok(guard.iter().filter(|j| j.status == JobStatus::Active).count() as i64)
    }
}

#[derive(Default, Clone)]
pub struct MemoryApplications {
    records: Arc<Mutex<Vec<Application>>>,
}

impl MemoryApplications {
    /// Applies `f` to a Pending record only.
    fn modify_pending<F>(&self, id: Uuid, f: F) -> Option<Application>
    where
        F: FnOnce(&mut Application),
    {
        let mut guard = self.records.lock().expect("application store poisoned");
        let slot = guard.iter_mut().find(|a| a.id == id && a.is_pending())?;
        f(slot);
        slot.updated_at = Utc::now();
        Some(slot.clone())
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplications {
    async fn insert(&self, application: NewApplication) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("application store poisoned");
        if guard
            .iter()
            .any(|a| a.job_id == application.job_id && a.user_id == application.user_id)
        {
            return Err(RepositoryError::Conflict);
        }
        let now = Utc::now();
        let stored = Application {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            user_id: application.user_id,
            candidate_name: application.candidate_name,
            email: application.email,
            phone: application.phone,
            file_path: application.file_path,
            file_name: application.file_name,
            parsed_data: ParsedData::default(),
            similarity_score: 0.0,
            classification: Classification::Pending,
            scoring_error: None,
            created_at: now,
            updated_at: now,
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        Ok(guard.iter().find(|a| a.id == id).cloned())
    }

    async fn find_for(
        &self,
        job_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        Ok(guard
            .iter()
            .find(|a| a.job_id == job_id && a.user_id == user_id)
            .cloned())
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        let mut ranked: Vec<Application> =
            guard.iter().filter(|a| a.job_id == job_id).cloned().collect();
        ranked.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        Ok(ranked)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        let mine: Vec<Application> = guard
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(&mine, |a| a.created_at))
    }

    async fn list_pending(&self) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        Ok(guard.iter().filter(|a| a.is_pending()).cloned().collect())
    }

    async fn record_score(
        &self,
        id: Uuid,
        result: &ScoreResult,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.modify_pending(id, |a| {
            a.parsed_data = result.parsed_data.clone();
            a.similarity_score = result.score;
            a.classification = result.classification;
            a.scoring_error = None;
        }))
    }

    async fn record_failure(
        &self,
        id: Uuid,
        message: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.modify_pending(id, |a| a.scoring_error = Some(message.to_string())))
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.records.lock().expect("application store poisoned").len() as i64)
    }

    async fn count_by_job(&self) -> Result<Vec<(Uuid, i64)>, RepositoryError> {
        let guard = self.records.lock().expect("application store poisoned");
        let mut order: Vec<Uuid> = Vec::new();
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for application in guard.iter() {
            let count = counts.entry(application.job_id).or_insert_with(|| {
                order.push(application.job_id);
                0
            });
            *count += 1;
        }
        let mut grouped: Vec<(Uuid, i64)> = order.into_iter().map(|id| (id, counts[&id])).collect();
        grouped.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(grouped)
    }
}
