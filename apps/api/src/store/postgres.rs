use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::application::{
    Application, ApplicationRow, Classification, NewApplication, ParsedData, ScoreResult,
};
use crate::models::job::{Job, JobRow, NewJob};
use crate::models::user::{NewUser, Role, RoleKind, User, UserRow};
use crate::store::{
    ApplicationRepository, JobRepository, RepositoryError, UserFilter, UserRepository,
};

fn convert<R, T>(row: R) -> Result<T, RepositoryError>
where
    T: TryFrom<R, Error = String>,
{
    T::try_from(row).map_err(RepositoryError::Corrupt)
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter().map(convert).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, role, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.kind().as_str())
        .bind(user.role.is_approved())
        .fetch_one(&self.pool)
        .await?;
        convert(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(convert)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(convert)
            .transpose()
    }

    async fn update_profile(&self, user: &User) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = $2, email = $3, phone = $4, password_hash = $5,
                resume_path = $6, resume_original_name = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.resume.as_ref().map(|r| r.path.as_str()))
        .bind(user.resume.as_ref().map(|r| r.original_name.as_str()))
        .fetch_one(&self.pool)
        .await?;
        convert(row)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET role = $2, is_approved = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role.kind().as_str())
        .bind(role.is_approved())
        .fetch_optional(&self.pool)
        .await?
        .map(convert)
        .transpose()
    }

    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, RepositoryError> {
        let sql = match filter {
            UserFilter::Candidates => {
                "SELECT * FROM users WHERE role = 'candidate' ORDER BY created_at DESC"
            }
            UserFilter::Recruiters => {
                "SELECT * FROM users WHERE role = 'recruiter' ORDER BY created_at DESC"
            }
            UserFilter::PendingRecruiters => {
                "SELECT * FROM users WHERE role = 'recruiter' AND NOT is_approved ORDER BY created_at DESC"
            }
        };
        let rows = sqlx::query_as::<_, UserRow>(sql)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn count_by_role(&self, role: RoleKind) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
                .bind(role.as_str())
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert(&self, job: NewJob) -> Result<Job, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, owner_id, title, description, department, location, job_type,
                 requirements, status, passing_threshold)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.owner_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.department)
        .bind(&job.location)
        .bind(&job.job_type)
        .bind(&job.requirements)
        .bind(job.status.as_str())
        .bind(job.passing_threshold)
        .fetch_one(&self.pool)
        .await?;
        convert(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(convert)
            .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Job>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn list_active(&self) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE status = 'active' ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET title = $2, description = $3, department = $4, location = $5,
                job_type = $6, requirements = $7, status = $8, passing_threshold = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.department)
        .bind(&job.location)
        .bind(&job.job_type)
        .bind(&job.requirements)
        .bind(job.status.as_str())
        .bind(job.passing_threshold)
        .fetch_one(&self.pool)
        .await?;
        convert(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_active(&self) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Applications
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn insert(&self, application: NewApplication) -> Result<Application, RepositoryError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications
                (id, job_id, user_id, candidate_name, email, phone, file_path, file_name,
                 parsed_data, similarity_score, classification)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application.job_id)
        .bind(application.user_id)
        .bind(&application.candidate_name)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.file_path)
        .bind(&application.file_name)
        .bind(Json(ParsedData::default()))
        .bind(Classification::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        convert(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Application>, RepositoryError> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(convert)
            .transpose()
    }

    async fn find_for(
        &self,
        job_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Application>, RepositoryError> {
        sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE job_id = $1 AND user_id = $2",
        )
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(convert)
        .transpose()
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, RepositoryError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY similarity_score DESC, created_at ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, RepositoryError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_pending(&self) -> Result<Vec<Application>, RepositoryError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE classification = 'Pending' ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn record_score(
        &self,
        id: Uuid,
        result: &ScoreResult,
    ) -> Result<Option<Application>, RepositoryError> {
        sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET parsed_data = $2, similarity_score = $3, classification = $4,
                scoring_error = NULL, updated_at = NOW()
            WHERE id = $1 AND classification = 'Pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(&result.parsed_data))
        .bind(result.score)
        .bind(result.classification.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(convert)
        .transpose()
    }

    async fn record_failure(
        &self,
        id: Uuid,
        message: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET scoring_error = $2, updated_at = NOW()
            WHERE id = $1 AND classification = 'Pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await?
        .map(convert)
        .transpose()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_by_job(&self) -> Result<Vec<(Uuid, i64)>, RepositoryError> {
        Ok(sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT job_id, COUNT(*) AS applications FROM applications GROUP BY job_id ORDER BY applications DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
