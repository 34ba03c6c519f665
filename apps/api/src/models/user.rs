use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Recruiter approval state. Candidates and admins never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Pending,
    Approved,
}

/// Single source of truth for what an account may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Candidate,
    Recruiter(Approval),
    Admin,
}

/// Role name as it appears on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Candidate,
    Recruiter,
    Admin,
}

impl RoleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::Candidate => "candidate",
            RoleKind::Recruiter => "recruiter",
            RoleKind::Admin => "admin",
        }
    }
}

impl Role {
    /// Initial role for a freshly created account. Recruiters wait for an admin.
    pub fn initial(kind: RoleKind) -> Self {
        match kind {
            RoleKind::Candidate => Role::Candidate,
            RoleKind::Recruiter => Role::Recruiter(Approval::Pending),
            RoleKind::Admin => Role::Admin,
        }
    }

    /// Rebuilds the role from its stored columns.
    pub fn from_columns(role: &str, is_approved: bool) -> Option<Self> {
        match role {
            "candidate" => Some(Role::Candidate),
            "admin" => Some(Role::Admin),
            "recruiter" if is_approved => Some(Role::Recruiter(Approval::Approved)),
            "recruiter" => Some(Role::Recruiter(Approval::Pending)),
            _ => None,
        }
    }

    pub fn kind(self) -> RoleKind {
        match self {
            Role::Candidate => RoleKind::Candidate,
            Role::Recruiter(_) => RoleKind::Recruiter,
            Role::Admin => RoleKind::Admin,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_approved(self) -> bool {
        !self.is_pending()
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Role::Recruiter(Approval::Pending))
    }

    /// Recruiters (approved) and admins review applicants and manage postings.
    pub fn is_reviewer(self) -> bool {
        matches!(self, Role::Recruiter(Approval::Approved) | Role::Admin)
    }
}

/// A stored profile resume: on-disk path plus the name the candidate uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResume {
    pub path: String,
    pub original_name: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub resume: Option<ProfileResume>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub is_approved: bool,
    pub resume_path: Option<String>,
    pub resume_original_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_columns(&row.role, row.is_approved)
            .ok_or_else(|| format!("user {} has unknown role '{}'", row.id, row.role))?;
        let resume = row.resume_path.map(|path| ProfileResume {
            original_name: row.resume_original_name.unwrap_or_else(|| path.clone()),
            path,
        });
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role,
            resume,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Public projection of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: RoleKind,
    pub is_admin: bool,
    pub is_approved: bool,
    pub resume: Option<String>,
    pub resume_original_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role.kind(),
            is_admin: user.role.is_admin(),
            is_approved: user.role.is_approved(),
            resume: user.resume.as_ref().map(|r| r.path.clone()),
            resume_original_name: user.resume.as_ref().map(|r| r.original_name.clone()),
            created_at: user.created_at,
        }
    }
}
