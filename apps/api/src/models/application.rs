use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Categorical verdict returned by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Highly Suitable")]
    HighlySuitable,
    #[serde(rename = "Moderately Suitable")]
    ModeratelySuitable,
    #[serde(rename = "Not Suitable")]
    NotSuitable,
    #[serde(rename = "Pending")]
    Pending,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::HighlySuitable => "Highly Suitable",
            Classification::ModeratelySuitable => "Moderately Suitable",
            Classification::NotSuitable => "Not Suitable",
            Classification::Pending => "Pending",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Highly Suitable" => Some(Classification::HighlySuitable),
            "Moderately Suitable" => Some(Classification::ModeratelySuitable),
            "Not Suitable" => Some(Classification::NotSuitable),
            "Pending" => Some(Classification::Pending),
            _ => None,
        }
    }
}

/// Structured output of resume parsing. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of one successful scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    #[serde(default)]
    pub parsed_data: ParsedData,
    pub score: f64,
    pub classification: Classification,
}

/// One candidate's submission against one job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub parsed_data: ParsedData,
    pub similarity_score: f64,
    pub classification: Classification,
    pub scoring_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn is_pending(&self) -> bool {
        self.classification == Classification::Pending
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub file_path: String,
    pub file_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub parsed_data: Json<ParsedData>,
    pub similarity_score: f64,
    pub classification: String,
    pub scoring_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = String;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let classification = Classification::parse(&row.classification).ok_or_else(|| {
            format!(
                "application {} has unknown classification '{}'",
                row.id, row.classification
            )
        })?;
        Ok(Application {
            id: row.id,
            job_id: row.job_id,
            user_id: row.user_id,
            candidate_name: row.candidate_name,
            email: row.email,
            phone: row.phone,
            file_path: row.file_path,
            file_name: row.file_name,
            parsed_data: row.parsed_data.0,
            similarity_score: row.similarity_score,
            classification,
            scoring_error: row.scoring_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
