//! Case records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status assigned to a case when the caller does not supply one.
pub const DEFAULT_STATUS: &str = "Active";

/// Unique identifier for a case, assigned by the store on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(i64);

impl CaseId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A legal matter owning zero or more documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: CaseId,
    pub case_name: String,
    pub client_name: String,
    pub status: String,
    pub date_opened: DateTime<Utc>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a case.
///
/// Only the case and client names are required; status falls back to
/// [`DEFAULT_STATUS`] and the opening date to the creation instant.
#[derive(Debug, Clone, Default)]
pub struct NewCase {
    pub case_name: String,
    pub client_name: String,
    pub status: Option<String>,
    pub date_opened: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl NewCase {
    pub fn new(case_name: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            case_name: case_name.into(),
            client_name: client_name.into(),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_date_opened(mut self, opened: DateTime<Utc>) -> Self {
        self.date_opened = Some(opened);
        self
    }
}

/// Partial update of a case. `None` leaves a field untouched.
///
/// `summary` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct CaseUpdate {
    pub case_name: Option<String>,
    pub client_name: Option<String>,
    pub status: Option<String>,
    pub summary: Option<Option<String>>,
}

impl CaseUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = Some(name.into());
        self
    }

    pub fn with_client_name(mut self, client: impl Into<String>) -> Self {
        self.client_name = Some(client.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.case_name.is_none()
            && self.client_name.is_none()
            && self.status.is_none()
            && self.summary.is_none()
    }
}
