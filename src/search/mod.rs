//! Read-only filtered views over the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{
    DocType, Document, DocumentKind, DocumentStatus, GeneratedDocument, RfpDocument,
};
use crate::error::{Result, VellumError};
use crate::storage::DocumentStore;

/// Filter applied by [`QueryService::search`]. Empty fields match everything.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive substring of the project name
    #[serde(default)]
    pub project_name_contains: Option<String>,
    /// Exact lifecycle status. RFPs carry no status and never match.
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    /// Exact document type. RFPs never match.
    #[serde(default)]
    pub doc_type: Option<DocType>,
    /// Saved (or uploaded) at or after this instant
    #[serde(default)]
    pub saved_after: Option<DateTime<Utc>>,
    /// Saved (or uploaded) before this instant
    #[serde(default)]
    pub saved_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(needle: &str) -> Self {
        Self {
            project_name_contains: Some(needle.to_string()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if filter has any constraints.
    pub fn is_empty(&self) -> bool {
        self.project_name_contains
            .as_deref()
            .map_or(true, |p| p.trim().is_empty())
            && self.status.is_none()
            && self.doc_type.is_none()
            && self.saved_after.is_none()
            && self.saved_before.is_none()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(ref needle) = self.project_name_contains {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() && !doc.project_name().to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if doc.status() != Some(status) {
                return false;
            }
        }

        let (doc_type, timestamp) = match doc {
            Document::Rfp(r) => (None, r.uploaded_at),
            Document::Generated(g) => (Some(g.doc_type), g.saved_at),
        };

        if let Some(wanted) = self.doc_type {
            if doc_type != Some(wanted) {
                return false;
            }
        }
        if self.saved_after.is_some_and(|after| timestamp < after) {
            return false;
        }
        if self.saved_before.is_some_and(|before| timestamp >= before) {
            return false;
        }

        true
    }
}

/// Every document belonging to one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDocuments {
    pub project_name: String,
    pub rfps: Vec<RfpDocument>,
    pub generated: Vec<GeneratedDocument>,
}

impl ProjectDocuments {
    pub fn is_empty(&self) -> bool {
        self.rfps.is_empty() && self.generated.is_empty()
    }
}

/// Document counts for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_name: String,
    pub rfps: usize,
    pub generated: usize,
    pub finalized: usize,
}

/// Queries always read the live store; nothing is cached.
pub struct QueryService<'a> {
    store: &'a DocumentStore,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Documents of one kind matching `filter`, in insertion order.
    pub fn search(&self, kind: DocumentKind, filter: &SearchFilter) -> Result<Vec<Document>> {
        let documents = self.store.list(kind)?;
        if filter.is_empty() {
            return Ok(documents);
        }
        Ok(documents
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect())
    }

    /// Group every document whose project name equals `project_name`,
    /// ignoring case and surrounding whitespace.
    pub fn by_project(&self, project_name: &str) -> Result<ProjectDocuments> {
        let wanted = project_name.trim().to_lowercase();
        let same_project = |name: &str| name.trim().to_lowercase() == wanted;

        Ok(ProjectDocuments {
            project_name: project_name.trim().to_string(),
            rfps: self
                .store
                .list_rfps()?
                .into_iter()
                .filter(|r| same_project(&r.project_name))
                .collect(),
            generated: self
                .store
                .list_generated()?
                .into_iter()
                .filter(|g| same_project(&g.project_name))
                .collect(),
        })
    }

    /// All projects in order of first appearance, with document counts.
    pub fn projects(&self) -> Result<Vec<ProjectSummary>> {
        let mut documents = Vec::new();
        for kind in DocumentKind::ALL {
            documents.extend(self.store.list(kind)?);
        }
        documents.sort_by_key(|d| d.sequence_number());

        let mut summaries: Vec<ProjectSummary> = Vec::new();
        for doc in &documents {
            let key = doc.project_name().trim().to_lowercase();
            let idx = match summaries
                .iter()
                .position(|s| s.project_name.to_lowercase() == key)
            {
                Some(idx) => idx,
                None => {
                    summaries.push(ProjectSummary {
                        project_name: doc.project_name().trim().to_string(),
                        rfps: 0,
                        generated: 0,
                        finalized: 0,
                    });
                    summaries.len() - 1
                }
            };

            let summary = &mut summaries[idx];
            match doc {
                Document::Rfp(_) => summary.rfps += 1,
                Document::Generated(g) => {
                    summary.generated += 1;
                    if g.status == DocumentStatus::Final {
                        summary.finalized += 1;
                    }
                }
            }
        }

        Ok(summaries)
    }
}

/// Parse a raw query string into (kind, filter).
///
/// Recognized prefixes:
/// - `kind:rfp` / `kind:generated`
/// - `status:final`
/// - `type:brd`
/// - `saved:>2024-01-01` / `saved:<2024-12-31`
///
/// Remaining words form the project name substring.
///
/// # Examples
///
/// ```ignore
/// let (kind, filter) = parse_query("kind:generated status:final commerce")?;
/// assert_eq!(kind, Some(DocumentKind::Generated));
/// assert_eq!(filter.project_name_contains, Some("commerce".to_string()));
/// ```
pub fn parse_query(raw: &str) -> Result<(Option<DocumentKind>, SearchFilter)> {
    let mut kind = None;
    let mut filter = SearchFilter::default();
    let mut remaining = Vec::new();

    for token in raw.split_whitespace() {
        if let Some(value) = token.strip_prefix("kind:") {
            kind = Some(value.parse().map_err(|_| invalid("kind", value))?);
        } else if let Some(value) = token.strip_prefix("status:") {
            filter.status = Some(value.parse().map_err(|_| invalid("status", value))?);
        } else if let Some(value) = token.strip_prefix("type:") {
            filter.doc_type = Some(value.parse().map_err(|_| invalid("type", value))?);
        } else if let Some(value) = token.strip_prefix("saved:>") {
            filter.saved_after = Some(parse_date(value).ok_or_else(|| invalid("saved", value))?);
        } else if let Some(value) = token.strip_prefix("saved:<") {
            filter.saved_before = Some(parse_date(value).ok_or_else(|| invalid("saved", value))?);
        } else {
            remaining.push(token);
        }
    }

    if !remaining.is_empty() {
        filter.project_name_contains = Some(remaining.join(" "));
    }

    Ok((kind, filter))
}

fn invalid(field: &str, value: &str) -> VellumError {
    VellumError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Parse a date string into DateTime<Utc>.
/// Supports ISO 8601 date format (YYYY-MM-DD) or full datetime.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Date only: midnight UTC
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let datetime = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::from_naive_utc_and_offset(datetime, Utc));
    }

    None
}
