use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "BRD")]
    Brd,
    #[serde(rename = "HLD")]
    Hld,
    #[serde(rename = "LLD")]
    Lld,
    TechSpec,
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocType::Brd => write!(f, "BRD"),
            DocType::Hld => write!(f, "HLD"),
            DocType::Lld => write!(f, "LLD"),
            DocType::TechSpec => write!(f, "TechSpec"),
        }
    }
}

impl std::str::FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "brd" => Ok(DocType::Brd),
            "hld" => Ok(DocType::Hld),
            "lld" => Ok(DocType::Lld),
            "techspec" => Ok(DocType::TechSpec),
            _ => Err(format!("Invalid document type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DocumentStatus {
    #[default]
    Draft,
    Final,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Draft => write!(f, "Draft"),
            DocumentStatus::Final => write!(f, "Final"),
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "final" => Ok(DocumentStatus::Final),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// A BRD or technical design document produced by a generator and
/// refined through edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: Uuid,
    pub sequence_number: u32,
    pub name: String,
    pub doc_type: DocType,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub project_name: String,
    pub status: DocumentStatus,
    pub content: String,
}

impl GeneratedDocument {
    pub fn new(
        name: String,
        doc_type: DocType,
        project_name: String,
        content: String,
        sequence_number: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sequence_number,
            name,
            doc_type,
            version: 1,
            created_at: now,
            saved_at: now,
            project_name,
            status: DocumentStatus::Draft,
            content,
        }
    }

    /// Capture the current state before it is overwritten.
    pub fn to_revision(&self) -> Revision {
        Revision {
            version: self.version,
            name: self.name.clone(),
            content: self.content.clone(),
            status: self.status,
            saved_at: self.saved_at,
        }
    }
}

/// A prior state of a generated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub version: u32,
    pub name: String,
    pub content: String,
    pub status: DocumentStatus,
    pub saved_at: DateTime<Utc>,
}

/// Creation payload for a generated document.
///
/// `version` and `status` are accepted so that callers can echo a full
/// record back, but the store always starts a document at version 1 in
/// `Draft`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGeneratedDocument {
    pub name: String,
    pub doc_type: DocType,
    pub project_name: String,
    pub content: String,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

impl NewGeneratedDocument {
    pub fn new(name: &str, doc_type: DocType, project_name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            doc_type,
            project_name: project_name.to_string(),
            content: content.to_string(),
            version: None,
            status: None,
        }
    }
}

/// Fields an edit may change. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

impl DocumentEdit {
    pub fn name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn status(status: DocumentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// True when name or content would actually change on `doc`.
    pub fn changes_text_of(&self, doc: &GeneratedDocument) -> bool {
        self.name.as_ref().is_some_and(|n| n.trim() != doc.name)
            || self.content.as_ref().is_some_and(|c| *c != doc.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_type_round_trips_through_display() {
        for t in [DocType::Brd, DocType::Hld, DocType::Lld, DocType::TechSpec] {
            assert_eq!(t.to_string().parse::<DocType>().unwrap(), t);
        }
        assert_eq!("tech-spec".parse::<DocType>().unwrap(), DocType::TechSpec);
        assert!("prd".parse::<DocType>().is_err());
    }

    #[test]
    fn test_status_serde_uses_capitalized_names() {
        let json = serde_json::to_string(&DocumentStatus::Final).unwrap();
        assert_eq!(json, "\"Final\"");
        assert_eq!("DRAFT".parse::<DocumentStatus>().unwrap(), DocumentStatus::Draft);
    }

    #[test]
    fn test_new_document_starts_at_version_one_draft() {
        let doc = GeneratedDocument::new(
            "BRD".to_string(),
            DocType::Brd,
            "Proj".to_string(),
            "text".to_string(),
            1,
        );
        assert_eq!(doc.version, 1);
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.created_at, doc.saved_at);
    }

    #[test]
    fn test_edit_detects_text_changes() {
        let doc = GeneratedDocument::new(
            "BRD".to_string(),
            DocType::Brd,
            "Proj".to_string(),
            "text".to_string(),
            1,
        );
        assert!(DocumentEdit::content("other").changes_text_of(&doc));
        assert!(!DocumentEdit::content("text").changes_text_of(&doc));
        assert!(!DocumentEdit::status(DocumentStatus::Final).changes_text_of(&doc));
    }
}
