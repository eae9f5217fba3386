mod generated;
mod rfp;

pub use generated::{DocType, DocumentEdit, DocumentStatus, GeneratedDocument, NewGeneratedDocument, Revision};
pub use rfp::{format_size, NewRfp, RfpDocument};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two document collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Rfp,
    Generated,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Rfp, DocumentKind::Generated];

    /// Name of the backing Loro map.
    pub(crate) fn collection(&self) -> &'static str {
        match self {
            DocumentKind::Rfp => "rfps",
            DocumentKind::Generated => "generated",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Rfp => write!(f, "rfp"),
            DocumentKind::Generated => write!(f, "generated"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rfp" | "rfps" => Ok(DocumentKind::Rfp),
            "generated" | "doc" | "docs" | "document" | "documents" => {
                Ok(DocumentKind::Generated)
            }
            _ => Err(format!("Invalid document kind: {}", s)),
        }
    }
}

/// A document of either kind, as handed out by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Document {
    Rfp(RfpDocument),
    Generated(GeneratedDocument),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Rfp(_) => DocumentKind::Rfp,
            Document::Generated(_) => DocumentKind::Generated,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Document::Rfp(d) => d.id,
            Document::Generated(d) => d.id,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Document::Rfp(d) => d.sequence_number,
            Document::Generated(d) => d.sequence_number,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Document::Rfp(d) => &d.name,
            Document::Generated(d) => &d.name,
        }
    }

    pub fn project_name(&self) -> &str {
        match self {
            Document::Rfp(d) => &d.project_name,
            Document::Generated(d) => &d.project_name,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Document::Rfp(d) => &d.content,
            Document::Generated(d) => &d.content,
        }
    }

    /// Lifecycle status; RFPs have none.
    pub fn status(&self) -> Option<DocumentStatus> {
        match self {
            Document::Rfp(_) => None,
            Document::Generated(d) => Some(d.status),
        }
    }

    pub fn into_rfp(self) -> Option<RfpDocument> {
        match self {
            Document::Rfp(d) => Some(d),
            Document::Generated(_) => None,
        }
    }

    pub fn into_generated(self) -> Option<GeneratedDocument> {
        match self {
            Document::Generated(d) => Some(d),
            Document::Rfp(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("rfp".parse::<DocumentKind>().unwrap(), DocumentKind::Rfp);
        assert_eq!("RFPs".parse::<DocumentKind>().unwrap(), DocumentKind::Rfp);
        assert_eq!(
            "doc".parse::<DocumentKind>().unwrap(),
            DocumentKind::Generated
        );
        assert!("memo".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_document_serializes_with_kind_tag() {
        let doc = Document::Rfp(RfpDocument::new(
            "Portal RFP".to_string(),
            "portal.pdf".to_string(),
            "Portal".to_string(),
            "body".to_string(),
            1,
        ));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["kind"], "rfp");
        assert_eq!(json["file_name"], "portal.pdf");
        assert!(doc.status().is_none());
    }
}
