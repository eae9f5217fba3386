//! MCP tool types and helpers for Vellum.
//!
//! Parameter types and parsing helpers for MCP tools. The tool
//! implementations live in mod.rs within the #[tool_router] impl block.

use crate::document::{DocType, DocumentKind, DocumentStatus};
use crate::mcp::error::{validation, McpError};
use crate::search::{parse_date, SearchFilter};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for rfp_create tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RfpCreateParams {
    /// Display name (defaults to the file name without extension)
    pub name: Option<String>,
    /// Original file name of the upload
    pub file_name: String,
    /// Project the RFP belongs to
    pub project_name: String,
    /// Extracted text content
    pub content: String,
    /// Size of the original upload in bytes (defaults to the content length)
    pub size_bytes: Option<u64>,
}

/// Parameters for document_create tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentCreateParams {
    pub name: String,
    /// Document type: BRD, HLD, LLD, or TechSpec
    pub doc_type: String,
    pub project_name: String,
    pub content: String,
}

/// Parameters for document_get tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentGetParams {
    /// Document ID (sequence number like "1" or UUID prefix like "abc123")
    pub id: String,
    /// Optional kind hint: rfp or generated
    pub kind: Option<String>,
}

/// Parameters for document_list tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentListParams {
    /// Filter by kind: rfp or generated (both when omitted)
    pub kind: Option<String>,
    /// Maximum results (default 50, max 100)
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

/// Parameters for document_edit tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentEditParams {
    /// Document ID (sequence number or UUID prefix)
    pub id: String,
    /// New name
    pub name: Option<String>,
    /// New content
    pub content: Option<String>,
    /// New status: Draft or Final
    pub status: Option<String>,
}

/// Parameters for document_history tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentHistoryParams {
    /// Generated document ID (sequence number or UUID prefix)
    pub id: String,
}

/// Parameters for document_search tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSearchParams {
    /// Free-form query such as "kind:generated status:final commerce"
    pub query: Option<String>,
    /// Restrict to one kind: rfp or generated
    pub kind: Option<String>,
    /// Case-insensitive substring of the project name
    pub project: Option<String>,
    /// Draft or Final
    pub status: Option<String>,
    /// BRD, HLD, LLD, or TechSpec
    pub doc_type: Option<String>,
    /// Saved at or after this date (YYYY-MM-DD or RFC 3339)
    pub saved_after: Option<String>,
    /// Saved before this date (YYYY-MM-DD or RFC 3339)
    pub saved_before: Option<String>,
}

/// Parameters for project_documents tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectDocumentsParams {
    /// Exact project name (case-insensitive)
    pub project_name: String,
}

/// Parameters for document_remove tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentRemoveParams {
    /// Document ID (sequence number or UUID prefix)
    pub id: String,
    /// Optional kind hint: rfp or generated
    pub kind: Option<String>,
}

/// Parameters for document_generate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentGenerateParams {
    /// Source RFP ID (sequence number or UUID prefix)
    pub rfp_id: String,
    /// Document type to produce: BRD, HLD, LLD, or TechSpec
    pub doc_type: String,
    /// Extra instructions for the generator
    pub prompt: Option<String>,
}

// ============================================================================
// Parsing Helpers
// ============================================================================

pub fn parse_kind(value: &str) -> Result<DocumentKind, McpError> {
    value.parse().map_err(|_| McpError::DocumentKindInvalid {
        provided: value.to_string(),
        valid: DocumentKind::ALL.iter().map(|k| k.to_string()).collect(),
    })
}

pub fn parse_doc_type(value: &str) -> Result<DocType, McpError> {
    value.parse().map_err(|_| McpError::InvalidValue {
        field: "doc_type".to_string(),
        value: value.to_string(),
    })
}

pub fn parse_status(value: &str) -> Result<DocumentStatus, McpError> {
    value.parse().map_err(|_| McpError::InvalidValue {
        field: "status".to_string(),
        value: value.to_string(),
    })
}

fn parse_saved(field: &str, value: &str) -> Result<chrono::DateTime<chrono::Utc>, McpError> {
    parse_date(value).ok_or_else(|| McpError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Clamp pagination to the server limits.
pub fn page_bounds(limit: Option<u32>, offset: Option<u32>) -> (usize, usize) {
    let limit = limit
        .map(|l| l as usize)
        .unwrap_or(validation::DEFAULT_LIMIT)
        .min(validation::MAX_LIMIT);
    (limit, offset.unwrap_or(0) as usize)
}

/// Combine the free-form query with the explicit fields. Explicit fields win.
pub fn build_search(
    params: &DocumentSearchParams,
) -> Result<(Option<DocumentKind>, SearchFilter), McpError> {
    let (mut kind, mut filter) = match params.query.as_deref() {
        Some(query) => crate::search::parse_query(query).map_err(McpError::from)?,
        None => (None, SearchFilter::new()),
    };

    if let Some(ref k) = params.kind {
        kind = Some(parse_kind(k)?);
    }
    if let Some(ref project) = params.project {
        filter.project_name_contains = Some(project.clone());
    }
    if let Some(ref status) = params.status {
        filter.status = Some(parse_status(status)?);
    }
    if let Some(ref doc_type) = params.doc_type {
        filter.doc_type = Some(parse_doc_type(doc_type)?);
    }
    if let Some(ref after) = params.saved_after {
        filter.saved_after = Some(parse_saved("saved_after", after)?);
    }
    if let Some(ref before) = params.saved_before {
        filter.saved_before = Some(parse_saved("saved_before", before)?);
    }

    Ok((kind, filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("rfp").unwrap(), DocumentKind::Rfp);
        assert_eq!(parse_kind("generated").unwrap(), DocumentKind::Generated);
        assert!(matches!(
            parse_kind("memo"),
            Err(McpError::DocumentKindInvalid { .. })
        ));
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (50, 0));
        assert_eq!(page_bounds(Some(500), Some(10)), (100, 10));
    }

    #[test]
    fn test_build_search_explicit_fields_override_query() {
        let params = DocumentSearchParams {
            query: Some("kind:rfp commerce".to_string()),
            kind: Some("generated".to_string()),
            status: Some("final".to_string()),
            ..Default::default()
        };
        let (kind, filter) = build_search(&params).unwrap();
        assert_eq!(kind, Some(DocumentKind::Generated));
        assert_eq!(filter.project_name_contains.as_deref(), Some("commerce"));
        assert_eq!(filter.status, Some(DocumentStatus::Final));
    }

    #[test]
    fn test_build_search_rejects_bad_date() {
        let params = DocumentSearchParams {
            saved_after: Some("last tuesday".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_search(&params),
            Err(McpError::InvalidValue { .. })
        ));
    }
}
