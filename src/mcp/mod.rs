//! MCP (Model Context Protocol) server implementation for Vellum.
//!
//! Exposes the document repository to AI tools as a set of MCP tools
//! served over stdio.

pub mod error;
pub mod tools;

use crate::document::{Document, DocumentEdit, DocumentKind, NewGeneratedDocument, NewRfp};
use crate::generation::{GenerationRequest, Generator, OutlineGenerator};
use crate::repository::Repository;
use error::McpError;
use rmcp::{
    handler::server::wrapper::Parameters, model::*, service::RoleServer, tool, tool_handler,
    tool_router, ErrorData as McpErrorData, ServerHandler,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tools::*;
use tracing::info;
use uuid::Uuid;

/// MCP server over a shared repository.
#[derive(Clone)]
pub struct VellumServer {
    /// The repository; one lock serializes every mutation.
    pub repo: Arc<Mutex<Repository>>,
    /// Produces drafts for document_generate.
    pub generator: OutlineGenerator,
    /// Tool router for MCP tool handling.
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpErrorData> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::InternalError {
        message: format!("JSON error: {}", e),
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn resolve(
    repo: &Repository,
    reference: &str,
    kind: Option<&str>,
) -> Result<(DocumentKind, Uuid), McpError> {
    match kind {
        Some(k) => {
            let kind = parse_kind(k)?;
            Ok((kind, repo.resolve_in(kind, reference)?))
        }
        None => Ok(repo.resolve(reference)?),
    }
}

#[tool_router]
impl VellumServer {
    /// Create a new VellumServer instance.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
            generator: OutlineGenerator::new(),
            tool_router: Self::tool_router(),
        }
    }

    /// Start the MCP server on the given transport.
    ///
    /// This method runs the server until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(self, transport: T) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        let running = ServiceExt::serve(self, transport).await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        running.waiting().await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    /// Ping tool for health checks.
    #[tool(description = "Check if the server is running")]
    async fn ping(&self) -> Result<CallToolResult, McpErrorData> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    #[tool(description = "Store an uploaded RFP. RFPs are immutable once stored.")]
    pub async fn rfp_create(
        &self,
        Parameters(params): Parameters<RfpCreateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let record = NewRfp {
            name: params.name,
            file_name: params.file_name,
            project_name: params.project_name,
            content: params.content,
            size_bytes: params.size_bytes,
            uploaded_at: None,
        };

        let repo = self.repo.lock().await;
        let rfp = repo.add_rfp(record).map_err(McpError::from)?;
        info!(id = %rfp.id, "MCP rfp_create");
        json_result(&Document::Rfp(rfp))
    }

    #[tool(description = "Create a generated document (BRD, HLD, LLD, or TechSpec) at version 1 in Draft status")]
    pub async fn document_create(
        &self,
        Parameters(params): Parameters<DocumentCreateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let doc_type = parse_doc_type(&params.doc_type)?;
        let record = NewGeneratedDocument::new(
            &params.name,
            doc_type,
            &params.project_name,
            &params.content,
        );

        let repo = self.repo.lock().await;
        let doc = repo.add_generated(record).map_err(McpError::from)?;
        info!(id = %doc.id, "MCP document_create");
        json_result(&doc)
    }

    #[tool(description = "Get a document by ID (sequence number like '1' or UUID prefix like 'abc123')")]
    pub async fn document_get(
        &self,
        Parameters(params): Parameters<DocumentGetParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let repo = self.repo.lock().await;
        let (kind, id) = resolve(&repo, &params.id, params.kind.as_deref())?;
        let doc = repo.get(kind, &id).map_err(McpError::from)?;
        json_result(&doc)
    }

    #[tool(description = "List documents in insertion order, optionally restricted to one kind (rfp or generated)")]
    pub async fn document_list(
        &self,
        Parameters(params): Parameters<DocumentListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let kinds = match params.kind.as_deref() {
            Some(k) => vec![parse_kind(k)?],
            None => DocumentKind::ALL.to_vec(),
        };
        let (limit, offset) = page_bounds(params.limit, params.offset);

        let repo = self.repo.lock().await;
        let mut documents: Vec<Document> = Vec::new();
        for kind in kinds {
            documents.extend(repo.list(kind).map_err(McpError::from)?);
        }
        documents.sort_by_key(|d| d.sequence_number());

        let total = documents.len();
        let page: Vec<Document> = documents.into_iter().skip(offset).take(limit).collect();
        json_result(&serde_json::json!({
            "documents": page,
            "total": total,
            "limit": limit,
            "offset": offset,
        }))
    }

    #[tool(description = "Edit a generated document's name, content, or status. Every accepted edit refreshes saved_at; the version bump follows the configured policy. RFPs cannot be edited.")]
    pub async fn document_edit(
        &self,
        Parameters(params): Parameters<DocumentEditParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let edit = DocumentEdit {
            name: params.name,
            content: params.content,
            status: params.status.as_deref().map(parse_status).transpose()?,
        };

        let repo = self.repo.lock().await;
        let (kind, id) = resolve(&repo, &params.id, None)?;
        let doc = repo.edit(kind, &id, edit).map_err(McpError::from)?;
        info!(id = %doc.id, version = doc.version, "MCP document_edit");
        json_result(&doc)
    }

    #[tool(description = "List the prior revisions of a generated document, oldest first")]
    pub async fn document_history(
        &self,
        Parameters(params): Parameters<DocumentHistoryParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let repo = self.repo.lock().await;
        let id = repo
            .resolve_in(DocumentKind::Generated, &params.id)
            .map_err(McpError::from)?;
        let revisions = repo.history(&id).map_err(McpError::from)?;
        json_result(&revisions)
    }

    #[tool(description = "Search documents by project name substring (case-insensitive), status, document type, and saved date range. The query accepts kind:, status:, type:, saved:> and saved:< prefixes.")]
    pub async fn document_search(
        &self,
        Parameters(params): Parameters<DocumentSearchParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let (kind, filter) = build_search(&params)?;
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => DocumentKind::ALL.to_vec(),
        };

        let repo = self.repo.lock().await;
        let mut results: Vec<Document> = Vec::new();
        for kind in kinds {
            results.extend(repo.search(kind, &filter).map_err(McpError::from)?);
        }
        json_result(&results)
    }

    #[tool(description = "Get all RFPs and generated documents of one project (exact name, case-insensitive)")]
    pub async fn project_documents(
        &self,
        Parameters(params): Parameters<ProjectDocumentsParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let repo = self.repo.lock().await;
        let group = repo
            .by_project(&params.project_name)
            .map_err(McpError::from)?;
        json_result(&group)
    }

    #[tool(description = "Delete a document by ID. Generated documents lose their revision history too.")]
    pub async fn document_remove(
        &self,
        Parameters(params): Parameters<DocumentRemoveParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let repo = self.repo.lock().await;
        let (kind, id) = resolve(&repo, &params.id, params.kind.as_deref())?;
        if !repo.remove(kind, &id).map_err(McpError::from)? {
            return Err(McpError::DocumentNotFound {
                kind: kind.to_string(),
                id: params.id,
            }
            .into());
        }

        info!(%id, %kind, "MCP document_remove");
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Document {} deleted successfully",
            params.id
        ))]))
    }

    #[tool(description = "Generate a BRD, HLD, LLD, or TechSpec draft from a stored RFP")]
    pub async fn document_generate(
        &self,
        Parameters(params): Parameters<DocumentGenerateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let doc_type = parse_doc_type(&params.doc_type)?;

        let request = {
            let repo = self.repo.lock().await;
            let rfp_id = repo
                .resolve_in(DocumentKind::Rfp, &params.rfp_id)
                .map_err(McpError::from)?;
            GenerationRequest::for_rfp(repo.store(), &rfp_id, doc_type, params.prompt)
                .map_err(McpError::from)?
        };

        let draft = self
            .generator
            .generate(&request)
            .await
            .map_err(McpError::from)?;

        let repo = self.repo.lock().await;
        let doc = repo
            .add_generated(request.into_record(draft))
            .map_err(McpError::from)?;
        info!(id = %doc.id, %doc_type, "MCP document_generate");
        json_result(&doc)
    }
}

#[tool_handler]
impl ServerHandler for VellumServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Vellum is a versioned document repository for RFPs and the \
                 BRD, HLD, LLD and TechSpec documents generated from them. \
                 RFPs are immutable; generated documents are versioned on edit."
                    .to_string(),
            ),
        }
    }
}
