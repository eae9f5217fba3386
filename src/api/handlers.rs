//! HTTP handlers for the document repository

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::document::{
    DocType, Document, DocumentEdit, DocumentKind, GeneratedDocument, NewGeneratedDocument,
    NewRfp, Revision, RfpDocument,
};
use crate::error::VellumError;
use crate::generation::{GenerationRequest, Generator};
use crate::search::{ProjectDocuments, ProjectSummary, SearchFilter};

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

// ========== RFPs ==========

pub async fn create_rfp(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewRfp>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Json(record) = payload?;
    let repo = state.repo.lock().await;
    let rfp = repo.add_rfp(record)?;
    Ok((StatusCode::CREATED, Json(Document::Rfp(rfp))))
}

pub async fn list_rfps(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<RfpDocument>>> {
    let repo = state.repo.lock().await;
    Ok(Json(repo.store().list_rfps()?))
}

pub async fn get_rfp(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Document>> {
    get_document_of(&state, DocumentKind::Rfp, &reference).await
}

/// RFPs are immutable; known ids answer 409, unknown ones 404.
pub async fn edit_rfp(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
    payload: Result<Json<DocumentEdit>, JsonRejection>,
) -> ApiResult<Json<GeneratedDocument>> {
    let edit = payload.map(|Json(e)| e).unwrap_or_default();
    let repo = state.repo.lock().await;
    let id = repo.resolve_in(DocumentKind::Rfp, &reference)?;
    Ok(Json(repo.edit(DocumentKind::Rfp, &id, edit)?))
}

pub async fn delete_rfp(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Value>> {
    remove_document_of(&state, DocumentKind::Rfp, &reference).await
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub doc_type: DocType,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Run the generator against an RFP. The repository lock is released
/// while the generator works.
pub async fn generate_from_rfp(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GeneratedDocument>)> {
    let Json(body) = payload?;

    let request = {
        let repo = state.repo.lock().await;
        let id = repo.resolve_in(DocumentKind::Rfp, &reference)?;
        GenerationRequest::for_rfp(repo.store(), &id, body.doc_type, body.prompt)?
    };

    let draft = state.generator.generate(&request).await?;

    let repo = state.repo.lock().await;
    let doc = repo.add_generated(request.into_record(draft))?;
    Ok((StatusCode::CREATED, Json(doc)))
}

// ========== Generated documents ==========

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewGeneratedDocument>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GeneratedDocument>)> {
    let Json(record) = payload?;
    let repo = state.repo.lock().await;
    let doc = repo.add_generated(record)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<GeneratedDocument>>> {
    let repo = state.repo.lock().await;
    Ok(Json(repo.store().list_generated()?))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Document>> {
    get_document_of(&state, DocumentKind::Generated, &reference).await
}

pub async fn edit_document(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
    payload: Result<Json<DocumentEdit>, JsonRejection>,
) -> ApiResult<Json<GeneratedDocument>> {
    let Json(edit) = payload?;
    let repo = state.repo.lock().await;
    let id = repo.resolve_in(DocumentKind::Generated, &reference)?;
    Ok(Json(repo.edit(DocumentKind::Generated, &id, edit)?))
}

pub async fn document_history(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Vec<Revision>>> {
    let repo = state.repo.lock().await;
    let id = repo.resolve_in(DocumentKind::Generated, &reference)?;
    Ok(Json(repo.history(&id)?))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Value>> {
    remove_document_of(&state, DocumentKind::Generated, &reference).await
}

// ========== Queries ==========

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub kind: Option<String>,
    pub project: Option<String>,
    pub status: Option<String>,
    pub doc_type: Option<String>,
}

impl SearchParams {
    fn into_query(self) -> Result<(Vec<DocumentKind>, SearchFilter), VellumError> {
        let kinds = match self.kind.as_deref() {
            Some(k) => vec![k
                .parse::<DocumentKind>()
                .map_err(|_| VellumError::InvalidKind(k.to_string()))?],
            None => DocumentKind::ALL.to_vec(),
        };
        let filter = SearchFilter {
            project_name_contains: self.project,
            status: parse_param("status", self.status)?,
            doc_type: parse_param("doc_type", self.doc_type)?,
            ..Default::default()
        };
        Ok((kinds, filter))
    }
}

fn parse_param<T: std::str::FromStr>(field: &str, value: Option<String>) -> Result<Option<T>, VellumError> {
    value
        .map(|v| {
            v.parse().map_err(|_| VellumError::InvalidValue {
                field: field.to_string(),
                value: v.clone(),
            })
        })
        .transpose()
}

/// Search one kind, or both (RFPs first) when no kind is given.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Document>>> {
    let (kinds, filter) = params.into_query()?;
    let repo = state.repo.lock().await;

    let mut results = Vec::new();
    for kind in kinds {
        results.extend(repo.search(kind, &filter)?);
    }
    Ok(Json(results))
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    let repo = state.repo.lock().await;
    Ok(Json(repo.projects()?))
}

pub async fn project_documents(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<ProjectDocuments>> {
    let repo = state.repo.lock().await;
    Ok(Json(repo.by_project(&name)?))
}

// ========== Shared ==========

async fn get_document_of(
    state: &AppState,
    kind: DocumentKind,
    reference: &str,
) -> ApiResult<Json<Document>> {
    let repo = state.repo.lock().await;
    let id = repo.resolve_in(kind, reference)?;
    Ok(Json(repo.get(kind, &id)?))
}

async fn remove_document_of(
    state: &AppState,
    kind: DocumentKind,
    reference: &str,
) -> ApiResult<Json<Value>> {
    let repo = state.repo.lock().await;
    let id = repo.resolve_in(kind, reference)?;
    let removed = repo.remove(kind, &id)?;
    Ok(Json(json!({ "id": id, "removed": removed })))
}
