//! Document generation as an injectable asynchronous step.
//!
//! A [`Generator`] turns an RFP into a draft. The store never depends on
//! how drafts are produced, so tests swap in fakes and real back ends can
//! be plugged in without touching the versioning rules.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{DocType, DocumentKind, GeneratedDocument, NewGeneratedDocument, RfpDocument};
use crate::error::{Result, VellumError};
use crate::storage::DocumentStore;

/// Everything a generator needs to produce a draft.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub rfp: RfpDocument,
    pub doc_type: DocType,
    /// Extra instructions from the caller
    pub prompt: Option<String>,
}

impl GenerationRequest {
    /// Build a request from a stored RFP.
    pub fn for_rfp(
        store: &DocumentStore,
        rfp_id: &Uuid,
        doc_type: DocType,
        prompt: Option<String>,
    ) -> Result<Self> {
        let rfp = store
            .get(DocumentKind::Rfp, rfp_id)?
            .into_rfp()
            .ok_or_else(|| VellumError::not_found(DocumentKind::Rfp, rfp_id.to_string()))?;
        Ok(Self {
            rfp,
            doc_type,
            prompt,
        })
    }

    /// The record to store once a draft has been produced.
    pub fn into_record(self, draft: Draft) -> NewGeneratedDocument {
        NewGeneratedDocument::new(
            &draft.name,
            self.doc_type,
            &self.rfp.project_name,
            &draft.content,
        )
    }
}

/// Output of a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub name: String,
    pub content: String,
}

pub trait Generator {
    fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Result<Draft>> + Send;
}

/// Builds a section skeleton from the markdown headings of the RFP.
#[derive(Debug, Clone, Default)]
pub struct OutlineGenerator {
    delay: Duration,
}

impl OutlineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before producing each draft.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Generator for OutlineGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Draft> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let sections: Vec<&str> = request
            .rfp
            .content
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim_start();
                let heading = trimmed.trim_start_matches('#');
                (trimmed.starts_with("##") && !heading.trim().is_empty()).then(|| heading.trim())
            })
            .collect();

        let mut content = format!(
            "# {}\n## {}\n\nSource: {} ({})\n",
            doc_type_title(request.doc_type),
            request.rfp.project_name,
            request.rfp.name,
            request.rfp.file_name
        );
        if let Some(ref prompt) = request.prompt {
            content.push_str(&format!("\n> {}\n", prompt.trim()));
        }

        let sections = if sections.is_empty() {
            vec!["Overview"]
        } else {
            sections
        };
        for (i, section) in sections.iter().enumerate() {
            content.push_str(&format!("\n### {}. {}\n", i + 1, section));
        }

        Ok(Draft {
            name: format!("{} - {}", request.doc_type, request.rfp.project_name),
            content,
        })
    }
}

fn doc_type_title(doc_type: DocType) -> &'static str {
    match doc_type {
        DocType::Brd => "Business Requirements Document",
        DocType::Hld => "High-Level Design",
        DocType::Lld => "Low-Level Design",
        DocType::TechSpec => "Technical Specification",
    }
}

/// Generate a document from an RFP and store it as a new version 1 draft.
pub async fn generate_document<G: Generator>(
    store: &DocumentStore,
    generator: &G,
    rfp_id: &Uuid,
    doc_type: DocType,
    prompt: Option<String>,
) -> Result<GeneratedDocument> {
    let request = GenerationRequest::for_rfp(store, rfp_id, doc_type, prompt)?;

    let draft = match generator.generate(&request).await {
        Ok(draft) => draft,
        Err(e) => {
            warn!(rfp = %rfp_id, %doc_type, error = %e, "Generation failed");
            return Err(e);
        }
    };

    let id = store.add_generated(request.into_record(draft))?;
    info!(rfp = %rfp_id, %id, %doc_type, "Generated document");
    store.get_generated(&id)
}
