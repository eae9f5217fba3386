//! Export documents as plain-text files with a YAML front-matter header.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::document::Document;
use crate::error::Result;
use crate::search::QueryService;
use crate::storage::DocumentStore;

/// Metadata block written at the top of every exported file
#[derive(Debug, Serialize)]
struct Frontmatter<'a> {
    kind: String,
    id: String,
    name: &'a str,
    project: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    timestamp: String,
}

impl<'a> Frontmatter<'a> {
    fn for_document(doc: &'a Document) -> Self {
        let mut fm = Frontmatter {
            kind: doc.kind().to_string(),
            id: doc.id().to_string(),
            name: doc.name(),
            project: doc.project_name(),
            file_name: None,
            size: None,
            doc_type: None,
            version: None,
            status: None,
            timestamp: String::new(),
        };
        match doc {
            Document::Rfp(r) => {
                fm.file_name = Some(r.file_name.as_str());
                fm.size = Some(r.size_label());
                fm.timestamp = r.uploaded_at.to_rfc3339();
            }
            Document::Generated(g) => {
                fm.doc_type = Some(g.doc_type.to_string());
                fm.version = Some(g.version);
                fm.status = Some(g.status.to_string());
                fm.timestamp = g.saved_at.to_rfc3339();
            }
        }
        fm
    }
}

/// Statistics about an export run
#[derive(Debug, Default)]
pub struct ExportStats {
    pub rfps: usize,
    pub generated: usize,
    pub files_written: Vec<PathBuf>,
}

/// File name for an exported document: whitespace runs become `-`, the
/// result is lowercased and given a `.txt` extension.
pub fn export_file_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            match c {
                '/' | '\\' | ':' | '\0' => slug.push('-'),
                _ => slug.extend(c.to_lowercase()),
            }
        }
    }

    if slug.is_empty() || slug.chars().all(|c| c == '.' || c == '-') {
        slug = "untitled".to_string();
    }

    format!("{}.txt", slug)
}

/// Generate YAML frontmatter block
pub fn yaml_frontmatter<T: Serialize>(data: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(data)?;
    Ok(format!("---\n{}---\n", yaml))
}

/// Render the full text of an exported document.
pub fn render_document(doc: &Document) -> Result<String> {
    let mut out = yaml_frontmatter(&Frontmatter::for_document(doc))?;
    out.push('\n');
    out.push_str(doc.content());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Write one document into `dir` and return the written path.
pub fn export_document(doc: &Document, dir: &Path) -> Result<PathBuf> {
    write_document(doc, dir, export_file_name(doc.name()))
}

/// Export every document of a project into `dir`. File names carry the
/// document number so that documents sharing a name do not collide.
pub fn export_project(store: &DocumentStore, project_name: &str, dir: &Path) -> Result<ExportStats> {
    let group = QueryService::new(store).by_project(project_name)?;
    let mut stats = ExportStats::default();

    let documents = group
        .rfps
        .into_iter()
        .map(Document::Rfp)
        .chain(group.generated.into_iter().map(Document::Generated));

    for doc in documents {
        let file_name = format!("{:03}-{}", doc.sequence_number(), export_file_name(doc.name()));
        let path = write_document(&doc, dir, file_name)?;
        match doc {
            Document::Rfp(_) => stats.rfps += 1,
            Document::Generated(_) => stats.generated += 1,
        }
        stats.files_written.push(path);
    }

    info!(project = project_name, files = stats.files_written.len(), "Exported project");
    Ok(stats)
}

fn write_document(doc: &Document, dir: &Path, file_name: String) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, render_document(doc)?)?;
    Ok(path)
}
