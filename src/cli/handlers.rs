use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::api::serve_http;
use crate::config::Config;
use crate::document::{
    DocType, Document, DocumentEdit, DocumentKind, DocumentStatus, GeneratedDocument,
    NewGeneratedDocument, NewRfp, RfpDocument,
};
use crate::error::{Result, VellumError};
use crate::export::{export_document, export_project};
use crate::generation::{generate_document, OutlineGenerator};
use crate::mcp::VellumServer;
use crate::repository::Repository;
use crate::search::parse_query;
use crate::storage::{find_project_root, DocumentStore, VELLUM_DIR};

fn open_repository() -> Result<(Repository, Config)> {
    Repository::open(&find_project_root())
}

fn short_id(id: &Uuid) -> String {
    id.to_string()[..7].to_string()
}

fn invalid(field: &str, value: &str) -> VellumError {
    VellumError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_doc_type(value: &str) -> Result<DocType> {
    value.parse().map_err(|_| invalid("type", value))
}

fn parse_kind(value: &str) -> Result<DocumentKind> {
    value
        .parse()
        .map_err(|_| VellumError::InvalidKind(value.to_string()))
}

/// Read content from a file, stdin, or neither.
fn read_content(file: Option<&Path>, stdin: bool) -> Result<Option<String>> {
    if let Some(path) = file {
        return Ok(Some(fs::read_to_string(path)?));
    }
    if stdin {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        return Ok(Some(content));
    }
    Ok(None)
}

fn print_rfp_line(r: &RfpDocument) {
    println!(
        "  {:03} ({}) [RFP] {} - {} ({})",
        r.sequence_number,
        short_id(&r.id),
        r.name,
        r.project_name,
        r.size_label()
    );
}

fn print_generated_line(g: &GeneratedDocument) {
    println!(
        "  {:03} ({}) [{}|{}|v{}] {} - {}",
        g.sequence_number,
        short_id(&g.id),
        g.doc_type,
        g.status,
        g.version,
        g.name,
        g.project_name
    );
}

fn print_document_line(doc: &Document) {
    match doc {
        Document::Rfp(r) => print_rfp_line(r),
        Document::Generated(g) => print_generated_line(g),
    }
}

pub fn handle_init(policy: Option<String>, json: bool) -> Result<()> {
    let root = env::current_dir()?;

    let mut config = Config::default();
    if let Some(ref p) = policy {
        config.version_policy = p.parse().map_err(|_| invalid("policy", p))?;
    }

    DocumentStore::init(&root)?;
    config.save(&root.join(VELLUM_DIR))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "root": root,
                "version_policy": config.version_policy,
            }))?
        );
    } else {
        println!("Initialized vellum project in {}", root.display());
        println!("  version policy: {}", config.version_policy);
    }
    Ok(())
}

pub fn handle_add_rfp(
    file: PathBuf,
    project: String,
    name: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let (repo, _) = open_repository()?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let (content, size_bytes) = if stdin {
        let content = read_content(None, true)?.unwrap_or_default();
        let size = content.len() as u64;
        (content, size)
    } else {
        let size = fs::metadata(&file)?.len();
        (fs::read_to_string(&file)?, size)
    };

    let mut record = NewRfp::new(&file_name, &project, &content);
    record.name = name;
    record.size_bytes = Some(size_bytes);

    let rfp = repo.add_rfp(record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&Document::Rfp(rfp))?);
    } else {
        println!(
            "Created RFP {:03} ({}) - {} [{}]",
            rfp.sequence_number,
            short_id(&rfp.id),
            rfp.name,
            rfp.size_label()
        );
    }
    Ok(())
}

pub fn handle_add_doc(
    name: String,
    doc_type: String,
    project: String,
    file: Option<PathBuf>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let doc_type = parse_doc_type(&doc_type)?;
    let content = read_content(file.as_deref(), stdin)?.unwrap_or_default();

    let (repo, _) = open_repository()?;
    let doc = repo.add_generated(NewGeneratedDocument::new(&name, doc_type, &project, &content))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!(
            "Created {} {:03} ({}) - {} (v{}, {})",
            doc.doc_type,
            doc.sequence_number,
            short_id(&doc.id),
            doc.name,
            doc.version,
            doc.status
        );
    }
    Ok(())
}

pub fn handle_list(kind: Option<String>, json: bool) -> Result<()> {
    let kinds = match kind.as_deref() {
        Some(k) => vec![parse_kind(k)?],
        None => DocumentKind::ALL.to_vec(),
    };

    let (repo, _) = open_repository()?;
    let mut documents = Vec::new();
    for kind in kinds {
        documents.extend(repo.list(kind)?);
    }
    documents.sort_by_key(Document::sequence_number);

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else if documents.is_empty() {
        println!("No documents found.");
    } else {
        println!("Documents:\n");
        for doc in &documents {
            print_document_line(doc);
        }
    }
    Ok(())
}

pub fn handle_get(id: String, json: bool) -> Result<()> {
    let (repo, _) = open_repository()?;
    let (kind, uuid) = repo.resolve(&id)?;
    let doc = repo.get(kind, &uuid)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    match &doc {
        Document::Rfp(r) => {
            println!("RFP {:03} ({})", r.sequence_number, short_id(&r.id));
            println!("  Name:     {}", r.name);
            println!("  File:     {}", r.file_name);
            println!("  Project:  {}", r.project_name);
            println!("  Size:     {}", r.size_label());
            println!("  Uploaded: {}", r.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        Document::Generated(g) => {
            println!("{} {:03} ({})", g.doc_type, g.sequence_number, short_id(&g.id));
            println!("  Name:     {}", g.name);
            println!("  Project:  {}", g.project_name);
            println!("  Version:  {}", g.version);
            println!("  Status:   {}", g.status);
            println!("  Created:  {}", g.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Saved:    {}", g.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    println!("\n{}", doc.content());
    Ok(())
}

pub fn handle_edit(
    id: String,
    name: Option<String>,
    status: Option<String>,
    file: Option<PathBuf>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let status = status
        .as_deref()
        .map(|s| s.parse::<DocumentStatus>().map_err(|_| invalid("status", s)))
        .transpose()?;
    let content = read_content(file.as_deref(), stdin)?;

    let (repo, _) = open_repository()?;
    let (kind, uuid) = repo.resolve(&id)?;
    let doc = repo.edit(
        kind,
        &uuid,
        DocumentEdit {
            name,
            content,
            status,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!(
            "Updated {} {:03} ({}) - {} (v{}, {})",
            doc.doc_type,
            doc.sequence_number,
            short_id(&doc.id),
            doc.name,
            doc.version,
            doc.status
        );
    }
    Ok(())
}

pub fn handle_history(id: String, json: bool) -> Result<()> {
    let (repo, _) = open_repository()?;
    let uuid = repo.resolve_in(DocumentKind::Generated, &id)?;
    let current = repo.store().get_generated(&uuid)?;
    let revisions = repo.history(&uuid)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&revisions)?);
        return Ok(());
    }

    println!(
        "History of {:03} ({}) - {}\n",
        current.sequence_number,
        short_id(&current.id),
        current.name
    );
    for rev in &revisions {
        println!(
            "  v{:<3} {}  [{}] {}",
            rev.version,
            rev.saved_at.format("%Y-%m-%d %H:%M:%S"),
            rev.status,
            rev.name
        );
    }
    println!(
        "  v{:<3} {}  [{}] {} (current)",
        current.version,
        current.saved_at.format("%Y-%m-%d %H:%M:%S"),
        current.status,
        current.name
    );
    Ok(())
}

pub fn handle_search(query: Vec<String>, json: bool) -> Result<()> {
    let (kind, filter) = parse_query(&query.join(" "))?;
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => DocumentKind::ALL.to_vec(),
    };

    let (repo, _) = open_repository()?;
    let mut results = Vec::new();
    for kind in kinds {
        results.extend(repo.search(kind, &filter)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No matching documents.");
    } else {
        println!("Found {} document(s):\n", results.len());
        for doc in &results {
            print_document_line(doc);
        }
    }
    Ok(())
}

pub fn handle_project(name: Option<String>, json: bool) -> Result<()> {
    let (repo, _) = open_repository()?;

    let Some(name) = name else {
        let projects = repo.projects()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&projects)?);
        } else if projects.is_empty() {
            println!("No projects found.");
        } else {
            println!("Projects:\n");
            for p in projects {
                println!(
                    "  {} ({} RFP, {} generated, {} final)",
                    p.project_name, p.rfps, p.generated, p.finalized
                );
            }
        }
        return Ok(());
    };

    let group = repo.by_project(&name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&group)?);
    } else if group.is_empty() {
        println!("No documents found for project '{}'.", group.project_name);
    } else {
        println!("Project {}:\n", group.project_name);
        for r in &group.rfps {
            print_rfp_line(r);
        }
        for g in &group.generated {
            print_generated_line(g);
        }
    }
    Ok(())
}

pub fn handle_remove(id: String, force: bool, json: bool) -> Result<()> {
    let (repo, _) = open_repository()?;
    let (kind, uuid) = repo.resolve(&id)?;
    let doc = repo.get(kind, &uuid)?;

    // Confirm deletion unless --force is used
    if !force {
        eprintln!(
            "Remove {} {:03} ({}) - {}? [y/N] ",
            kind,
            doc.sequence_number(),
            short_id(&uuid),
            doc.name()
        );

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                if json {
                    println!("{}", json!({ "id": uuid, "kind": kind, "removed": false }));
                } else {
                    println!("Cancelled.");
                }
                return Ok(());
            }
        } else {
            return Err(VellumError::UnsupportedOperation(
                "Use --force to remove in non-interactive mode".to_string(),
            ));
        }
    }

    let removed = repo.remove(kind, &uuid)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "id": uuid, "kind": kind, "removed": removed }))?
        );
    } else {
        println!(
            "Removed {} {:03} ({}) - {}",
            kind,
            doc.sequence_number(),
            short_id(&uuid),
            doc.name()
        );
    }
    Ok(())
}

pub fn handle_export(
    id: Option<String>,
    project: Option<String>,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let (repo, config) = open_repository()?;
    let dir = match out {
        Some(dir) => dir,
        None => {
            let vellum_dir = repo.store().vellum_dir().ok_or(VellumError::NotInitialized)?;
            config.export_path(vellum_dir)
        }
    };

    let written = match (id, project) {
        (Some(id), _) => {
            let (kind, uuid) = repo.resolve(&id)?;
            vec![export_document(&repo.get(kind, &uuid)?, &dir)?]
        }
        (None, Some(project)) => export_project(repo.store(), &project, &dir)?.files_written,
        (None, None) => {
            return Err(VellumError::validation(
                "id",
                "give a document ID or --project",
            ))
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "files": written }))?);
    } else if written.is_empty() {
        println!("Nothing to export.");
    } else {
        println!("Exported {} file(s) to {}", written.len(), dir.display());
        for path in &written {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

pub fn handle_generate(
    rfp_id: String,
    doc_type: String,
    prompt: Option<String>,
    json: bool,
) -> Result<()> {
    let doc_type = parse_doc_type(&doc_type)?;
    let (repo, _) = open_repository()?;
    let rfp_uuid = repo.resolve_in(DocumentKind::Rfp, &rfp_id)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let doc = runtime.block_on(generate_document(
        repo.store(),
        &OutlineGenerator::new(),
        &rfp_uuid,
        doc_type,
        prompt,
    ))?;
    repo.store().save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!(
            "Generated {} {:03} ({}) - {} (v{}, {})",
            doc.doc_type,
            doc.sequence_number,
            short_id(&doc.id),
            doc.name,
            doc.version,
            doc.status
        );
    }
    Ok(())
}

pub fn handle_serve(http: bool, bind: Option<String>) -> Result<()> {
    let (repo, config) = open_repository()?;
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async move {
        if http {
            let bind = bind.unwrap_or(config.http.bind);
            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown signal received");
                    signal.cancel();
                }
            });
            serve_http(repo, &bind, shutdown).await
        } else {
            info!("Starting MCP server on stdio");
            VellumServer::new(repo)
                .serve(rmcp::transport::stdio())
                .await
                .map_err(|e| VellumError::Server(e.to_string()))
        }
    })
}
