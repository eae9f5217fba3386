use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn vellum_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_vellum"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    vellum_cmd().current_dir(dir).args(args).output().unwrap()
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["init"]);
    assert!(output.status.success());
    tmp
}

fn add_rfp(dir: &Path, file: &str, project: &str, content: &str) -> serde_json::Value {
    fs::write(dir.join(file), content).unwrap();
    run_json(dir, &["add", "rfp", file, "--project", project, "--json"])
}

fn add_doc(dir: &Path, name: &str, doc_type: &str, project: &str, content: &str) -> serde_json::Value {
    let file = format!("{}.md", doc_type.to_lowercase());
    fs::write(dir.join(&file), content).unwrap();
    run_json(
        dir,
        &[
            "add", "doc", name, "--type", doc_type, "--project", project, "--file", &file,
            "--json",
        ],
    )
}

#[test]
fn test_init_creates_vellum_directory() {
    let tmp = init_project();

    assert!(tmp.path().join(".vellum").exists());
    assert!(tmp.path().join(".vellum/vellum.db").exists());
    assert!(tmp.path().join(".vellum/config.yaml").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = init_project();

    let output = run(tmp.path(), &["init"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Already initialized"));
}

#[test]
fn test_init_with_policy_writes_config() {
    let tmp = TempDir::new().unwrap();
    let init = run_json(tmp.path(), &["init", "--policy", "content_change", "--json"]);
    assert_eq!(init["version_policy"], "content_change");

    let config = fs::read_to_string(tmp.path().join(".vellum/config.yaml")).unwrap();
    assert!(config.contains("content_change"));
}

#[test]
fn test_command_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["list"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not in a vellum project"));
}

#[test]
fn test_add_rfp_records_metadata() {
    let tmp = init_project();

    let rfp = add_rfp(
        tmp.path(),
        "ecommerce-rfp-v2.txt",
        "E-Commerce Platform Modernization",
        "# RFP\n## Key Requirements\n",
    );
    assert_eq!(rfp["kind"], "rfp");
    assert_eq!(rfp["name"], "ecommerce-rfp-v2");
    assert_eq!(rfp["file_name"], "ecommerce-rfp-v2.txt");
    assert_eq!(rfp["sequence_number"], 1);
    assert_eq!(rfp["size_bytes"], 26);

    let output = run(tmp.path(), &["list", "rfp"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("001"));
    assert!(stdout.contains("E-Commerce Platform Modernization"));
}

#[test]
fn test_full_document_workflow() {
    let tmp = init_project();
    let dir = tmp.path();

    let doc = add_doc(dir, "BRD v1", "BRD", "Proj A", "draft text");
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["status"], "Draft");

    // Content edit bumps the version
    fs::write(dir.join("revised.md"), "revised text").unwrap();
    let edited = run_json(dir, &["edit", "1", "--file", "revised.md", "--json"]);
    assert_eq!(edited["version"], 2);
    assert_eq!(edited["content"], "revised text");
    assert_eq!(edited["name"], "BRD v1");

    // Status-only edit also bumps under the default policy
    let finalized = run_json(dir, &["edit", "1", "--status", "final", "--json"]);
    assert_eq!(finalized["version"], 3);
    assert_eq!(finalized["status"], "Final");

    let history = run_json(dir, &["history", "1", "--json"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["version"], 1);
    assert_eq!(history[0]["content"], "draft text");
    assert_eq!(history[1]["version"], 2);

    let fetched = run_json(dir, &["get", "1", "--json"]);
    assert_eq!(fetched["version"], 3);
    assert_eq!(fetched["content"], "revised text");
}

#[test]
fn test_edit_with_stdin() {
    let tmp = init_project();
    let dir = tmp.path();
    add_doc(dir, "HLD", "HLD", "Proj A", "v1");

    let mut child = vellum_cmd()
        .current_dir(dir)
        .args(["edit", "1", "--stdin", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"from stdin")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let edited: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(edited["content"], "from stdin");
    assert_eq!(edited["version"], 2);
}

#[test]
fn test_exit_codes() {
    let tmp = init_project();
    let dir = tmp.path();
    add_rfp(dir, "rfp.txt", "Proj A", "hello");

    // Unknown document
    let output = run(dir, &["get", "999"]);
    assert_eq!(output.status.code(), Some(1));

    // Empty content
    let output = run(dir, &["add", "doc", "Empty", "--type", "BRD", "--project", "Proj A"]);
    assert_eq!(output.status.code(), Some(2));

    // Invalid kind
    let output = run(dir, &["list", "memo"]);
    assert_eq!(output.status.code(), Some(2));

    // RFPs are immutable
    let output = run(dir, &["edit", "1", "--name", "Renamed"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported operation"));

    let rfp = run_json(dir, &["get", "1", "--json"]);
    assert_eq!(rfp["name"], "rfp");
}

#[test]
fn test_search_and_project() {
    let tmp = init_project();
    let dir = tmp.path();
    add_rfp(
        dir,
        "ecommerce.txt",
        "E-Commerce Platform Modernization",
        "# RFP",
    );
    add_doc(
        dir,
        "BRD - CRM",
        "BRD",
        "Customer Relationship Management System",
        "brd",
    );
    add_doc(
        dir,
        "HLD - Commerce",
        "HLD",
        "E-Commerce Platform Modernization",
        "hld",
    );

    let results = run_json(dir, &["search", "commerce", "--json"]);
    assert_eq!(results.as_array().unwrap().len(), 2);

    let results = run_json(dir, &["search", "kind:generated", "type:hld", "--json"]);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "HLD - Commerce");

    let results = run_json(dir, &["search", "status:final", "--json"]);
    assert!(results.as_array().unwrap().is_empty());

    let group = run_json(
        dir,
        &["project", "e-commerce platform modernization", "--json"],
    );
    assert_eq!(group["rfps"].as_array().unwrap().len(), 1);
    assert_eq!(group["generated"].as_array().unwrap().len(), 1);

    let projects = run_json(dir, &["project", "--json"]);
    assert_eq!(projects.as_array().unwrap().len(), 2);
}

#[test]
fn test_remove_requires_force_when_not_interactive() {
    let tmp = init_project();
    let dir = tmp.path();
    add_doc(dir, "BRD", "BRD", "Proj A", "text");

    let output = run(dir, &["remove", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--force"));

    let removed = run_json(dir, &["remove", "1", "--force", "--json"]);
    assert_eq!(removed["removed"], true);
    assert_eq!(removed["kind"], "generated");

    let output = run(dir, &["get", "1"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_export_document() {
    let tmp = init_project();
    let dir = tmp.path();
    add_doc(dir, "Tech Spec  Draft", "TechSpec", "Proj A", "spec body");

    let output = run(dir, &["export", "1", "--out", "out"]);
    assert!(output.status.success());

    let text = fs::read_to_string(dir.join("out/tech-spec-draft.txt")).unwrap();
    assert!(text.starts_with("---\n"));
    assert!(text.contains("spec body"));
}

#[test]
fn test_generate_from_rfp() {
    let tmp = init_project();
    let dir = tmp.path();
    add_rfp(
        dir,
        "crm-requirements.txt",
        "CRM",
        "# CRM System RFP\n## Objective\n## Core Features Required\n",
    );

    let doc = run_json(dir, &["generate", "1", "--type", "lld", "--json"]);
    assert_eq!(doc["doc_type"], "LLD");
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["status"], "Draft");
    assert_eq!(doc["project_name"], "CRM");
    assert_eq!(doc["sequence_number"], 2);

    let listed = run_json(dir, &["list", "generated", "--json"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}
