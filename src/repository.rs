//! Facade tying the document store, version manager and query service
//! together for the CLI and server front ends.

use std::path::Path;

use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::document::{
    Document, DocumentEdit, DocumentKind, GeneratedDocument, NewGeneratedDocument, NewRfp,
    Revision, RfpDocument,
};
use crate::error::{Result, VellumError};
use crate::search::{ProjectDocuments, ProjectSummary, QueryService, SearchFilter};
use crate::storage::DocumentStore;
use crate::versioning::{VersionManager, VersionPolicy};

/// Every mutating call persists the store before returning when the store
/// is file-backed.
pub struct Repository {
    store: DocumentStore,
    versions: VersionManager,
}

impl Repository {
    pub fn new(store: DocumentStore, policy: VersionPolicy) -> Self {
        Self {
            store,
            versions: VersionManager::new(policy),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(DocumentStore::in_memory(), VersionPolicy::default())
    }

    /// Open the project rooted at `root` together with its config.
    pub fn open(root: &Path) -> Result<(Self, Config)> {
        let store = DocumentStore::open(root)?;
        let config = match store.vellum_dir() {
            Some(dir) => Config::load(dir)?,
            None => Config::default(),
        };
        Ok((Self::new(store, config.version_policy), config))
    }

    /// Save after a mutation. A failed write leaves the change in memory
    /// only, so it is reported loudly.
    fn persist(&self) -> Result<()> {
        self.store.save().map_err(|e| {
            warn!(error = %e, "Failed to persist change; it is held in memory only");
            e
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn policy(&self) -> VersionPolicy {
        self.versions.policy()
    }

    pub fn add_rfp(&self, record: NewRfp) -> Result<RfpDocument> {
        let id = self.store.add_rfp(record)?;
        self.persist()?;
        self.store
            .get(DocumentKind::Rfp, &id)?
            .into_rfp()
            .ok_or_else(|| VellumError::Storage("Failed to read back stored RFP".to_string()))
    }

    pub fn add_generated(&self, record: NewGeneratedDocument) -> Result<GeneratedDocument> {
        let id = self.store.add_generated(record)?;
        self.persist()?;
        self.store.get_generated(&id)
    }

    pub fn get(&self, kind: DocumentKind, id: &Uuid) -> Result<Document> {
        self.store.get(kind, id)
    }

    pub fn list(&self, kind: DocumentKind) -> Result<Vec<Document>> {
        self.store.list(kind)
    }

    pub fn edit(&self, kind: DocumentKind, id: &Uuid, edit: DocumentEdit) -> Result<GeneratedDocument> {
        let doc = self.versions.apply_edit(&self.store, kind, id, edit)?;
        self.persist()?;
        Ok(doc)
    }

    pub fn history(&self, id: &Uuid) -> Result<Vec<Revision>> {
        self.store.history(id)
    }

    pub fn remove(&self, kind: DocumentKind, id: &Uuid) -> Result<bool> {
        let removed = self.store.remove(kind, id)?;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn search(&self, kind: DocumentKind, filter: &SearchFilter) -> Result<Vec<Document>> {
        QueryService::new(&self.store).search(kind, filter)
    }

    pub fn by_project(&self, project_name: &str) -> Result<ProjectDocuments> {
        QueryService::new(&self.store).by_project(project_name)
    }

    pub fn projects(&self) -> Result<Vec<ProjectSummary>> {
        QueryService::new(&self.store).projects()
    }

    /// Resolve a short reference against every kind.
    pub fn resolve(&self, reference: &str) -> Result<(DocumentKind, Uuid)> {
        self.store.resolve_any(reference)
    }

    pub fn resolve_in(&self, kind: DocumentKind, reference: &str) -> Result<Uuid> {
        self.store.resolve_id(kind, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocType, DocumentStatus};
    use tempfile::TempDir;

    #[test]
    fn test_mutations_are_persisted() {
        let tmp = TempDir::new().unwrap();
        DocumentStore::init(tmp.path()).unwrap();

        let (repo, config) = Repository::open(tmp.path()).unwrap();
        assert_eq!(config, Config::default());

        let doc = repo
            .add_generated(NewGeneratedDocument::new("BRD", DocType::Brd, "P", "text"))
            .unwrap();
        repo.edit(
            DocumentKind::Generated,
            &doc.id,
            DocumentEdit::status(DocumentStatus::Final),
        )
        .unwrap();

        let (reopened, _) = Repository::open(tmp.path()).unwrap();
        let stored = reopened.store().get_generated(&doc.id).unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.status, DocumentStatus::Final);
        assert_eq!(reopened.history(&doc.id).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_save_is_reported() {
        let tmp = TempDir::new().unwrap();
        DocumentStore::init(tmp.path()).unwrap();
        let (repo, _) = Repository::open(tmp.path()).unwrap();

        std::fs::remove_dir_all(tmp.path().join(".vellum")).unwrap();

        let result = repo.add_generated(NewGeneratedDocument::new("BRD", DocType::Brd, "P", "text"));
        assert!(matches!(result, Err(VellumError::Io(_))));
    }

    #[test]
    fn test_open_honours_configured_policy() {
        let tmp = TempDir::new().unwrap();
        DocumentStore::init(tmp.path()).unwrap();
        let config = Config {
            version_policy: VersionPolicy::ContentChange,
            ..Config::default()
        };
        config.save(&tmp.path().join(".vellum")).unwrap();

        let (repo, _) = Repository::open(tmp.path()).unwrap();
        assert_eq!(repo.policy(), VersionPolicy::ContentChange);
    }

    #[test]
    fn test_resolve_and_remove() {
        let repo = Repository::in_memory();
        let rfp = repo.add_rfp(NewRfp::new("a.pdf", "P", "x")).unwrap();

        let (kind, id) = repo.resolve("1").unwrap();
        assert_eq!(kind, DocumentKind::Rfp);
        assert_eq!(id, rfp.id);

        assert!(repo.remove(kind, &id).unwrap());
        assert!(repo.resolve("1").is_err());
    }
}
