use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use loro::{LoroDoc, LoroList, LoroMap, LoroValue, ValueOrContainer};
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{
    Document, DocumentKind, GeneratedDocument, NewGeneratedDocument, NewRfp, Revision,
    RfpDocument,
};
use crate::error::{Result, VellumError};

pub const VELLUM_DIR: &str = ".vellum";
const LORO_DB: &str = "vellum.db";

/// Shortest UUID prefix accepted when resolving a document reference.
pub const MIN_ID_PREFIX_LENGTH: usize = 4;

/// Find the project root by looking for .vellum/ or .git/
pub fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(VELLUM_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// The single source of truth for every document.
///
/// Documents live in a Loro document with one map per kind, keyed by UUID.
/// A store-wide sequence counter gives every document a short number that
/// also defines insertion order. The store can run purely in memory or be
/// backed by a snapshot file under `.vellum/`.
pub struct DocumentStore {
    doc: LoroDoc,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// Create a store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            doc: LoroDoc::new(),
            path: None,
        }
    }

    /// Initialize a new vellum project
    pub fn init(root: &Path) -> Result<Self> {
        let vellum_dir = root.join(VELLUM_DIR);

        if vellum_dir.exists() {
            return Err(VellumError::AlreadyInitialized);
        }

        fs::create_dir_all(&vellum_dir)?;

        let store = Self {
            doc: LoroDoc::new(),
            path: Some(vellum_dir.join(LORO_DB)),
        };
        store.save()?;

        info!(root = %root.display(), "Initialized document store");
        Ok(store)
    }

    /// Open an existing vellum project
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(VELLUM_DIR).join(LORO_DB);

        if !path.exists() {
            return Err(VellumError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        debug!(path = %path.display(), "Opened document store");
        Ok(Self {
            doc,
            path: Some(path),
        })
    }

    /// Persist the document to disk. No-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        if let Some(ref path) = self.path {
            let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
            fs::write(path, bytes)?;
        }
        Ok(())
    }

    /// The `.vellum` directory, if this store is file-backed.
    pub fn vellum_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Get the next store-wide sequence number
    pub fn next_sequence_number(&self) -> u32 {
        let meta = self.doc.get_map("_meta");
        let current = meta
            .get("sequence")
            .and_then(|v| match v {
                ValueOrContainer::Value(LoroValue::I64(n)) => Some(n as u32),
                _ => None,
            })
            .unwrap_or(0);

        current + 1
    }

    fn record_sequence_number(&self, sequence_number: u32) -> Result<()> {
        let meta = self.doc.get_map("_meta");
        meta.insert("sequence", sequence_number as i64)?;
        Ok(())
    }

    // ========== Creation ==========

    /// Insert a new RFP. RFPs are never modified afterwards.
    pub fn add_rfp(&self, record: NewRfp) -> Result<Uuid> {
        require_non_empty("file_name", &record.file_name)?;
        require_non_empty("project_name", &record.project_name)?;
        require_non_empty("content", &record.content)?;

        let seq = self.next_sequence_number();
        let mut rfp = RfpDocument::new(
            record.display_name(),
            record.file_name.trim().to_string(),
            record.project_name.trim().to_string(),
            record.content,
            seq,
        );
        if let Some(size) = record.size_bytes {
            rfp.size_bytes = size;
        }
        if let Some(uploaded_at) = record.uploaded_at {
            rfp.uploaded_at = uploaded_at;
        }

        let rfps = self.doc.get_map(DocumentKind::Rfp.collection());
        let id_str = rfp.id.to_string();
        let entity_map = rfps.get_or_create_container(&id_str, LoroMap::new())?;

        entity_map.insert("id", id_str.clone())?;
        entity_map.insert("sequence_number", rfp.sequence_number as i64)?;
        entity_map.insert("name", rfp.name.clone())?;
        entity_map.insert("file_name", rfp.file_name.clone())?;
        entity_map.insert("uploaded_at", rfp.uploaded_at.to_rfc3339())?;
        entity_map.insert("size_bytes", rfp.size_bytes as i64)?;
        entity_map.insert("project_name", rfp.project_name.clone())?;
        entity_map.insert("content", rfp.content.clone())?;

        self.record_sequence_number(seq)?;
        self.doc.commit();

        info!(id = %rfp.id, seq, project = %rfp.project_name, "Added RFP");
        Ok(rfp.id)
    }

    /// Insert a new generated document at version 1 in `Draft`, whatever
    /// version or status the caller supplied.
    pub fn add_generated(&self, record: NewGeneratedDocument) -> Result<Uuid> {
        require_non_empty("name", &record.name)?;
        require_non_empty("project_name", &record.project_name)?;
        require_non_empty("content", &record.content)?;

        if record.version.is_some_and(|v| v != 1) || record.status.is_some() {
            debug!("Ignoring caller-supplied version/status on create");
        }

        let seq = self.next_sequence_number();
        let doc = GeneratedDocument::new(
            record.name.trim().to_string(),
            record.doc_type,
            record.project_name.trim().to_string(),
            record.content,
            seq,
        );

        let generated = self.doc.get_map(DocumentKind::Generated.collection());
        let id_str = doc.id.to_string();
        let entity_map = generated.get_or_create_container(&id_str, LoroMap::new())?;

        entity_map.insert("id", id_str.clone())?;
        entity_map.insert("sequence_number", doc.sequence_number as i64)?;
        entity_map.insert("doc_type", doc.doc_type.to_string())?;
        entity_map.insert("created_at", doc.created_at.to_rfc3339())?;
        entity_map.insert("project_name", doc.project_name.clone())?;
        write_mutable_fields(&entity_map, &doc)?;

        self.record_sequence_number(seq)?;
        self.doc.commit();

        info!(id = %doc.id, seq, doc_type = %doc.doc_type, project = %doc.project_name, "Added generated document");
        Ok(doc.id)
    }

    // ========== Reads ==========

    /// Get a document by kind and UUID
    pub fn get(&self, kind: DocumentKind, id: &Uuid) -> Result<Document> {
        let map = self.doc.get_map(kind.collection());
        let id_str = id.to_string();

        if let LoroValue::Map(entries) = map.get_deep_value() {
            if let Some(LoroValue::Map(entity_map)) = entries.get(&id_str) {
                if let Some(doc) = parse_document(kind, entity_map) {
                    return Ok(doc);
                }
            }
        }

        debug!(%kind, id = %id_str, "Document lookup missed");
        Err(VellumError::not_found(kind, id_str))
    }

    /// Get a generated document, typed.
    pub fn get_generated(&self, id: &Uuid) -> Result<GeneratedDocument> {
        self.get(DocumentKind::Generated, id)?
            .into_generated()
            .ok_or_else(|| VellumError::not_found(DocumentKind::Generated, id.to_string()))
    }

    /// List all documents of a kind in insertion order
    pub fn list(&self, kind: DocumentKind) -> Result<Vec<Document>> {
        let map = self.doc.get_map(kind.collection());
        let mut documents = Vec::new();

        if let LoroValue::Map(entries) = map.get_deep_value() {
            for (_, value) in entries.iter() {
                if let LoroValue::Map(entity_map) = value {
                    if let Some(doc) = parse_document(kind, entity_map) {
                        documents.push(doc);
                    }
                }
            }
        }

        documents.sort_by_key(|d| d.sequence_number());
        Ok(documents)
    }

    pub fn list_rfps(&self) -> Result<Vec<RfpDocument>> {
        Ok(self
            .list(DocumentKind::Rfp)?
            .into_iter()
            .filter_map(Document::into_rfp)
            .collect())
    }

    pub fn list_generated(&self) -> Result<Vec<GeneratedDocument>> {
        Ok(self
            .list(DocumentKind::Generated)?
            .into_iter()
            .filter_map(Document::into_generated)
            .collect())
    }

    /// Prior revisions of a generated document, oldest first.
    pub fn history(&self, id: &Uuid) -> Result<Vec<Revision>> {
        // Fail with NotFound for unknown ids rather than returning nothing.
        self.get_generated(id)?;

        let revisions = self.doc.get_map("revisions");
        let mut result = Vec::new();
        if let LoroValue::Map(entries) = revisions.get_deep_value() {
            if let Some(LoroValue::List(list)) = entries.get(&id.to_string()) {
                for item in list.iter() {
                    if let LoroValue::String(json) = item {
                        result.push(serde_json::from_str::<Revision>(json)?);
                    }
                }
            }
        }

        result.sort_by_key(|r| r.version);
        Ok(result)
    }

    /// Resolve a sequence number ("3") or UUID prefix ("a1b2c") to a UUID
    /// within one kind.
    pub fn resolve_id(&self, kind: DocumentKind, reference: &str) -> Result<Uuid> {
        let reference = reference.trim();
        let documents = self.list(kind)?;

        // Sequence numbers win; all-digit references may still be UUID prefixes.
        let by_sequence = reference
            .parse::<u32>()
            .ok()
            .and_then(|seq| documents.iter().find(|d| d.sequence_number() == seq));

        let found = by_sequence.or_else(|| {
            if reference.len() < MIN_ID_PREFIX_LENGTH {
                return None;
            }
            let prefix = reference.to_lowercase();
            documents
                .iter()
                .find(|d| d.id().to_string().starts_with(&prefix))
        });

        found
            .map(Document::id)
            .ok_or_else(|| VellumError::not_found(kind, reference))
    }

    /// Resolve a reference against every kind.
    pub fn resolve_any(&self, reference: &str) -> Result<(DocumentKind, Uuid)> {
        for kind in DocumentKind::ALL {
            match self.resolve_id(kind, reference) {
                Ok(id) => return Ok((kind, id)),
                Err(VellumError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(VellumError::not_found("any", reference.trim()))
    }

    // ========== Mutation ==========

    /// Overwrite the mutable fields of a stored generated document and
    /// append `prior` to its revision list. Only the version manager calls
    /// this.
    pub(crate) fn write_generated(
        &self,
        doc: &GeneratedDocument,
        prior: Option<&Revision>,
    ) -> Result<()> {
        let generated = self.doc.get_map(DocumentKind::Generated.collection());
        let id_str = doc.id.to_string();

        let entity_map = match generated.get(&id_str) {
            Some(ValueOrContainer::Container(loro::Container::Map(map))) => map,
            _ => return Err(VellumError::not_found(DocumentKind::Generated, id_str)),
        };

        write_mutable_fields(&entity_map, doc)?;

        if let Some(revision) = prior {
            let revisions = self.doc.get_map("revisions");
            let list = revisions.get_or_create_container(&id_str, LoroList::new())?;
            list.push(serde_json::to_string(revision)?)?;
        }

        self.doc.commit();
        Ok(())
    }

    /// Remove a document. Returns false when nothing was stored under the id.
    pub fn remove(&self, kind: DocumentKind, id: &Uuid) -> Result<bool> {
        let map = self.doc.get_map(kind.collection());
        let id_str = id.to_string();

        if map.get(&id_str).is_none() {
            return Ok(false);
        }

        map.delete(&id_str)?;

        if kind == DocumentKind::Generated {
            let revisions = self.doc.get_map("revisions");
            if revisions.get(&id_str).is_some() {
                revisions.delete(&id_str)?;
            }
        }

        self.doc.commit();
        info!(%kind, id = %id_str, "Removed document");
        Ok(true)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VellumError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn write_mutable_fields(entity_map: &LoroMap, doc: &GeneratedDocument) -> Result<()> {
    entity_map.insert("name", doc.name.clone())?;
    entity_map.insert("version", doc.version as i64)?;
    entity_map.insert("saved_at", doc.saved_at.to_rfc3339())?;
    entity_map.insert("status", doc.status.to_string())?;
    entity_map.insert("content", doc.content.clone())?;
    Ok(())
}

fn parse_document(kind: DocumentKind, map: &loro::LoroMapValue) -> Option<Document> {
    match kind {
        DocumentKind::Rfp => parse_rfp_from_map(map).map(Document::Rfp),
        DocumentKind::Generated => parse_generated_from_map(map).map(Document::Generated),
    }
}

fn get_string(map: &loro::LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn get_i64(map: &loro::LoroMapValue, key: &str) -> Option<i64> {
    match map.get(key)? {
        LoroValue::I64(n) => Some(*n),
        _ => None,
    }
}

fn get_datetime(map: &loro::LoroMapValue, key: &str) -> Option<DateTime<Utc>> {
    match map.get(key)? {
        LoroValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn parse_rfp_from_map(map: &loro::LoroMapValue) -> Option<RfpDocument> {
    Some(RfpDocument {
        id: get_string(map, "id")?.parse().ok()?,
        sequence_number: get_i64(map, "sequence_number")? as u32,
        name: get_string(map, "name")?,
        file_name: get_string(map, "file_name")?,
        uploaded_at: get_datetime(map, "uploaded_at")?,
        size_bytes: get_i64(map, "size_bytes").unwrap_or(0) as u64,
        project_name: get_string(map, "project_name")?,
        content: get_string(map, "content").unwrap_or_default(),
    })
}

fn parse_generated_from_map(map: &loro::LoroMapValue) -> Option<GeneratedDocument> {
    Some(GeneratedDocument {
        id: get_string(map, "id")?.parse().ok()?,
        sequence_number: get_i64(map, "sequence_number")? as u32,
        name: get_string(map, "name")?,
        doc_type: get_string(map, "doc_type")?.parse().ok()?,
        version: get_i64(map, "version")? as u32,
        created_at: get_datetime(map, "created_at")?,
        saved_at: get_datetime(map, "saved_at")?,
        project_name: get_string(map, "project_name")?,
        status: get_string(map, "status")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        content: get_string(map, "content").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocType, DocumentStatus};
    use tempfile::TempDir;

    fn brd(name: &str, project: &str) -> NewGeneratedDocument {
        NewGeneratedDocument::new(name, DocType::Brd, project, "draft text")
    }

    #[test]
    fn test_init_creates_vellum_directory() {
        let tmp = TempDir::new().unwrap();
        let _store = DocumentStore::init(tmp.path()).unwrap();

        assert!(tmp.path().join(".vellum").exists());
        assert!(tmp.path().join(".vellum/vellum.db").exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let tmp = TempDir::new().unwrap();
        DocumentStore::init(tmp.path()).unwrap();

        let result = DocumentStore::init(tmp.path());
        assert!(matches!(result, Err(VellumError::AlreadyInitialized)));
    }

    #[test]
    fn test_open_fails_if_not_initialized() {
        let tmp = TempDir::new().unwrap();

        let result = DocumentStore::open(tmp.path());
        assert!(matches!(result, Err(VellumError::NotInitialized)));
    }

    #[test]
    fn test_add_rfp_and_get() {
        let store = DocumentStore::in_memory();
        let id = store
            .add_rfp(NewRfp::new("rfp.pdf", "Proj A", "hello"))
            .unwrap();

        let doc = store.get(DocumentKind::Rfp, &id).unwrap();
        assert_eq!(doc.content(), "hello");
        assert_eq!(doc.name(), "rfp");
        assert_eq!(doc.project_name(), "Proj A");

        let rfp = doc.into_rfp().unwrap();
        assert_eq!(rfp.file_name, "rfp.pdf");
        assert_eq!(rfp.size_bytes, 5);
    }

    #[test]
    fn test_add_rfp_rejects_empty_fields() {
        let store = DocumentStore::in_memory();

        for (record, field) in [
            (NewRfp::new("", "Proj", "body"), "file_name"),
            (NewRfp::new("a.pdf", "  ", "body"), "project_name"),
            (NewRfp::new("a.pdf", "Proj", ""), "content"),
        ] {
            match store.add_rfp(record) {
                Err(VellumError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
        assert!(store.list(DocumentKind::Rfp).unwrap().is_empty());
    }

    #[test]
    fn test_add_generated_forces_version_and_status() {
        let store = DocumentStore::in_memory();
        let mut record = brd("BRD v1", "Proj A");
        record.version = Some(7);
        record.status = Some(DocumentStatus::Final);

        let id = store.add_generated(record).unwrap();
        let doc = store.get_generated(&id).unwrap();

        assert_eq!(doc.version, 1);
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.name, "BRD v1");
        assert_eq!(doc.content, "draft text");
    }

    #[test]
    fn test_add_generated_rejects_empty_fields() {
        let store = DocumentStore::in_memory();
        let result = store.add_generated(brd("", "Proj"));
        assert!(matches!(result, Err(VellumError::Validation { .. })));

        let mut blank = brd("Name", "Proj");
        blank.content = "   ".to_string();
        assert!(matches!(
            store.add_generated(blank),
            Err(VellumError::Validation { .. })
        ));
    }

    #[test]
    fn test_get_wrong_kind_is_not_found() {
        let store = DocumentStore::in_memory();
        let id = store.add_generated(brd("BRD", "Proj")).unwrap();

        let result = store.get(DocumentKind::Rfp, &id);
        assert!(matches!(result, Err(VellumError::NotFound { .. })));
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = DocumentStore::in_memory();
        let names = ["Zeta", "Alpha", "Mu", "Beta"];
        for name in names {
            store.add_generated(brd(name, "Proj")).unwrap();
        }

        let listed: Vec<String> = store
            .list(DocumentKind::Generated)
            .unwrap()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_remove() {
        let store = DocumentStore::in_memory();
        let a = store.add_generated(brd("A", "Proj")).unwrap();
        let b = store.add_generated(brd("B", "Proj")).unwrap();

        assert!(store.remove(DocumentKind::Generated, &a).unwrap());
        assert!(!store.remove(DocumentKind::Generated, &a).unwrap());
        assert!(!store.remove(DocumentKind::Rfp, &b).unwrap());

        let remaining = store.list(DocumentKind::Generated).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), b);
    }

    #[test]
    fn test_sequence_numbers_are_store_wide_and_not_reused() {
        let store = DocumentStore::in_memory();
        let rfp = store.add_rfp(NewRfp::new("a.pdf", "P", "x")).unwrap();
        let doc = store.add_generated(brd("B", "P")).unwrap();

        assert_eq!(store.get(DocumentKind::Rfp, &rfp).unwrap().sequence_number(), 1);
        assert_eq!(store.get_generated(&doc).unwrap().sequence_number, 2);

        store.remove(DocumentKind::Generated, &doc).unwrap();
        let next = store.add_generated(brd("C", "P")).unwrap();
        assert_eq!(store.get_generated(&next).unwrap().sequence_number, 3);
    }

    #[test]
    fn test_resolve_by_sequence_and_prefix() {
        let store = DocumentStore::in_memory();
        let rfp = store.add_rfp(NewRfp::new("a.pdf", "P", "x")).unwrap();
        let doc = store.add_generated(brd("B", "P")).unwrap();

        assert_eq!(store.resolve_any("1").unwrap(), (DocumentKind::Rfp, rfp));
        assert_eq!(
            store.resolve_any("2").unwrap(),
            (DocumentKind::Generated, doc)
        );

        let prefix = &doc.to_string()[..8];
        assert_eq!(
            store.resolve_id(DocumentKind::Generated, prefix).unwrap(),
            doc
        );

        // Too short to be a prefix
        assert!(store.resolve_id(DocumentKind::Generated, "ab").is_err());
        assert!(matches!(
            store.resolve_any("99"),
            Err(VellumError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_all_digit_uuid_prefix() {
        // Retry until a random id starts with four decimal digits
        for _ in 0..1000 {
            let store = DocumentStore::in_memory();
            let id = store.add_generated(brd("B", "P")).unwrap();
            let prefix = id.to_string()[..4].to_string();
            if !prefix.chars().all(|c| c.is_ascii_digit()) || prefix.parse::<u32>() == Ok(1) {
                continue;
            }

            assert_eq!(store.resolve_id(DocumentKind::Generated, &prefix).unwrap(), id);
            assert_eq!(store.resolve_any(&prefix).unwrap(), (DocumentKind::Generated, id));
            // The sequence number still resolves first
            assert_eq!(store.resolve_id(DocumentKind::Generated, "1").unwrap(), id);
            return;
        }
        panic!("no all-digit uuid prefix generated");
    }

    #[test]
    fn test_history_unknown_id_is_not_found() {
        let store = DocumentStore::in_memory();
        let result = store.history(&Uuid::new_v4());
        assert!(matches!(result, Err(VellumError::NotFound { .. })));
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::init(tmp.path()).unwrap();

        let rfp = store
            .add_rfp(NewRfp::new("crm.pdf", "CRM System", "requirements"))
            .unwrap();
        let doc = store.add_generated(brd("BRD - CRM", "CRM System")).unwrap();
        store.save().unwrap();

        let reopened = DocumentStore::open(tmp.path()).unwrap();
        assert_eq!(
            reopened.get(DocumentKind::Rfp, &rfp).unwrap().content(),
            "requirements"
        );
        assert_eq!(reopened.get_generated(&doc).unwrap().name, "BRD - CRM");
        assert_eq!(reopened.next_sequence_number(), 3);
    }

    #[test]
    fn test_save_is_noop_in_memory() {
        let store = DocumentStore::in_memory();
        store.save().unwrap();
        assert!(store.vellum_dir().is_none());
    }
}
