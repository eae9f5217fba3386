//! The only code path that mutates a stored generated document.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{DocumentEdit, DocumentKind, GeneratedDocument};
use crate::error::{Result, VellumError};
use crate::storage::DocumentStore;

/// Which edits count as a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Every save bumps the version, including status-only saves.
    #[default]
    EveryEdit,
    /// Only a changed name or content bumps the version.
    ContentChange,
}

impl std::fmt::Display for VersionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionPolicy::EveryEdit => write!(f, "every_edit"),
            VersionPolicy::ContentChange => write!(f, "content_change"),
        }
    }
}

impl std::str::FromStr for VersionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "every_edit" => Ok(VersionPolicy::EveryEdit),
            "content_change" => Ok(VersionPolicy::ContentChange),
            _ => Err(format!("Invalid version policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionManager {
    policy: VersionPolicy,
}

impl VersionManager {
    pub fn new(policy: VersionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Apply an edit and return the updated document.
    ///
    /// RFPs are immutable and fail with `UnsupportedOperation`. A counted
    /// edit increments the version by exactly one and records the previous
    /// state as a revision. `saved_at` moves forward on every save.
    pub fn apply_edit(
        &self,
        store: &DocumentStore,
        kind: DocumentKind,
        id: &Uuid,
        edit: DocumentEdit,
    ) -> Result<GeneratedDocument> {
        let current = store.get(kind, id)?;

        let mut doc = match current.into_generated() {
            Some(doc) => doc,
            None => {
                warn!(%id, "Rejected edit of immutable RFP");
                return Err(VellumError::UnsupportedOperation(format!(
                    "RFP {} is immutable and cannot be edited",
                    id
                )));
            }
        };

        if let Some(ref name) = edit.name {
            if name.trim().is_empty() {
                return Err(VellumError::validation("name", "must not be empty"));
            }
        }
        if let Some(ref content) = edit.content {
            if content.trim().is_empty() {
                return Err(VellumError::validation("content", "must not be empty"));
            }
        }

        let bump = match self.policy {
            VersionPolicy::EveryEdit => true,
            VersionPolicy::ContentChange => edit.changes_text_of(&doc),
        };
        let prior = bump.then(|| doc.to_revision());

        if let Some(name) = edit.name {
            doc.name = name.trim().to_string();
        }
        if let Some(content) = edit.content {
            doc.content = content;
        }
        if let Some(status) = edit.status {
            doc.status = status;
        }
        if bump {
            doc.version += 1;
        }

        // saved_at strictly increases across saves
        let now = Utc::now();
        doc.saved_at = if now > doc.saved_at {
            now
        } else {
            doc.saved_at + Duration::microseconds(1)
        };

        store.write_generated(&doc, prior.as_ref())?;

        info!(%id, version = doc.version, status = %doc.status, bumped = bump, "Saved document edit");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocType, DocumentStatus, NewGeneratedDocument, NewRfp};

    fn setup() -> (DocumentStore, Uuid) {
        let store = DocumentStore::in_memory();
        let id = store
            .add_generated(NewGeneratedDocument::new(
                "BRD v1",
                DocType::Brd,
                "Proj A",
                "draft text",
            ))
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_content_then_status_edit_scenario() {
        let (store, id) = setup();
        let vm = VersionManager::default();
        let created = store.get_generated(&id).unwrap();

        let v2 = vm
            .apply_edit(
                &store,
                DocumentKind::Generated,
                &id,
                DocumentEdit::content("revised text"),
            )
            .unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v2.name, "BRD v1");
        assert_eq!(v2.content, "revised text");
        assert!(v2.saved_at > created.saved_at);

        let v3 = vm
            .apply_edit(
                &store,
                DocumentKind::Generated,
                &id,
                DocumentEdit::status(DocumentStatus::Final),
            )
            .unwrap();
        assert_eq!(v3.version, 3);
        assert_eq!(v3.status, DocumentStatus::Final);
        assert!(v3.saved_at > v2.saved_at);

        // The stored copy matches what was returned
        assert_eq!(store.get_generated(&id).unwrap(), v3);
    }

    #[test]
    fn test_n_edits_yield_version_n_plus_one() {
        let (store, id) = setup();
        let vm = VersionManager::new(VersionPolicy::EveryEdit);

        for n in 1..=10u32 {
            let doc = vm
                .apply_edit(
                    &store,
                    DocumentKind::Generated,
                    &id,
                    DocumentEdit::content(&format!("revision {}", n)),
                )
                .unwrap();
            assert_eq!(doc.version, 1 + n);
        }
        assert_eq!(store.history(&id).unwrap().len(), 10);
    }

    #[test]
    fn test_status_round_trip_is_allowed() {
        let (store, id) = setup();
        let vm = VersionManager::default();

        for status in [
            DocumentStatus::Final,
            DocumentStatus::Draft,
            DocumentStatus::Final,
        ] {
            let doc = vm
                .apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::status(status))
                .unwrap();
            assert_eq!(doc.status, status);
        }
        assert_eq!(store.get_generated(&id).unwrap().version, 4);
    }

    #[test]
    fn test_unknown_id_is_not_found_and_store_unchanged() {
        let (store, id) = setup();
        let vm = VersionManager::default();
        let before = store.list(DocumentKind::Generated).unwrap().len();

        let result = vm.apply_edit(
            &store,
            DocumentKind::Generated,
            &Uuid::new_v4(),
            DocumentEdit::content("x"),
        );
        assert!(matches!(result, Err(VellumError::NotFound { .. })));
        assert_eq!(store.list(DocumentKind::Generated).unwrap().len(), before);
        assert_eq!(store.get_generated(&id).unwrap().version, 1);
    }

    #[test]
    fn test_rfp_edit_is_unsupported() {
        let store = DocumentStore::in_memory();
        let vm = VersionManager::default();
        let id = store
            .add_rfp(NewRfp::new("rfp.pdf", "Proj A", "hello"))
            .unwrap();

        let result = vm.apply_edit(&store, DocumentKind::Rfp, &id, DocumentEdit::content("bye"));
        assert!(matches!(result, Err(VellumError::UnsupportedOperation(_))));
        assert_eq!(store.get(DocumentKind::Rfp, &id).unwrap().content(), "hello");
    }

    #[test]
    fn test_empty_replacement_text_is_rejected() {
        let (store, id) = setup();
        let vm = VersionManager::default();

        let result = vm.apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::name(" "));
        assert!(matches!(result, Err(VellumError::Validation { .. })));
        assert_eq!(store.get_generated(&id).unwrap().version, 1);
    }

    #[test]
    fn test_history_records_prior_states() {
        let (store, id) = setup();
        let vm = VersionManager::default();

        vm.apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::name("BRD v2"))
            .unwrap();
        vm.apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::content("final text"))
            .unwrap();

        let history = store.history(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version, 1);
        assert_eq!(history[0].name, "BRD v1");
        assert_eq!(history[1].version, 2);
        assert_eq!(history[1].name, "BRD v2");
        assert_eq!(history[1].content, "draft text");
    }

    #[test]
    fn test_content_change_policy_skips_status_only_edits() {
        let (store, id) = setup();
        let vm = VersionManager::new(VersionPolicy::ContentChange);
        let created = store.get_generated(&id).unwrap();

        let doc = vm
            .apply_edit(
                &store,
                DocumentKind::Generated,
                &id,
                DocumentEdit::status(DocumentStatus::Final),
            )
            .unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.status, DocumentStatus::Final);
        assert!(doc.saved_at > created.saved_at);

        // Same content is not a change either
        let doc = vm
            .apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::content("draft text"))
            .unwrap();
        assert_eq!(doc.version, 1);

        let doc = vm
            .apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::content("new text"))
            .unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(store.history(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_content_change_policy_ignores_padded_same_name() {
        let (store, id) = setup();
        let vm = VersionManager::new(VersionPolicy::ContentChange);

        let doc = vm
            .apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::name(" BRD v1 "))
            .unwrap();
        assert_eq!(doc.name, "BRD v1");
        assert_eq!(doc.version, 1);
        assert!(store.history(&id).unwrap().is_empty());

        let doc = vm
            .apply_edit(&store, DocumentKind::Generated, &id, DocumentEdit::name(" BRD v2 "))
            .unwrap();
        assert_eq!(doc.name, "BRD v2");
        assert_eq!(doc.version, 2);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "content-change".parse::<VersionPolicy>().unwrap(),
            VersionPolicy::ContentChange
        );
        assert_eq!(
            "every_edit".parse::<VersionPolicy>().unwrap(),
            VersionPolicy::EveryEdit
        );
        assert!("sometimes".parse::<VersionPolicy>().is_err());
    }
}
