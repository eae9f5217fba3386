use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded Request for Proposal. Never changes after upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfpDocument {
    pub id: Uuid,
    pub sequence_number: u32,
    pub name: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub project_name: String,
    pub content: String,
}

impl RfpDocument {
    pub fn new(
        name: String,
        file_name: String,
        project_name: String,
        content: String,
        sequence_number: u32,
    ) -> Self {
        let size_bytes = content.len() as u64;
        Self {
            id: Uuid::new_v4(),
            sequence_number,
            name,
            file_name,
            uploaded_at: Utc::now(),
            size_bytes,
            project_name,
            content,
        }
    }

    /// Human-readable size, e.g. "2.4 MB".
    pub fn size_label(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Upload payload for a new RFP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRfp {
    /// Display name; derived from the file name when absent
    #[serde(default)]
    pub name: Option<String>,
    pub file_name: String,
    pub project_name: String,
    pub content: String,
    /// Size of the original upload; defaults to the content length
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl NewRfp {
    pub fn new(file_name: &str, project_name: &str, content: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            project_name: project_name.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    /// The display name, falling back to the file stem.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let file_name = self.file_name.trim();
                match file_name.rsplit_once('.') {
                    Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                    _ => file_name.to_string(),
                }
            }
        }
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
