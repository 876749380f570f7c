use serde::{Deserialize, Serialize};
use url::Url;

/// A file picked on the device, not yet uploaded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A newly chosen file and a deletion mark are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoState {
    file: Option<LocalFile>,
    existing_url: Option<String>,
    marked_for_deletion: bool,
}

/// What the photo step of a submission has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoPlan<'a> {
    Delete { filename: Option<String> },
    Upload(&'a LocalFile),
    Keep(Option<String>),
}

impl PhotoState {
    pub fn with_existing(url: Option<String>) -> Self {
        Self {
            existing_url: url.filter(|u| !u.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn file(&self) -> Option<&LocalFile> {
        self.file.as_ref()
    }

    pub fn existing_url(&self) -> Option<&str> {
        self.existing_url.as_deref()
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// Choosing a file clears the deletion mark. Clearing the choice keeps it.
    pub fn select_file(&mut self, file: Option<LocalFile>) {
        if file.is_some() {
            self.marked_for_deletion = false;
        }
        self.file = file;
    }

    pub fn mark_for_deletion(&mut self) {
        self.marked_for_deletion = true;
        self.file = None;
    }

    pub fn plan(&self) -> PhotoPlan<'_> {
        match (&self.existing_url, &self.file) {
            (Some(url), _) if self.marked_for_deletion => PhotoPlan::Delete {
                filename: extract_filename(url),
            },
            (_, Some(file)) => PhotoPlan::Upload(file),
            (existing, None) => PhotoPlan::Keep(existing.clone()),
        }
    }
}

/// The stored filename is the last path segment of the photo URL.
pub fn extract_filename(url: &str) -> Option<String> {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url.rsplit('/').next().map(str::to_string),
    };
    segment.filter(|s| !s.is_empty())
}
