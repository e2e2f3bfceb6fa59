// Uploaded file attachments

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// An uploaded file as seen by the validation layer
pub trait UploadedFile: fmt::Debug + Send + Sync {
    /// File name sent by the client
    fn client_filename(&self) -> Option<&str>;

    /// Media type sent by the client
    fn media_type(&self) -> Option<&str> {
        None
    }

    /// Size in bytes
    fn size(&self) -> u64;

    /// Representation handed to the rule engine alongside input values
    fn descriptor(&self) -> Value {
        json!({
            "filename": self.client_filename(),
            "media_type": self.media_type(),
            "size": self.size(),
        })
    }
}

/// Shared handle to an uploaded file
pub type FileRef = Arc<dyn UploadedFile>;

/// Plain uploaded file description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub filename: Option<String>,
    pub media_type: Option<String>,
    pub size: u64,
    pub path: Option<PathBuf>,
}

impl FileAttachment {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: Some(filename.into()),
            media_type: None,
            size,
            path: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Temporary location of the uploaded content
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl UploadedFile for FileAttachment {
    fn client_filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Files attached to a view model, keyed by input name
#[derive(Debug, Clone, Default)]
pub struct FileBag {
    files: BTreeMap<String, FileRef>,
}

impl FileBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file; `None` leaves the bag unchanged
    pub fn add(&mut self, key: impl Into<String>, file: Option<FileRef>) -> &mut Self {
        if let Some(file) = file {
            self.files.insert(key.into(), file);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&FileRef> {
        self.files.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRef)> {
        self.files.iter().map(|(key, file)| (key.as_str(), file))
    }

    /// File descriptors keyed by input name
    pub fn to_values(&self) -> serde_json::Map<String, Value> {
        self.files
            .iter()
            .map(|(key, file)| (key.clone(), file.descriptor()))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, FileRef)> for FileBag {
    fn from_iter<I: IntoIterator<Item = (K, FileRef)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, file) in iter {
            bag.add(key, Some(file));
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_ignores_missing_file() {
        let mut bag = FileBag::new();
        bag.add("avatar", None);
        assert!(bag.is_empty());

        bag.add("avatar", Some(Arc::new(FileAttachment::new("me.png", 10))));
        assert!(bag.has("avatar"));
        assert_eq!(bag.get("avatar").map(|f| f.size()), Some(10));
    }

    #[test]
    fn test_descriptor_shape() {
        let file = FileAttachment::new("cv.pdf", 2048)
            .with_media_type("application/pdf")
            .with_path("/tmp/upload-1");

        assert_eq!(
            file.descriptor(),
            json!({"filename": "cv.pdf", "media_type": "application/pdf", "size": 2048})
        );
    }

    #[test]
    fn test_to_values() {
        let bag: FileBag = [("doc", Arc::new(FileAttachment::new("a.txt", 1)) as FileRef)]
            .into_iter()
            .collect();

        assert_eq!(bag.to_values()["doc"]["filename"], json!("a.txt"));
    }
}
