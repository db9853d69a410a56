//! Data store shapes.
//!
//! `GET /data/{path}` answers with one of two bodies depending on what the
//! path names, so the result is modelled as [`DataEntry`] and the content type
//! of the response is the only discriminator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Flat attribute mapping carried as prefixed HTTP headers.
pub type Metadata = IndexMap<String, String>;

/// Kind tag of a directory child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Collection,
    DataObject,
    #[serde(other)]
    Unknown,
}

/// A child of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Collection
    }
}

/// A directory listing, children in server order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryContents {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub contents: Vec<DirectoryEntry>,
    /// Populated from response headers, never from the body.
    #[serde(skip)]
    pub metadata: Metadata,
}

impl DirectoryContents {
    /// Splits the children into directories and everything else, keeping the
    /// server order within each bucket.
    pub fn partition(&self) -> (Vec<&DirectoryEntry>, Vec<&DirectoryEntry>) {
        self.contents.iter().partition(|entry| entry.is_directory())
    }
}

/// A file read back from the data store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// Path as supplied by the caller.
    pub path: String,
    /// Exact response body.
    pub content: Vec<u8>,
    pub metadata: Metadata,
}

impl FileContent {
    /// Content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Result of browsing a data store path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataEntry {
    Directory(DirectoryContents),
    File(FileContent),
}

/// Body of a successful directory creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateDirectoryResponse {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partition_keeps_server_order_within_buckets() {
        let listing: DirectoryContents = serde_json::from_value(json!({
            "path": "/home/alice",
            "type": "collection",
            "contents": [
                { "name": "b.txt", "type": "data_object" },
                { "name": "zeta", "type": "collection" },
                { "name": "a.txt", "type": "data_object" },
                { "name": "alpha", "type": "collection" }
            ]
        }))
        .unwrap();

        let (directories, files) = listing.partition();
        let names = |entries: &[&DirectoryEntry]| entries.iter().map(|e| e.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&directories), vec!["zeta", "alpha"]);
        assert_eq!(names(&files), vec!["b.txt", "a.txt"]);
        assert!(listing.metadata.is_empty());
    }

    #[test]
    fn unknown_entry_kinds_decode_without_error() {
        let entry: DirectoryEntry = serde_json::from_value(json!({ "name": "link", "type": "special" })).unwrap();
        assert_eq!(entry.kind, EntryKind::Unknown);
        assert!(!entry.is_directory());
    }
}
