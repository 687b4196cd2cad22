use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type the backend assigns to folder entries
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Identifier of the top of the user's drive. Never fetched, only named.
pub const ROOT_FOLDER_ID: &str = "root";

/// Display name given to the synthetic root node
pub const ROOT_FOLDER_NAME: &str = "Root";

/// Placeholder name for nodes whose metadata could not be fetched
pub const UNKNOWN_FOLDER_NAME: &str = "Unknown";

/// Which children a list call should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    Folders,
    Files,
    All,
}

impl EntryFilter {
    pub fn accepts(&self, entry: &DriveEntry) -> bool {
        match self {
            EntryFilter::Folders => entry.is_folder(),
            EntryFilter::Files => !entry.is_folder(),
            EntryFilter::All => true,
        }
    }
}

/// A raw entry as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

impl DriveEntry {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            web_view_link: None,
            thumbnail_link: None,
            created_time: None,
        }
    }

    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        created_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            web_view_link: None,
            thumbnail_link: None,
            created_time,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Result of a metadata lookup on a single entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

impl EntryMetadata {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// One page of a list call
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(default, rename = "files")]
    pub entries: Vec<DriveEntry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListPage {
    /// Continuation token, ignoring the empty string some servers send
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// How far a folder node's expansion got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Every child was listed and every child folder expanded as far as allowed
    Complete,
    /// The depth limit was reached here, or the listing stopped at the page cap
    Truncated,
    /// Metadata or enumeration for this folder failed
    Errored,
}

/// A node of a materialized folder tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub is_folder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    /// `None` on file leaves, `Some` on every folder the builder visited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FolderNode>>,
}

impl FolderNode {
    /// The top of the drive, synthesized without a metadata fetch
    pub fn synthetic_root() -> Self {
        Self {
            id: ROOT_FOLDER_ID.to_string(),
            name: ROOT_FOLDER_NAME.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            is_folder: true,
            web_view_link: None,
            thumbnail_link: None,
            created_at: None,
            status: None,
            children: None,
        }
    }

    /// Folder node whose name could not be fetched
    pub fn unknown_folder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: UNKNOWN_FOLDER_NAME.to_string(),
            ..Self::synthetic_root()
        }
    }

    pub fn from_metadata(metadata: EntryMetadata) -> Self {
        Self {
            is_folder: metadata.is_folder() || metadata.mime_type.is_empty(),
            id: metadata.id,
            name: metadata.name,
            mime_type: if metadata.mime_type.is_empty() {
                FOLDER_MIME_TYPE.to_string()
            } else {
                metadata.mime_type
            },
            web_view_link: None,
            thumbnail_link: None,
            created_at: None,
            status: None,
            children: None,
        }
    }

    /// Unexpanded node carrying the presentation attributes of a listed entry
    pub fn from_entry(entry: DriveEntry) -> Self {
        Self {
            is_folder: entry.is_folder(),
            id: entry.id,
            name: entry.name,
            mime_type: entry.mime_type,
            web_view_link: entry.web_view_link,
            thumbnail_link: entry.thumbnail_link,
            created_at: entry.created_time,
            status: None,
            children: None,
        }
    }

    pub fn children(&self) -> &[FolderNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn child_named(&self, name: &str) -> Option<&FolderNode> {
        self.children().iter().find(|child| child.name == name)
    }

    /// Depth of the deepest node below this one (a lone node has height 0)
    pub fn height(&self) -> usize {
        self.children()
            .iter()
            .map(|child| child.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(FolderNode::node_count).sum::<usize>()
    }
}
