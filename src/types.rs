use serde::Serialize;
use serde_json::Value;

/// A stored document, including `_id`, `$createdAt`, `$updatedAt` and `$version`.
pub type Document = Value;

/// Pagination metadata of a list response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meta {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

/// One page of documents.
#[derive(Clone, Debug, PartialEq)]
pub struct ListResult {
    pub data: Vec<Document>,
    pub meta: Meta,
}

impl ListResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.data.iter()
    }
}

impl IntoIterator for ListResult {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

/// Outcome of a single operation inside a bulk request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkItemResult {
    pub status: u16,
    pub id: Option<String>,
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Result of a bulk request. Operations succeed or fail independently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkResult {
    pub results: Vec<BulkItemResult>,
    pub summary: BulkSummary,
}

/// Operation inside a mixed bulk request.
#[derive(Clone, Debug, PartialEq)]
pub enum BulkOperation {
    /// Create a document, with a server-generated id unless `id` is set.
    Create { id: Option<String>, body: Document },
    /// Replace a document.
    Replace { id: String, body: Document },
    /// Merge-patch a document.
    Patch { id: String, body: Document },
    Delete { id: String },
}

impl BulkOperation {
    pub fn create(body: Document) -> Self {
        Self::Create { id: None, body }
    }

    pub fn replace(id: impl Into<String>, body: Document) -> Self {
        Self::Replace {
            id: id.into(),
            body,
        }
    }

    pub fn patch(id: impl Into<String>, body: Document) -> Self {
        Self::Patch {
            id: id.into(),
            body,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self::Delete { id: id.into() }
    }
}

/// RFC 6902 JSON Patch operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Add {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Replace {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Move {
            from: from.into(),
            path: path.into(),
        }
    }

    pub fn copy_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Copy {
            from: from.into(),
            path: path.into(),
        }
    }

    pub fn test(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Test {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Webhook registration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Event names, e.g. `document.created`.
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Shared secret used to sign deliveries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl WebhookConfig {
    pub fn new<I, E>(url: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        Self {
            url: url.into(),
            events: events.into_iter().map(Into::into).collect(),
            description: None,
            secret: None,
        }
    }
}

/// Partial webhook update. Only set fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WebhookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Options for `import_documents`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Conflict strategy understood by the server, e.g. `skip` or `overwrite`.
    pub on_conflict: Option<String>,
    /// Document field used as `_id`.
    pub id_field: Option<String>,
}
