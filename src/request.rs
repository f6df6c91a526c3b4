use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::{
    query::{count_query_string, encode, filter_query_string},
    wire, BulkOperation, Document, Filter, ImportOptions, ListOptions, PatchOperation, Result,
    WebhookConfig, WebhookUpdate,
};

pub(crate) const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";
pub(crate) const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// A single logical API call.
///
/// `path` is relative to the base URL and starts with `/`; anything else is
/// rejected with [`JsonDbError::Config`](crate::JsonDbError::Config). It is
/// sent as given, so segments and query values must already be encoded.
/// `headers` are layered over the client defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` and sets it as the JSON body.
    pub fn serialize<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    /// Adds a per-request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Builds the requests behind every collection operation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CollectionRequests<'a> {
    project: &'a str,
    name: &'a str,
}

impl<'a> CollectionRequests<'a> {
    pub(crate) fn new(project: &'a str, name: &'a str) -> Self {
        Self { project, name }
    }

    /// `/{project}/{name}/{segments...}`, each segment percent-encoded.
    fn path(&self, segments: &[&str]) -> String {
        let mut path = format!("/{}/{}", encode(self.project), encode(self.name));
        for segment in segments {
            path.push('/');
            path.push_str(&encode(segment));
        }
        path
    }

    fn with_query(&self, segments: &[&str], query: &str) -> String {
        let path = self.path(segments);
        if query.is_empty() {
            path
        } else {
            format!("{path}?{query}")
        }
    }

    pub(crate) fn create(&self, id: Option<&str>, doc: &Document) -> Request {
        Request::post(self.path(id.as_slice())).json(doc.clone())
    }

    pub(crate) fn get(&self, id: &str) -> Request {
        Request::get(self.path(&[id]))
    }

    pub(crate) fn list(&self, options: &ListOptions) -> Request {
        Request::get(self.with_query(&[], &options.to_query_string()))
    }

    pub(crate) fn update(&self, id: &str, doc: &Document) -> Request {
        Request::put(self.path(&[id])).json(doc.clone())
    }

    pub(crate) fn merge_patch(&self, id: &str, doc: &Document) -> Request {
        Request::patch(self.path(&[id]))
            .json(doc.clone())
            .header("Content-Type", MERGE_PATCH_CONTENT_TYPE)
    }

    pub(crate) fn json_patch(&self, id: &str, operations: &[PatchOperation]) -> Result<Request> {
        let operations = operations.iter().map(patch_to_wire).collect::<Vec<_>>();
        Ok(Request::patch(self.path(&[id]))
            .serialize(&operations)?
            .header("Content-Type", JSON_PATCH_CONTENT_TYPE))
    }

    pub(crate) fn delete(&self, id: &str) -> Request {
        Request::delete(self.path(&[id]))
    }

    pub(crate) fn bulk_create(&self, docs: &[Document]) -> Result<Request> {
        let operations = docs
            .iter()
            .map(|doc| wire::BulkOperation {
                method: "POST",
                id: None,
                body: Some(doc),
            })
            .collect();
        Request::post(self.path(&["_bulk"])).serialize(&wire::BulkRequest { operations })
    }

    pub(crate) fn bulk(&self, operations: &[BulkOperation]) -> Result<Request> {
        let operations = operations.iter().map(bulk_to_wire).collect();
        Request::post(self.path(&["_bulk"])).serialize(&wire::BulkRequest { operations })
    }

    pub(crate) fn count(&self, filter: Option<&Filter>) -> Request {
        Request::get(self.with_query(&[], &count_query_string(filter)))
    }

    pub(crate) fn get_schema(&self) -> Request {
        Request::get(self.path(&["_schema"]))
    }

    pub(crate) fn set_schema(&self, schema: &Value) -> Request {
        Request::put(self.path(&["_schema"])).json(schema.clone())
    }

    pub(crate) fn remove_schema(&self) -> Request {
        Request::delete(self.path(&["_schema"]))
    }

    pub(crate) fn validate(&self, doc: &Document) -> Request {
        Request::post(self.path(&["_validate"])).json(doc.clone())
    }

    pub(crate) fn list_versions(&self, id: &str) -> Request {
        Request::get(self.path(&[id, "versions"]))
    }

    pub(crate) fn get_version(&self, id: &str, version: u64) -> Request {
        Request::get(self.path(&[id, "versions", version.to_string().as_str()]))
    }

    pub(crate) fn restore_version(&self, id: &str, version: u64) -> Request {
        Request::post(self.path(&[id, "versions", version.to_string().as_str(), "restore"]))
    }

    pub(crate) fn diff_versions(&self, id: &str, from: u64, to: u64) -> Request {
        Request::get(self.with_query(
            &[id, "versions", "diff"],
            &format!("from={from}&to={to}"),
        ))
    }

    pub(crate) fn create_webhook(&self, config: &WebhookConfig) -> Result<Request> {
        Request::post(self.path(&["_webhooks"])).serialize(config)
    }

    pub(crate) fn list_webhooks(&self) -> Request {
        Request::get(self.path(&["_webhooks"]))
    }

    pub(crate) fn get_webhook(&self, webhook_id: &str) -> Request {
        Request::get(self.path(&["_webhooks", webhook_id]))
    }

    pub(crate) fn update_webhook(&self, webhook_id: &str, update: &WebhookUpdate) -> Result<Request> {
        Request::put(self.path(&["_webhooks", webhook_id])).serialize(update)
    }

    pub(crate) fn delete_webhook(&self, webhook_id: &str) -> Request {
        Request::delete(self.path(&["_webhooks", webhook_id]))
    }

    pub(crate) fn test_webhook(&self, webhook_id: &str) -> Request {
        Request::post(self.path(&["_webhooks", webhook_id, "test"]))
    }

    pub(crate) fn import(&self, docs: &[Document], options: &ImportOptions) -> Result<Request> {
        let mut parts = Vec::new();
        if let Some(on_conflict) = &options.on_conflict {
            parts.push(format!("onConflict={}", encode(on_conflict)));
        }
        if let Some(id_field) = &options.id_field {
            parts.push(format!("idField={}", encode(id_field)));
        }
        Request::post(self.with_query(&["_import"], &parts.join("&"))).serialize(docs)
    }

    pub(crate) fn export(&self, filter: Option<&Filter>) -> Request {
        let query = filter.map(filter_query_string).unwrap_or_default();
        Request::get(self.with_query(&["_export"], &query))
    }
}

pub(crate) fn list_collections(project: &str) -> Request {
    Request::get(format!("/{}", encode(project)))
}

fn bulk_to_wire(operation: &BulkOperation) -> wire::BulkOperation<'_> {
    match operation {
        BulkOperation::Create { id, body } => wire::BulkOperation {
            method: "POST",
            id: id.as_deref(),
            body: Some(body),
        },
        BulkOperation::Replace { id, body } => wire::BulkOperation {
            method: "PUT",
            id: Some(id.as_str()),
            body: Some(body),
        },
        BulkOperation::Patch { id, body } => wire::BulkOperation {
            method: "PATCH",
            id: Some(id.as_str()),
            body: Some(body),
        },
        BulkOperation::Delete { id } => wire::BulkOperation {
            method: "DELETE",
            id: Some(id.as_str()),
            body: None,
        },
    }
}

fn patch_to_wire(operation: &PatchOperation) -> wire::PatchOperation<'_> {
    let (op, path, value, from) = match operation {
        PatchOperation::Add { path, value } => ("add", path, Some(value), None),
        PatchOperation::Remove { path } => ("remove", path, None, None),
        PatchOperation::Replace { path, value } => ("replace", path, Some(value), None),
        PatchOperation::Move { from, path } => ("move", path, None, Some(from.as_str())),
        PatchOperation::Copy { from, path } => ("copy", path, None, Some(from.as_str())),
        PatchOperation::Test { path, value } => ("test", path, Some(value), None),
    };
    wire::PatchOperation {
        op,
        path,
        value,
        from,
    }
}
