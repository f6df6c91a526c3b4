use serde_json::Value;

use super::JsonDb;
use crate::{
    decode::{
        decode_bulk_result, decode_count, decode_document, decode_documents, decode_list_result,
        decode_schema,
    },
    request::CollectionRequests,
    BulkOperation, BulkResult, Document, Filter, ImportOptions, ListOptions, ListResult,
    PatchOperation, Result, WebhookConfig, WebhookUpdate,
};

/// Blocking handle to one collection. Obtain it with [`JsonDb::collection`].
#[derive(Clone, Debug)]
pub struct Collection<'a> {
    client: &'a JsonDb,
    name: String,
}

impl<'a> Collection<'a> {
    pub(crate) fn new(client: &'a JsonDb, name: String) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project(&self) -> &str {
        &self.client.options().project
    }

    fn requests(&self) -> CollectionRequests<'_> {
        CollectionRequests::new(self.project(), &self.name)
    }

    /// Creates a document with a server-generated id.
    pub fn create(&self, doc: &Document) -> Result<Document> {
        let body = self.client.request(self.requests().create(None, doc))?;
        decode_document(body)
    }

    /// Creates a document under an explicit id.
    pub fn create_with_id(&self, id: &str, doc: &Document) -> Result<Document> {
        let body = self.client.request(self.requests().create(Some(id), doc))?;
        decode_document(body)
    }

    pub fn get(&self, id: &str) -> Result<Document> {
        let body = self.client.request(self.requests().get(id))?;
        decode_document(body)
    }

    /// Lists documents with optional filtering, sorting and pagination.
    pub fn list(&self, options: &ListOptions) -> Result<ListResult> {
        let body = self.client.request(self.requests().list(options))?;
        decode_list_result(body)
    }

    /// Replaces a document entirely.
    pub fn update(&self, id: &str, doc: &Document) -> Result<Document> {
        let body = self.client.request(self.requests().update(id, doc))?;
        decode_document(body)
    }

    /// Partially updates a document with RFC 7396 merge-patch semantics.
    pub fn patch(&self, id: &str, doc: &Document) -> Result<Document> {
        let body = self.client.request(self.requests().merge_patch(id, doc))?;
        decode_document(body)
    }

    /// Applies RFC 6902 JSON Patch operations in order.
    pub fn json_patch(&self, id: &str, operations: &[PatchOperation]) -> Result<Document> {
        let request = self.requests().json_patch(id, operations)?;
        let body = self.client.request(request)?;
        decode_document(body)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.client.request(self.requests().delete(id))?;
        Ok(())
    }

    /// Creates several documents in one request.
    pub fn bulk_create(&self, docs: &[Document]) -> Result<BulkResult> {
        let request = self.requests().bulk_create(docs)?;
        let body = self.client.request(request)?;
        decode_bulk_result(body)
    }

    /// Runs mixed create/replace/patch/delete operations in one request.
    pub fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResult> {
        let request = self.requests().bulk(operations)?;
        let body = self.client.request(request)?;
        decode_bulk_result(body)
    }

    pub fn count(&self, filter: Option<&Filter>) -> Result<u64> {
        let body = self.client.request(self.requests().count(filter))?;
        decode_count(body)
    }

    /// Returns the collection's JSON Schema, or `None` when unset.
    pub fn get_schema(&self) -> Result<Option<Value>> {
        let body = self.client.request(self.requests().get_schema())?;
        decode_schema(body)
    }

    pub fn set_schema(&self, schema: &Value) -> Result<()> {
        self.client.request(self.requests().set_schema(schema))?;
        Ok(())
    }

    pub fn remove_schema(&self) -> Result<()> {
        self.client.request(self.requests().remove_schema())?;
        Ok(())
    }

    /// Validates a document against the schema without storing it.
    pub fn validate(&self, doc: &Document) -> Result<Value> {
        let body = self.client.request(self.requests().validate(doc))?;
        decode_document(body)
    }

    pub fn list_versions(&self, id: &str) -> Result<Value> {
        let body = self.client.request(self.requests().list_versions(id))?;
        decode_document(body)
    }

    pub fn get_version(&self, id: &str, version: u64) -> Result<Document> {
        let body = self.client.request(self.requests().get_version(id, version))?;
        decode_document(body)
    }

    pub fn restore_version(&self, id: &str, version: u64) -> Result<Document> {
        let body = self.client.request(self.requests().restore_version(id, version))?;
        decode_document(body)
    }

    pub fn diff_versions(&self, id: &str, from: u64, to: u64) -> Result<Value> {
        let body = self.client.request(self.requests().diff_versions(id, from, to))?;
        decode_document(body)
    }

    pub fn create_webhook(&self, config: &WebhookConfig) -> Result<Value> {
        let request = self.requests().create_webhook(config)?;
        let body = self.client.request(request)?;
        decode_document(body)
    }

    pub fn list_webhooks(&self) -> Result<Value> {
        let body = self.client.request(self.requests().list_webhooks())?;
        decode_document(body)
    }

    /// Returns webhook details including recent deliveries.
    pub fn get_webhook(&self, webhook_id: &str) -> Result<Value> {
        let body = self.client.request(self.requests().get_webhook(webhook_id))?;
        decode_document(body)
    }

    pub fn update_webhook(&self, webhook_id: &str, update: &WebhookUpdate) -> Result<Value> {
        let request = self.requests().update_webhook(webhook_id, update)?;
        let body = self.client.request(request)?;
        decode_document(body)
    }

    pub fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        self.client.request(self.requests().delete_webhook(webhook_id))?;
        Ok(())
    }

    /// Sends a test event and returns the delivery record.
    pub fn test_webhook(&self, webhook_id: &str) -> Result<Value> {
        let body = self.client.request(self.requests().test_webhook(webhook_id))?;
        decode_document(body)
    }

    pub fn import_documents(
        &self,
        docs: &[Document],
        options: &ImportOptions,
    ) -> Result<Value> {
        let request = self.requests().import(docs, options)?;
        let body = self.client.request(request)?;
        decode_document(body)
    }

    /// Exports all documents, optionally filtered.
    pub fn export_documents(&self, filter: Option<&Filter>) -> Result<Vec<Document>> {
        let body = self.client.request(self.requests().export(filter))?;
        decode_documents(body)
    }
}
