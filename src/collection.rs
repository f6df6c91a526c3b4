use serde_json::Value;

use crate::{
    decode::{
        decode_bulk_result, decode_count, decode_document, decode_documents, decode_list_result,
        decode_schema,
    },
    request::CollectionRequests,
    BulkOperation, BulkResult, Document, Filter, ImportOptions, JsonDb, ListOptions, ListResult,
    PatchOperation, Result, WebhookConfig, WebhookUpdate,
};

/// Async handle to one collection. Obtain it with [`JsonDb::collection`].
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
    pub async fn create(&self, doc: &Document) -> Result<Document> {
        let body = self.client.request(self.requests().create(None, doc)).await?;
        decode_document(body)
    }

    /// Creates a document under an explicit id.
    pub async fn create_with_id(&self, id: &str, doc: &Document) -> Result<Document> {
        let body = self
            .client
            .request(self.requests().create(Some(id), doc))
            .await?;
        decode_document(body)
    }

    pub async fn get(&self, id: &str) -> Result<Document> {
        let body = self.client.request(self.requests().get(id)).await?;
        decode_document(body)
    }

    /// Lists documents with optional filtering, sorting and pagination.
    pub async fn list(&self, options: &ListOptions) -> Result<ListResult> {
        let body = self.client.request(self.requests().list(options)).await?;
        decode_list_result(body)
    }

    /// Replaces a document entirely.
    pub async fn update(&self, id: &str, doc: &Document) -> Result<Document> {
        let body = self.client.request(self.requests().update(id, doc)).await?;
        decode_document(body)
    }

    /// Partially updates a document with RFC 7396 merge-patch semantics.
    pub async fn patch(&self, id: &str, doc: &Document) -> Result<Document> {
        let body = self
            .client
            .request(self.requests().merge_patch(id, doc))
            .await?;
        decode_document(body)
    }

    /// Applies RFC 6902 JSON Patch operations in order.
    pub async fn json_patch(&self, id: &str, operations: &[PatchOperation]) -> Result<Document> {
        let request = self.requests().json_patch(id, operations)?;
        let body = self.client.request(request).await?;
        decode_document(body)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.request(self.requests().delete(id)).await?;
        Ok(())
    }

    /// Creates several documents in one request.
    pub async fn bulk_create(&self, docs: &[Document]) -> Result<BulkResult> {
        let request = self.requests().bulk_create(docs)?;
        let body = self.client.request(request).await?;
        decode_bulk_result(body)
    }

    /// Runs mixed create/replace/patch/delete operations in one request.
    pub async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResult> {
        let request = self.requests().bulk(operations)?;
        let body = self.client.request(request).await?;
        decode_bulk_result(body)
    }

    pub async fn count(&self, filter: Option<&Filter>) -> Result<u64> {
        let body = self.client.request(self.requests().count(filter)).await?;
        decode_count(body)
    }

    /// Returns the collection's JSON Schema, or `None` when unset.
    pub async fn get_schema(&self) -> Result<Option<Value>> {
        let body = self.client.request(self.requests().get_schema()).await?;
        decode_schema(body)
    }

    pub async fn set_schema(&self, schema: &Value) -> Result<()> {
        self.client
            .request(self.requests().set_schema(schema))
            .await?;
        Ok(())
    }

    pub async fn remove_schema(&self) -> Result<()> {
        self.client.request(self.requests().remove_schema()).await?;
        Ok(())
    }

    /// Validates a document against the schema without storing it.
    pub async fn validate(&self, doc: &Document) -> Result<Value> {
        let body = self.client.request(self.requests().validate(doc)).await?;
        decode_document(body)
    }

    pub async fn list_versions(&self, id: &str) -> Result<Value> {
        let body = self.client.request(self.requests().list_versions(id)).await?;
        decode_document(body)
    }

    pub async fn get_version(&self, id: &str, version: u64) -> Result<Document> {
        let body = self
            .client
            .request(self.requests().get_version(id, version))
            .await?;
        decode_document(body)
    }

    pub async fn restore_version(&self, id: &str, version: u64) -> Result<Document> {
        let body = self
            .client
            .request(self.requests().restore_version(id, version))
            .await?;
        decode_document(body)
    }

    pub async fn diff_versions(&self, id: &str, from: u64, to: u64) -> Result<Value> {
        let body = self
            .client
            .request(self.requests().diff_versions(id, from, to))
            .await?;
        decode_document(body)
    }

    pub async fn create_webhook(&self, config: &WebhookConfig) -> Result<Value> {
        let request = self.requests().create_webhook(config)?;
        let body = self.client.request(request).await?;
        decode_document(body)
    }

    pub async fn list_webhooks(&self) -> Result<Value> {
        let body = self.client.request(self.requests().list_webhooks()).await?;
        decode_document(body)
    }

    /// Returns webhook details including recent deliveries.
    pub async fn get_webhook(&self, webhook_id: &str) -> Result<Value> {
        let body = self
            .client
            .request(self.requests().get_webhook(webhook_id))
            .await?;
        decode_document(body)
    }

    pub async fn update_webhook(&self, webhook_id: &str, update: &WebhookUpdate) -> Result<Value> {
        let request = self.requests().update_webhook(webhook_id, update)?;
        let body = self.client.request(request).await?;
        decode_document(body)
    }

    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        self.client
            .request(self.requests().delete_webhook(webhook_id))
            .await?;
        Ok(())
    }

    /// Sends a test event and returns the delivery record.
    pub async fn test_webhook(&self, webhook_id: &str) -> Result<Value> {
        let body = self
            .client
            .request(self.requests().test_webhook(webhook_id))
            .await?;
        decode_document(body)
    }

    pub async fn import_documents(
        &self,
        docs: &[Document],
        options: &ImportOptions,
    ) -> Result<Value> {
        let request = self.requests().import(docs, options)?;
        let body = self.client.request(request).await?;
        decode_document(body)
    }

    /// Exports all documents, optionally filtered.
    pub async fn export_documents(&self, filter: Option<&Filter>) -> Result<Vec<Document>> {
        let body = self.client.request(self.requests().export(filter)).await?;
        decode_documents(body)
    }
}
