use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::{
    wire, ApiError, ApiErrorKind, BulkItemResult, BulkResult, BulkSummary, Document, FieldError,
    JsonDbError, ListResult, Meta, Result,
};

const UNKNOWN_CODE: &str = "UNKNOWN";
const UNKNOWN_MESSAGE: &str = "Unknown error";

/// Translates a failed response into an [`ApiError`].
///
/// Expects `{"error": {"code", "message", "details"}}`. Missing or malformed
/// fields fall back to `UNKNOWN` / `Unknown error` / empty details; this
/// never fails.
pub fn create_error(status: u16, body: &Value) -> ApiError {
    let descriptor = body.get("error").and_then(Value::as_object);
    let code = descriptor
        .and_then(|error| error.get("code"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_CODE);
    let message = descriptor
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_MESSAGE)
        .to_owned();
    let details = descriptor
        .and_then(|error| error.get("details"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let (kind, canonical_code) = match status {
        401 => (ApiErrorKind::Unauthorized, "UNAUTHORIZED"),
        403 => (ApiErrorKind::Forbidden, "FORBIDDEN"),
        404 => (
            ApiErrorKind::NotFound {
                document_id: document_id(&details),
            },
            "DOCUMENT_NOT_FOUND",
        ),
        409 => (ApiErrorKind::Conflict, "CONFLICT"),
        413 => (ApiErrorKind::DocumentTooLarge, "DOCUMENT_TOO_LARGE"),
        429 if code == "RATE_LIMITED" => (ApiErrorKind::RateLimited, "RATE_LIMITED"),
        429 => (
            ApiErrorKind::QuotaExceeded {
                limit: quota_number(&details, "limit"),
                current: quota_number(&details, "current"),
            },
            "QUOTA_EXCEEDED",
        ),
        400 if code == "VALIDATION_FAILED" => (
            ApiErrorKind::Validation {
                errors: field_errors(&details),
            },
            "VALIDATION_FAILED",
        ),
        500.. => (ApiErrorKind::ServerError, "INTERNAL_ERROR"),
        _ => (ApiErrorKind::Generic, code),
    };

    ApiError {
        message,
        code: canonical_code.to_owned(),
        status,
        details,
        kind,
    }
}

fn document_id(details: &Map<String, Value>) -> Option<String> {
    ["documentId", "document_id"]
        .iter()
        .filter_map(|key| details.get(*key))
        .find_map(|value| match value {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
}

fn quota_number(details: &Map<String, Value>, key: &str) -> Option<Number> {
    match details.get(key) {
        Some(Value::Number(value)) => Some(value.clone()),
        _ => None,
    }
}

fn field_errors(details: &Map<String, Value>) -> Vec<FieldError> {
    let Some(errors) = details.get("errors").and_then(Value::as_array) else {
        return Vec::new();
    };
    errors
        .iter()
        .filter_map(Value::as_object)
        .map(|error| {
            let field = |name: &str| {
                error
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned()
            };
            FieldError {
                path: field("path"),
                message: field("message"),
                keyword: field("keyword"),
            }
        })
        .collect()
}

fn require_body(body: Option<Value>, what: &str) -> Result<Value> {
    body.ok_or_else(|| JsonDbError::Decode(format!("expected {what} in response, got no content")))
}

fn from_body<T: DeserializeOwned>(body: Value, what: &str) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|err| JsonDbError::Decode(format!("invalid {what} response: {err}")))
}

pub(crate) fn decode_document(body: Option<Value>) -> Result<Document> {
    require_body(body, "document")
}

pub(crate) fn decode_list_result(body: Option<Value>) -> Result<ListResult> {
    let response: wire::ListResponse = from_body(require_body(body, "list")?, "list")?;
    Ok(ListResult {
        data: response.data,
        meta: Meta {
            total: response.meta.total,
            limit: response.meta.limit,
            offset: response.meta.offset,
            has_more: response.meta.has_more,
        },
    })
}

pub(crate) fn decode_bulk_result(body: Option<Value>) -> Result<BulkResult> {
    let response: wire::BulkResponse = from_body(require_body(body, "bulk")?, "bulk")?;
    let results = response
        .results
        .into_iter()
        .map(|item| BulkItemResult {
            status: item.status,
            id: item.id,
            ok: item.ok,
            error: item.error.map(|error| match &error {
                Value::String(message) => message.clone(),
                Value::Object(fields) => fields
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| error.to_string()),
                other => other.to_string(),
            }),
        })
        .collect();
    Ok(BulkResult {
        results,
        summary: BulkSummary {
            total: response.summary.total,
            succeeded: response.summary.succeeded,
            failed: response.summary.failed,
        },
    })
}

pub(crate) fn decode_count(body: Option<Value>) -> Result<u64> {
    let response: wire::CountResponse = from_body(require_body(body, "count")?, "count")?;
    Ok(response.count)
}

/// `None` when no schema is set.
pub(crate) fn decode_schema(body: Option<Value>) -> Result<Option<Value>> {
    Ok(body
        .and_then(|mut body| body.get_mut("schema").map(Value::take))
        .filter(|schema| !schema.is_null()))
}

pub(crate) fn decode_documents(body: Option<Value>) -> Result<Vec<Document>> {
    from_body(require_body(body, "document array")?, "document array")
}

/// Accepts both `{"data": [...]}` and a bare array.
pub(crate) fn decode_collection_names(body: Option<Value>) -> Result<Vec<String>> {
    let body = require_body(body, "collection list")?;
    let names = match body {
        Value::Object(mut fields) => fields.remove("data").unwrap_or(Value::Null),
        other => other,
    };
    from_body(names, "collection list")
}
