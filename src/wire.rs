use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct BulkRequest<'a> {
    pub operations: Vec<BulkOperation<'a>>,
}

#[derive(Debug, Serialize)]
pub struct BulkOperation<'a> {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
pub struct PatchOperation<'a> {
    pub op: &'static str,
    pub path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListResponse {
    pub data: Vec<Value>,
    pub meta: Meta,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meta {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            total: 0,
            limit: 25,
            offset: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkResponse {
    pub results: Vec<BulkResultItem>,
    pub summary: BulkSummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkResultItem {
    pub status: u16,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub ok: bool,
    pub error: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}
