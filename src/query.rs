use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes one path segment or query component.
pub(crate) fn encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Comparison operator of a field filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Membership; array values are sent comma-joined.
    In,
    Contains,
    Exists,
    /// Any operator name the server understands but this enum does not list.
    Other(String),
}

impl FilterOp {
    /// Parses an operator name, with or without the `$` prefix.
    pub fn parse(name: &str) -> Self {
        match name.trim_start_matches('$') {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "in" => Self::In,
            "contains" => Self::Contains,
            "exists" => Self::Exists,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Exists => "exists",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of field conditions, rendered as `filter[...]` query parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, FilterOp, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(field, FilterOp::Eq, value)
    }

    /// Adds a membership condition.
    pub fn is_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.op(field, FilterOp::In, Value::Array(values))
    }

    /// Adds a condition with an arbitrary operator.
    pub fn op(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), op, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Brackets stay literal; fields, operators and values are encoded.
    fn write_to(&self, parts: &mut Vec<String>) {
        for (field, op, value) in &self.conditions {
            let field = encode(field);
            match (op, value) {
                (FilterOp::Eq, value) => {
                    parts.push(format!("filter[{field}]={}", render_value(value)));
                }
                (FilterOp::In, Value::Array(values)) => {
                    let joined = values.iter().map(render_value).collect::<Vec<_>>().join(",");
                    parts.push(format!("filter[{field}][in]={joined}"));
                }
                (op, value) => {
                    let op = encode(op.as_str());
                    parts.push(format!("filter[{field}][{op}]={}", render_value(value)));
                }
            }
        }
    }
}

/// Filtering, sorting, pagination and projection for `list`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    pub filter: Option<Filter>,
    /// Field name, prefixed with `-` for descending order.
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Fields to return; empty returns whole documents.
    pub select: Vec<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(filter) = &self.filter {
            filter.write_to(&mut parts);
        }
        if let Some(sort) = &self.sort {
            parts.push(format!("sort={}", encode(sort)));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("offset={offset}"));
        }
        if !self.select.is_empty() {
            let fields = self.select.iter().map(|field| encode(field));
            parts.push(format!("select={}", fields.collect::<Vec<_>>().join(",")));
        }
        parts.join("&")
    }
}

/// Query string for a count request: the filter followed by `count=true`.
pub(crate) fn count_query_string(filter: Option<&Filter>) -> String {
    let mut parts = Vec::new();
    if let Some(filter) = filter {
        filter.write_to(&mut parts);
    }
    parts.push("count=true".to_owned());
    parts.join("&")
}

pub(crate) fn filter_query_string(filter: &Filter) -> String {
    let mut parts = Vec::new();
    filter.write_to(&mut parts);
    parts.join("&")
}

/// Strings are sent unquoted, everything else as its JSON text; both encoded.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => encode(text),
        other => encode(&other.to_string()),
    }
}
