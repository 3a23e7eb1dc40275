use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::client::error::ExecutorError;
use crate::client::executor::{Connection, Connector, QueryPage};
use crate::data::{Field, Row, Schema, Value, ValueKind};

/// Rows requested per page. Collection caps are applied by the caller;
/// this only bounds a single response body.
const PAGE_SIZE: usize = 500;

/// Production transport: HTTP/JSON against the query service.
///
/// Building a connection is local work with no round trip, so an
/// unreachable backend only surfaces on the first submit.
pub struct HttpConnector {
    client: reqwest::Client,
    endpoint: String,
    bearer: Option<String>,
    batch_priority: bool,
    timeout: Option<Duration>,
}

impl HttpConnector {
    /// `timeout` is forwarded to the backend as the server-side query
    /// limit; zero means "backend default/maximum".
    pub fn new(
        endpoint: String,
        bearer: Option<String>,
        batch_priority: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bearer,
            batch_priority,
            timeout: (!timeout.is_zero()).then_some(timeout),
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, target: &str) -> Result<Arc<dyn Connection>, ExecutorError> {
        Ok(Arc::new(HttpConnection {
            client: self.client.clone(),
            url: format!("{}/v1/projects/{}/queries", self.endpoint, target),
            target: target.to_string(),
            bearer: self.bearer.clone(),
            batch_priority: self.batch_priority,
            timeout_ms: self.timeout.map(|t| t.as_millis() as u64),
        }))
    }
}

struct HttpConnection {
    client: reqwest::Client,
    url: String,
    target: String,
    bearer: Option<String>,
    batch_priority: bool,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    batch_priority: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRequest<'a> {
    page_token: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    schema: WireSchema,
    #[serde(default)]
    rows: Vec<Vec<JsonValue>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireSchema {
    #[serde(default)]
    fields: Vec<WireField>,
}

#[derive(Debug, Deserialize)]
struct WireField {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    fields: Vec<WireField>,
    #[serde(default)]
    repeated: bool,
}

impl WireField {
    fn to_field(&self) -> Field {
        let base = match ValueKind::from_wire(&self.kind) {
            ValueKind::Record(_) => {
                ValueKind::Record(self.fields.iter().map(WireField::to_field).collect())
            }
            other => other,
        };
        let kind = if self.repeated {
            ValueKind::Repeated(Box::new(base))
        } else {
            base
        };
        Field::new(self.name.clone(), kind)
    }
}

impl HttpConnection {
    async fn fetch(&self, builder: reqwest::RequestBuilder) -> Result<QueryPage, ExecutorError> {
        let builder = match &self.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await.map_err(|e| self.unreachable(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            };
            // 4xx means the backend understood us and said no to this
            // query; everything else is the connection's fault.
            return Err(if status.is_client_error() {
                ExecutorError::Query(message)
            } else {
                ExecutorError::Connection {
                    target: self.target.clone(),
                    message,
                }
            });
        }

        let decoded: QueryResponse = response.json().await.map_err(|e| self.unreachable(e))?;
        Ok(decode_page(decoded))
    }

    fn unreachable(&self, error: reqwest::Error) -> ExecutorError {
        ExecutorError::Connection {
            target: self.target.clone(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn run_query(&self, text: &str) -> Result<QueryPage, ExecutorError> {
        debug!(project = %self.target, "POST {}", self.url);
        let request = QueryRequest {
            query: text,
            max_results: PAGE_SIZE,
            timeout_ms: self.timeout_ms,
            batch_priority: self.batch_priority,
        };
        self.fetch(self.client.post(&self.url).json(&request)).await
    }

    async fn next_page(&self, token: &str) -> Result<QueryPage, ExecutorError> {
        let request = PageRequest {
            page_token: token,
            max_results: PAGE_SIZE,
        };
        self.fetch(
            self.client
                .post(format!("{}/pages", self.url))
                .json(&request),
        )
        .await
    }

    async fn close(&self) -> Result<(), ExecutorError> {
        // reqwest pools connections internally; dropping the client on
        // the last clone releases them.
        Ok(())
    }
}

fn decode_page(response: QueryResponse) -> QueryPage {
    let schema = Schema::new(
        response
            .schema
            .fields
            .iter()
            .map(WireField::to_field)
            .collect(),
    );

    let rows = response
        .rows
        .into_iter()
        .map(|cells| {
            let values = if schema.is_empty() {
                // A page without a schema still decodes; the kinds are
                // inferred from the JSON itself.
                cells.iter().map(infer_value).collect()
            } else {
                schema
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        let cell = cells.get(i).unwrap_or(&JsonValue::Null);
                        Value::from_json(&field.kind, cell)
                    })
                    .collect()
            };
            Row::new(values)
        })
        .collect();

    QueryPage {
        schema,
        rows,
        next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
    }
}

fn infer_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(items) => Value::Repeated(items.iter().map(infer_value).collect()),
        JsonValue::Object(map) => Value::Record(
            map.iter()
                .map(|(name, value)| (name.clone(), infer_value(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_response(body: JsonValue) -> QueryResponse {
        serde_json::from_value(body).expect("valid wire body")
    }

    #[test]
    fn decodes_schema_rows_and_token() {
        let page = decode_page(wire_response(json!({
            "schema": {"fields": [
                {"name": "id", "type": "INT64"},
                {"name": "name", "type": "STRING"},
            ]},
            "rows": [["7", "acme"], [null, "zenith"]],
            "nextPageToken": "tok-1",
        })));

        assert_eq!(page.schema.field_names(), vec!["id", "name"]);
        assert_eq!(page.rows[0].values[0], Value::Integer(7));
        assert_eq!(page.rows[1].values[0], Value::Null);
        assert_eq!(page.next_page_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn repeated_record_fields_decode_recursively() {
        let page = decode_page(wire_response(json!({
            "schema": {"fields": [
                {"name": "tags", "type": "STRING", "repeated": true},
                {"name": "owner", "type": "RECORD", "fields": [
                    {"name": "id", "type": "INT64"},
                ]},
            ]},
            "rows": [[["a", "b"], {"id": "3"}]],
        })));

        assert_eq!(
            page.rows[0].values[0],
            Value::Repeated(vec![Value::Text("a".into()), Value::Text("b".into())])
        );
        assert_eq!(
            page.rows[0].values[1],
            Value::Record(vec![("id".to_string(), Value::Integer(3))])
        );
    }

    #[test]
    fn missing_schema_falls_back_to_inference() {
        let page = decode_page(wire_response(json!({
            "rows": [[1, true, "x", null]],
        })));
        assert_eq!(page.rows[0].values[0], Value::Integer(1));
        assert_eq!(page.rows[0].values[1], Value::Boolean(true));
        assert_eq!(page.rows[0].values[3], Value::Null);
    }

    #[test]
    fn empty_page_token_means_no_more_pages() {
        let page = decode_page(wire_response(json!({
            "schema": {"fields": []},
            "rows": [],
            "nextPageToken": "",
        })));
        assert!(page.next_page_token.is_none());
    }
}
