//! In-memory PostgREST emulator for integration tests
//!
//! Supports the subset the client uses: `eq`/`neq`/`in`/`is` filters, a single
//! `order`, `limit`/`offset`, inserts (with `(whisper_id, user_id)`
//! uniqueness on `likes`), merge-duplicate upserts, patches and deletes.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use whisperchain::api::WhisperApi;
use whisperchain::rest::{HttpRequest, HttpResponse, Method, RestClient, Transport, TransportError};
use whisperchain::transform::IdentityTransformer;

/// Unique key columns per table
fn unique_key(table: &str) -> Option<&'static [&'static str]> {
    match table {
        "likes" => Some(&["whisper_id", "user_id"]),
        "follows" => Some(&["follower_id", "following_id"]),
        _ => None,
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<HttpRequest>>,
    clock: AtomicI64,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Timestamps handed out in strictly increasing order
    pub fn next_timestamp(&self) -> String {
        let tick = self.clock.fetch_add(1, AtomicOrdering::SeqCst);
        timestamp(tick)
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let (table, params) = match parse_url(&request.url) {
            Some(parsed) => parsed,
            None => return reply(404, json!({"message": "unknown path"})),
        };

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.clone()).or_default();

        let filters: Vec<(String, String)> = params
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "select" | "order" | "limit" | "offset" | "on_conflict"))
            .cloned()
            .collect();
        let param = |name: &str| params.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());

        match request.method {
            Method::Get => {
                let mut matched: Vec<Value> = rows
                    .iter()
                    .filter(|row| matches_all(row, &filters))
                    .cloned()
                    .collect();

                if let Some(order) = param("order") {
                    let (column, direction) = order.rsplit_once('.').unwrap_or((order.as_str(), "asc"));
                    matched.sort_by(|a, b| {
                        let ord = compare(&a[column], &b[column]);
                        if direction == "desc" { ord.reverse() } else { ord }
                    });
                }

                let offset = param("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
                let limit = param("limit").and_then(|v| v.parse().ok()).unwrap_or(usize::MAX);
                let page: Vec<Value> = matched.into_iter().skip(offset).take(limit).collect();
                reply(200, Value::Array(page))
            }
            Method::Post => {
                let merge = request
                    .header("Prefer")
                    .map(|p| p.contains("resolution=merge-duplicates"))
                    .unwrap_or(false);
                let conflict_column = param("on_conflict");

                let incoming = match request.body.clone() {
                    Some(Value::Array(items)) => items,
                    Some(Value::Object(obj)) => vec![Value::Object(obj)],
                    _ => return reply(400, json!({"message": "missing body"})),
                };

                let mut written = Vec::new();
                for item in incoming {
                    if merge {
                        if let Some(column) = &conflict_column {
                            if let Some(existing) = rows.iter_mut().find(|r| r[column.as_str()] == item[column.as_str()]) {
                                merge_into(existing, &item);
                                written.push(existing.clone());
                                continue;
                            }
                        }
                    }

                    if let Some(key) = unique_key(&table) {
                        let duplicate = rows.iter().any(|r| key.iter().all(|c| r[*c] == item[*c]));
                        if duplicate {
                            return reply(
                                409,
                                json!({"code": "23505", "message": "duplicate key value violates unique constraint"}),
                            );
                        }
                    }

                    let row = self.with_defaults(&table, item);
                    rows.push(row.clone());
                    written.push(row);
                }
                reply(201, Value::Array(written))
            }
            Method::Patch => {
                let patch = request.body.clone().unwrap_or(Value::Null);
                let mut written = Vec::new();
                for row in rows.iter_mut().filter(|row| matches_all(row, &filters)) {
                    merge_into(row, &patch);
                    written.push(row.clone());
                }
                reply(200, Value::Array(written))
            }
            Method::Delete => {
                let (removed, kept): (Vec<Value>, Vec<Value>) =
                    rows.drain(..).partition(|row| matches_all(row, &filters));
                *rows = kept;
                reply(200, Value::Array(removed))
            }
        }
    }

    fn with_defaults(&self, table: &str, item: Value) -> Value {
        let mut row = match item {
            Value::Object(obj) => obj,
            _ => Map::new(),
        };
        row.entry("id").or_insert_with(|| json!(Uuid::new_v4().to_string()));
        row.entry("created_at").or_insert_with(|| json!(self.next_timestamp()));
        if table == "whispers" {
            row.entry("likes_count").or_insert(json!(0));
            row.entry("chain_count").or_insert(json!(0));
            row.entry("is_published").or_insert(json!(true));
        }
        Value::Object(row)
    }
}

#[async_trait]
impl Transport for MemoryBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.handle(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

fn reply(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

fn parse_url(url: &str) -> Option<(String, Vec<(String, String)>)> {
    let path_and_query = url.split_once("/rest/v1/")?.1;
    let (table, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((
                urlencoding::decode(k).ok()?.into_owned(),
                urlencoding::decode(v).ok()?.into_owned(),
            ))
        })
        .collect();

    Some((table.to_string(), params))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_all(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, expr)| matches_filter(&row[column.as_str()], expr))
}

fn matches_filter(value: &Value, expr: &str) -> bool {
    let (op, operand) = match expr.split_once('.') {
        Some(parts) => parts,
        None => return false,
    };
    match op {
        "eq" => scalar(value) == operand,
        "neq" => scalar(value) != operand,
        "is" => scalar(value) == operand,
        "in" => {
            let inner = operand.trim_start_matches('(').trim_end_matches(')');
            inner
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_matches('"'))
                .any(|candidate| scalar(value) == candidate)
        }
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => scalar(a).cmp(&scalar(b)),
    }
}

fn merge_into(row: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(source)) = (row, patch) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
}

/// RFC 3339 timestamp `tick` seconds after a fixed epoch
pub fn timestamp(tick: i64) -> String {
    let base: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (base + Duration::seconds(tick)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A whisper row as the datastore would hold it
pub fn whisper_row(id: &str, user_id: &str, text: &str, likes: i64, chains: i64, tick: i64) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "original_text": text,
        "transformed_text": format!("softly: {}", text),
        "theme_id": null,
        "likes_count": likes,
        "chain_count": chains,
        "is_published": true,
        "created_at": timestamp(tick),
    })
}

/// API wired to a fresh backend; the transform returns text unchanged
pub fn setup() -> (Arc<MemoryBackend>, WhisperApi) {
    let backend = MemoryBackend::new();
    // Seeded rows use ticks below this
    backend.clock.store(1_000_000, AtomicOrdering::SeqCst);
    let client = RestClient::new("http://backend.test", "anon-key", backend.clone());
    let api = WhisperApi::new(client, Arc::new(IdentityTransformer));
    (backend, api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        let (table, params) =
            parse_url("http://backend.test/rest/v1/likes?select=%2A&id=in.%28a%2Cb%29").unwrap();
        assert_eq!(table, "likes");
        assert_eq!(params[0], ("select".to_string(), "*".to_string()));
        assert_eq!(params[1], ("id".to_string(), "in.(a,b)".to_string()));
    }

    #[test]
    fn test_matches_filter() {
        assert!(matches_filter(&json!("a"), "in.(a,b)"));
        assert!(!matches_filter(&json!("c"), "in.(a,b)"));
        assert!(!matches_filter(&json!("c"), "in.()"));
        assert!(matches_filter(&json!(true), "eq.true"));
        assert!(matches_filter(&json!(5), "eq.5"));
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        assert!(timestamp(9) < timestamp(10));
        assert!(timestamp(59) < timestamp(3600));
    }
}
