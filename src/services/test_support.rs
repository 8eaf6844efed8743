//! In-memory remote for unit tests: a handful of seeded models, a tiny
//! domain evaluator, and call recording. Read failures can be injected per
//! record to mimic a non-2xx response (which the client surfaces as an empty
//! result).

use crate::services::client::{Method, RemoteApi, RemoteInfo};
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub struct FakeRemote {
    records: RefCell<HashMap<String, Vec<Map<String, Value>>>>,
    pub created: RefCell<Vec<(String, Value)>>,
    calls: Cell<u64>,
    fail_reads: RefCell<HashSet<(String, i64)>>,
    info: RemoteInfo,
    next_id: Cell<i64>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::with_api("16.0")
    }

    pub fn with_api(api: &str) -> Self {
        Self {
            records: RefCell::new(HashMap::new()),
            created: RefCell::new(Vec::new()),
            calls: Cell::new(0),
            fail_reads: RefCell::new(HashSet::new()),
            info: RemoteInfo {
                host: "https://odoo.test".to_string(),
                api: Some(api.to_string()),
                user: Some("admin".to_string()),
            },
            next_id: Cell::new(1000),
        }
    }

    pub fn insert(&self, model: &str, record: Value) -> i64 {
        let mut map = record
            .as_object()
            .cloned()
            .expect("fake records must be objects");
        let id = match map.get("id").and_then(Value::as_i64) {
            Some(id) => id,
            None => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                map.insert("id".to_string(), json!(id));
                id
            }
        };
        self.records
            .borrow_mut()
            .entry(model.to_string())
            .or_default()
            .push(map);
        id
    }

    /// Make every `id = <id>` read of this record behave like a non-2xx
    /// response: the call returns an empty result.
    pub fn fail_read(&self, model: &str, id: i64) {
        self.fail_reads.borrow_mut().insert((model.to_string(), id));
    }

    pub fn calls(&self) -> u64 {
        self.calls.get()
    }
}

impl RemoteApi for FakeRemote {
    fn execute(
        &self,
        endpoint: &str,
        method: Method,
        payload: &[(&str, String)],
    ) -> anyhow::Result<Option<Value>> {
        self.calls.set(self.calls.get() + 1);
        match endpoint {
            "search_read" => {
                let model = param(payload, "model").unwrap_or_default();
                let domain: Value =
                    serde_json::from_str(&param(payload, "domain").unwrap_or_else(|| "[]".into()))?;
                let fields: Vec<String> =
                    serde_json::from_str(&param(payload, "fields").unwrap_or_else(|| "[]".into()))?;
                let limit = param(payload, "limit").and_then(|l| l.parse::<usize>().ok());
                if let Some(id) = single_id_domain(&domain) {
                    if self.fail_reads.borrow().contains(&(model.clone(), id)) {
                        return Ok(None);
                    }
                }
                let records = self.records.borrow();
                let mut rows: Vec<Value> = records
                    .get(&model)
                    .map(|rows| {
                        rows.iter()
                            .filter(|r| domain_matches(&domain, r))
                            .map(|r| project(r, &fields))
                            .collect()
                    })
                    .unwrap_or_default();
                if let Some(n) = limit {
                    rows.truncate(n);
                }
                Ok(Some(Value::Array(rows)))
            }
            "create" => {
                anyhow::ensure!(method == Method::Post, "create must be a POST");
                let model = param(payload, "model").unwrap_or_default();
                let values: Value =
                    serde_json::from_str(&param(payload, "values").unwrap_or_else(|| "{}".into()))?;
                self.created.borrow_mut().push((model, values));
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                Ok(Some(json!(id)))
            }
            _ => Ok(Some(json!({}))),
        }
    }

    fn info(&self) -> RemoteInfo {
        self.info.clone()
    }
}

fn param(payload: &[(&str, String)], key: &str) -> Option<String> {
    payload.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
}

fn single_id_domain(domain: &Value) -> Option<i64> {
    let terms = domain.as_array()?;
    if terms.len() != 1 {
        return None;
    }
    let parts = terms[0].as_array()?;
    if parts.first()?.as_str()? == "id" && parts.get(1)?.as_str()? == "=" {
        parts.get(2)?.as_i64()
    } else {
        None
    }
}

fn domain_matches(domain: &Value, record: &Map<String, Value>) -> bool {
    let Some(terms) = domain.as_array() else {
        return true;
    };
    let triples: Vec<&Value> = terms.iter().filter(|t| t.is_array()).collect();
    if triples.is_empty() {
        return true;
    }
    // leading "|" operators union the triples, Odoo prefix style
    if terms.iter().any(|t| t == "|") {
        triples.iter().any(|t| triple_matches(t, record))
    } else {
        triples.iter().all(|t| triple_matches(t, record))
    }
}

fn triple_matches(triple: &Value, record: &Map<String, Value>) -> bool {
    let Some(parts) = triple.as_array() else {
        return false;
    };
    let (Some(field), Some(op)) = (
        parts.first().and_then(Value::as_str),
        parts.get(1).and_then(Value::as_str),
    ) else {
        return false;
    };
    let expected = parts.get(2).cloned().unwrap_or(Value::Null);
    let mut actual = record.get(field).cloned().unwrap_or(Value::Bool(false));
    // many2one values are stored as [id, name]; domains compare on the id
    if let (true, Value::Array(pair)) = (field.ends_with("_id"), &actual) {
        actual = pair.first().cloned().unwrap_or(Value::Null);
    }
    match op {
        "=" => match &expected {
            Value::Array(list) => list.contains(&actual),
            _ => actual == expected,
        },
        "in" => expected
            .as_array()
            .map(|l| l.contains(&actual))
            .unwrap_or(false),
        "ilike" => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => a.to_lowercase().contains(&e.to_lowercase()),
            _ => false,
        },
        _ => false,
    }
}

fn project(record: &Map<String, Value>, fields: &[String]) -> Value {
    let mut out = Map::new();
    out.insert(
        "id".to_string(),
        record.get("id").cloned().unwrap_or(Value::Null),
    );
    for field in fields {
        if field == "id" {
            continue;
        }
        // absent one2many fields come back as empty lists, everything else
        // as Odoo's false
        let missing = if field.ends_with("_ids") {
            json!([])
        } else {
            Value::Bool(false)
        };
        out.insert(field.clone(), record.get(field).cloned().unwrap_or(missing));
    }
    Value::Object(out)
}

/// Seed the "Invoice Sync" fixture tree: one root with a generator owning two
/// child generators and one `en_US` language mapping, plus a two-level parser
/// branch and the descriptor rows everything references.
pub fn seed_invoice_sync(remote: &FakeRemote) {
    remote.insert(
        "ir.model",
        json!({"id": 70, "model": "account.move", "name": "Journal Entry"}),
    );
    remote.insert(
        "ir.model.fields",
        json!({"id": 700, "name": "invoice_date", "model": "account.move"}),
    );
    remote.insert(
        "res.lang",
        json!({"id": 2, "code": "en_US", "name": "English (US)"}),
    );
    remote.insert(
        "data.structure",
        json!({
            "id": 1,
            "name": "Invoice Sync",
            "field_name": false,
            "is_execute_for_each_record": true,
            "is_for_specific_records": false,
            "model_name": "account.move",
            "records_domain": "[]",
            "structure_type": "export",
            "value_type": "json",
            "child_id": false,
            "model_id": [70, "Journal Entry"],
            "filter_date_field_id": [700, "Invoice Date"],
            "generator_ids": [10],
            "parser_ids": [30]
        }),
    );
    remote.insert(
        "generate.data.structure",
        json!({
            "id": 10,
            "keyword": "invoice",
            "keyword_type": "static",
            "sequence": 1,
            "value_type": "object",
            "is_required": true,
            "model_id": [70, "Journal Entry"],
            "child_ids": [11, 12],
            "lang_mapping_ids": [20]
        }),
    );
    remote.insert(
        "generate.data.structure",
        json!({
            "id": 11,
            "keyword": "number",
            "keyword_type": "static",
            "sequence": 1,
            "value": "name",
            "value_type": "char",
            "child_ids": [],
            "lang_mapping_ids": []
        }),
    );
    remote.insert(
        "generate.data.structure",
        json!({
            "id": 12,
            "keyword": "date",
            "keyword_type": "static",
            "sequence": 2,
            "value_type": "date",
            "field_id": [700, "Invoice Date"],
            "child_ids": [],
            "lang_mapping_ids": []
        }),
    );
    remote.insert(
        "language.mapping",
        json!({
            "id": 20,
            "keyword": "invoice_us",
            "lang_id": [2, "English (US)"]
        }),
    );
    remote.insert(
        "parse.data.structure",
        json!({
            "id": 30,
            "keyword": "status",
            "value_type": "object",
            "odoo_model_id": [70, "Journal Entry"],
            "child_ids": [31]
        }),
    );
    remote.insert(
        "parse.data.structure",
        json!({
            "id": 31,
            "keyword": "code",
            "value_type": "char",
            "child_ids": []
        }),
    );
}
