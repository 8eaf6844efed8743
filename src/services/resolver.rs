//! Bidirectional id / natural-key resolution with per-operation memoization.
//!
//! Numeric ids are only meaningful on one system; natural keys (structure
//! name, model technical name, field name + model, language code) travel in
//! the exported document instead. A `Resolver` is constructed fresh for one
//! export or import and never outlives it.
//!
//! Structure, model and field lookups are hard: a miss on the target system
//! makes the whole tree impossible to create. Language lookups are soft and
//! yield `None`.

use crate::domain::error::SyncError;
use crate::services::client::RemoteApi;
use serde_json::{json, Value};
use std::collections::HashMap;

pub struct Resolver<'a> {
    api: &'a dyn RemoteApi,
    structure_ids: HashMap<String, Option<i64>>,
    model_ids: HashMap<String, Option<i64>>,
    field_ids: HashMap<(String, String), Option<i64>>,
    lang_ids: HashMap<String, Option<i64>>,
    structure_names: HashMap<i64, Option<String>>,
    model_names: HashMap<i64, Option<String>>,
    field_keys: HashMap<i64, Option<(String, String)>>,
    lang_codes: HashMap<i64, Option<String>>,
}

impl<'a> Resolver<'a> {
    pub fn new(api: &'a dyn RemoteApi) -> Self {
        Self {
            api,
            structure_ids: HashMap::new(),
            model_ids: HashMap::new(),
            field_ids: HashMap::new(),
            lang_ids: HashMap::new(),
            structure_names: HashMap::new(),
            model_names: HashMap::new(),
            field_keys: HashMap::new(),
            lang_codes: HashMap::new(),
        }
    }

    fn first_match(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
    ) -> anyhow::Result<Option<Value>> {
        let rows = self.api.search_read(model, &domain, fields, Some(1))?;
        Ok(rows.into_iter().next())
    }

    /// Like [`Self::structure_id_by_name`] but a miss is `Ok(None)`; the
    /// importer's name-conflict precondition needs the non-failing form.
    pub fn try_structure_id_by_name(&mut self, name: &str) -> anyhow::Result<Option<i64>> {
        if let Some(hit) = self.structure_ids.get(name) {
            return Ok(*hit);
        }
        let row = self.first_match("data.structure", json!([["name", "=", name]]), &["id"])?;
        let id = row.and_then(|r| r.get("id").and_then(Value::as_i64));
        self.structure_ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn structure_id_by_name(&mut self, name: &str) -> anyhow::Result<i64> {
        self.try_structure_id_by_name(name)?
            .ok_or_else(|| SyncError::StructureNotFound(name.to_string()).into())
    }

    pub fn model_id_by_name(&mut self, model: &str) -> anyhow::Result<i64> {
        if let Some(hit) = self.model_ids.get(model) {
            return hit.ok_or_else(|| SyncError::ModelNotFound(model.to_string()).into());
        }
        let row = self.first_match("ir.model", json!([["model", "=", model]]), &["id"])?;
        let id = row.and_then(|r| r.get("id").and_then(Value::as_i64));
        self.model_ids.insert(model.to_string(), id);
        id.ok_or_else(|| SyncError::ModelNotFound(model.to_string()).into())
    }

    pub fn field_id_by_name_and_model(
        &mut self,
        name: &str,
        model: &str,
    ) -> anyhow::Result<i64> {
        let key = (name.to_string(), model.to_string());
        if let Some(hit) = self.field_ids.get(&key) {
            return hit.ok_or_else(|| {
                SyncError::FieldNotFound(name.to_string(), model.to_string()).into()
            });
        }
        let row = self.first_match(
            "ir.model.fields",
            json!([["name", "=", name], ["model", "=", model]]),
            &["id"],
        )?;
        let id = row.and_then(|r| r.get("id").and_then(Value::as_i64));
        self.field_ids.insert(key, id);
        id.ok_or_else(|| SyncError::FieldNotFound(name.to_string(), model.to_string()).into())
    }

    pub fn lang_id_by_code(&mut self, code: &str) -> anyhow::Result<Option<i64>> {
        if let Some(hit) = self.lang_ids.get(code) {
            return Ok(*hit);
        }
        let row = self.first_match("res.lang", json!([["code", "=", code]]), &["id"])?;
        let id = row.and_then(|r| r.get("id").and_then(Value::as_i64));
        self.lang_ids.insert(code.to_string(), id);
        Ok(id)
    }

    pub fn structure_name_by_id(&mut self, id: i64) -> anyhow::Result<Option<String>> {
        if let Some(hit) = self.structure_names.get(&id) {
            return Ok(hit.clone());
        }
        let row = self.first_match("data.structure", json!([["id", "=", id]]), &["name"])?;
        let name = row.and_then(|r| r.get("name").and_then(Value::as_str).map(str::to_string));
        if name.is_none() {
            println!("WARNING: no data structure with id {id} on the remote system");
        }
        self.structure_names.insert(id, name.clone());
        Ok(name)
    }

    pub fn model_name_by_id(&mut self, id: i64) -> anyhow::Result<Option<String>> {
        if let Some(hit) = self.model_names.get(&id) {
            return Ok(hit.clone());
        }
        let row = self.first_match("ir.model", json!([["id", "=", id]]), &["model"])?;
        let name = row.and_then(|r| r.get("model").and_then(Value::as_str).map(str::to_string));
        if name.is_none() {
            println!("WARNING: no model with id {id} on the remote system");
        }
        self.model_names.insert(id, name.clone());
        Ok(name)
    }

    pub fn field_key_by_id(&mut self, id: i64) -> anyhow::Result<Option<(String, String)>> {
        if let Some(hit) = self.field_keys.get(&id) {
            return Ok(hit.clone());
        }
        let row = self.first_match(
            "ir.model.fields",
            json!([["id", "=", id]]),
            &["name", "model"],
        )?;
        let key = row.and_then(|r| {
            let name = r.get("name").and_then(Value::as_str)?.to_string();
            let model = r.get("model").and_then(Value::as_str)?.to_string();
            Some((name, model))
        });
        if key.is_none() {
            println!("WARNING: no field with id {id} on the remote system");
        }
        self.field_keys.insert(id, key.clone());
        Ok(key)
    }

    pub fn lang_code_by_id(&mut self, id: i64) -> anyhow::Result<Option<String>> {
        if let Some(hit) = self.lang_codes.get(&id) {
            return Ok(hit.clone());
        }
        let row = self.first_match("res.lang", json!([["id", "=", id]]), &["code"])?;
        let code = row.and_then(|r| r.get("code").and_then(Value::as_str).map(str::to_string));
        if code.is_none() {
            println!("WARNING: no language with id {id} on the remote system");
        }
        self.lang_codes.insert(id, code.clone());
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_invoice_sync, FakeRemote};

    #[test]
    fn forward_lookups_are_memoized() {
        let remote = FakeRemote::new();
        seed_invoice_sync(&remote);
        let mut resolver = Resolver::new(&remote);
        assert_eq!(resolver.model_id_by_name("account.move").unwrap(), 70);
        let after_first = remote.calls();
        assert_eq!(resolver.model_id_by_name("account.move").unwrap(), 70);
        assert_eq!(remote.calls(), after_first);
    }

    #[test]
    fn reverse_lookups_are_memoized_by_id() {
        let remote = FakeRemote::new();
        seed_invoice_sync(&remote);
        let mut resolver = Resolver::new(&remote);
        assert_eq!(
            resolver.field_key_by_id(700).unwrap(),
            Some(("invoice_date".to_string(), "account.move".to_string()))
        );
        let after_first = remote.calls();
        assert_eq!(
            resolver.field_key_by_id(700).unwrap(),
            Some(("invoice_date".to_string(), "account.move".to_string()))
        );
        assert_eq!(remote.calls(), after_first);
    }

    #[test]
    fn missing_structure_model_and_field_are_hard_errors() {
        let remote = FakeRemote::new();
        let mut resolver = Resolver::new(&remote);
        let err = resolver.structure_id_by_name("Nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::StructureNotFound(_))
        ));
        let err = resolver.model_id_by_name("no.model").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::ModelNotFound(_))
        ));
        let err = resolver
            .field_id_by_name_and_model("nope", "no.model")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::FieldNotFound(..))
        ));
    }

    #[test]
    fn missing_language_is_soft_and_the_miss_is_cached() {
        let remote = FakeRemote::new();
        let mut resolver = Resolver::new(&remote);
        assert_eq!(resolver.lang_id_by_code("xx_XX").unwrap(), None);
        let after_first = remote.calls();
        assert_eq!(resolver.lang_id_by_code("xx_XX").unwrap(), None);
        assert_eq!(remote.calls(), after_first);
    }

    #[test]
    fn hard_lookup_misses_are_cached_too() {
        let remote = FakeRemote::new();
        let mut resolver = Resolver::new(&remote);
        assert!(resolver.model_id_by_name("no.model").is_err());
        let after_first = remote.calls();
        assert!(resolver.model_id_by_name("no.model").is_err());
        assert_eq!(remote.calls(), after_first);
    }
}
