//! Tree reconstruction on a target system.
//!
//! The whole tree is created with a single `create` call: children are
//! embedded bottom-up as `[0, 0, {values}]` commands, so the server links the
//! hierarchy itself and the operation is all-or-nothing. That is also why
//! unresolvable structure/model/field references abort the import outright -
//! a partially re-wired tree must never be created. Language references are
//! the one soft spot: an unknown code drops the mapping or field with a
//! warning.

use crate::domain::error::SyncError;
use crate::domain::orm::{ManyToOne, OrmCommand};
use crate::domain::records::{ExportDocument, StructureRecord, DATE_DELTA_MIN_SERIES};
use crate::services::client::RemoteApi;
use crate::services::resolver::Resolver;
use anyhow::Context;
use serde_json::{json, Map, Value};

pub struct Importer<'a> {
    api: &'a dyn RemoteApi,
    resolver: Resolver<'a>,
    verbosity: u8,
}

impl<'a> Importer<'a> {
    pub fn new(api: &'a dyn RemoteApi, verbosity: u8) -> Self {
        Self {
            api,
            resolver: Resolver::new(api),
            verbosity,
        }
    }

    /// Create the structure described by `data_file` under `name`. The
    /// name-conflict precondition runs before the file is even opened: update
    /// and create are disjoint operations and update is not implemented.
    pub fn create_from_file(&mut self, data_file: &str, name: &str) -> anyhow::Result<Option<i64>> {
        if self.resolver.try_structure_id_by_name(name)?.is_some() {
            return Err(SyncError::StructureExists(name.to_string()).into());
        }
        let raw = std::fs::read_to_string(data_file)
            .with_context(|| format!("reading data file {data_file}"))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing data file {data_file}"))?;
        if value.get("data_structure").is_none() {
            return Err(SyncError::MalformedDocument(data_file.to_string()).into());
        }
        let document: ExportDocument = serde_json::from_value(value)
            .with_context(|| format!("decoding data file {data_file}"))?;
        if self.verbosity > 1 {
            println!("loaded the data structure from {data_file}");
        }
        self.create_structure(&document, name)
    }

    pub fn create_structure(
        &mut self,
        document: &ExportDocument,
        name: &str,
    ) -> anyhow::Result<Option<i64>> {
        let date_delta_supported = self
            .api
            .info()
            .series()
            .is_some_and(|s| s >= DATE_DELTA_MIN_SERIES);
        let values = self.structure_values(document, name, date_delta_supported)?;
        if self.verbosity > 1 {
            println!("now creating the new data structure {name} with the following values:");
            println!(
                "{}",
                serde_json::to_string_pretty(&values).unwrap_or_default()
            );
        }
        let created = self.api.create(StructureRecord::MODEL, &values)?;
        match created {
            Some(id) => println!("Result: a new data structure has been created with id {id}"),
            None => println!(
                "WARNING: there seems to have been a problem creating the structure, \
                 check the previous messages or increase verbosity"
            ),
        }
        Ok(created)
    }

    fn structure_values(
        &mut self,
        document: &ExportDocument,
        name: &str,
        date_delta_supported: bool,
    ) -> anyhow::Result<Value> {
        let root = &document.data_structure;
        let mut values = Map::new();
        values.insert("name".to_string(), json!(name));
        put_string(&mut values, "field_name", &root.field_name);
        put_string(&mut values, "model_name", &root.model_name);
        put_string(&mut values, "records_domain", &root.records_domain);
        put_string(&mut values, "structure_type", &root.structure_type);
        put_string(&mut values, "value_type", &root.value_type);
        values.insert(
            "is_execute_for_each_record".to_string(),
            json!(root.is_execute_for_each_record),
        );
        values.insert(
            "is_for_specific_records".to_string(),
            json!(root.is_for_specific_records),
        );

        if let Some(id) = self.resolve_structure_ref(&root.child_id, &root.child_name)? {
            values.insert("child_id".to_string(), json!(id));
        }
        if let Some(id) = self.resolve_model_ref(&root.model_id, &root.model_technical_name)? {
            values.insert("model_id".to_string(), json!(id));
        }
        if let Some(id) = self.resolve_field_ref(
            &root.filter_date_field_id,
            &root.filter_date_field_name,
            &root.filter_date_field_model,
        )? {
            values.insert("filter_date_field_id".to_string(), json!(id));
        }

        let mut generators = Vec::new();
        for generator_id in &root.generator_ids {
            if let Some(command) =
                self.generator_command(*generator_id, document, date_delta_supported)?
            {
                generators.push(command);
            }
        }
        values.insert("generator_ids".to_string(), serde_json::to_value(generators)?);

        let mut parsers = Vec::new();
        for parser_id in &root.parser_ids {
            if let Some(command) = self.parser_command(*parser_id, document)? {
                parsers.push(command);
            }
        }
        values.insert("parser_ids".to_string(), serde_json::to_value(parsers)?);

        Ok(Value::Object(values))
    }

    fn generator_command(
        &mut self,
        id: i64,
        document: &ExportDocument,
        date_delta_supported: bool,
    ) -> anyhow::Result<Option<OrmCommand>> {
        let Some(record) = document.generator_structures.get(&id.to_string()) else {
            println!("WARNING: missing data for generator structure {id}, skipping its branch");
            return Ok(None);
        };
        if self.verbosity > 2 {
            println!("building the creation payload for generator structure {id}");
        }
        let mut values = Map::new();
        put_string(&mut values, "field_name", &record.field_name);
        put_string(&mut values, "keyword", &record.keyword);
        put_string(&mut values, "keyword_type", &record.keyword_type);
        put_string(&mut values, "keyword_value", &record.keyword_value);
        put_string(&mut values, "model_name", &record.model_name);
        put_string(&mut values, "records_domain", &record.records_domain);
        put_string(&mut values, "skip_if_value", &record.skip_if_value);
        put_string(&mut values, "structure_value_type", &record.structure_value_type);
        put_string(&mut values, "translation_for", &record.translation_for);
        put_string(&mut values, "value", &record.value);
        put_string(&mut values, "value_type", &record.value_type);
        put_string(&mut values, "value_type_cast", &record.value_type_cast);
        put_i64(&mut values, "sequence", &record.sequence);
        values.insert(
            "is_execute_for_each_record".to_string(),
            json!(record.is_execute_for_each_record),
        );
        values.insert(
            "is_for_specific_records".to_string(),
            json!(record.is_for_specific_records),
        );
        values.insert(
            "is_keyword_dynamic".to_string(),
            json!(record.is_keyword_dynamic),
        );
        values.insert("is_required".to_string(), json!(record.is_required));

        if date_delta_supported {
            put_i64(&mut values, "value_date_delta", &record.value_date_delta);
            put_string(&mut values, "value_date_delta_unit", &record.value_date_delta_unit);
        } else if record.value_date_delta.is_some() || record.value_date_delta_unit.is_some() {
            println!(
                "WARNING: the target system does not support date delta fields, \
                 dropping them from generator structure {id}"
            );
        }

        if let Some(model_id) =
            self.resolve_model_ref(&record.model_id, &record.model_technical_name)?
        {
            values.insert("model_id".to_string(), json!(model_id));
        }
        if let Some(field_id) = self.resolve_field_ref(
            &record.field_id,
            &record.field_ref_name,
            &record.field_ref_model,
        )? {
            values.insert("field_id".to_string(), json!(field_id));
        }
        if let Some(lang_id) = self.resolve_lang_ref(&record.lang_id, &record.lang_code)? {
            values.insert("lang_id".to_string(), json!(lang_id));
        }

        let mut mappings = Vec::new();
        for mapping_id in &record.lang_mapping_ids {
            let Some(mapping) = document.language_mappings.get(&mapping_id.to_string()) else {
                println!("WARNING: missing data for language mapping {mapping_id}, skipping it");
                continue;
            };
            let Some(lang_id) = self.resolve_lang_ref(&mapping.lang_id, &mapping.lang_code)?
            else {
                continue;
            };
            let mut mapping_values = Map::new();
            put_string(&mut mapping_values, "keyword", &mapping.keyword);
            mapping_values.insert("lang_id".to_string(), json!(lang_id));
            mappings.push(OrmCommand::Create(Value::Object(mapping_values)));
        }
        values.insert(
            "lang_mapping_ids".to_string(),
            serde_json::to_value(mappings)?,
        );

        let mut children = Vec::new();
        for child_id in &record.child_ids {
            if let Some(command) =
                self.generator_command(*child_id, document, date_delta_supported)?
            {
                children.push(command);
            }
        }
        values.insert("child_ids".to_string(), serde_json::to_value(children)?);

        Ok(Some(OrmCommand::Create(Value::Object(values))))
    }

    fn parser_command(
        &mut self,
        id: i64,
        document: &ExportDocument,
    ) -> anyhow::Result<Option<OrmCommand>> {
        let Some(record) = document.parser_structures.get(&id.to_string()) else {
            println!("WARNING: missing data for parser structure {id}, skipping its branch");
            return Ok(None);
        };
        if self.verbosity > 2 {
            println!("building the creation payload for parser structure {id}");
        }
        let mut values = Map::new();
        put_string(&mut values, "keyword", &record.keyword);
        put_string(&mut values, "value_type", &record.value_type);

        if let Some(model_id) =
            self.resolve_model_ref(&record.odoo_model_id, &record.model_technical_name)?
        {
            values.insert("odoo_model_id".to_string(), json!(model_id));
        }
        if let Some(field_id) = self.resolve_field_ref(
            &record.field_id,
            &record.field_ref_name,
            &record.field_ref_model,
        )? {
            values.insert("field_id".to_string(), json!(field_id));
        }

        let mut children = Vec::new();
        for child_id in &record.child_ids {
            if let Some(command) = self.parser_command(*child_id, document)? {
                children.push(command);
            }
        }
        values.insert("child_ids".to_string(), serde_json::to_value(children)?);

        Ok(Some(OrmCommand::Create(Value::Object(values))))
    }

    /// Structure references resolve through the exported name; the display
    /// name of the pair doubles as the natural key since data structures are
    /// displayed by name.
    fn resolve_structure_ref(
        &mut self,
        reference: &Option<ManyToOne>,
        name: &Option<String>,
    ) -> anyhow::Result<Option<i64>> {
        let key = name
            .clone()
            .or_else(|| reference.as_ref().map(|m| m.display_name.clone()))
            .filter(|k| !k.is_empty());
        match (reference, key) {
            (None, None) => Ok(None),
            (_, Some(key)) => Ok(Some(self.resolver.structure_id_by_name(&key)?)),
            (Some(reference), None) => {
                Err(SyncError::MissingNaturalKey("data structure", reference.id).into())
            }
        }
    }

    fn resolve_model_ref(
        &mut self,
        reference: &Option<ManyToOne>,
        technical_name: &Option<String>,
    ) -> anyhow::Result<Option<i64>> {
        match (reference, technical_name) {
            (None, None) => Ok(None),
            (_, Some(technical)) => Ok(Some(self.resolver.model_id_by_name(technical)?)),
            (Some(reference), None) => {
                Err(SyncError::MissingNaturalKey("model", reference.id).into())
            }
        }
    }

    fn resolve_field_ref(
        &mut self,
        reference: &Option<ManyToOne>,
        name: &Option<String>,
        model: &Option<String>,
    ) -> anyhow::Result<Option<i64>> {
        match (reference, name, model) {
            (None, None, None) => Ok(None),
            (_, Some(name), Some(model)) => {
                Ok(Some(self.resolver.field_id_by_name_and_model(name, model)?))
            }
            (Some(reference), _, _) => {
                Err(SyncError::MissingNaturalKey("field", reference.id).into())
            }
            (None, _, _) => Ok(None),
        }
    }

    /// Languages are soft references: an unresolvable code is omitted with a
    /// warning instead of aborting the import.
    fn resolve_lang_ref(
        &mut self,
        reference: &Option<ManyToOne>,
        code: &Option<String>,
    ) -> anyhow::Result<Option<i64>> {
        let Some(code) = code.as_deref().filter(|c| !c.is_empty()) else {
            if let Some(reference) = reference {
                println!(
                    "WARNING: language reference {} carries no code, omitting it",
                    reference.id
                );
            }
            return Ok(None);
        };
        let id = self.resolver.lang_id_by_code(code)?;
        if id.is_none() {
            println!("WARNING: language {code} does not exist on the target system, omitting it");
        }
        Ok(id)
    }
}

fn put_string(values: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        values.insert(key.to_string(), json!(value));
    }
}

fn put_i64(values: &mut Map<String, Value>, key: &str, value: &Option<i64>) {
    if let Some(value) = value {
        values.insert(key.to_string(), json!(value));
    }
}
