//! Recursive tree export.
//!
//! A data structure is read root-first: the root record, then every
//! generator node depth-first (each fetched by id), then the language
//! mappings of all generators in one batched call per generator, then every
//! parser node. The result is flattened into id-keyed maps so the document
//! mirrors what the import side needs: parents hold ordered child-id lists,
//! children live in the flat maps.
//!
//! Cross-references leave the system as `<field>.<descriptor>` natural-key
//! annotations next to the numeric pair, e.g. `model_id` gains a
//! `model_id.model` sibling.

use crate::domain::records::{
    ExportDocument, GeneratorRecord, LangMappingRecord, ParserRecord, StructureRecord,
};
use crate::services::client::RemoteApi;
use crate::services::resolver::Resolver;
use anyhow::Context;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub export_meta: bool,
    pub export_no_import: bool,
    pub partial_match: bool,
}

pub struct Exporter<'a> {
    api: &'a dyn RemoteApi,
    resolver: Resolver<'a>,
    verbosity: u8,
    opts: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(api: &'a dyn RemoteApi, opts: ExportOptions, verbosity: u8) -> Self {
        Self {
            api,
            resolver: Resolver::new(api),
            verbosity,
            opts,
        }
    }

    /// Export every structure whose name matches one of `names` (all
    /// structures when `names` is empty). Returns the written file names.
    pub fn export_structures(
        &mut self,
        names: &[String],
        data_file: &str,
    ) -> anyhow::Result<Vec<String>> {
        let domain = name_union_domain(names, self.opts.partial_match);
        if self.verbosity > 1 {
            println!("INFO: data.structure to export {domain}");
        }
        let rows = self
            .api
            .search_read(StructureRecord::MODEL, &domain, &["name"], None)?;
        if rows.is_empty() && self.verbosity > 0 {
            println!("INFO: no matching data structures found");
        }
        let mut written = Vec::new();
        for row in rows {
            let Some(name) = row.get("name").and_then(Value::as_str) else {
                continue;
            };
            let file_name = target_file_name(name, data_file);
            if self.export_structure(name, Path::new(&file_name))? {
                written.push(file_name);
            }
        }
        Ok(written)
    }

    pub fn export_structure(&mut self, name: &str, path: &Path) -> anyhow::Result<bool> {
        let Some(document) = self.export_document(name)? else {
            println!("WARNING: did not get any data for structure {name}, nothing written");
            return Ok(false);
        };
        std::fs::write(path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("writing data file {}", path.display()))?;
        if self.verbosity > 0 {
            println!(
                "INFO: the data structure {name} has been read and written to the file {}",
                path.display()
            );
        }
        Ok(true)
    }

    pub fn export_document(&mut self, name: &str) -> anyhow::Result<Option<ExportDocument>> {
        let info = self.api.info();
        let series = info.series();
        let structure_fields =
            StructureRecord::export_fields(self.opts.export_meta, self.opts.export_no_import);
        let generator_fields = GeneratorRecord::export_fields(
            series,
            self.opts.export_meta,
            self.opts.export_no_import,
        );
        let parser_fields =
            ParserRecord::export_fields(self.opts.export_meta, self.opts.export_no_import);
        let mapping_fields =
            LangMappingRecord::export_fields(self.opts.export_meta, self.opts.export_no_import);

        if self.verbosity > 1 {
            println!("looking for and exporting the data.structure named {name}");
        }
        let rows = self.api.search_read(
            StructureRecord::MODEL,
            &json!([["name", "=", name]]),
            &structure_fields,
            Some(1),
        )?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let mut root: StructureRecord =
            serde_json::from_value(row).context("decoding the data.structure record")?;
        self.annotate_structure(&mut root)?;

        let mut generators = BTreeMap::new();
        for generator_id in root.generator_ids.clone() {
            self.read_generator(generator_id, &generator_fields, &mut generators)?;
        }

        let mut mappings = BTreeMap::new();
        for (generator_id, generator) in &generators {
            if self.verbosity > 2 {
                println!(
                    "checking generator {generator_id} for language mappings and found {:?}",
                    generator.lang_mapping_ids
                );
            }
            if !generator.lang_mapping_ids.is_empty() {
                let ids = generator.lang_mapping_ids.clone();
                self.read_language_mappings(&ids, &mapping_fields, &mut mappings)?;
            }
        }

        let mut parsers = BTreeMap::new();
        for parser_id in root.parser_ids.clone() {
            self.read_parser(parser_id, &parser_fields, &mut parsers)?;
        }

        Ok(Some(ExportDocument {
            api: info.api,
            user: info.user,
            host: Some(info.host),
            data_structure: root,
            generator_structures: generators,
            parser_structures: parsers,
            language_mappings: mappings,
        }))
    }

    fn read_generator(
        &mut self,
        id: i64,
        fields: &[&str],
        out: &mut BTreeMap<String, GeneratorRecord>,
    ) -> anyhow::Result<()> {
        if self.verbosity > 1 {
            println!("looking for and exporting the generate.data.structure with id {id}");
        }
        let rows = self.api.search_read(
            GeneratorRecord::MODEL,
            &json!([["id", "=", id]]),
            fields,
            Some(1),
        )?;
        let Some(row) = rows.into_iter().next() else {
            println!("WARNING: generator structure {id} could not be read, skipping its branch");
            return Ok(());
        };
        let mut record: GeneratorRecord = serde_json::from_value(row)
            .with_context(|| format!("decoding generator structure {id}"))?;
        self.annotate_generator(&mut record)?;
        let child_ids = record.child_ids.clone();
        out.insert(id.to_string(), record);
        for child_id in child_ids {
            self.read_generator(child_id, fields, out)?;
        }
        Ok(())
    }

    fn read_language_mappings(
        &mut self,
        ids: &[i64],
        fields: &[&str],
        out: &mut BTreeMap<String, LangMappingRecord>,
    ) -> anyhow::Result<()> {
        if self.verbosity > 1 {
            println!("looking for and exporting the language.mapping with ids {ids:?}");
        }
        let rows = self.api.search_read(
            LangMappingRecord::MODEL,
            &json!([["id", "in", ids]]),
            fields,
            None,
        )?;
        for row in rows {
            let mut record: LangMappingRecord =
                serde_json::from_value(row).context("decoding a language.mapping record")?;
            self.annotate_mapping(&mut record)?;
            let Some(id) = record.id else {
                println!("WARNING: language mapping row without an id, skipping it");
                continue;
            };
            out.insert(id.to_string(), record);
        }
        Ok(())
    }

    fn read_parser(
        &mut self,
        id: i64,
        fields: &[&str],
        out: &mut BTreeMap<String, ParserRecord>,
    ) -> anyhow::Result<()> {
        if self.verbosity > 1 {
            println!("looking for and exporting the parse.data.structure with id {id}");
        }
        let rows = self.api.search_read(
            ParserRecord::MODEL,
            &json!([["id", "=", id]]),
            fields,
            Some(1),
        )?;
        let Some(row) = rows.into_iter().next() else {
            println!("WARNING: parser structure {id} could not be read, skipping its branch");
            return Ok(());
        };
        let mut record: ParserRecord = serde_json::from_value(row)
            .with_context(|| format!("decoding parser structure {id}"))?;
        self.annotate_parser(&mut record)?;
        let child_ids = record.child_ids.clone();
        out.insert(id.to_string(), record);
        for child_id in child_ids {
            self.read_parser(child_id, fields, out)?;
        }
        Ok(())
    }

    fn annotate_structure(&mut self, record: &mut StructureRecord) -> anyhow::Result<()> {
        if let Some(child) = &record.child_id {
            record.child_name = self.resolver.structure_name_by_id(child.id)?;
        }
        if let Some(model) = &record.model_id {
            record.model_technical_name = self.resolver.model_name_by_id(model.id)?;
        }
        if let Some(field) = &record.filter_date_field_id {
            if let Some((name, model)) = self.resolver.field_key_by_id(field.id)? {
                record.filter_date_field_name = Some(name);
                record.filter_date_field_model = Some(model);
            }
        }
        Ok(())
    }

    fn annotate_generator(&mut self, record: &mut GeneratorRecord) -> anyhow::Result<()> {
        if let Some(model) = &record.model_id {
            record.model_technical_name = self.resolver.model_name_by_id(model.id)?;
        }
        if let Some(field) = &record.field_id {
            if let Some((name, model)) = self.resolver.field_key_by_id(field.id)? {
                record.field_ref_name = Some(name);
                record.field_ref_model = Some(model);
            }
        }
        if let Some(lang) = &record.lang_id {
            record.lang_code = self.resolver.lang_code_by_id(lang.id)?;
        }
        Ok(())
    }

    fn annotate_parser(&mut self, record: &mut ParserRecord) -> anyhow::Result<()> {
        if let Some(model) = &record.odoo_model_id {
            record.model_technical_name = self.resolver.model_name_by_id(model.id)?;
        }
        if let Some(field) = &record.field_id {
            if let Some((name, model)) = self.resolver.field_key_by_id(field.id)? {
                record.field_ref_name = Some(name);
                record.field_ref_model = Some(model);
            }
        }
        Ok(())
    }

    fn annotate_mapping(&mut self, record: &mut LangMappingRecord) -> anyhow::Result<()> {
        if let Some(lang) = &record.lang_id {
            record.lang_code = self.resolver.lang_code_by_id(lang.id)?;
        }
        Ok(())
    }
}

/// Union of name predicates in Odoo's prefix notation: n-1 leading `|`
/// operators followed by one triple per name.
fn name_union_domain(names: &[String], partial: bool) -> Value {
    let operator = if partial { "ilike" } else { "=" };
    let mut terms = vec![Value::from("|"); names.len().saturating_sub(1)];
    for name in names {
        terms.push(json!(["name", operator, name]));
    }
    Value::Array(terms)
}

/// Replace the `{}` placeholder with the structure name stripped down to
/// alphanumerics, and make sure the file ends in `.json`.
fn target_file_name(structure: &str, data_file: &str) -> String {
    let sanitized: String = structure
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let mut file = data_file.replace("{}", &sanitized);
    if !file.to_lowercase().ends_with(".json") {
        file.push_str(".json");
    }
    file
}
