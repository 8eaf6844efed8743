//! Typed records for the exportable tree.
//!
//! One struct per remote model, with optional fields spelled out as `Option`
//! instead of key absence. The same structs serve both directions: they are
//! deserialized from `search_read` rows on export and read back from the data
//! file on import. Natural-key annotations (`model_id.model`, `lang_id.code`,
//! ...) live next to the reference they describe so a document stays
//! portable across systems with different id spaces.

use crate::domain::orm::{self, ManyToOne};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Odoo series that introduced the date-delta generator fields.
pub const DATE_DELTA_MIN_SERIES: u32 = 14;

/// Audit-trail fields, identical on every model.
const META_FIELDS: [&str; 5] = [
    "__last_update",
    "create_date",
    "create_uid",
    "write_date",
    "write_uid",
];

/// Root record of an exportable tree (`data.structure`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureRecord {
    pub name: String,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub is_execute_for_each_record: bool,
    #[serde(default)]
    pub is_for_specific_records: bool,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub records_domain: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub structure_type: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub child_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub filter_date_field_id: Option<ManyToOne>,

    #[serde(default)]
    pub generator_ids: Vec<i64>,
    #[serde(default)]
    pub parser_ids: Vec<i64>,

    // natural-key annotations, filled in by the exporter
    #[serde(rename = "child_id.name", default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(rename = "model_id.model", default, skip_serializing_if = "Option::is_none")]
    pub model_technical_name: Option<String>,
    #[serde(rename = "filter_date_field_id.name", default, skip_serializing_if = "Option::is_none")]
    pub filter_date_field_name: Option<String>,
    #[serde(rename = "filter_date_field_id.model", default, skip_serializing_if = "Option::is_none")]
    pub filter_date_field_model: Option<String>,

    #[serde(rename = "__last_update", default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub create_uid: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub write_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub write_uid: Option<ManyToOne>,

    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl StructureRecord {
    pub const MODEL: &'static str = "data.structure";

    const SIMPLE: [&'static str; 8] = [
        "field_name",
        "is_execute_for_each_record",
        "is_for_specific_records",
        "model_name",
        "name",
        "records_domain",
        "structure_type",
        "value_type",
    ];
    const MANY2ONE: [&'static str; 3] = ["child_id", "filter_date_field_id", "model_id"];
    const ONE2MANY: [&'static str; 2] = ["generator_ids", "parser_ids"];
    const NO_IMPORT: [&'static str; 2] = ["display_name", "id"];

    pub fn export_fields(meta: bool, no_import: bool) -> Vec<&'static str> {
        assemble_fields(&Self::SIMPLE, &Self::MANY2ONE, &Self::ONE2MANY, &Self::NO_IMPORT, meta, no_import)
    }
}

/// Generator node (`generate.data.structure`), recursive via `child_ids`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorRecord {
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub is_execute_for_each_record: bool,
    #[serde(default)]
    pub is_for_specific_records: bool,
    #[serde(default)]
    pub is_keyword_dynamic: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub keyword_type: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub keyword_value: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub records_domain: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_i64", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub skip_if_value: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub structure_value_type: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub translation_for: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub value_type_cast: Option<String>,

    // only served by series >= 14
    #[serde(default, deserialize_with = "orm::opt_i64", skip_serializing_if = "Option::is_none")]
    pub value_date_delta: Option<i64>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub value_date_delta_unit: Option<String>,

    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub field_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub lang_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ManyToOne>,

    #[serde(default)]
    pub child_ids: Vec<i64>,
    #[serde(default)]
    pub lang_mapping_ids: Vec<i64>,

    #[serde(rename = "field_id.name", default, skip_serializing_if = "Option::is_none")]
    pub field_ref_name: Option<String>,
    #[serde(rename = "field_id.model", default, skip_serializing_if = "Option::is_none")]
    pub field_ref_model: Option<String>,
    #[serde(rename = "lang_id.code", default, skip_serializing_if = "Option::is_none")]
    pub lang_code: Option<String>,
    #[serde(rename = "model_id.model", default, skip_serializing_if = "Option::is_none")]
    pub model_technical_name: Option<String>,

    #[serde(rename = "__last_update", default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub create_uid: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub write_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub write_uid: Option<ManyToOne>,

    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<ManyToOne>,
}

impl GeneratorRecord {
    pub const MODEL: &'static str = "generate.data.structure";

    const SIMPLE: [&'static str; 17] = [
        "field_name",
        "is_execute_for_each_record",
        "is_for_specific_records",
        "is_keyword_dynamic",
        "is_required",
        "keyword",
        "keyword_type",
        "keyword_value",
        "model_name",
        "records_domain",
        "sequence",
        "skip_if_value",
        "structure_value_type",
        "translation_for",
        "value",
        "value_type",
        "value_type_cast",
    ];
    const SIMPLE_DATE_DELTA: [&'static str; 2] = ["value_date_delta", "value_date_delta_unit"];
    const MANY2ONE: [&'static str; 4] = ["field_id", "lang_id", "model_id", "parent_id"];
    const ONE2MANY: [&'static str; 2] = ["child_ids", "lang_mapping_ids"];
    const NO_IMPORT: [&'static str; 3] = ["display_name", "id", "structure_id"];

    pub fn export_fields(series: Option<u32>, meta: bool, no_import: bool) -> Vec<&'static str> {
        let mut fields = assemble_fields(
            &Self::SIMPLE,
            &Self::MANY2ONE,
            &Self::ONE2MANY,
            &Self::NO_IMPORT,
            meta,
            no_import,
        );
        if series.is_some_and(|s| s >= DATE_DELTA_MIN_SERIES) {
            fields.extend_from_slice(&Self::SIMPLE_DATE_DELTA);
        }
        fields
    }
}

/// Parser node (`parse.data.structure`), recursive via `child_ids`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserRecord {
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub field_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub odoo_model_id: Option<ManyToOne>,

    #[serde(default)]
    pub child_ids: Vec<i64>,

    #[serde(rename = "field_id.name", default, skip_serializing_if = "Option::is_none")]
    pub field_ref_name: Option<String>,
    #[serde(rename = "field_id.model", default, skip_serializing_if = "Option::is_none")]
    pub field_ref_model: Option<String>,
    #[serde(rename = "odoo_model_id.model", default, skip_serializing_if = "Option::is_none")]
    pub model_technical_name: Option<String>,

    #[serde(rename = "__last_update", default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub create_uid: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub write_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub write_uid: Option<ManyToOne>,

    #[serde(default)]
    pub available_odoo_mapping_field_ids: Vec<i64>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<ManyToOne>,
}

impl ParserRecord {
    pub const MODEL: &'static str = "parse.data.structure";

    const SIMPLE: [&'static str; 2] = ["keyword", "value_type"];
    const MANY2ONE: [&'static str; 2] = ["field_id", "odoo_model_id"];
    const ONE2MANY: [&'static str; 1] = ["child_ids"];
    const NO_IMPORT: [&'static str; 5] = [
        "available_odoo_mapping_field_ids",
        "display_name",
        "id",
        "parent_id",
        "structure_id",
    ];

    pub fn export_fields(meta: bool, no_import: bool) -> Vec<&'static str> {
        assemble_fields(&Self::SIMPLE, &Self::MANY2ONE, &Self::ONE2MANY, &Self::NO_IMPORT, meta, no_import)
    }
}

/// Per-language keyword override attached to a generator (`language.mapping`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LangMappingRecord {
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub lang_id: Option<ManyToOne>,

    #[serde(rename = "lang_id.code", default, skip_serializing_if = "Option::is_none")]
    pub lang_code: Option<String>,

    #[serde(rename = "__last_update", default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub create_uid: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub write_date: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub write_uid: Option<ManyToOne>,

    #[serde(default, deserialize_with = "orm::opt_string", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "orm::opt_m2o", skip_serializing_if = "Option::is_none")]
    pub generator_id: Option<ManyToOne>,
    #[serde(default, deserialize_with = "orm::opt_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl LangMappingRecord {
    pub const MODEL: &'static str = "language.mapping";

    const SIMPLE: [&'static str; 1] = ["keyword"];
    const MANY2ONE: [&'static str; 1] = ["lang_id"];
    const NO_IMPORT: [&'static str; 3] = ["display_name", "generator_id", "id"];

    pub fn export_fields(meta: bool, no_import: bool) -> Vec<&'static str> {
        assemble_fields(&Self::SIMPLE, &Self::MANY2ONE, &[], &Self::NO_IMPORT, meta, no_import)
    }
}

/// Top-level shape of an exported data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub data_structure: StructureRecord,
    #[serde(default)]
    pub generator_structures: BTreeMap<String, GeneratorRecord>,
    #[serde(default)]
    pub parser_structures: BTreeMap<String, ParserRecord>,
    #[serde(default)]
    pub language_mappings: BTreeMap<String, LangMappingRecord>,
}

fn assemble_fields(
    simple: &[&'static str],
    many2one: &[&'static str],
    one2many: &[&'static str],
    no_import: &[&'static str],
    meta: bool,
    with_no_import: bool,
) -> Vec<&'static str> {
    let mut fields = Vec::with_capacity(simple.len() + many2one.len() + one2many.len() + 7);
    fields.extend_from_slice(simple);
    fields.extend_from_slice(one2many);
    fields.extend_from_slice(many2one);
    if meta {
        fields.extend_from_slice(&META_FIELDS);
    }
    if with_no_import {
        fields.extend_from_slice(no_import);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generator_field_list_is_gated_on_the_remote_series() {
        let old = GeneratorRecord::export_fields(Some(13), false, false);
        assert!(!old.contains(&"value_date_delta"));
        let new = GeneratorRecord::export_fields(Some(14), false, false);
        assert!(new.contains(&"value_date_delta"));
        assert!(new.contains(&"value_date_delta_unit"));
        let unknown = GeneratorRecord::export_fields(None, false, false);
        assert!(!unknown.contains(&"value_date_delta"));
    }

    #[test]
    fn meta_and_no_import_fields_are_opt_in() {
        let plain = StructureRecord::export_fields(false, false);
        assert!(!plain.contains(&"create_date"));
        assert!(!plain.contains(&"id"));
        let full = StructureRecord::export_fields(true, true);
        assert!(full.contains(&"create_date"));
        assert!(full.contains(&"__last_update"));
        assert!(full.contains(&"id"));
    }

    #[test]
    fn structure_row_deserializes_from_the_wire_shape() {
        let record: StructureRecord = serde_json::from_value(json!({
            "name": "Invoice Sync",
            "field_name": false,
            "model_name": "account.move",
            "records_domain": false,
            "structure_type": "export",
            "value_type": "json",
            "is_execute_for_each_record": true,
            "is_for_specific_records": false,
            "child_id": false,
            "model_id": [7, "Journal Entry"],
            "filter_date_field_id": false,
            "generator_ids": [3, 5],
            "parser_ids": []
        }))
        .unwrap();
        assert_eq!(record.name, "Invoice Sync");
        assert_eq!(record.field_name, None);
        assert_eq!(record.model_id.as_ref().map(|m| m.id), Some(7));
        assert_eq!(record.generator_ids, vec![3, 5]);
        assert!(record.parser_ids.is_empty());
    }

    #[test]
    fn annotations_round_trip_through_the_document() {
        let mut record = LangMappingRecord {
            keyword: Some("city".to_string()),
            lang_id: Some(ManyToOne {
                id: 2,
                display_name: "English (US)".to_string(),
            }),
            ..Default::default()
        };
        record.lang_code = Some("en_US".to_string());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["lang_id.code"], "en_US");
        let back: LangMappingRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.lang_code.as_deref(), Some("en_US"));
    }
}
