//! Odoo wire conventions.
//!
//! Two shapes keep coming back in the REST payloads: many2one fields are
//! `[id, "display name"]` (or `false` when unset), and one2many collections
//! are written with command triples like `[0, 0, {values}]`. Both get an
//! explicit type here instead of leaking raw `serde_json::Value` through the
//! rest of the crate.

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A many2one reference as Odoo serializes it: numeric id plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToOne {
    pub id: i64,
    pub display_name: String,
}

impl Serialize for ManyToOne {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.id)?;
        seq.serialize_element(&self.display_name)?;
        seq.end()
    }
}

/// One2many write commands. The remote create call takes an ordered list of
/// these per collection field; `Create` carries the nested record inline.
#[derive(Debug, Clone, PartialEq)]
pub enum OrmCommand {
    /// `[0, 0, values]` - create a new linked record.
    Create(Value),
    /// `[1, id, values]` - update an existing linked record.
    Update(i64, Value),
    /// `[3, id, 0]` - detach a linked record without deleting it.
    Unlink(i64),
    /// `[4, id, 0]` - attach an existing record.
    Link(i64),
}

impl Serialize for OrmCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        match self {
            Self::Create(values) => {
                seq.serialize_element(&0)?;
                seq.serialize_element(&0)?;
                seq.serialize_element(values)?;
            }
            Self::Update(id, values) => {
                seq.serialize_element(&1)?;
                seq.serialize_element(id)?;
                seq.serialize_element(values)?;
            }
            Self::Unlink(id) => {
                seq.serialize_element(&3)?;
                seq.serialize_element(id)?;
                seq.serialize_element(&0)?;
            }
            Self::Link(id) => {
                seq.serialize_element(&4)?;
                seq.serialize_element(id)?;
                seq.serialize_element(&0)?;
            }
        }
        seq.end()
    }
}

/// Odoo returns `false` for empty char/selection fields; map that to `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Odoo returns `false` for empty numeric fields; map that to `None`.
pub fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64())
}

/// Many2one fields arrive as `[id, "display name"]` or `false`.
pub fn opt_m2o<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ManyToOne>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(None);
    };
    let Some(id) = items.first().and_then(Value::as_i64) else {
        return Ok(None);
    };
    let display_name = items
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(Some(ManyToOne { id, display_name }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_string")]
        keyword: Option<String>,
        #[serde(default, deserialize_with = "opt_m2o")]
        lang_id: Option<ManyToOne>,
        #[serde(default, deserialize_with = "opt_i64")]
        sequence: Option<i64>,
    }

    #[test]
    fn false_wire_values_deserialize_to_none() {
        let probe: Probe =
            serde_json::from_value(json!({"keyword": false, "lang_id": false, "sequence": false}))
                .unwrap();
        assert_eq!(probe.keyword, None);
        assert_eq!(probe.lang_id, None);
        assert_eq!(probe.sequence, None);
    }

    #[test]
    fn populated_wire_values_deserialize() {
        let probe: Probe = serde_json::from_value(json!({
            "keyword": "partner",
            "lang_id": [42, "English (US)"],
            "sequence": 7
        }))
        .unwrap();
        assert_eq!(probe.keyword.as_deref(), Some("partner"));
        let lang = probe.lang_id.unwrap();
        assert_eq!(lang.id, 42);
        assert_eq!(lang.display_name, "English (US)");
        assert_eq!(probe.sequence, Some(7));
    }

    #[test]
    fn commands_render_the_odoo_triples() {
        let create = OrmCommand::Create(json!({"keyword": "city"}));
        assert_eq!(
            serde_json::to_value(&create).unwrap(),
            json!([0, 0, {"keyword": "city"}])
        );
        assert_eq!(
            serde_json::to_value(OrmCommand::Update(9, json!({"value": "x"}))).unwrap(),
            json!([1, 9, {"value": "x"}])
        );
        assert_eq!(
            serde_json::to_value(OrmCommand::Unlink(3)).unwrap(),
            json!([3, 3, 0])
        );
        assert_eq!(
            serde_json::to_value(OrmCommand::Link(12)).unwrap(),
            json!([4, 12, 0])
        );
    }

    #[test]
    fn many2one_serializes_back_to_the_pair_form() {
        let m2o = ManyToOne {
            id: 5,
            display_name: "res.partner".to_string(),
        };
        assert_eq!(serde_json::to_value(&m2o).unwrap(), json!([5, "res.partner"]));
    }
}
