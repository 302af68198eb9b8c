//! Projection of on-disk wire schemas onto the current table schema.
//!
//! Reconciles what a data file says with what the table says now: renamed
//! columns are resolved by field id and surfaced under their current name
//! with the on-disk name as an alias, so rewritten metadata never requires
//! rewriting data files.

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::types::{Any, Field, List, Map, Schema as TableSchema, Struct};
use crate::{Error, ErrorKind, Result};

use super::schema::{
    copy_field, copy_record, create_projection_map, field_id_opt, from_option, id_attr_value,
    is_map_array, is_option, map_key_value_fields, option_with_branch, ArraySchema, MapSchema,
    RecordField, RecordSchema, Schema, ELEMENT_ID_PROP, FIELD_ID_PROP, KEY_ID_PROP, VALUE_ID_PROP,
};
use super::to_avro::field_to_avro;

/// Produce a wire schema that reads `on_disk` data under the names of
/// `expected`.
///
/// Fields are matched by id; `renames` supplies explicit old-name to
/// new-name overrides for legacy fields that carry no id property. Fields
/// present on disk but no longer expected are dropped, and expected
/// optional fields absent on disk are synthesized as null placeholders.
/// The inputs are never mutated.
pub fn build_projection(
    on_disk: &Schema,
    expected: &TableSchema,
    renames: &HashMap<String, String>,
) -> Result<Schema> {
    let record = match on_disk {
        Schema::Record(record) => record,
        _ => {
            return Err(Error::new(
                ErrorKind::SchemaIncompatible,
                "The root of a wire schema must be a record",
            ));
        }
    };
    project_struct(record, expected.as_struct(), renames)
}

fn project_struct(
    record: &RecordSchema,
    expected: &Struct,
    renames: &HashMap<String, String>,
) -> Result<Schema> {
    let mut fields = Vec::with_capacity(expected.len());
    for expected_field in expected.fields() {
        match find_field(record, expected_field, renames)? {
            Some(disk_field) => {
                fields.push(project_field(disk_field, expected_field, renames)?);
            }
            None if expected_field.required => {
                return Err(Error::new(
                    ErrorKind::SchemaIncompatible,
                    format!("Missing required field: {}", expected_field.name),
                )
                .with_context("record", record.name.fullname()));
            }
            None => {
                debug!(
                    "field {} is not in the file, synthesizing a null placeholder",
                    expected_field.name
                );
                fields.push(field_to_avro(expected_field)?);
            }
        }
    }

    // a rename that collides with another projected name or alias would
    // make resolution ambiguous
    let names = fields
        .iter()
        .map(|field| field.name.as_str())
        .chain(fields.iter().flat_map(|field| {
            field.aliases.iter().map(String::as_str)
        }));
    if let Some(duplicate) = names.duplicates().next() {
        return Err(Error::new(
            ErrorKind::IncompatibleRename,
            format!("Name '{duplicate}' resolves to more than one projected field"),
        )
        .with_context("record", record.name.fullname()));
    }

    Ok(Schema::Record(copy_record(record, fields, None)))
}

fn find_field<'a>(
    record: &'a RecordSchema,
    expected: &Field,
    renames: &HashMap<String, String>,
) -> Result<Option<&'a RecordField>> {
    // the id is authoritative whenever it is present
    for field in &record.fields {
        if field_id_opt(field)? == Some(expected.id) {
            return Ok(Some(field));
        }
    }

    // legacy files without id metadata resolve by name, or through the
    // recorded rename mapping
    for field in &record.fields {
        if field_id_opt(field)?.is_some() {
            continue;
        }
        let resolved = renames.get(&field.name).unwrap_or(&field.name);
        if resolved == &expected.name {
            return Ok(Some(field));
        }
    }
    Ok(None)
}

fn project_field(
    disk: &RecordField,
    expected: &Field,
    renames: &HashMap<String, String>,
) -> Result<RecordField> {
    let (optional, inner) = if is_option(&disk.schema) {
        (true, from_option(&disk.schema)?)
    } else {
        (false, &disk.schema)
    };

    let projected = project_schema(inner, &expected.field_type, renames)
        .map_err(|err| err.with_context("field", disk.name.clone()))?;
    let schema = if optional {
        match &disk.schema {
            Schema::Union(union) => option_with_branch(union, projected)?,
            _ => unreachable!("optional schemas are unions"),
        }
    } else {
        projected
    };

    let mut field = if expected.name != disk.name || schema != disk.schema {
        copy_field(disk, schema, &expected.name)
    } else {
        disk.clone()
    };
    // fields resolved through the rename mapping get re-tagged
    field
        .custom_attributes
        .entry(FIELD_ID_PROP.to_string())
        .or_insert_with(|| id_attr_value(expected.id));
    Ok(field)
}

fn project_schema(
    disk: &Schema,
    expected: &Any,
    renames: &HashMap<String, String>,
) -> Result<Schema> {
    match (disk, expected) {
        (Schema::Record(record), Any::Struct(expected)) => {
            project_struct(record, expected, renames)
        }
        (Schema::Array(array), Any::Map(expected)) if is_map_array(array) => {
            project_map_array(array, expected, renames)
        }
        // the expected type disambiguates a genuine list of two-field
        // records from an encoded map
        (Schema::Array(array), Any::List(expected)) => project_array(array, expected, renames),
        (Schema::Map(map), Any::Map(expected)) => project_native_map(map, expected, renames),
        (Schema::Union(union), _) => Err(Error::new(
            ErrorKind::UnsupportedUnion,
            format!(
                "Only the two-branch optional union is supported, got {} branches",
                union.variants().len()
            ),
        )),
        (disk, Any::Primitive(_))
            if !matches!(
                disk,
                Schema::Null | Schema::Record(_) | Schema::Array(_) | Schema::Map(_)
            ) =>
        {
            // type promotion is the reader's concern, the projection keeps
            // the on-disk primitive
            Ok(disk.clone())
        }
        (disk, expected) => Err(Error::new(
            ErrorKind::SchemaIncompatible,
            format!("Cannot project {disk:?} as {expected:?}"),
        )),
    }
}

fn project_array(
    array: &ArraySchema,
    expected: &List,
    renames: &HashMap<String, String>,
) -> Result<Schema> {
    let (optional, inner) = if is_option(&array.items) {
        (true, from_option(&array.items)?)
    } else {
        (false, array.items.as_ref())
    };
    let projected = project_schema(inner, &expected.element_type, renames)?;
    let items = if optional {
        match array.items.as_ref() {
            Schema::Union(union) => option_with_branch(union, projected)?,
            _ => unreachable!("optional schemas are unions"),
        }
    } else {
        projected
    };

    let mut attributes = array.attributes.clone();
    attributes
        .entry(ELEMENT_ID_PROP.to_string())
        .or_insert_with(|| id_attr_value(expected.element_id));
    Ok(Schema::Array(ArraySchema {
        items: Box::new(items),
        attributes,
    }))
}

fn project_map_array(
    array: &ArraySchema,
    expected: &Map,
    renames: &HashMap<String, String>,
) -> Result<Schema> {
    let record = match array.items.as_ref() {
        Schema::Record(record) => record,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidMapShape,
                "An encoded map must be an array of key/value records",
            ));
        }
    };
    let (key_field, value_field) = map_key_value_fields(record)?;
    let key_id = field_id_opt(key_field)?.unwrap_or(expected.key_id);
    let value_id = field_id_opt(value_field)?.unwrap_or(expected.value_id);

    let key = project_schema(&key_field.schema, &expected.key_type, renames)?;

    let (value_optional, value_inner) = if is_option(&value_field.schema) {
        (true, from_option(&value_field.schema)?)
    } else {
        (false, &value_field.schema)
    };
    let projected_value = project_schema(value_inner, &expected.value_type, renames)?;
    let value = if value_optional {
        match &value_field.schema {
            Schema::Union(union) => option_with_branch(union, projected_value)?,
            _ => unreachable!("optional schemas are unions"),
        }
    } else {
        projected_value
    };

    // re-encode canonically; historic key/value/record names survive as
    // aliases
    create_projection_map(
        &record.name.fullname(),
        key_id,
        &key_field.name,
        key,
        value_id,
        &value_field.name,
        value,
    )
}

fn project_native_map(
    map: &MapSchema,
    expected: &Map,
    renames: &HashMap<String, String>,
) -> Result<Schema> {
    let (optional, inner) = if is_option(&map.values) {
        (true, from_option(&map.values)?)
    } else {
        (false, map.values.as_ref())
    };
    let projected = project_schema(inner, &expected.value_type, renames)?;
    let values = if optional {
        match map.values.as_ref() {
            Schema::Union(union) => option_with_branch(union, projected)?,
            _ => unreachable!("optional schemas are unions"),
        }
    } else {
        projected
    };

    let mut attributes = map.attributes.clone();
    attributes
        .entry(KEY_ID_PROP.to_string())
        .or_insert_with(|| id_attr_value(expected.key_id));
    attributes
        .entry(VALUE_ID_PROP.to_string())
        .or_insert_with(|| id_attr_value(expected.value_id));
    Ok(Schema::Map(MapSchema {
        values: Box::new(values),
        attributes,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::Primitive;

    fn record(schema: &Schema) -> &RecordSchema {
        match schema {
            Schema::Record(record) => record,
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[test]
    fn test_project_renamed_field() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [ { "name": "amt", "type": "long", "field-id": 5 } ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![Arc::new(Field::required(
                5,
                "amount",
                Primitive::Long.into(),
            ))]),
        );

        let projected = build_projection(&on_disk, &expected, &HashMap::new()).unwrap();
        let projected_record = record(&projected);
        assert_eq!(projected_record.fields.len(), 1);

        let field = &projected_record.fields[0];
        assert_eq!(field.name, "amount");
        // data keyed by the old name stays addressable
        assert_eq!(field.aliases, vec!["amt".to_string()]);
        assert_eq!(field.schema, Schema::Long);
        assert!(projected_record.field("amt").is_some());
    }

    #[test]
    fn test_project_synthesizes_missing_optional_field() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [ { "name": "id", "type": "long", "field-id": 1 } ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![
                Arc::new(Field::required(1, "id", Primitive::Long.into())),
                Arc::new(Field::optional(2, "note", Primitive::String.into())),
            ]),
        );

        let projected = build_projection(&on_disk, &expected, &HashMap::new()).unwrap();
        let note = record(&projected).field("note").unwrap();
        assert_eq!(
            note.schema.to_json(),
            serde_json::json!(["null", "string"])
        );
        assert_eq!(note.default, Some(serde_json::Value::Null));
        assert_eq!(crate::avro::get_field_id(note).unwrap(), 2);
    }

    #[test]
    fn test_project_missing_required_field_fails() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [ { "name": "id", "type": "long", "field-id": 1 } ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![
                Arc::new(Field::required(1, "id", Primitive::Long.into())),
                Arc::new(Field::required(2, "amount", Primitive::Long.into())),
            ]),
        );

        let err = build_projection(&on_disk, &expected, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIncompatible);
    }

    #[test]
    fn test_project_drops_unexpected_fields_and_reorders() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [
            { "name": "legacy", "type": "int", "field-id": 9 },
            { "name": "b", "type": "string", "field-id": 2 },
            { "name": "a", "type": "long", "field-id": 1 }
          ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![
                Arc::new(Field::required(1, "a", Primitive::Long.into())),
                Arc::new(Field::required(2, "b", Primitive::String.into())),
            ]),
        );

        let projected = build_projection(&on_disk, &expected, &HashMap::new()).unwrap();
        let names: Vec<&str> = record(&projected)
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        // file columns the table dropped disappear, order follows the table
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_project_legacy_field_via_rename_map() {
        // no id property at all: the recorded mapping resolves the rename
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [ { "name": "amt", "type": "long" } ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![Arc::new(Field::required(
                5,
                "amount",
                Primitive::Long.into(),
            ))]),
        );
        let renames = HashMap::from([("amt".to_string(), "amount".to_string())]);

        let projected = build_projection(&on_disk, &expected, &renames).unwrap();
        let field = &record(&projected).fields[0];
        assert_eq!(field.name, "amount");
        assert_eq!(field.aliases, vec!["amt".to_string()]);
        // the projection re-tags the field with the expected id
        assert_eq!(crate::avro::get_field_id(field).unwrap(), 5);
    }

    #[test]
    fn test_project_map_array_aliases_historic_names() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [ {
            "name": "props",
            "type": {
              "type": "array",
              "items": {
                "type": "record",
                "name": "props_entry",
                "fields": [
                  { "name": "key", "type": "string", "field-id": 8 },
                  { "name": "value", "type": [ "null", "long" ], "default": null, "field-id": 9 }
                ]
              },
              "logicalType": "map"
            },
            "field-id": 7
          } ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![Arc::new(Field::required(
                7,
                "props",
                Any::Map(Map {
                    key_id: 8,
                    key_type: Box::new(Primitive::String.into()),
                    value_id: 9,
                    value_required: false,
                    value_type: Box::new(Primitive::Long.into()),
                }),
            ))]),
        );

        let projected = build_projection(&on_disk, &expected, &HashMap::new()).unwrap();
        let props = record(&projected).field("props").unwrap();
        let pair = match &props.schema {
            Schema::Array(array) => match array.items.as_ref() {
                Schema::Record(pair) => pair,
                other => panic!("expected a record, got {other:?}"),
            },
            other => panic!("expected an array, got {other:?}"),
        };
        // canonical name wins, the historic record name becomes an alias
        assert_eq!(pair.name.fullname(), "k8_v9");
        assert_eq!(pair.aliases.len(), 1);
        assert_eq!(pair.aliases[0].fullname(), "props_entry");
        assert_eq!(pair.field("value").unwrap().default, Some(serde_json::Value::Null));
    }

    #[test]
    fn test_project_swap_rename_is_refused() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [
            { "name": "a", "type": "long", "field-id": 1 },
            { "name": "b", "type": "long", "field-id": 2 }
          ]
        }"#,
        )
        .unwrap();
        // the table swapped the two names; any alias assignment would be
        // ambiguous for readers resolving by name
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![
                Arc::new(Field::required(1, "b", Primitive::Long.into())),
                Arc::new(Field::required(2, "a", Primitive::Long.into())),
            ]),
        );

        let err = build_projection(&on_disk, &expected, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleRename);
    }

    #[test]
    fn test_project_nested_struct_rename() {
        let on_disk = Schema::parse_str(
            r#"
        {
          "type": "record",
          "name": "t",
          "fields": [ {
            "name": "customer",
            "type": {
              "type": "record",
              "name": "r2",
              "fields": [ { "name": "fullname", "type": "string", "field-id": 3 } ]
            },
            "field-id": 2
          } ]
        }"#,
        )
        .unwrap();
        let expected = TableSchema::new(
            1,
            None,
            Struct::new(vec![Arc::new(Field::required(
                2,
                "customer",
                Any::Struct(Arc::new(Struct::new(vec![Arc::new(Field::required(
                    3,
                    "display_name",
                    Primitive::String.into(),
                ))]))),
            ))]),
        );

        let projected = build_projection(&on_disk, &expected, &HashMap::new()).unwrap();
        let customer = record(&projected).field("customer").unwrap();
        match &customer.schema {
            Schema::Record(nested) => {
                assert_eq!(nested.fields[0].name, "display_name");
                assert_eq!(nested.fields[0].aliases, vec!["fullname".to_string()]);
            }
            other => panic!("expected a record, got {other:?}"),
        }
    }
}
