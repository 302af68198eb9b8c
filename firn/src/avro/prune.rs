//! Column pruning of wire schemas.

use std::collections::HashSet;

use log::debug;

use crate::{Error, ErrorKind, Result};

use super::schema::{
    copy_field, copy_record, from_option, get_element_id, get_field_id, get_key_id, get_value_id,
    is_map_array, map_key_value_fields, option_with_branch, ArraySchema, MapSchema, RecordField,
    RecordSchema, Schema,
};

/// Produce the minimal wire schema containing only the wanted field ids.
///
/// A selected id keeps its entire subtree verbatim; otherwise a node
/// survives only if something beneath it is wanted, pruned further.
/// Optional wrapping and union branch order are preserved, and map keys
/// are always retained alongside their values. Ids that match nothing are
/// never an error; an empty selection yields an empty root record, which
/// is a valid existence-only projection.
///
/// The input is never mutated.
pub fn prune_columns(schema: &Schema, selected: &HashSet<i32>) -> Result<Schema> {
    let record = match schema {
        Schema::Record(record) => record,
        _ => {
            return Err(Error::new(
                ErrorKind::SchemaIncompatible,
                "Can only prune a record schema",
            ));
        }
    };

    match prune_record(record, selected)? {
        Some(pruned) => Ok(pruned),
        None => {
            debug!("no selected column matched, returning the empty record");
            Ok(Schema::Record(copy_record(record, Vec::new(), None)))
        }
    }
}

fn prune_schema(schema: &Schema, selected: &HashSet<i32>) -> Result<Option<Schema>> {
    match schema {
        Schema::Record(record) => prune_record(record, selected),
        Schema::Array(array) if is_map_array(array) => prune_map_array(array, selected),
        Schema::Array(array) => prune_array(array, selected),
        Schema::Map(map) => prune_native_map(map, selected),
        Schema::Union(_) => prune_option(schema, selected),
        _ => Ok(None),
    }
}

fn prune_record(record: &RecordSchema, selected: &HashSet<i32>) -> Result<Option<Schema>> {
    let mut kept: Vec<RecordField> = Vec::new();
    for field in &record.fields {
        let field_id =
            get_field_id(field).map_err(|err| err.with_context("field", field.name.clone()))?;
        if selected.contains(&field_id) {
            kept.push(field.clone());
        } else if let Some(pruned) = prune_schema(&field.schema, selected)? {
            kept.push(copy_field(field, pruned, &field.name));
        }
    }

    if kept.is_empty() {
        return Ok(None);
    }
    Ok(Some(Schema::Record(copy_record(record, kept, None))))
}

fn prune_option(schema: &Schema, selected: &HashSet<i32>) -> Result<Option<Schema>> {
    let inner = from_option(schema)?;
    let pruned = match prune_schema(inner, selected)? {
        Some(pruned) => pruned,
        None => return Ok(None),
    };

    let union = match schema {
        Schema::Union(union) => union,
        _ => unreachable!("prune_option is only called on unions"),
    };
    Ok(Some(option_with_branch(union, pruned)?))
}

fn prune_array(array: &ArraySchema, selected: &HashSet<i32>) -> Result<Option<Schema>> {
    let element_id = get_element_id(array)?;
    if selected.contains(&element_id) {
        return Ok(Some(Schema::Array(array.clone())));
    }

    let pruned = match prune_schema(&array.items, selected)? {
        Some(pruned) => pruned,
        None => return Ok(None),
    };
    Ok(Some(Schema::Array(ArraySchema {
        items: Box::new(pruned),
        attributes: array.attributes.clone(),
    })))
}

fn prune_map_array(array: &ArraySchema, selected: &HashSet<i32>) -> Result<Option<Schema>> {
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
    let key_id = get_field_id(key_field)?;
    let value_id = get_field_id(value_field)?;

    // selecting either id keeps the whole map: the pairwise encoding
    // cannot express a valueless key or a keyless value
    if selected.contains(&key_id) || selected.contains(&value_id) {
        return Ok(Some(Schema::Array(array.clone())));
    }

    let key_pruned = prune_schema(&key_field.schema, selected)?;
    let value_pruned = prune_schema(&value_field.schema, selected)?;
    if key_pruned.is_none() && value_pruned.is_none() {
        return Ok(None);
    }

    let new_key = match key_pruned {
        Some(pruned) => copy_field(key_field, pruned, &key_field.name),
        None => key_field.clone(),
    };
    let new_value = match value_pruned {
        Some(pruned) => copy_field(value_field, pruned, &value_field.name),
        None => value_field.clone(),
    };

    // keep the on-disk declaration order of the two fields
    let fields = record
        .fields
        .iter()
        .map(|field| {
            if field.name == key_field.name {
                new_key.clone()
            } else {
                new_value.clone()
            }
        })
        .collect();

    Ok(Some(Schema::Array(ArraySchema {
        items: Box::new(Schema::Record(copy_record(record, fields, None))),
        attributes: array.attributes.clone(),
    })))
}

fn prune_native_map(map: &MapSchema, selected: &HashSet<i32>) -> Result<Option<Schema>> {
    let key_id = get_key_id(map)?;
    let value_id = get_value_id(map)?;
    if selected.contains(&key_id) || selected.contains(&value_id) {
        return Ok(Some(Schema::Map(map.clone())));
    }

    let pruned = match prune_schema(&map.values, selected)? {
        Some(pruned) => pruned,
        None => return Ok(None),
    };
    Ok(Some(Schema::Map(MapSchema {
        values: Box::new(pruned),
        attributes: map.attributes.clone(),
    })))
}
