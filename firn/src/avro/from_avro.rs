//! Conversion from Avro wire schemas back to table column types.

use std::sync::Arc;

use crate::types::{Any, Field, List, Map, Primitive, Schema, Struct};
use crate::{Error, ErrorKind, Result};

use super::schema::{
    decode_map, from_option, get_element_id, get_field_id, get_key_id, get_value_id, is_map_array,
    is_option, ArraySchema, MapSchema, RecordSchema, Schema as AvroSchema,
};

/// Convert a wire schema back to a table schema.
///
/// Wire schemas carry no schema id, so the result always has id 0.
pub fn from_avro_schema(schema: &AvroSchema) -> Result<Schema> {
    match schema {
        AvroSchema::Record(record) => Ok(Schema::new(0, None, struct_from_record(record)?)),
        _ => Err(Error::new(
            ErrorKind::SchemaIncompatible,
            "The root of a wire schema must be a record",
        )),
    }
}

fn struct_from_record(record: &RecordSchema) -> Result<Struct> {
    let mut fields = Vec::with_capacity(record.fields.len());
    for avro_field in &record.fields {
        let id = get_field_id(avro_field)
            .map_err(|err| err.with_context("field", avro_field.name.clone()))?;
        let (required, schema) = split_option(&avro_field.schema)?;

        let field_type = any_from_avro(schema)?;
        let mut field = if required {
            Field::required(id, &avro_field.name, field_type)
        } else {
            Field::optional(id, &avro_field.name, field_type)
        };
        if let Some(doc) = &avro_field.doc {
            field = field.with_comment(doc.clone());
        }
        fields.push(Arc::new(field));
    }
    Ok(Struct::new(fields))
}

/// Split a schema into its nullability and its value schema.
fn split_option(schema: &AvroSchema) -> Result<(bool, &AvroSchema)> {
    if is_option(schema) {
        Ok((false, from_option(schema)?))
    } else {
        Ok((true, schema))
    }
}

fn any_from_avro(schema: &AvroSchema) -> Result<Any> {
    let any = match schema {
        AvroSchema::Boolean => Primitive::Boolean.into(),
        AvroSchema::Int => Primitive::Int.into(),
        AvroSchema::Long => Primitive::Long.into(),
        AvroSchema::Float => Primitive::Float.into(),
        AvroSchema::Double => Primitive::Double.into(),
        AvroSchema::Bytes => Primitive::Binary.into(),
        AvroSchema::String => Primitive::String.into(),
        AvroSchema::Date => Primitive::Date.into(),
        AvroSchema::TimeMicros => Primitive::Time.into(),
        AvroSchema::TimestampMicros { adjust_to_utc } => if *adjust_to_utc {
            Primitive::Timestampz
        } else {
            Primitive::Timestamp
        }
        .into(),
        AvroSchema::Uuid => Primitive::Uuid.into(),
        AvroSchema::Fixed(fixed) => Primitive::Fixed(fixed.size as u64).into(),
        AvroSchema::Decimal(decimal) => {
            let precision = u32::try_from(decimal.precision).unwrap_or(u32::MAX);
            // rejects precision 0 and anything above the supported maximum
            Primitive::decimal_required_bytes(precision)?;
            if decimal.scale > decimal.precision {
                return Err(Error::new(
                    ErrorKind::SchemaIncompatible,
                    format!(
                        "Unsupported decimal shape: precision {}, scale {}",
                        decimal.precision, decimal.scale
                    ),
                ));
            }
            Primitive::Decimal {
                precision: decimal.precision as u8,
                scale: decimal.scale as u8,
            }
            .into()
        }

        AvroSchema::Record(record) => Any::Struct(Arc::new(struct_from_record(record)?)),

        AvroSchema::Array(array) if is_map_array(array) => Any::Map(map_from_array(array)?),
        AvroSchema::Array(array) => {
            // the element id lives on the array node, not the element type
            let element_id = get_element_id(array)?;
            let (element_required, element) = split_option(&array.items)?;
            Any::List(List {
                element_id,
                element_required,
                element_type: Box::new(any_from_avro(element)?),
            })
        }

        AvroSchema::Map(map) => Any::Map(map_from_native(map)?),

        AvroSchema::Union(union) => {
            return Err(Error::new(
                ErrorKind::UnsupportedUnion,
                format!(
                    "Only the two-branch optional union is supported, got {} branches",
                    union.variants().len()
                ),
            ));
        }
        AvroSchema::Null => {
            return Err(Error::new(
                ErrorKind::SchemaIncompatible,
                "The null schema is only meaningful as a union branch",
            ));
        }
    };
    Ok(any)
}

fn map_from_array(array: &ArraySchema) -> Result<Map> {
    let record = match array.items.as_ref() {
        AvroSchema::Record(record) => record,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidMapShape,
                "An encoded map must be an array of key/value records",
            ));
        }
    };
    let (key_id, key_schema, value_id, value_schema) = decode_map(record)?;
    let (value_required, value_schema) = split_option(value_schema)?;

    Ok(Map {
        key_id,
        key_type: Box::new(any_from_avro(key_schema)?),
        value_id,
        value_required,
        value_type: Box::new(any_from_avro(value_schema)?),
    })
}

fn map_from_native(map: &MapSchema) -> Result<Map> {
    let (value_required, value_schema) = split_option(&map.values)?;
    Ok(Map {
        key_id: get_key_id(map)?,
        key_type: Box::new(Primitive::String.into()),
        value_id: get_value_id(map)?,
        value_required,
        value_type: Box::new(any_from_avro(value_schema)?),
    })
}
