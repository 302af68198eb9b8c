//! Conversion from table column types to Avro wire schemas.

use std::sync::Arc;

use crate::types::{Any, Field, Primitive, Schema, Struct};
use crate::Result;

use super::schema::{
    create_map, id_attr_value, new_record_field, to_option, ArraySchema, Attributes, DecimalSchema,
    FixedSchema, Name, RecordField as AvroRecordField, RecordSchema as AvroRecordSchema,
    Schema as AvroSchema, ELEMENT_ID_PROP,
};

/// Record name overrides for structs, keyed by structural identity.
///
/// Lets callers produce a wire schema matching a target record-naming
/// convention, e.g. the record names of an existing data file, without
/// touching the logical types. Structs without an override are named
/// `r<id>` from the id of the field, element, key or value holding them.
#[derive(Debug, Default)]
pub struct RecordNames(Vec<(Struct, String)>);

impl RecordNames {
    /// Create an empty override table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name override for a struct.
    pub fn with(mut self, r#struct: Struct, name: impl Into<String>) -> Self {
        self.0.push((r#struct, name.into()));
        self
    }

    fn get(&self, r#struct: &Struct) -> Option<&str> {
        self.0
            .iter()
            .find(|(s, _)| s == r#struct)
            .map(|(_, name)| name.as_str())
    }
}

/// Convert a table schema to its wire schema.
///
/// `name` overrides the root record name, which otherwise defaults to
/// `r_<schema_id>`.
pub fn to_avro_schema(value: &Schema, name: Option<&str>) -> Result<AvroSchema> {
    to_avro_schema_with_names(value, &root_names(value, name))
}

/// Convert a table schema to its wire schema with record name overrides.
pub fn to_avro_schema_with_names(value: &Schema, names: &RecordNames) -> Result<AvroSchema> {
    let mut converter = TypeToAvro::new(names, false);
    converter.schema(value)
}

/// Convert a table schema to its wire schema, also returning the wire node
/// produced for every logical node.
///
/// The pairs let callers look up "what wire representation did this type
/// get" without re-traversing; lookup is by structural equality. Wire
/// nodes are recorded before any optional wrapping.
pub fn to_avro_with_conversions(
    value: &Schema,
    name: Option<&str>,
) -> Result<(AvroSchema, Vec<(Any, AvroSchema)>)> {
    let names = root_names(value, name);
    let mut converter = TypeToAvro::new(&names, true);
    let schema = converter.schema(value)?;
    Ok((schema, converter.conversions))
}

fn root_names(value: &Schema, name: Option<&str>) -> RecordNames {
    match name {
        Some(name) => RecordNames::new().with(value.as_struct().clone(), name),
        None => RecordNames::new(),
    }
}

/// Convert a single field to its wire form, used by the projection
/// builder to synthesize placeholders for fields missing on disk.
pub(crate) fn field_to_avro(field: &Field) -> Result<AvroRecordField> {
    let names = RecordNames::new();
    TypeToAvro::new(&names, false).field(field)
}

struct TypeToAvro<'a> {
    names: &'a RecordNames,
    track_conversions: bool,
    conversions: Vec<(Any, AvroSchema)>,
}

impl<'a> TypeToAvro<'a> {
    fn new(names: &'a RecordNames, track_conversions: bool) -> Self {
        Self {
            names,
            track_conversions,
            conversions: Vec::new(),
        }
    }

    fn schema(&mut self, value: &Schema) -> Result<AvroSchema> {
        let name = self
            .names
            .get(value.as_struct())
            .map(str::to_string)
            .unwrap_or_else(|| format!("r_{}", value.schema_id));
        let fields = self.fields(value.fields())?;
        let avro_schema = AvroSchema::Record(record_schema(name, fields));

        if self.track_conversions {
            self.conversions.push((
                Any::Struct(Arc::new(value.as_struct().clone())),
                avro_schema.clone(),
            ));
        }
        Ok(avro_schema)
    }

    fn fields(&mut self, fields: &[Arc<Field>]) -> Result<Vec<AvroRecordField>> {
        fields
            .iter()
            .map(|field| self.field(field))
            .collect::<Result<Vec<AvroRecordField>>>()
    }

    fn field(&mut self, field: &Field) -> Result<AvroRecordField> {
        let mut avro_schema = self.any(&field.field_type, field.id)?;
        if !field.required {
            avro_schema = to_option(avro_schema)?;
        }

        Ok(new_record_field(
            field.name.clone(),
            field.comment.clone(),
            avro_schema,
            field.id,
        ))
    }

    /// Convert one type; `id` is the id of the field, element, key or
    /// value position holding it and seeds the record name of an unnamed
    /// struct.
    fn any(&mut self, value: &Any, id: i32) -> Result<AvroSchema> {
        let avro_schema = match value {
            Any::Primitive(data_type) => primitive_to_avro(data_type)?,

            Any::Struct(value) => {
                let name = self
                    .names
                    .get(value)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("r{id}"));
                let fields = self.fields(value.fields())?;
                AvroSchema::Record(record_schema(name, fields))
            }

            Any::List(list) => {
                let mut element = self.any(&list.element_type, list.element_id)?;
                if !list.element_required {
                    element = to_option(element)?;
                }
                AvroSchema::Array(ArraySchema {
                    items: Box::new(element),
                    attributes: Attributes::from([(
                        ELEMENT_ID_PROP.to_string(),
                        id_attr_value(list.element_id),
                    )]),
                })
            }

            // every map takes the pair-array form, string keys included;
            // the native wire map cannot carry non-string keys
            Any::Map(map) => {
                let key = self.any(&map.key_type, map.key_id)?;
                let mut value = self.any(&map.value_type, map.value_id)?;
                if !map.value_required {
                    value = to_option(value)?;
                }
                create_map(map.key_id, key, map.value_id, value)?
            }
        };

        if self.track_conversions {
            self.conversions.push((value.clone(), avro_schema.clone()));
        }
        Ok(avro_schema)
    }
}

fn record_schema(name: impl Into<String>, fields: Vec<AvroRecordField>) -> AvroRecordSchema {
    AvroRecordSchema {
        name: Name::new(name.into()),
        doc: None,
        aliases: Vec::new(),
        fields,
        attributes: Attributes::default(),
    }
}

fn primitive_to_avro(value: &Primitive) -> Result<AvroSchema> {
    let avro_schema = match value {
        Primitive::Boolean => AvroSchema::Boolean,
        Primitive::Int => AvroSchema::Int,
        Primitive::Long => AvroSchema::Long,
        Primitive::Float => AvroSchema::Float,
        Primitive::Double => AvroSchema::Double,
        Primitive::Decimal { precision, scale } => AvroSchema::Decimal(DecimalSchema {
            precision: *precision as usize,
            scale: *scale as usize,
            inner: Box::new(AvroSchema::Fixed(FixedSchema {
                name: Name::new(format!("decimal_{precision}_{scale}")),
                doc: None,
                aliases: Vec::new(),
                size: Primitive::decimal_required_bytes(*precision as u32)? as usize,
                attributes: Attributes::default(),
            })),
        }),
        Primitive::Date => AvroSchema::Date,
        Primitive::Time => AvroSchema::TimeMicros,
        Primitive::Timestamp => AvroSchema::TimestampMicros {
            adjust_to_utc: false,
        },
        Primitive::Timestampz => AvroSchema::TimestampMicros {
            adjust_to_utc: true,
        },
        Primitive::String => AvroSchema::String,
        Primitive::Uuid => AvroSchema::Uuid,
        Primitive::Fixed(size) => AvroSchema::Fixed(FixedSchema {
            name: Name::new(format!("fixed_{size}")),
            doc: None,
            aliases: Vec::new(),
            size: *size as usize,
            attributes: Attributes::default(),
        }),
        Primitive::Binary => AvroSchema::Bytes,
    };
    Ok(avro_schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{List, Map};

    fn order_schema() -> Schema {
        let customer = Struct::new(vec![
            Arc::new(Field::required(3, "name", Primitive::String.into())),
            Arc::new(Field::optional(4, "address", Primitive::String.into())),
        ]);

        Schema::new(
            1,
            None,
            Struct::new(vec![
                Arc::new(Field::required(1, "id", Primitive::Long.into())),
                Arc::new(Field::required(2, "customer", Any::Struct(Arc::new(customer)))),
                Arc::new(Field::optional(
                    5,
                    "tags",
                    Any::List(List {
                        element_id: 6,
                        element_required: true,
                        element_type: Box::new(Primitive::String.into()),
                    }),
                )),
                Arc::new(Field::required(
                    7,
                    "props",
                    Any::Map(Map {
                        key_id: 8,
                        key_type: Box::new(Primitive::String.into()),
                        value_id: 9,
                        value_required: false,
                        value_type: Box::new(Primitive::String.into()),
                    }),
                )),
                Arc::new(
                    Field::required(10, "created_at", Primitive::Timestampz.into())
                        .with_comment("Commit time of the order"),
                ),
            ]),
        )
    }

    #[test]
    fn test_to_order_schema() {
        let schema_str = r#"
        {
          "type": "record",
          "name": "order_entry",
          "fields": [ {
            "name": "id",
            "type": "long",
            "field-id": 1
          }, {
            "name": "customer",
            "type": {
              "type": "record",
              "name": "r2",
              "fields": [ {
                "name": "name",
                "type": "string",
                "field-id": 3
              }, {
                "name": "address",
                "type": [ "null", "string" ],
                "default": null,
                "field-id": 4
              } ]
            },
            "field-id": 2
          }, {
            "name": "tags",
            "type": [ "null", {
              "type": "array",
              "items": "string",
              "element-id": 6
            } ],
            "default": null,
            "field-id": 5
          }, {
            "name": "props",
            "type": {
              "type": "array",
              "items": {
                "type": "record",
                "name": "k8_v9",
                "fields": [ {
                  "name": "key",
                  "type": "string",
                  "field-id": 8
                }, {
                  "name": "value",
                  "type": [ "null", "string" ],
                  "default": null,
                  "field-id": 9
                } ]
              },
              "logicalType": "map"
            },
            "field-id": 7
          }, {
            "name": "created_at",
            "type": {
              "type": "long",
              "logicalType": "timestamp-micros",
              "adjust-to-utc": true
            },
            "doc": "Commit time of the order",
            "field-id": 10
          } ]
        }"#;
        let expect_schema = AvroSchema::parse_str(schema_str).unwrap();

        let avro_schema = to_avro_schema(&order_schema(), Some("order_entry")).unwrap();

        assert_eq!(avro_schema, expect_schema);
    }

    #[test]
    fn test_nested_record_name_override() {
        let schema = order_schema();
        let customer = match &schema.fields()[1].field_type {
            Any::Struct(customer) => customer.as_ref().clone(),
            _ => panic!("customer must be a struct"),
        };

        let names = RecordNames::new()
            .with(schema.as_struct().clone(), "order_entry")
            .with(customer, "customer_v1");
        let avro_schema = to_avro_schema_with_names(&schema, &names).unwrap();

        let record = match avro_schema {
            AvroSchema::Record(record) => record,
            _ => panic!("expected a record"),
        };
        match &record.field("customer").unwrap().schema {
            AvroSchema::Record(customer) => {
                assert_eq!(customer.name.fullname(), "customer_v1")
            }
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[test]
    fn test_avro_schema_with_decimal() {
        let schema = Schema::new(
            0,
            None,
            Struct::new(vec![Arc::new(Field::required(
                1,
                "test_decimal",
                Any::Primitive(Primitive::Decimal {
                    precision: 36,
                    scale: 2,
                }),
            ))]),
        );

        let avro_schema = to_avro_schema(&schema, None).unwrap();

        let expected = serde_json::json!({
            "type": "record",
            "name": "r_0",
            "fields": [
                {
                    "name": "test_decimal",
                    "type": {
                        "type": "fixed",
                        "name": "decimal_36_2",
                        "size": 16,
                        "logicalType": "decimal",
                        "precision": 36,
                        "scale": 2
                    },
                    "field-id": 1
                }
            ]
        });

        assert_eq!(avro_schema.to_json(), expected);
    }

    #[test]
    fn test_conversion_map_records_every_node() {
        let schema = order_schema();
        let (avro_schema, conversions) =
            to_avro_with_conversions(&schema, Some("order_entry")).unwrap();

        // the tags list maps to the array node, pre-option-wrapping
        let tags_type = schema.fields()[2].field_type.clone();
        let (_, tags_avro) = conversions
            .iter()
            .find(|(any, _)| *any == tags_type)
            .expect("the list node must be recorded");
        match tags_avro {
            AvroSchema::Array(_) => {}
            other => panic!("expected an array, got {other:?}"),
        }

        // the root struct maps to the root record
        let root = conversions
            .iter()
            .find(|(any, _)| *any == Any::Struct(Arc::new(schema.as_struct().clone())))
            .map(|(_, avro)| avro)
            .expect("the root struct must be recorded");
        assert_eq!(root, &avro_schema);
    }
}
