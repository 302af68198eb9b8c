//! Avro-style JSON form of wire schemas.
//!
//! Data files and schema registries carry wire schemas as JSON documents.
//! Parsing keeps every attribute it does not recognize, so identity
//! properties written by other engines survive a round trip untouched.

use serde::ser::{Serialize, Serializer};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use super::schema::{
    ArraySchema, Attributes, DecimalSchema, FixedSchema, MapSchema, Name, RecordField,
    RecordFieldOrder, RecordSchema, Schema, UnionSchema, ADJUST_TO_UTC_PROP, LOGICAL_TYPE_PROP,
};
use crate::{Error, ErrorKind, Result};

const RECORD_RESERVED: &[&str] = &["type", "name", "namespace", "doc", "aliases", "fields"];
const FIELD_RESERVED: &[&str] = &["name", "type", "doc", "default", "order", "aliases"];
const ARRAY_RESERVED: &[&str] = &["type", "items"];
const MAP_RESERVED: &[&str] = &["type", "values"];
const FIXED_RESERVED: &[&str] = &[
    "type",
    "name",
    "namespace",
    "doc",
    "aliases",
    "size",
    "logicalType",
    "precision",
    "scale",
];

impl Schema {
    /// Parse a wire schema from its JSON text.
    pub fn parse_str(input: &str) -> Result<Schema> {
        let value: JsonValue = serde_json::from_str(input)?;
        Schema::parse(&value)
    }

    /// Parse a wire schema from its JSON value.
    pub fn parse(value: &JsonValue) -> Result<Schema> {
        parse_schema(value)
    }

    /// Render the schema as its JSON value.
    pub fn to_json(&self) -> JsonValue {
        schema_to_json(self)
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

fn schema_to_json(schema: &Schema) -> JsonValue {
    match schema {
        Schema::Null => json!("null"),
        Schema::Boolean => json!("boolean"),
        Schema::Int => json!("int"),
        Schema::Long => json!("long"),
        Schema::Float => json!("float"),
        Schema::Double => json!("double"),
        Schema::Bytes => json!("bytes"),
        Schema::String => json!("string"),
        Schema::Date => json!({"type": "int", "logicalType": "date"}),
        Schema::TimeMicros => json!({"type": "long", "logicalType": "time-micros"}),
        Schema::TimestampMicros { adjust_to_utc } => json!({
            "type": "long",
            "logicalType": "timestamp-micros",
            "adjust-to-utc": adjust_to_utc,
        }),
        Schema::Uuid => json!({"type": "string", "logicalType": "uuid"}),
        Schema::Decimal(decimal) => decimal_to_json(decimal),
        Schema::Fixed(fixed) => JsonValue::Object(fixed_to_json(fixed)),
        Schema::Record(record) => record_to_json(record),
        Schema::Array(array) => {
            let mut object = JsonMap::new();
            object.insert("type".to_string(), json!("array"));
            object.insert("items".to_string(), schema_to_json(&array.items));
            extend_attributes(&mut object, &array.attributes);
            JsonValue::Object(object)
        }
        Schema::Map(map) => {
            let mut object = JsonMap::new();
            object.insert("type".to_string(), json!("map"));
            object.insert("values".to_string(), schema_to_json(&map.values));
            extend_attributes(&mut object, &map.attributes);
            JsonValue::Object(object)
        }
        Schema::Union(union) => {
            JsonValue::Array(union.variants().iter().map(schema_to_json).collect())
        }
    }
}

fn decimal_to_json(decimal: &DecimalSchema) -> JsonValue {
    let mut object = match decimal.inner.as_ref() {
        Schema::Fixed(fixed) => fixed_to_json(fixed),
        _ => {
            let mut object = JsonMap::new();
            object.insert("type".to_string(), json!("bytes"));
            object
        }
    };
    object.insert(LOGICAL_TYPE_PROP.to_string(), json!("decimal"));
    object.insert("precision".to_string(), json!(decimal.precision));
    object.insert("scale".to_string(), json!(decimal.scale));
    JsonValue::Object(object)
}

fn fixed_to_json(fixed: &FixedSchema) -> JsonMap<String, JsonValue> {
    let mut object = JsonMap::new();
    object.insert("type".to_string(), json!("fixed"));
    object.insert("name".to_string(), json!(fixed.name.name));
    if let Some(namespace) = &fixed.name.namespace {
        object.insert("namespace".to_string(), json!(namespace));
    }
    if let Some(doc) = &fixed.doc {
        object.insert("doc".to_string(), json!(doc));
    }
    if !fixed.aliases.is_empty() {
        object.insert(
            "aliases".to_string(),
            JsonValue::Array(fixed.aliases.iter().map(|a| json!(a.fullname())).collect()),
        );
    }
    object.insert("size".to_string(), json!(fixed.size));
    extend_attributes(&mut object, &fixed.attributes);
    object
}

fn record_to_json(record: &RecordSchema) -> JsonValue {
    let mut object = JsonMap::new();
    object.insert("type".to_string(), json!("record"));
    object.insert("name".to_string(), json!(record.name.name));
    if let Some(namespace) = &record.name.namespace {
        object.insert("namespace".to_string(), json!(namespace));
    }
    if let Some(doc) = &record.doc {
        object.insert("doc".to_string(), json!(doc));
    }
    if !record.aliases.is_empty() {
        object.insert(
            "aliases".to_string(),
            JsonValue::Array(record.aliases.iter().map(|a| json!(a.fullname())).collect()),
        );
    }
    object.insert(
        "fields".to_string(),
        JsonValue::Array(record.fields.iter().map(field_to_json).collect()),
    );
    extend_attributes(&mut object, &record.attributes);
    JsonValue::Object(object)
}

fn field_to_json(field: &RecordField) -> JsonValue {
    let mut object = JsonMap::new();
    object.insert("name".to_string(), json!(field.name));
    object.insert("type".to_string(), schema_to_json(&field.schema));
    if let Some(doc) = &field.doc {
        object.insert("doc".to_string(), json!(doc));
    }
    if let Some(default) = &field.default {
        // a declared null default serializes as an explicit "default": null
        object.insert("default".to_string(), default.clone());
    }
    match field.order {
        RecordFieldOrder::Ascending => {}
        RecordFieldOrder::Descending => {
            object.insert("order".to_string(), json!("descending"));
        }
        RecordFieldOrder::Ignore => {
            object.insert("order".to_string(), json!("ignore"));
        }
    }
    if !field.aliases.is_empty() {
        object.insert(
            "aliases".to_string(),
            JsonValue::Array(field.aliases.iter().map(|a| json!(a)).collect()),
        );
    }
    extend_attributes(&mut object, &field.custom_attributes);
    JsonValue::Object(object)
}

fn extend_attributes(object: &mut JsonMap<String, JsonValue>, attributes: &Attributes) {
    for (key, value) in attributes {
        object.insert(key.clone(), value.clone());
    }
}

fn parse_schema(value: &JsonValue) -> Result<Schema> {
    match value {
        JsonValue::String(name) => parse_primitive(name),
        JsonValue::Array(variants) => {
            let variants = variants
                .iter()
                .map(parse_schema)
                .collect::<Result<Vec<Schema>>>()?;
            Ok(Schema::Union(UnionSchema::new(variants)?))
        }
        JsonValue::Object(object) => parse_complex(object),
        _ => Err(Error::new(
            ErrorKind::Unexpected,
            format!("A schema must be a string, array or object: {value}"),
        )),
    }
}

fn parse_primitive(name: &str) -> Result<Schema> {
    match name {
        "null" => Ok(Schema::Null),
        "boolean" => Ok(Schema::Boolean),
        "int" => Ok(Schema::Int),
        "long" => Ok(Schema::Long),
        "float" => Ok(Schema::Float),
        "double" => Ok(Schema::Double),
        "bytes" => Ok(Schema::Bytes),
        "string" => Ok(Schema::String),
        _ => Err(Error::new(
            ErrorKind::Unexpected,
            format!("Unknown schema type: {name}"),
        )),
    }
}

fn parse_complex(object: &JsonMap<String, JsonValue>) -> Result<Schema> {
    let ty = object
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::Unexpected,
                "A schema object must have a string 'type'",
            )
        })?;

    match ty {
        "record" => parse_record(object),
        "array" => Ok(Schema::Array(ArraySchema {
            items: Box::new(parse_schema(object.get("items").ok_or_else(|| {
                Error::new(ErrorKind::Unexpected, "An array schema must have 'items'")
            })?)?),
            attributes: collect_attributes(object, ARRAY_RESERVED),
        })),
        "map" => Ok(Schema::Map(MapSchema {
            values: Box::new(parse_schema(object.get("values").ok_or_else(|| {
                Error::new(ErrorKind::Unexpected, "A map schema must have 'values'")
            })?)?),
            attributes: collect_attributes(object, MAP_RESERVED),
        })),
        "fixed" => parse_fixed(object),
        ty => parse_logical(ty, object),
    }
}

fn parse_logical(ty: &str, object: &JsonMap<String, JsonValue>) -> Result<Schema> {
    let logical = object.get(LOGICAL_TYPE_PROP).and_then(JsonValue::as_str);
    match (ty, logical) {
        ("int", Some("date")) => Ok(Schema::Date),
        ("long", Some("time-micros")) => Ok(Schema::TimeMicros),
        ("long", Some("timestamp-micros")) => Ok(Schema::TimestampMicros {
            adjust_to_utc: object
                .get(ADJUST_TO_UTC_PROP)
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        }),
        ("string", Some("uuid")) => Ok(Schema::Uuid),
        ("bytes", Some("decimal")) => Ok(Schema::Decimal(DecimalSchema {
            precision: require_usize(object, "precision")?,
            scale: require_usize(object, "scale")?,
            inner: Box::new(Schema::Bytes),
        })),
        // unknown logical types read as their base type
        _ => parse_primitive(ty),
    }
}

fn parse_fixed(object: &JsonMap<String, JsonValue>) -> Result<Schema> {
    let fixed = FixedSchema {
        name: parse_name(object)?,
        doc: object
            .get("doc")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        aliases: parse_aliases(object),
        size: require_usize(object, "size")?,
        attributes: collect_attributes(object, FIXED_RESERVED),
    };

    if object.get(LOGICAL_TYPE_PROP).and_then(JsonValue::as_str) == Some("decimal") {
        return Ok(Schema::Decimal(DecimalSchema {
            precision: require_usize(object, "precision")?,
            scale: require_usize(object, "scale")?,
            inner: Box::new(Schema::Fixed(fixed)),
        }));
    }
    Ok(Schema::Fixed(fixed))
}

fn parse_record(object: &JsonMap<String, JsonValue>) -> Result<Schema> {
    let fields = object
        .get("fields")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Error::new(ErrorKind::Unexpected, "A record schema must have 'fields'"))?
        .iter()
        .map(parse_field)
        .collect::<Result<Vec<RecordField>>>()?;

    Ok(Schema::Record(RecordSchema {
        name: parse_name(object)?,
        doc: object
            .get("doc")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        aliases: parse_aliases(object),
        fields,
        attributes: collect_attributes(object, RECORD_RESERVED),
    }))
}

fn parse_field(value: &JsonValue) -> Result<RecordField> {
    let object = value.as_object().ok_or_else(|| {
        Error::new(ErrorKind::Unexpected, "A record field must be an object")
    })?;

    let name = object
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::new(ErrorKind::Unexpected, "A record field must have a 'name'"))?;
    let schema = parse_schema(object.get("type").ok_or_else(|| {
        Error::new(ErrorKind::Unexpected, "A record field must have a 'type'")
            .with_context("field", name)
    })?)?;

    let order = match object.get("order").and_then(JsonValue::as_str) {
        None | Some("ascending") => RecordFieldOrder::Ascending,
        Some("descending") => RecordFieldOrder::Descending,
        Some("ignore") => RecordFieldOrder::Ignore,
        Some(order) => {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Unknown field order: {order}"),
            )
            .with_context("field", name));
        }
    };

    Ok(RecordField {
        name: name.to_string(),
        doc: object
            .get("doc")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        aliases: object
            .get("aliases")
            .and_then(JsonValue::as_array)
            .map(|aliases| {
                aliases
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        default: object.get("default").cloned(),
        schema,
        order,
        custom_attributes: collect_attributes(object, FIELD_RESERVED),
    })
}

fn parse_name(object: &JsonMap<String, JsonValue>) -> Result<Name> {
    let name = object
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::new(ErrorKind::Unexpected, "A named schema must have a 'name'"))?;
    let mut name = Name::new(name);
    if name.namespace.is_none() {
        name.namespace = object
            .get("namespace")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
    }
    Ok(name)
}

fn parse_aliases(object: &JsonMap<String, JsonValue>) -> Vec<Name> {
    object
        .get("aliases")
        .and_then(JsonValue::as_array)
        .map(|aliases| {
            aliases
                .iter()
                .filter_map(JsonValue::as_str)
                .map(Name::new)
                .collect()
        })
        .unwrap_or_default()
}

fn require_usize(object: &JsonMap<String, JsonValue>, key: &str) -> Result<usize> {
    object
        .get(key)
        .and_then(JsonValue::as_u64)
        .map(|v| v as usize)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::Unexpected,
                format!("Expected a non-negative integer '{key}'"),
            )
        })
}

fn collect_attributes(object: &JsonMap<String, JsonValue>, reserved: &[&str]) -> Attributes {
    object
        .iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
