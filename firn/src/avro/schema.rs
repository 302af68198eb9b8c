//! Wire schema model.
//!
//! Data files embed an Avro-style schema: records, arrays, maps and unions
//! over a small set of primitives. Nodes carry free-form JSON attributes,
//! which is where the table layer stores the identity properties that make
//! schema evolution possible.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::Number;
use serde_json::Value as JsonValue;

use crate::{Error, ErrorKind, Result};

/// Property holding the field id of a record field.
pub const FIELD_ID_PROP: &str = "field-id";
/// Property holding the key id of a native map.
pub const KEY_ID_PROP: &str = "key-id";
/// Property holding the value id of a native map.
pub const VALUE_ID_PROP: &str = "value-id";
/// Property holding the element id of an array.
pub const ELEMENT_ID_PROP: &str = "element-id";
/// Property marking a timestamp as UTC-adjusted.
pub const ADJUST_TO_UTC_PROP: &str = "adjust-to-utc";

pub(crate) const LOGICAL_TYPE_PROP: &str = "logicalType";
pub(crate) const MAP_LOGICAL_TYPE: &str = "map";

/// Free-form JSON attributes attached to a wire schema node.
pub type Attributes = BTreeMap<String, JsonValue>;

/// A possibly namespace-qualified name of a record or fixed schema.
#[derive(Debug, Clone)]
pub struct Name {
    /// The unqualified name.
    pub name: String,
    /// The namespace, if any. `Some("")` marks an explicitly empty
    /// namespace, which matters for alias resolution of renamed records.
    pub namespace: Option<String>,
}

impl Name {
    /// Create a name from a possibly dotted fullname string.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.rsplit_once('.') {
            Some((namespace, name)) => Name {
                name: name.to_string(),
                namespace: Some(namespace.to_string()),
            },
            None => Name {
                name,
                namespace: None,
            },
        }
    }

    /// Return the namespace-qualified name.
    pub fn fullname(&self) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // An absent namespace and an empty namespace both resolve to the
        // root namespace.
        self.name == other.name
            && self.namespace.as_deref().unwrap_or("") == other.namespace.as_deref().unwrap_or("")
    }
}

impl Eq for Name {}

/// A wire schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// The null marker, only meaningful as a union branch.
    Null,
    /// True or false.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 float.
    Float,
    /// 64-bit IEEE 754 float.
    Double,
    /// Arbitrary-length byte array.
    Bytes,
    /// UTF-8 character sequence.
    String,
    /// Calendar date, an int of days from the unix epoch.
    Date,
    /// Time of day, a long of microseconds.
    TimeMicros,
    /// Timestamp, a long of microseconds from the unix epoch.
    TimestampMicros {
        /// Whether values are adjusted to UTC, i.e. represent a point in
        /// time rather than a wall-clock reading.
        adjust_to_utc: bool,
    },
    /// Universally unique identifier, stored as a string.
    Uuid,
    /// Fixed point decimal over a fixed-length byte array.
    Decimal(DecimalSchema),
    /// Fixed-length byte array.
    Fixed(FixedSchema),
    /// A named record of fields.
    Record(RecordSchema),
    /// A collection of items of a single schema.
    Array(ArraySchema),
    /// A native map; keys are always strings.
    Map(MapSchema),
    /// A union of alternative schemas, used exclusively to encode
    /// optionality as a two-branch null union.
    Union(UnionSchema),
}

/// A record schema: a named, ordered list of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// The record name.
    pub name: Name,
    /// Documentation of the record.
    pub doc: Option<String>,
    /// Alternate names this record resolves under.
    pub aliases: Vec<Name>,
    /// The fields, in declaration order.
    pub fields: Vec<RecordField>,
    /// Custom attributes of the record.
    pub attributes: Attributes,
}

impl RecordSchema {
    /// Look up a field by its name or one of its aliases.
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.aliases.iter().any(|a| a == name))
    }
}

/// Sort order of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFieldOrder {
    /// Ascending order, the default.
    Ascending,
    /// Descending order.
    Descending,
    /// The field is ignored for ordering.
    Ignore,
}

/// A field of a record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// The field name.
    pub name: String,
    /// Documentation of the field.
    pub doc: Option<String>,
    /// Alternate names this field resolves under.
    pub aliases: Vec<String>,
    /// The declared default value. `Some(JsonValue::Null)` declares a null
    /// default, which is distinct from declaring no default at all.
    pub default: Option<JsonValue>,
    /// The field schema.
    pub schema: Schema,
    /// Sort order of the field.
    pub order: RecordFieldOrder,
    /// Custom attributes of the field, including its field-id.
    pub custom_attributes: Attributes,
}

/// An array schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    /// The item schema.
    pub items: Box<Schema>,
    /// Custom attributes of the array, including its element-id.
    pub attributes: Attributes,
}

/// A native map schema. Keys are always strings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSchema {
    /// The value schema.
    pub values: Box<Schema>,
    /// Custom attributes of the map, including its key-id and value-id.
    pub attributes: Attributes,
}

/// A fixed-length byte array schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    /// The fixed name.
    pub name: Name,
    /// Documentation of the fixed.
    pub doc: Option<String>,
    /// Alternate names this fixed resolves under.
    pub aliases: Vec<Name>,
    /// Length in bytes.
    pub size: usize,
    /// Custom attributes of the fixed.
    pub attributes: Attributes,
}

/// A decimal schema over an inner fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalSchema {
    /// Number of digits.
    pub precision: usize,
    /// Number of digits right of the decimal point.
    pub scale: usize,
    /// The underlying storage schema, a fixed of the minimum length able
    /// to hold `precision` digits.
    pub inner: Box<Schema>,
}

/// A union of alternative schemas.
///
/// Only validated shapes can be constructed: unions never immediately
/// contain other unions and carry at most one null branch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    variants: Vec<Schema>,
}

impl UnionSchema {
    /// Create a union from its variants.
    pub fn new(variants: Vec<Schema>) -> Result<Self> {
        let mut nulls = 0;
        for variant in &variants {
            match variant {
                Schema::Union(_) => {
                    return Err(Error::new(
                        ErrorKind::UnsupportedUnion,
                        "Unions may not immediately contain other unions",
                    ));
                }
                Schema::Null => nulls += 1,
                _ => {}
            }
        }
        if nulls > 1 {
            return Err(Error::new(
                ErrorKind::UnsupportedUnion,
                "Unions may not carry more than one null branch",
            ));
        }
        Ok(UnionSchema { variants })
    }

    /// The union variants, in declaration order.
    pub fn variants(&self) -> &[Schema] {
        &self.variants
    }

    /// Whether one of the variants is the null marker.
    pub fn is_nullable(&self) -> bool {
        self.variants.iter().any(|v| matches!(v, Schema::Null))
    }
}

/// Check whether `schema` is the optional form: a two-branch union with
/// exactly one null branch.
///
/// Any other union shape is not optional and is never reported as such.
pub fn is_option(schema: &Schema) -> bool {
    match schema {
        Schema::Union(union) => {
            union.variants().len() == 2
                && union
                    .variants()
                    .iter()
                    .filter(|v| matches!(v, Schema::Null))
                    .count()
                    == 1
        }
        _ => false,
    }
}

/// Wrap `schema` into the optional form.
///
/// An already-optional schema is returned unchanged, branch order included.
/// A union of any other shape has no conversion semantics and is rejected.
pub fn to_option(schema: Schema) -> Result<Schema> {
    if is_option(&schema) {
        return Ok(schema);
    }
    match schema {
        Schema::Union(union) => Err(Error::new(
            ErrorKind::UnsupportedUnion,
            format!(
                "Union schemas are not supported: [{}]",
                union.variants().iter().map(schema_kind).join(", ")
            ),
        )),
        schema => Ok(Schema::Union(UnionSchema::new(vec![
            Schema::Null,
            schema,
        ])?)),
    }
}

/// Unwrap the optional form, returning the non-null branch unchanged.
pub fn from_option(schema: &Schema) -> Result<&Schema> {
    let union = match schema {
        Schema::Union(union) => union,
        _ => {
            return Err(Error::new(
                ErrorKind::UnsupportedUnion,
                "Expected union schema",
            ));
        }
    };
    if !is_option(schema) {
        return Err(Error::new(
            ErrorKind::UnsupportedUnion,
            format!(
                "Expected optional schema, got a union of [{}]",
                union.variants().iter().map(schema_kind).join(", ")
            ),
        ));
    }
    union
        .variants()
        .iter()
        .find(|v| !matches!(v, Schema::Null))
        .ok_or_else(|| Error::new(ErrorKind::UnsupportedUnion, "Expected optional schema"))
}

/// Rebuild an optional union around a new non-null branch, preserving the
/// original branch order. The order decides whether the declared default
/// is null, so it is never cosmetic.
pub(crate) fn option_with_branch(original: &UnionSchema, inner: Schema) -> Result<Schema> {
    let variants = original
        .variants()
        .iter()
        .map(|variant| match variant {
            Schema::Null => Schema::Null,
            _ => inner.clone(),
        })
        .collect();
    Ok(Schema::Union(UnionSchema::new(variants)?))
}

fn schema_kind(schema: &Schema) -> &'static str {
    match schema {
        Schema::Null => "null",
        Schema::Boolean => "boolean",
        Schema::Int => "int",
        Schema::Long => "long",
        Schema::Float => "float",
        Schema::Double => "double",
        Schema::Bytes => "bytes",
        Schema::String => "string",
        Schema::Date => "date",
        Schema::TimeMicros => "time-micros",
        Schema::TimestampMicros { .. } => "timestamp-micros",
        Schema::Uuid => "uuid",
        Schema::Decimal(_) => "decimal",
        Schema::Fixed(_) => "fixed",
        Schema::Record(_) => "record",
        Schema::Array(_) => "array",
        Schema::Map(_) => "map",
        Schema::Union(_) => "union",
    }
}

fn coerce_id(prop: &str, value: &JsonValue) -> Result<i32> {
    let id = match value {
        JsonValue::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        // numeric strings are accepted for backward read compatibility
        JsonValue::String(s) => s.parse::<i32>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id >= 0 => Ok(id),
        _ => Err(Error::new(
            ErrorKind::MalformedIdentity,
            format!("'{prop}' must be a non-negative integer: {value}"),
        )),
    }
}

fn attr_id(attributes: &Attributes, prop: &str) -> Result<i32> {
    let value = attributes.get(prop).ok_or_else(|| {
        Error::new(
            ErrorKind::MissingIdentity,
            format!("Missing expected '{prop}' property"),
        )
    })?;
    coerce_id(prop, value)
}

pub(crate) fn id_attr_value(id: i32) -> JsonValue {
    JsonValue::Number(Number::from(id))
}

/// Read the field id of a record field.
pub fn get_field_id(field: &RecordField) -> Result<i32> {
    attr_id(&field.custom_attributes, FIELD_ID_PROP)
}

/// Read the field id of a record field, `None` when untagged.
pub(crate) fn field_id_opt(field: &RecordField) -> Result<Option<i32>> {
    field
        .custom_attributes
        .get(FIELD_ID_PROP)
        .map(|v| coerce_id(FIELD_ID_PROP, v))
        .transpose()
}

/// Read the element id of an array.
pub fn get_element_id(array: &ArraySchema) -> Result<i32> {
    attr_id(&array.attributes, ELEMENT_ID_PROP)
}

/// Read the key id of a native map.
pub fn get_key_id(map: &MapSchema) -> Result<i32> {
    attr_id(&map.attributes, KEY_ID_PROP)
}

/// Read the value id of a native map.
pub fn get_value_id(map: &MapSchema) -> Result<i32> {
    attr_id(&map.attributes, VALUE_ID_PROP)
}

/// Create a record field tagged with its field id.
///
/// Optional fields always declare a null default, so a record written
/// without the field reads as null instead of failing.
pub(crate) fn new_record_field(
    name: String,
    doc: Option<String>,
    schema: Schema,
    field_id: i32,
) -> RecordField {
    let default = if is_option(&schema) {
        Some(JsonValue::Null)
    } else {
        None
    };

    RecordField {
        name,
        doc,
        aliases: Vec::new(),
        default,
        schema,
        order: RecordFieldOrder::Ascending,
        custom_attributes: BTreeMap::from([(FIELD_ID_PROP.to_string(), id_attr_value(field_id))]),
    }
}

/// Encode a logical map as an array of two-field key/value records.
///
/// The record is named `k<keyId>_v<valueId>` and the array carries the
/// `logicalType: "map"` marker so it can be told apart from a genuine
/// list of pairs.
pub fn create_map(key_id: i32, key: Schema, value_id: i32, value: Schema) -> Result<Schema> {
    let key_value_name = format!("k{key_id}_v{value_id}");
    create_projection_map(&key_value_name, key_id, "key", key, value_id, "value", value)
}

/// Encode a map for projection, aliasing historic key/value/record names.
///
/// The synthesized `k<keyId>_v<valueId>` name always wins; a divergent
/// caller-supplied record name is kept as an alias, never substituted.
pub fn create_projection_map(
    record_name: &str,
    key_id: i32,
    key_name: &str,
    key: Schema,
    value_id: i32,
    value_name: &str,
    value: Schema,
) -> Result<Schema> {
    if is_option(&key) {
        return Err(Error::new(
            ErrorKind::InvalidMapShape,
            "Map keys must be required",
        ));
    }

    let key_value_name = format!("k{key_id}_v{value_id}");

    let mut key_field = new_record_field("key".to_string(), None, key, key_id);
    if key_name != "key" {
        key_field.aliases.push(key_name.to_string());
    }

    let mut value_field = new_record_field("value".to_string(), None, value, value_id);
    if value_name != "value" {
        value_field.aliases.push(value_name.to_string());
    }

    let mut record = RecordSchema {
        name: Name::new(key_value_name.as_str()),
        doc: None,
        aliases: Vec::new(),
        fields: vec![key_field, value_field],
        attributes: Attributes::new(),
    };
    if record_name != key_value_name {
        record.aliases.push(Name::new(record_name));
    }

    Ok(Schema::Array(ArraySchema {
        items: Box::new(Schema::Record(record)),
        attributes: Attributes::from([(
            LOGICAL_TYPE_PROP.to_string(),
            JsonValue::String(MAP_LOGICAL_TYPE.to_string()),
        )]),
    }))
}

/// Check whether an array node is an encoded map rather than a genuine
/// list.
///
/// Arrays written by [`create_map`] carry an explicit `logicalType: "map"`
/// marker; for historic schemas the two-field key/value record shape is
/// accepted as a structural fallback.
pub fn is_map_array(array: &ArraySchema) -> bool {
    if array
        .attributes
        .get(LOGICAL_TYPE_PROP)
        .and_then(JsonValue::as_str)
        == Some(MAP_LOGICAL_TYPE)
    {
        return true;
    }
    match array.items.as_ref() {
        Schema::Record(record) => {
            record.fields.len() == 2
                && record.field("key").is_some()
                && record.field("value").is_some()
        }
        _ => false,
    }
}

/// Resolve the key and value fields of an encoded-map record.
///
/// Identification is by the `key`/`value` name or a declared alias, never
/// by position, so historically reordered fields still decode correctly.
pub(crate) fn map_key_value_fields(record: &RecordSchema) -> Result<(&RecordField, &RecordField)> {
    if record.fields.len() != 2 {
        return Err(Error::new(
            ErrorKind::InvalidMapShape,
            format!(
                "Expected a two-field key/value record, got {} fields",
                record.fields.len()
            ),
        )
        .with_context("record", record.name.fullname()));
    }

    let key = record.field("key").ok_or_else(|| {
        Error::new(ErrorKind::InvalidMapShape, "Cannot resolve the key field")
            .with_context("record", record.name.fullname())
    })?;
    let value = record.field("value").ok_or_else(|| {
        Error::new(ErrorKind::InvalidMapShape, "Cannot resolve the value field")
            .with_context("record", record.name.fullname())
    })?;
    if std::ptr::eq(key, value) {
        return Err(Error::new(
            ErrorKind::InvalidMapShape,
            "Key and value resolve to the same field",
        )
        .with_context("record", record.name.fullname()));
    }
    if is_option(&key.schema) {
        return Err(Error::new(
            ErrorKind::InvalidMapShape,
            "Map keys must be required",
        )
        .with_context("record", record.name.fullname()));
    }

    Ok((key, value))
}

/// Decode an encoded-map record into its key/value ids and schemas.
pub fn decode_map(record: &RecordSchema) -> Result<(i32, &Schema, i32, &Schema)> {
    let (key, value) = map_key_value_fields(record)?;
    Ok((
        get_field_id(key)?,
        &key.schema,
        get_field_id(value)?,
        &value.schema,
    ))
}

/// Copy a record with new fields, optionally under a new name.
///
/// When renamed, the original full name becomes an alias on the copy. An
/// original without a namespace is aliased under the explicitly empty
/// namespace: leaving the alias namespace unset would make it default to
/// the copy's namespace and break resolution of the old name.
pub fn copy_record(
    record: &RecordSchema,
    new_fields: Vec<RecordField>,
    new_name: Option<&str>,
) -> RecordSchema {
    let (name, aliases) = match new_name {
        Some(new_name) if new_name != record.name.fullname() => {
            let alias = Name {
                name: record.name.name.clone(),
                namespace: Some(record.name.namespace.clone().unwrap_or_default()),
            };
            (Name::new(new_name), vec![alias])
        }
        _ => (record.name.clone(), Vec::new()),
    };

    RecordSchema {
        name,
        doc: record.doc.clone(),
        aliases,
        fields: new_fields,
        attributes: record.attributes.clone(),
    }
}

/// Copy a field with a new schema and name, preserving documentation,
/// default, sort order and custom properties.
///
/// When the name changes, the old name becomes an alias on the copy.
pub fn copy_field(field: &RecordField, new_schema: Schema, new_name: &str) -> RecordField {
    let mut aliases = Vec::new();
    if new_name != field.name {
        aliases.push(field.name.clone());
    }

    RecordField {
        name: new_name.to_string(),
        doc: field.doc.clone(),
        aliases,
        default: field.default.clone(),
        schema: new_schema,
        order: field.order,
        custom_attributes: field.custom_attributes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_round_trip() {
        let long = Schema::Long;
        let option = to_option(long.clone()).unwrap();

        assert!(is_option(&option));
        assert!(!is_option(&long));
        assert_eq!(from_option(&option).unwrap(), &long);

        // wrapping is idempotent on an already-optional schema
        assert_eq!(to_option(option.clone()).unwrap(), option);
    }

    #[test]
    fn test_option_preserves_branch_order() {
        let reversed = Schema::Union(UnionSchema::new(vec![Schema::Int, Schema::Null]).unwrap());

        assert!(is_option(&reversed));
        assert_eq!(to_option(reversed.clone()).unwrap(), reversed);
        assert_eq!(from_option(&reversed).unwrap(), &Schema::Int);
    }

    #[test]
    fn test_option_rejects_other_unions() {
        let three =
            Schema::Union(UnionSchema::new(vec![Schema::Null, Schema::Int, Schema::Long]).unwrap());
        assert!(!is_option(&three));
        assert_eq!(
            to_option(three.clone()).unwrap_err().kind(),
            ErrorKind::UnsupportedUnion
        );
        assert_eq!(
            from_option(&three).unwrap_err().kind(),
            ErrorKind::UnsupportedUnion
        );

        let no_null =
            Schema::Union(UnionSchema::new(vec![Schema::Int, Schema::Long]).unwrap());
        assert!(!is_option(&no_null));
    }

    #[test]
    fn test_union_rejects_nested_union() {
        let inner = Schema::Union(UnionSchema::new(vec![Schema::Null, Schema::Int]).unwrap());
        assert_eq!(
            UnionSchema::new(vec![inner, Schema::Long]).unwrap_err().kind(),
            ErrorKind::UnsupportedUnion
        );
    }

    #[test]
    fn test_map_encode_decode_inverse() {
        let value = to_option(Schema::Int).unwrap();
        let map = create_map(2, Schema::String, 3, value.clone()).unwrap();

        let array = match &map {
            Schema::Array(array) => array,
            _ => panic!("encoded map must be an array"),
        };
        assert!(is_map_array(array));

        let record = match array.items.as_ref() {
            Schema::Record(record) => record,
            _ => panic!("encoded map items must be a record"),
        };
        assert_eq!(record.name.fullname(), "k2_v3");
        // optional values declare a null default
        assert_eq!(record.field("value").unwrap().default, Some(JsonValue::Null));
        assert_eq!(record.field("key").unwrap().default, None);

        let (key_id, key_schema, value_id, value_schema) = decode_map(record).unwrap();
        assert_eq!(key_id, 2);
        assert_eq!(key_schema, &Schema::String);
        assert_eq!(value_id, 3);
        assert_eq!(value_schema, &value);
    }

    #[test]
    fn test_map_decode_by_alias_not_position() {
        let map = create_projection_map(
            "pair",
            2,
            "k",
            Schema::String,
            3,
            "v",
            Schema::Long,
        )
        .unwrap();
        let record = match &map {
            Schema::Array(array) => match array.items.as_ref() {
                Schema::Record(record) => record.clone(),
                _ => panic!(),
            },
            _ => panic!(),
        };
        assert_eq!(record.aliases, vec![Name::new("pair")]);
        assert_eq!(record.field("k").unwrap().name, "key");
        assert_eq!(record.field("v").unwrap().name, "value");

        // decoding does not assume field order
        let reordered = RecordSchema {
            fields: record.fields.iter().rev().cloned().collect(),
            ..record
        };
        let (key_id, key_schema, value_id, _) = decode_map(&reordered).unwrap();
        assert_eq!((key_id, value_id), (2, 3));
        assert_eq!(key_schema, &Schema::String);
    }

    #[test]
    fn test_map_rejects_optional_key() {
        let key = to_option(Schema::String).unwrap();
        assert_eq!(
            create_map(2, key, 3, Schema::Long).unwrap_err().kind(),
            ErrorKind::InvalidMapShape
        );
    }

    #[test]
    fn test_id_property_coercion() {
        let mut field = new_record_field("amount".to_string(), None, Schema::Long, 5);
        assert_eq!(get_field_id(&field).unwrap(), 5);

        // numeric strings are legal on read
        field
            .custom_attributes
            .insert(FIELD_ID_PROP.to_string(), JsonValue::String("5".to_string()));
        assert_eq!(get_field_id(&field).unwrap(), 5);

        field
            .custom_attributes
            .insert(FIELD_ID_PROP.to_string(), JsonValue::String("five".to_string()));
        assert_eq!(
            get_field_id(&field).unwrap_err().kind(),
            ErrorKind::MalformedIdentity
        );

        field
            .custom_attributes
            .insert(FIELD_ID_PROP.to_string(), id_attr_value(-1));
        assert_eq!(
            get_field_id(&field).unwrap_err().kind(),
            ErrorKind::MalformedIdentity
        );

        field.custom_attributes.remove(FIELD_ID_PROP);
        assert_eq!(
            get_field_id(&field).unwrap_err().kind(),
            ErrorKind::MissingIdentity
        );
    }

    #[test]
    fn test_copy_record_aliases_old_name() {
        let record = RecordSchema {
            name: Name::new("amt_rec"),
            doc: Some("amounts".to_string()),
            aliases: Vec::new(),
            fields: vec![new_record_field("amount".to_string(), None, Schema::Long, 5)],
            attributes: Attributes::from([("custom".to_string(), JsonValue::Bool(true))]),
        };

        let copy = copy_record(&record, record.fields.clone(), Some("amount_rec"));
        assert_eq!(copy.name, Name::new("amount_rec"));
        // the alias carries an explicitly empty namespace so it keeps
        // resolving against the unqualified original name
        assert_eq!(
            copy.aliases,
            vec![Name {
                name: "amt_rec".to_string(),
                namespace: Some(String::new()),
            }]
        );
        assert_eq!(copy.doc, record.doc);
        assert_eq!(copy.attributes, record.attributes);

        let same = copy_record(&record, record.fields.clone(), None);
        assert_eq!(same.name, record.name);
        assert!(same.aliases.is_empty());
    }

    #[test]
    fn test_copy_field_aliases_old_name() {
        let field = RecordField {
            doc: Some("total in cents".to_string()),
            ..new_record_field(
                "amt".to_string(),
                None,
                to_option(Schema::Long).unwrap(),
                5,
            )
        };

        let copy = copy_field(&field, field.schema.clone(), "amount");
        assert_eq!(copy.name, "amount");
        assert_eq!(copy.aliases, vec!["amt".to_string()]);
        assert_eq!(copy.doc, field.doc);
        assert_eq!(copy.default, Some(JsonValue::Null));
        assert_eq!(copy.custom_attributes, field.custom_attributes);

        let unchanged = copy_field(&field, field.schema.clone(), "amt");
        assert!(unchanged.aliases.is_empty());
    }
}
