//! in_memory module provides the definition of the Firn in-memory data
//! types: a table schema is a tree of typed, named fields, every field
//! carrying an integer id that stays stable across schema versions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Utc;
use ordered_float::OrderedFloat;
use uuid::Uuid;

use crate::types::in_memory::_decimal::REQUIRED_LENGTH;
use crate::Error;
use crate::ErrorKind;
use crate::Result;

pub(crate) const MAX_DECIMAL_BYTES: u32 = 24;
pub(crate) const MAX_DECIMAL_PRECISION: u32 = 38;

mod _decimal {
    use lazy_static::lazy_static;

    use super::{MAX_DECIMAL_BYTES, MAX_DECIMAL_PRECISION};

    lazy_static! {
        // Max precision of bytes, starts from 1
        pub(super) static ref MAX_PRECISION: [u32; MAX_DECIMAL_BYTES as usize] = {
            let mut ret: [u32; MAX_DECIMAL_BYTES as usize] = [0; MAX_DECIMAL_BYTES as usize];
            for (i, prec) in ret.iter_mut().enumerate() {
                *prec = 2f64.powi((8 * (i + 1) - 1) as i32).log10().floor() as u32;
            }

            ret
        };

        //  Required bytes of precision, starts from 1
        pub(super) static ref REQUIRED_LENGTH: [u32; MAX_DECIMAL_PRECISION as usize] = {
            let mut ret: [u32; MAX_DECIMAL_PRECISION as usize] = [0; MAX_DECIMAL_PRECISION as usize];

            for (i, required_len) in ret.iter_mut().enumerate() {
                for j in 0..MAX_PRECISION.len() {
                    if MAX_PRECISION[j] >= ((i + 1) as u32) {
                        *required_len = (j + 1) as u32;
                        break;
                    }
                }
            }

            ret
        };
    }
}

/// All data types are either primitives or nested types, which are maps,
/// lists, or structs.
#[derive(Debug, PartialEq, Clone, Eq)]
pub enum Any {
    /// A Primitive type
    Primitive(Primitive),
    /// A Struct type
    Struct(Arc<Struct>),
    /// A List type.
    List(List),
    /// A Map type
    Map(Map),
}

/// Primitive Types within a schema.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Primitive {
    /// True or False
    Boolean,
    /// 32-bit signed integer, Can promote to long
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754 floating bit, Can promote to double
    Float,
    /// 64-bit IEEE 754 floating bit.
    Double,
    /// Fixed point decimal
    ///
    /// - Precision can only be widened.
    /// - Scale is fixed and cannot be changed by schema evolution.
    Decimal {
        /// The number of digits in the number, precision must be 38 or less
        precision: u8,
        /// The number of digits to the right of the decimal point.
        scale: u8,
    },
    /// Calendar date without timezone or time
    Date,
    /// Time of day without date or timezone.
    ///
    /// Time values are stored with microsecond precision.
    Time,
    /// Timestamp without timezone
    ///
    /// Timestamp values are stored with microsecond precision.
    ///
    /// Timestamps without time zone represent a date and time of day
    /// regardless of zone: the time value is independent of zone
    /// adjustments.
    Timestamp,
    /// Timestamp with timezone
    ///
    /// Timestampz values are stored with microsecond precision.
    ///
    /// Timestamps with time zone represent a point in time: values are
    /// stored as UTC and do not retain a source time zone.
    Timestampz,
    /// Arbitrary-length character sequences, Encoded with UTF-8
    String,
    /// Universally Unique Identifiers, Should use 16-byte fixed
    Uuid,
    /// Fixed-length byte array of length.
    Fixed(u64),
    /// Arbitrary-length byte array.
    Binary,
}

impl From<Primitive> for Any {
    fn from(value: Primitive) -> Self {
        Any::Primitive(value)
    }
}

impl Primitive {
    /// Returns minimum bytes required for decimal with [`precision`].
    #[inline(always)]
    pub fn decimal_required_bytes(precision: u32) -> Result<u32> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(Error::new(
                ErrorKind::SchemaIncompatible,
                format!(
                    "Decimal precision must be between 1 and {MAX_DECIMAL_PRECISION}: {precision}",
                ),
            ));
        }
        Ok(REQUIRED_LENGTH[precision as usize - 1])
    }
}

/// All data values are either primitives or nested values.
///
/// Values only appear in this layer as field defaults; struct values are
/// owned by the row subsystem and not modeled here.
#[derive(Debug, PartialEq, Clone, Eq)]
pub enum AnyValue {
    /// A Primitive value
    Primitive(PrimitiveValue),
    /// A list of typed values, `None` marking null elements.
    List(Vec<Option<AnyValue>>),
    /// A map is a collection of key-value pairs, `None` marking null
    /// values.
    Map {
        /// All keys in this map.
        keys: Vec<AnyValue>,
        /// All values in this map.
        values: Vec<Option<AnyValue>>,
    },
}

impl From<PrimitiveValue> for AnyValue {
    fn from(value: PrimitiveValue) -> Self {
        AnyValue::Primitive(value)
    }
}

/// Primitive Values within a schema.
///
/// Used to represent the value of a primitive type, like as default value.
#[derive(Debug, PartialEq, Clone, Eq)]
pub enum PrimitiveValue {
    /// True or False
    Boolean(bool),
    /// 32-bit signed integer, Can promote to long
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit IEEE 754 floating bit, Can promote to double
    Float(OrderedFloat<f32>),
    /// 64-bit IEEE 754 floating bit.
    Double(OrderedFloat<f64>),
    /// Fixed point decimal, unscaled value.
    Decimal(i128),
    /// Calendar date without timezone or time
    Date(NaiveDate),
    /// Time of day without date or timezone, microsecond precision.
    Time(NaiveTime),
    /// Timestamp without timezone, microsecond precision.
    Timestamp(NaiveDateTime),
    /// Timestamp with timezone, microsecond precision, stored as UTC.
    Timestampz(DateTime<Utc>),
    /// Arbitrary-length character sequences, Encoded with UTF-8
    String(String),
    /// Universally Unique Identifiers, Should use 16-byte fixed
    Uuid(Uuid),
    /// Fixed-length byte array of length.
    Fixed(Vec<u8>),
    /// Arbitrary-length byte array.
    Binary(Vec<u8>),
}

/// A struct is a tuple of typed values.
///
/// - Each field in the tuple is named and has an integer id that is unique in the table schema.
/// - Each field can be either optional or required, meaning that values can (or cannot) be null.
/// - Fields may be any type.
/// - Fields may have an optional comment or doc string.
/// - Fields can have default values.
#[derive(Default, Debug, Clone, Eq)]
pub struct Struct {
    /// Fields contained in this struct.
    fields: Vec<FieldRef>,
    /// Map field id to field
    id_lookup: HashMap<i32, FieldRef>,
}

impl PartialEq for Struct {
    fn eq(&self, other: &Self) -> bool {
        // id_lookup is derived state, fields carry the identity.
        self.fields == other.fields
    }
}

impl Struct {
    /// Create a new struct.
    pub fn new(fields: Vec<FieldRef>) -> Self {
        let mut id_lookup = HashMap::with_capacity(fields.len());
        fields.iter().for_each(|field| {
            id_lookup.insert(field.id, field.clone());
            Self::index_nested(&field.field_type, &mut id_lookup)
        });
        Struct { fields, id_lookup }
    }

    fn index_nested(ty: &Any, map: &mut HashMap<i32, FieldRef>) {
        // Lookups are used to resolve projected columns, which can only
        // name struct fields. List elements and map entries are addressed
        // through their parent field.
        if let Any::Struct(inner) = ty {
            map.extend(inner.id_lookup.clone())
        }
    }

    /// Return the number of fields in the struct.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the struct is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Return the reference to the field of this struct.
    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }

    /// Lookup the field type according to the field id.
    pub fn lookup_type(&self, field_id: i32) -> Option<Any> {
        self.id_lookup
            .get(&field_id)
            .map(|field| field.field_type.clone())
    }

    /// Lookup the field according to the field id.
    pub fn lookup_field(&self, field_id: i32) -> Option<&FieldRef> {
        self.id_lookup.get(&field_id)
    }

    /// Lookup field by field name.
    pub fn lookup_field_by_name(&self, field_name: &str) -> Option<&FieldRef> {
        self.fields.iter().find(|field| field.name == field_name)
    }
}

/// The reference to a Field.
pub type FieldRef = Arc<Field>;

/// A Field is the field of a struct.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Field {
    /// An integer id that is unique in the table schema
    pub id: i32,
    /// Field Name
    pub name: String,
    /// Optional or required, meaning that values can (or can not be null)
    pub required: bool,
    /// Field can have any type
    pub field_type: Any,
    /// Fields can have any optional comment or doc string.
    pub comment: Option<String>,
    /// `initial-default` is used to populate the field's value for all
    /// records that were written before the field was added to the schema
    pub initial_default: Option<AnyValue>,
    /// `write-default` is used to populate the field's value for any
    /// records written after the field was added to the schema, if the
    /// writer does not supply the field's value
    pub write_default: Option<AnyValue>,
}

impl Field {
    /// Create a required field.
    pub fn required(id: i32, name: impl Into<String>, r#type: Any) -> Self {
        Self {
            id,
            name: name.into(),
            required: true,
            field_type: r#type,
            comment: None,
            initial_default: None,
            write_default: None,
        }
    }

    /// Create an optional field.
    pub fn optional(id: i32, name: impl Into<String>, r#type: Any) -> Self {
        Self {
            id,
            name: name.into(),
            required: false,
            field_type: r#type,
            comment: None,
            initial_default: None,
            write_default: None,
        }
    }

    /// Set the comment of the field.
    pub fn with_comment(mut self, doc: impl Into<String>) -> Self {
        self.comment = Some(doc.into());
        self
    }
}

/// A list is a collection of values with some element type.
///
/// - The element field has an integer id that is unique in the table schema.
/// - Elements can be either optional or required.
/// - Element types may be any type.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct List {
    /// an integer id that is unique in the table schema.
    pub element_id: i32,
    /// Optional or required, meaning that values can (or can not be null)
    pub element_required: bool,
    /// Element types may be any type.
    pub element_type: Box<Any>,
}

/// A map is a collection of key-value pairs with a key type and a value type.
///
/// - Both the key field and value field each have an integer id that is unique in the table schema.
/// - Map keys are required and map values can be either optional or required.
/// - Both map keys and map values may be any type, including nested types.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Map {
    /// an integer id that is unique in the table schema
    pub key_id: i32,
    /// Both map keys and map values may be any type, including nested types.
    pub key_type: Box<Any>,

    /// an integer id that is unique in the table schema
    pub value_id: i32,
    /// map values can be either optional or required.
    pub value_required: bool,
    /// Both map keys and map values may be any type, including nested types.
    pub value_type: Box<Any>,
}

/// A table's schema is a list of named columns.
///
/// All data types are either primitives or nested types, which are maps,
/// lists, or structs. A table schema is also a struct type.
#[derive(Debug, PartialEq, Clone)]
pub struct Schema {
    /// The unique id for this schema.
    pub schema_id: i32,
    /// A schema can optionally track the set of primitive fields that
    /// identify rows in a table, using the property identifier-field-ids
    pub identifier_field_ids: Option<Vec<i32>>,
    /// fields contained in this schema.
    r#struct: Struct,
}

impl Schema {
    /// Create a schema
    pub fn new(schema_id: i32, identifier_field_ids: Option<Vec<i32>>, r#struct: Struct) -> Self {
        Schema {
            schema_id,
            identifier_field_ids,
            r#struct,
        }
    }

    /// Return the fields of the schema
    pub fn fields(&self) -> &[FieldRef] {
        self.r#struct.fields()
    }

    /// Return the schema as a struct type.
    pub fn as_struct(&self) -> &Struct {
        &self.r#struct
    }

    /// Look up field by field id
    pub fn look_up_field_by_id(&self, field_id: i32) -> Option<&FieldRef> {
        self.r#struct.lookup_field(field_id)
    }

    /// Look up field by field name.
    pub fn look_up_field_by_name(&self, field_name: &str) -> Option<&FieldRef> {
        self.r#struct.lookup_field_by_name(field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_required_bytes() {
        assert_eq!(Primitive::decimal_required_bytes(1).unwrap(), 1);
        assert_eq!(Primitive::decimal_required_bytes(9).unwrap(), 4);
        assert_eq!(Primitive::decimal_required_bytes(18).unwrap(), 8);
        assert_eq!(Primitive::decimal_required_bytes(38).unwrap(), 16);
        assert!(Primitive::decimal_required_bytes(0).is_err());
        assert!(Primitive::decimal_required_bytes(39).is_err());
    }

    #[test]
    fn test_struct_lookup() {
        let nested = Struct::new(vec![Arc::new(Field::required(
            3,
            "city",
            Any::Primitive(Primitive::String),
        ))]);
        let s = Struct::new(vec![
            Arc::new(Field::required(1, "id", Any::Primitive(Primitive::Long))),
            Arc::new(Field::optional(2, "address", Any::Struct(Arc::new(nested)))),
        ]);

        assert_eq!(s.len(), 2);
        assert_eq!(s.lookup_field(1).unwrap().name, "id");
        // nested struct fields are reachable by id as well
        assert_eq!(s.lookup_field(3).unwrap().name, "city");
        assert_eq!(
            s.lookup_type(2),
            s.lookup_field_by_name("address")
                .map(|f| f.field_type.clone())
        );
        assert!(s.lookup_field(4).is_none());
    }

    #[test]
    fn test_field_default_value() {
        let field = Field {
            write_default: Some(AnyValue::Primitive(PrimitiveValue::Long(0))),
            ..Field::optional(7, "retries", Any::Primitive(Primitive::Long))
        };

        assert!(!field.required);
        assert_eq!(
            field.write_default,
            Some(AnyValue::Primitive(PrimitiveValue::Long(0)))
        );
        assert_eq!(field.initial_default, None);
    }
}
