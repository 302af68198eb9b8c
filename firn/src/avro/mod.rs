//! Avro wire schema support: the bidirectional conversion between table
//! column types and the wire schemas embedded in data files, plus the
//! schema-evolution operations that work on wire schemas directly.
//!
//! Field identity is carried through wire schemas as node properties
//! ([`FIELD_ID_PROP`] and friends); nullability is encoded as a two-branch
//! null union; maps are encoded as arrays of key/value records, since the
//! native wire map only supports string keys. [`prune_columns`] and
//! [`build_projection`] operate on wire schemas downstream of conversion
//! and never mutate their inputs.

mod from_avro;
mod json;
mod prune;
mod project;
mod schema;
mod to_avro;

pub use from_avro::from_avro_schema;
pub use prune::prune_columns;
pub use project::build_projection;
pub use schema::{
    copy_field, copy_record, create_map, create_projection_map, decode_map, from_option,
    get_element_id, get_field_id, get_key_id, get_value_id, is_map_array, is_option, to_option,
    ArraySchema, Attributes, DecimalSchema, FixedSchema, MapSchema, Name, RecordField,
    RecordFieldOrder, RecordSchema, Schema, UnionSchema, ADJUST_TO_UTC_PROP, ELEMENT_ID_PROP,
    FIELD_ID_PROP, KEY_ID_PROP, VALUE_ID_PROP,
};
pub use to_avro::{
    to_avro_schema, to_avro_schema_with_names, to_avro_with_conversions, RecordNames,
};
