//! firn is the schema conversion and evolution layer of the Firn table
//! format: it translates between a table's logical column schema and the
//! Avro-style wire schema embedded in data files, preserving field ids and
//! nullability across schema versions.

// Make sure all our public APIs have docs.
#![deny(missing_docs)]
#![allow(dead_code)]

mod error;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;

pub mod avro;
pub mod types;
