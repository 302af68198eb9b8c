//! Types provides the definition of the Firn in-memory table types: the
//! logical column schema that wire schemas are converted from and to.

mod in_memory;
pub use in_memory::*;
