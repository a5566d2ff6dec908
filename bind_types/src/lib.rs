//! Native Declaration Model
//!
//! This crate contains the data structures a header parser hands to the
//! binding renderer: structs, fields, functions, operator tags and the native
//! types they are spelled with. It has no code generation logic and no file
//! I/O; everything here is plain data that (de)serializes through serde.

pub mod decl;
pub mod native;
pub mod operator;

// Re-export commonly used types at the crate root
pub use decl::*;
pub use native::*;
pub use operator::*;
