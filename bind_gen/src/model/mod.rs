pub mod layout;
pub mod mapping;

pub use layout::{FieldLayout, LayoutError, LayoutResolver, StructLayout};
pub use mapping::{DataModel, MappingSpec, TypeMapping};
