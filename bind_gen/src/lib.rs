//! Static binding generator for native struct, function and operator
//! declarations.
//!
//! Given declarations extracted from a C/C++ header and a type mapping, the
//! renderers produce a Rust module of `#[repr(C)]` proxy types, proxy
//! functions and operator impls, plus a native source blob of `extern "C"`
//! shims the module links against. All state lives in a caller-owned
//! [`Session`].

pub mod cmds;
pub mod codegen;
pub mod model;

pub use bind_types::{Declarations, FieldDecl, FunctionDecl, NativeType, Operator, ParamDecl, StructDecl};
pub use codegen::{
    FunctionRenderer, GeneratedModule, OperatorOverride, RenderConfig, RenderError, RenderFlags, Session,
    StructRenderer,
};
pub use model::{DataModel, MappingSpec, TypeMapping};
