pub mod aggregate;
pub mod config;
pub mod errors;
pub mod fragment;
pub mod function_gen;
pub mod helpers;
pub mod session;
pub mod struct_gen;

pub use config::{OperatorOverride, RenderConfig};
pub use errors::{RenderError, RenderResult};
pub use fragment::{Fragment, FragmentId, FragmentKind, GeneratedModule, RenderFlags};
pub use function_gen::FunctionRenderer;
pub use session::{CacheEntry, CacheKey, DeclKind, ProxyType, Session};
pub use struct_gen::StructRenderer;

pub const OUTPUT_DIR: &str = "generated";
