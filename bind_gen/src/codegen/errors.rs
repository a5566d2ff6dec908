use bind_types::Operator;
use thiserror::Error;

/// Result alias used across the renderers.
pub type RenderResult<T> = Result<T, RenderError>;

/// Failures raised while rendering one declaration.
///
/// A failing declaration commits nothing to the session; declarations
/// rendered before it in the same call stay committed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The struct has no entry in the type mapping spec.
    #[error("struct '{struct_name}' has no entry in the type mapping")]
    MissingMapping { struct_name: String },

    /// A field type can neither be mapped nor laid out.
    #[error("field '{struct_name}::{field}' has unsupported type '{field_type}': {reason}")]
    UnsupportedFieldType {
        struct_name: String,
        field: String,
        field_type: String,
        reason: String,
    },

    /// Operator tag does not match the declared parameter count.
    #[error("'{function}' is tagged {operator} which takes {expected} operand(s), but declares {found}")]
    UnsupportedOperatorArity {
        function: String,
        operator: Operator,
        expected: usize,
        found: usize,
    },

    /// A parameter or return type has no registered proxy.
    #[error("'{function}' uses '{type_name}' which has no proxy mapping: {reason}")]
    MissingOperandMapping {
        function: String,
        type_name: String,
        reason: String,
    },

    /// Operator returns a type its host trait cannot carry.
    #[error("'{function}' is tagged {operator} but returns '{return_type}'")]
    UnsupportedOperatorReturn {
        function: String,
        operator: Operator,
        return_type: String,
    },

    /// Two declarations would emit the same generated name.
    #[error("'{name}' from '{incoming}' collides with the one emitted for '{existing}'")]
    NameCollision {
        name: String,
        existing: String,
        incoming: String,
    },
}
