use serde_derive::{Deserialize, Serialize};

/// What happens when a second declaration registers an operator impl that
/// is already registered for the same operand types.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorOverride {
    /// Fail with `NameCollision`.
    #[default]
    Reject,
    /// The later declaration replaces the earlier one in place.
    LastWins,
}

/// Knobs shared by every renderer in a session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Prefix of every generated shim symbol.
    pub shim_prefix: String,
    /// Extra qualifiers placed after `extern "C"` on shims, e.g. `__device__`.
    pub shim_qualifiers: String,
    /// Name of the host constant that embeds the shim source.
    pub shim_source_ident: String,
    /// Returns of at most this many bytes come back by value instead of
    /// through the output parameter. `None` always uses the output parameter.
    pub by_value_return_limit: Option<u64>,
    pub operator_override: OperatorOverride,
    /// Pointer size in bytes used for layout computation.
    pub pointer_width: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shim_prefix: "__bind_shim_".to_string(),
            shim_qualifiers: String::new(),
            shim_source_ident: "SHIM_SOURCE".to_string(),
            by_value_return_limit: None,
            operator_override: OperatorOverride::Reject,
            pointer_width: 8,
        }
    }
}
