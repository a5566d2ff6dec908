/* Type mapping table - native struct name to host proxy description */

use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Memory-layout descriptor for a proxy type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DataModel {
    /// Field-by-field `#[repr(C)]` proxy with public named fields.
    #[default]
    Struct,
    /// Size and alignment preserving byte blob; fields are not exposed.
    Opaque,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TypeMapping {
    /// Proxy type name; defaults to the native name with `::` flattened.
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub model: DataModel,
    /// Header that defines the native type.
    pub header: PathBuf,
}

impl TypeMapping {
    pub fn new(model: DataModel, header: impl Into<PathBuf>) -> Self {
        Self {
            host_name: None,
            model,
            header: header.into(),
        }
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn host_name_for(&self, native_name: &str) -> String {
        match &self.host_name {
            Some(name) => name.clone(),
            None => native_name.replace("::", "_"),
        }
    }
}

/// Caller-supplied type mapping: one entry per struct that may be rendered.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MappingSpec {
    entries: IndexMap<String, TypeMapping>,
}

impl MappingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, native_name: impl Into<String>, mapping: TypeMapping) -> Option<TypeMapping> {
        self.entries.insert(native_name.into(), mapping)
    }

    pub fn with(mut self, native_name: impl Into<String>, mapping: TypeMapping) -> Self {
        self.insert(native_name, mapping);
        self
    }

    pub fn get(&self, native_name: &str) -> Option<&TypeMapping> {
        self.entries.get(native_name)
    }

    pub fn contains(&self, native_name: &str) -> bool {
        self.entries.contains_key(native_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /* Resolve relative headers against the directory the mapping file was loaded from */
    pub fn rebase_headers(&mut self, base: &Path) {
        for mapping in self.entries.values_mut() {
            if mapping.header.is_relative() {
                mapping.header = base.join(&mapping.header);
            }
        }
    }
}
