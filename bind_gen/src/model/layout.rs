//! Native memory layout of declared structs.
//!
//! Layouts follow the C rules the native compiler applies to a plain struct:
//! every field is placed at the next offset aligned to its natural alignment,
//! the struct takes the largest field alignment and its size is rounded up to
//! that alignment. An empty struct occupies one byte, as in C++.

use bind_types::{NativeType, StructDecl};
use indexmap::IndexMap;
use serde_derive::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldLayout {
    pub name: String,
    pub native_type: String,
    pub offset: u64,
    pub size: u64,
    pub alignment: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StructLayout {
    pub name: String,
    pub size: u64,
    pub alignment: u64,
    pub fields: Vec<FieldLayout>,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("'{0}' is not a known struct")]
    UnknownType(String),

    #[error("struct '{0}' contains itself by value")]
    Recursive(String),

    #[error("'{0}' has no storage layout")]
    Unsized(String),

    #[error("'{0}' is larger than any object the target can address")]
    Overflow(String),

    #[error("field '{struct_name}::{field}' of type '{field_type}': {reason}")]
    Field {
        struct_name: String,
        field: String,
        field_type: String,
        reason: String,
    },
}

/* Objects past isize::MAX bytes cannot be declared on a 64-bit host */
const MAX_OBJECT_SIZE: u64 = i64::MAX as u64;

/// `offset` rounded up to `alignment`; `None` when that does not fit a `u64`.
pub fn align_up(offset: u64, alignment: u64) -> Option<u64> {
    if alignment <= 1 {
        return Some(offset);
    }
    offset.div_ceil(alignment).checked_mul(alignment)
}

fn bounded(size: Option<u64>, what: impl FnOnce() -> String) -> Result<u64, LayoutError> {
    size.filter(|size| *size <= MAX_OBJECT_SIZE)
        .ok_or_else(|| LayoutError::Overflow(what()))
}

/// Computes struct layouts over one batch of declarations.
///
/// Types registered with [`LayoutResolver::add_known`] (proxies rendered by
/// an earlier call) take precedence over batch declarations of the same name.
pub struct LayoutResolver<'a> {
    pointer_width: u64,
    decls: IndexMap<&'a str, &'a StructDecl>,
    known: HashMap<String, (u64, u64)>,
    resolved: HashMap<String, StructLayout>,
    in_progress: Vec<String>,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(decls: &'a [StructDecl], pointer_width: u64) -> Self {
        Self {
            pointer_width,
            decls: decls.iter().map(|decl| (decl.name.as_str(), decl)).collect(),
            known: HashMap::new(),
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn add_known(&mut self, name: impl Into<String>, size: u64, alignment: u64) {
        self.known.insert(name.into(), (size, alignment));
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn resolve(&mut self, name: &str) -> Result<StructLayout, LayoutError> {
        if let Some(layout) = self.resolved.get(name) {
            return Ok(layout.clone());
        }
        if self.in_progress.iter().any(|pending| pending == name) {
            return Err(LayoutError::Recursive(name.to_string()));
        }
        let decl = *self
            .decls
            .get(name)
            .ok_or_else(|| LayoutError::UnknownType(name.to_string()))?;

        self.in_progress.push(name.to_string());
        let result = self.layout_fields(decl);
        self.in_progress.pop();

        let layout = result?;
        self.resolved.insert(name.to_string(), layout.clone());
        Ok(layout)
    }

    /// Size and alignment of a field type.
    pub fn type_layout(&mut self, ty: &NativeType) -> Result<(u64, u64), LayoutError> {
        match ty {
            NativeType::Void => Err(LayoutError::Unsized(ty.to_string())),
            NativeType::Primitive { prim, .. } => Ok((prim.size(), prim.size())),
            NativeType::Pointer { .. } => Ok((self.pointer_width, self.pointer_width)),
            NativeType::Reference { .. } => Err(LayoutError::Unsized(ty.to_string())),
            NativeType::Array { element, len } => {
                let (size, alignment) = self.type_layout(element)?;
                let total = bounded(size.checked_mul(*len), || ty.to_string())?;
                Ok((total, alignment))
            }
            NativeType::Named(name) => {
                if let Some(known) = self.known.get(name) {
                    return Ok(*known);
                }
                let layout = self.resolve(name)?;
                Ok((layout.size, layout.alignment))
            }
        }
    }

    fn layout_fields(&mut self, decl: &StructDecl) -> Result<StructLayout, LayoutError> {
        let mut fields = Vec::with_capacity(decl.fields.len());
        let mut current_offset = 0u64;
        let mut max_alignment = 1u64;

        for field in &decl.fields {
            let (size, alignment) = match self.type_layout(&field.field_type) {
                Ok(layout) => layout,
                /* Keep the innermost field that failed */
                Err(err @ LayoutError::Field { .. }) => return Err(err),
                Err(err) => {
                    return Err(LayoutError::Field {
                        struct_name: decl.name.clone(),
                        field: field.name.clone(),
                        field_type: field.field_type.to_string(),
                        reason: err.to_string(),
                    });
                }
            };

            let placed = align_up(current_offset, alignment)
                .and_then(|offset| Some((offset, offset.checked_add(size)?)))
                .filter(|(_, end)| *end <= MAX_OBJECT_SIZE);
            let Some((offset, end)) = placed else {
                return Err(LayoutError::Field {
                    struct_name: decl.name.clone(),
                    field: field.name.clone(),
                    field_type: field.field_type.to_string(),
                    reason: LayoutError::Overflow(decl.name.clone()).to_string(),
                });
            };
            fields.push(FieldLayout {
                name: field.name.clone(),
                native_type: field.field_type.to_string(),
                offset,
                size,
                alignment,
            });
            current_offset = end;
            max_alignment = max_alignment.max(alignment);
        }

        let size = if fields.is_empty() {
            1
        } else {
            bounded(align_up(current_offset, max_alignment), || decl.name.clone())?
        };

        Ok(StructLayout {
            name: decl.name.clone(),
            size,
            alignment: max_alignment,
            fields,
        })
    }
}
