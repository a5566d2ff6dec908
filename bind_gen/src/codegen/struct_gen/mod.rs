//! Struct renderer: one host proxy type plus native layout checks per struct.

mod layout_shim;
mod proxy;

use super::errors::{RenderError, RenderResult};
use super::fragment::{Fragment, FragmentKind, GeneratedModule, RenderFlags};
use super::helpers::{escape_rust_keyword, host_type, sanitize_identifier, C_VOID};
use super::session::{CacheEntry, CacheKey, DeclKind, FingerprintBuilder, PendingRender, ProxyType, Session};
use crate::model::{DataModel, LayoutError, LayoutResolver, MappingSpec, StructLayout, TypeMapping};
use bind_types::StructDecl;
use proxy::ProxyField;
use tracing::{debug, trace};

pub(crate) const C_VOID_IMPORT: &str = "use core::ffi::c_void;";

pub struct StructRenderer<'a> {
    structs: &'a [StructDecl],
    specs: &'a MappingSpec,
    header_digest: Option<&'a str>,
}

impl<'a> StructRenderer<'a> {
    pub fn new(structs: &'a [StructDecl], specs: &'a MappingSpec) -> Self {
        Self {
            structs,
            specs,
            header_digest: None,
        }
    }

    /// Fold the header's content digest into every cache key.
    pub fn with_header_digest(mut self, header_digest: Option<&'a str>) -> Self {
        self.header_digest = header_digest;
        self
    }

    /// Render every struct in declaration order.
    ///
    /// Stops at the first failing struct; the ones before it stay committed.
    pub fn render(&self, session: &mut Session) -> RenderResult<GeneratedModule> {
        let mut module = session.empty_module();
        let mut resolver = LayoutResolver::new(self.structs, session.config().pointer_width);
        for proxy in session.proxies() {
            resolver.add_known(proxy.native_name.clone(), proxy.size, proxy.alignment);
        }

        for decl in self.structs {
            let entry = self.render_one(session, &mut resolver, decl)?;
            for header in &entry.includes {
                module.add_include(header.clone());
            }
            module.extend(entry.fragments);
        }
        Ok(module)
    }

    pub fn render_as_str(&self, session: &mut Session, flags: RenderFlags) -> RenderResult<String> {
        Ok(self.render(session)?.to_text(flags))
    }

    fn render_one(
        &self,
        session: &mut Session,
        resolver: &mut LayoutResolver,
        decl: &StructDecl,
    ) -> RenderResult<CacheEntry> {
        let mapping = self.specs.get(&decl.name).ok_or_else(|| RenderError::MissingMapping {
            struct_name: decl.name.clone(),
        })?;

        let key = self.cache_key(decl, mapping);
        if let Some(entry) = session.cached(&key) {
            debug!(key = %key, "struct cache hit");
            return Ok(entry.clone());
        }

        let layout = resolver
            .resolve(&decl.name)
            .map_err(|err| layout_error(decl, err))?;
        trace!(
            name = %decl.name,
            size = layout.size,
            alignment = layout.alignment,
            "computed native layout"
        );

        let host_name = sanitize_identifier(&mapping.host_name_for(&decl.name));
        let header = mapping.header.to_string_lossy().into_owned();
        let comment = decl.comment.as_deref();

        let mut fragments = Vec::new();
        let text = match mapping.model {
            DataModel::Struct => {
                let fields = self.proxy_fields(session, decl, &layout)?;
                if fields.iter().any(|field| field.host_type.contains(C_VOID)) {
                    fragments.push(Fragment::new(
                        FragmentKind::Import,
                        C_VOID_IMPORT,
                        format!("{}\n", C_VOID_IMPORT),
                    ));
                }
                proxy::struct_proxy(&decl.name, &host_name, &header, comment, &layout, &fields)
            }
            DataModel::Opaque => proxy::opaque_proxy(&decl.name, &host_name, &header, comment, &layout),
        };
        fragments.push(Fragment::new(FragmentKind::StructBinding, host_name.clone(), text));
        fragments.push(Fragment::new(
            FragmentKind::Shim,
            format!("static_assert {}", decl.name),
            layout_shim::layout_asserts(&decl.name, &layout),
        ));

        let entry = CacheEntry {
            fragments,
            includes: vec![header],
            proxy: Some(ProxyType {
                native_name: decl.name.clone(),
                host_name,
                size: layout.size,
                alignment: layout.alignment,
                model: mapping.model,
            }),
        };
        session.commit(PendingRender {
            key,
            entry: entry.clone(),
            replaceable: false,
        })?;
        Ok(entry)
    }

    fn proxy_fields(
        &self,
        session: &Session,
        decl: &StructDecl,
        layout: &StructLayout,
    ) -> RenderResult<Vec<ProxyField>> {
        let lookup = |name: &str| -> Option<String> {
            if let Some(proxy) = session.proxy(name) {
                return Some(proxy.host_name.clone());
            }
            if let Some(mapping) = self.specs.get(name) {
                return Some(sanitize_identifier(&mapping.host_name_for(name)));
            }
            self.structs
                .iter()
                .any(|other| other.name == name)
                .then(|| sanitize_identifier(name))
        };

        decl.fields
            .iter()
            .zip(&layout.fields)
            .map(|(field, field_layout)| {
                let host = host_type(&field.field_type, &lookup).ok_or_else(|| {
                    RenderError::UnsupportedFieldType {
                        struct_name: decl.name.clone(),
                        field: field.name.clone(),
                        field_type: field.field_type.to_string(),
                        reason: "type has no host representation".to_string(),
                    }
                })?;
                Ok(ProxyField {
                    native_name: field.name.clone(),
                    ident: escape_rust_keyword(&field.name),
                    host_type: host,
                    offset: field_layout.offset,
                })
            })
            .collect()
    }

    fn cache_key(&self, decl: &StructDecl, mapping: &TypeMapping) -> CacheKey {
        let mut builder = FingerprintBuilder::new(&mapping.header, self.header_digest);
        builder.part("struct").part(&decl.name);
        for field in &decl.fields {
            builder.part(&field.name).part(&field.field_type.to_string());
        }
        builder.part(decl.comment.as_deref().unwrap_or(""));
        builder
            .part(&mapping.host_name_for(&decl.name))
            .part(match mapping.model {
                DataModel::Struct => "struct",
                DataModel::Opaque => "opaque",
            });
        builder.finish(DeclKind::Struct, &decl.name)
    }
}

fn layout_error(decl: &StructDecl, err: LayoutError) -> RenderError {
    match err {
        LayoutError::Field {
            struct_name,
            field,
            field_type,
            reason,
        } => RenderError::UnsupportedFieldType {
            struct_name,
            field,
            field_type,
            reason,
        },
        other => RenderError::UnsupportedFieldType {
            struct_name: decl.name.clone(),
            field: String::new(),
            field_type: decl.name.clone(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bind_types::{FieldDecl, NativeType};

    fn ty(spelling: &str) -> NativeType {
        NativeType::parse(spelling).unwrap()
    }

    fn foo() -> Vec<StructDecl> {
        vec![StructDecl::new("Foo", vec![FieldDecl::new("x", ty("int"))])]
    }

    fn spec() -> MappingSpec {
        MappingSpec::new().with("Foo", TypeMapping::new(DataModel::Struct, "operator.h"))
    }

    #[test]
    fn renders_proxy_with_layout_checks() {
        let decls = foo();
        let specs = spec();
        let mut session = Session::default();
        let module = StructRenderer::new(&decls, &specs).render(&mut session).unwrap();

        let binding = &module.fragments(FragmentKind::StructBinding)[0];
        assert_eq!(binding.name, "Foo");
        assert!(binding.text.contains("#[repr(C)]"));
        assert!(binding.text.contains("pub x: i32,"));
        assert!(binding.text.contains("pub const fn new(x: i32) -> Self"));
        assert!(binding.text.contains("[(\"x\", 0)]"));
        assert!(binding.text.contains("assert!(core::mem::size_of::<Foo>() == 4);"));
        assert!(binding.text.contains("assert!(core::mem::offset_of!(Foo, x) == 0);"));

        let proxy = session.proxy("Foo").unwrap();
        assert_eq!((proxy.size, proxy.alignment), (4, 4));
        assert_eq!(module.includes(), ["operator.h".to_string()]);
    }

    #[test]
    fn opaque_model_keeps_size_and_alignment_only() {
        let decls = vec![StructDecl::new(
            "Pair",
            vec![FieldDecl::new("a", ty("double")), FieldDecl::new("b", ty("char"))],
        )];
        let specs = MappingSpec::new().with(
            "Pair",
            TypeMapping::new(DataModel::Opaque, "pair.h").with_host_name("RawPair"),
        );
        let mut session = Session::default();
        let module = StructRenderer::new(&decls, &specs).render(&mut session).unwrap();
        let text = &module.fragments(FragmentKind::StructBinding)[0].text;
        assert!(text.contains("#[repr(C, align(8))]"));
        assert!(text.contains("pub struct RawPair {\n    bytes: [u8; 16],\n}"));
        assert!(text.contains("pub const fn to_bytes(self) -> [u8; 16]"));
        assert!(!text.contains("offset_of"));
    }

    #[test]
    fn unknown_pointee_degrades_to_c_void() {
        let decls = vec![StructDecl::new("Node", vec![FieldDecl::new("handle", ty("Handle *"))])];
        let specs = MappingSpec::new().with("Node", TypeMapping::new(DataModel::Struct, "node.h"));
        let mut session = Session::default();
        let module = StructRenderer::new(&decls, &specs).render(&mut session).unwrap();
        assert!(module.fragments(FragmentKind::StructBinding)[0]
            .text
            .contains("pub handle: *mut c_void,"));
        assert_eq!(module.fragments(FragmentKind::Import)[0].name, C_VOID_IMPORT);
    }

    #[test]
    fn reference_fields_are_rejected() {
        let decls = vec![StructDecl::new("Bad", vec![FieldDecl::new("r", ty("int &"))])];
        let specs = MappingSpec::new().with("Bad", TypeMapping::new(DataModel::Struct, "bad.h"));
        let mut session = Session::default();
        let err = StructRenderer::new(&decls, &specs).render(&mut session).unwrap_err();
        match err {
            RenderError::UnsupportedFieldType { struct_name, field, .. } => {
                assert_eq!(struct_name, "Bad");
                assert_eq!(field, "r");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(session.cache_len(), 0);
    }

    #[test]
    fn empty_struct_gets_reserved_byte() {
        let decls = vec![StructDecl::new("Tag", vec![])];
        let specs = MappingSpec::new().with("Tag", TypeMapping::new(DataModel::Struct, "tag.h"));
        let mut session = Session::default();
        let module = StructRenderer::new(&decls, &specs).render(&mut session).unwrap();
        let text = &module.fragments(FragmentKind::StructBinding)[0].text;
        assert!(text.contains("_reserved: u8,"));
        assert!(text.contains("Self { _reserved: 0 }"));
        assert!(text.contains("size_of::<Tag>() == 1"));
    }
}
