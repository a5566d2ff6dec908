//! Function and operator renderer.
//!
//! Every declaration becomes a native `extern "C"` shim that calls the real
//! function or operator, plus a host proxy function calling that shim.
//! Operator declarations additionally get the matching `core::ops` (or
//! `PartialEq`) impl on the proxy types.

mod operators;
mod proxy;
mod shim;
pub(crate) mod signature;

use super::errors::RenderResult;
use super::fragment::{Fragment, FragmentKind, GeneratedModule, RenderFlags};
use super::session::{CacheEntry, CacheKey, DeclKind, FingerprintBuilder, PendingRender, Session};
use super::struct_gen::C_VOID_IMPORT;
use bind_types::FunctionDecl;
use signature::{plan_function, ReturnPlan};
use std::path::Path;
use tracing::debug;

const MAYBE_UNINIT_IMPORT: &str = "use core::mem::MaybeUninit;";

fn import(line: &str) -> Fragment {
    Fragment::new(FragmentKind::Import, line, format!("{}\n", line))
}

pub struct FunctionRenderer<'a> {
    functions: &'a [FunctionDecl],
    header: &'a Path,
    header_digest: Option<&'a str>,
}

impl<'a> FunctionRenderer<'a> {
    pub fn new(functions: &'a [FunctionDecl], header: &'a Path) -> Self {
        Self {
            functions,
            header,
            header_digest: None,
        }
    }

    pub fn with_header_digest(mut self, header_digest: Option<&'a str>) -> Self {
        self.header_digest = header_digest;
        self
    }

    /// Render every declaration in order.
    ///
    /// Struct proxies for every named type must already be registered in
    /// `session`. Stops at the first failing declaration; the ones before it
    /// stay committed.
    pub fn render(&self, session: &mut Session) -> RenderResult<GeneratedModule> {
        let mut module = session.empty_module();
        for decl in self.functions {
            let entry = self.render_one(session, decl)?;
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

    /* Plain functions sharing a name in this batch get mangled proxy names */
    fn is_overloaded(&self, decl: &FunctionDecl) -> bool {
        decl.operator.is_none()
            && self
                .functions
                .iter()
                .filter(|other| other.operator.is_none() && other.name == decl.name)
                .count()
                > 1
    }

    fn render_one(&self, session: &mut Session, decl: &FunctionDecl) -> RenderResult<CacheEntry> {
        let overloaded = self.is_overloaded(decl);
        let key = self.cache_key(decl, overloaded);
        if let Some(entry) = session.cached(&key) {
            debug!(key = %key, "function cache hit");
            return Ok(entry.clone());
        }

        let plan = plan_function(decl, overloaded, session)?;
        let header = self.header.to_string_lossy().into_owned();

        let mut fragments = Vec::new();
        if matches!(plan.ret, ReturnPlan::OutParam { .. }) {
            fragments.push(import(MAYBE_UNINIT_IMPORT));
        }
        if plan.uses_c_void() {
            fragments.push(import(C_VOID_IMPORT));
        }
        if let Some(operator) = plan.operator {
            fragments.push(import(&operators::trait_import(operator)));
        }

        fragments.push(Fragment::new(
            FragmentKind::FunctionBinding,
            plan.proxy_name.clone(),
            proxy::proxy_function(&plan, &header),
        ));
        if let Some(operator) = plan.operator {
            fragments.push(Fragment::new(
                FragmentKind::FunctionBinding,
                operators::impl_header(operator, &plan),
                operators::operator_impl(operator, &plan),
            ));
        }
        fragments.push(Fragment::new(
            FragmentKind::Shim,
            plan.shim_name.clone(),
            shim::shim_function(&plan, &session.config().shim_qualifiers),
        ));

        let entry = CacheEntry {
            fragments,
            includes: vec![header],
            proxy: None,
        };
        session.commit(PendingRender {
            key,
            entry: entry.clone(),
            replaceable: decl.is_operator(),
        })?;
        Ok(entry)
    }

    fn cache_key(&self, decl: &FunctionDecl, overloaded: bool) -> CacheKey {
        let mut builder = FingerprintBuilder::new(self.header, self.header_digest);
        builder
            .part("function")
            .part(&decl.name)
            .part(&decl.return_type.to_string());
        for param in &decl.params {
            builder
                .part(param.name.as_deref().unwrap_or(""))
                .part(&param.param_type.to_string());
        }
        builder
            .part(decl.operator.map(|operator| operator.mnemonic()).unwrap_or(""))
            .part(if overloaded { "overloaded" } else { "unique" });
        builder.finish(DeclKind::Function, &decl.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::config::{OperatorOverride, RenderConfig};
    use crate::codegen::errors::RenderError;
    use crate::codegen::struct_gen::StructRenderer;
    use crate::model::{DataModel, MappingSpec, TypeMapping};
    use bind_types::{FieldDecl, NativeType, Operator, ParamDecl, StructDecl};

    fn ty(spelling: &str) -> NativeType {
        NativeType::parse(spelling).unwrap()
    }

    fn session_with_foo(config: RenderConfig) -> Session {
        let structs = vec![StructDecl::new("Foo", vec![FieldDecl::new("x", ty("int"))])];
        let specs = MappingSpec::new().with("Foo", TypeMapping::new(DataModel::Struct, "operator.h"));
        let mut session = Session::new(config);
        StructRenderer::new(&structs, &specs).render(&mut session).unwrap();
        session
    }

    fn add(lhs: &str, rhs: &str) -> FunctionDecl {
        FunctionDecl::new(
            "operator+",
            ty("Foo"),
            vec![ParamDecl::new(Some("lhs"), ty(lhs)), ParamDecl::new(Some("rhs"), ty(rhs))],
        )
        .with_operator(Operator::Add)
    }

    #[test]
    fn binary_operator_renders_shim_proxy_and_impl() {
        let mut session = session_with_foo(RenderConfig::default());
        let decls = vec![add("Foo", "Foo")];
        let module = FunctionRenderer::new(&decls, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();

        let bindings = module.fragments(FragmentKind::FunctionBinding);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name, "operator_add_Foo_Foo");
        assert!(bindings[0]
            .text
            .contains("fn __bind_shim_operator_add_Foo_Foo(retval: *mut Foo, lhs: *const Foo, rhs: *const Foo);"));
        assert!(bindings[0].text.contains("pub fn operator_add_Foo_Foo(lhs: Foo, rhs: Foo) -> Foo {"));
        assert_eq!(bindings[1].name, "impl Add<Foo> for Foo");
        assert!(bindings[1].text.contains("type Output = Foo;"));
        assert!(bindings[1].text.contains("operator_add_Foo_Foo(self, rhs)"));

        let shims = module.fragments(FragmentKind::Shim);
        assert_eq!(
            shims[0].text,
            "extern \"C\" void __bind_shim_operator_add_Foo_Foo(Foo *retval, Foo const *lhs, Foo const *rhs) {\n    *retval = (*lhs) + (*rhs);\n}\n"
        );

        let imports: Vec<&str> = module
            .fragments(FragmentKind::Import)
            .iter()
            .map(|fragment| fragment.name.as_str())
            .collect();
        assert_eq!(imports, vec![MAYBE_UNINIT_IMPORT, "use core::ops::Add;"]);
    }

    #[test]
    fn compound_assignment_takes_mut_self() {
        let mut session = session_with_foo(RenderConfig::default());
        let decls = vec![FunctionDecl::new(
            "operator+=",
            ty("Foo &"),
            vec![ParamDecl::new(Some("lhs"), ty("Foo &")), ParamDecl::new(Some("rhs"), ty("const Foo &"))],
        )
        .with_operator(Operator::AddAssign)];
        let module = FunctionRenderer::new(&decls, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();
        let bindings = module.fragments(FragmentKind::FunctionBinding);
        assert!(bindings[0].text.contains("(lhs: &mut Foo, rhs: Foo)"));
        assert!(bindings[1].text.contains("fn add_assign(&mut self, rhs: Foo) {"));
        assert!(bindings[1].text.contains("(self, rhs);"));
        assert!(module.fragments(FragmentKind::Shim)[0].text.contains("    (*lhs) += (*rhs);\n"));
    }

    #[test]
    fn overloaded_functions_get_mangled_proxy_names() {
        let mut session = session_with_foo(RenderConfig::default());
        let decls = vec![
            FunctionDecl::new("scale", ty("Foo"), vec![ParamDecl::new(Some("v"), ty("Foo"))]),
            FunctionDecl::new(
                "scale",
                ty("Foo"),
                vec![ParamDecl::new(Some("v"), ty("Foo")), ParamDecl::new(Some("k"), ty("int"))],
            ),
            FunctionDecl::new("norm", ty("float"), vec![ParamDecl::new(Some("v"), ty("const Foo &"))]),
        ];
        let module = FunctionRenderer::new(&decls, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();
        let names: Vec<&str> = module
            .fragments(FragmentKind::FunctionBinding)
            .iter()
            .map(|fragment| fragment.name.as_str())
            .collect();
        assert_eq!(names, vec!["scale_Foo", "scale_Foo_i32", "norm"]);
    }

    #[test]
    fn duplicate_operator_registration_is_rejected_by_default() {
        let mut session = session_with_foo(RenderConfig::default());
        let first = vec![add("Foo", "Foo")];
        FunctionRenderer::new(&first, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();

        let second = vec![add("const Foo &", "const Foo &")];
        let err = FunctionRenderer::new(&second, Path::new("operator.h"))
            .render(&mut session)
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::NameCollision {
                name: "impl Add<Foo> for Foo".to_string(),
                existing: "operator+".to_string(),
                incoming: "operator+".to_string(),
            }
        );
        assert!(session.fragment(FragmentKind::FunctionBinding, "operator_add_cref_Foo_cref_Foo").is_none());
    }

    #[test]
    fn last_wins_replaces_the_operator_impl() {
        let config = RenderConfig {
            operator_override: OperatorOverride::LastWins,
            ..Default::default()
        };
        let mut session = session_with_foo(config);
        let decls = vec![add("Foo", "Foo"), add("const Foo &", "const Foo &")];
        FunctionRenderer::new(&decls, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();
        let text = &session
            .fragment(FragmentKind::FunctionBinding, "impl Add<Foo> for Foo")
            .unwrap()
            .text;
        assert!(text.contains("operator_add_cref_Foo_cref_Foo(self, rhs)"));
        assert!(session.fragment(FragmentKind::FunctionBinding, "operator_add_Foo_Foo").is_some());

        /* Rendering the displaced declaration again takes the impl back */
        let first = vec![add("Foo", "Foo")];
        let module = FunctionRenderer::new(&first, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();
        let returned = &module.fragments(FragmentKind::FunctionBinding)[1];
        assert!(returned.text.contains("operator_add_Foo_Foo(self, rhs)"));
        let stored = session
            .fragment(FragmentKind::FunctionBinding, "impl Add<Foo> for Foo")
            .unwrap();
        assert_eq!(stored.text, returned.text);
    }

    #[test]
    fn equality_returning_int_compares_against_zero() {
        let mut session = session_with_foo(RenderConfig::default());
        let decls = vec![FunctionDecl::new(
            "operator==",
            ty("int"),
            vec![ParamDecl::new(None, ty("const Foo &")), ParamDecl::new(None, ty("const Foo &"))],
        )
        .with_operator(Operator::Eq)];
        let module = FunctionRenderer::new(&decls, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();
        let eq_impl = &module.fragments(FragmentKind::FunctionBinding)[1];
        assert_eq!(eq_impl.name, "impl PartialEq<Foo> for Foo");
        assert!(eq_impl.text.contains("fn eq(&self, other: &Foo) -> bool {"));
        assert!(eq_impl.text.contains("(*self, *other) != 0"));
    }

    #[test]
    fn pointer_parameters_make_the_proxy_unsafe() {
        let mut session = session_with_foo(RenderConfig {
            shim_qualifiers: "__device__".to_string(),
            ..Default::default()
        });
        let decls = vec![FunctionDecl::new(
            "fill",
            ty("void"),
            vec![ParamDecl::new(Some("out"), ty("Foo *")), ParamDecl::new(Some("n"), ty("size_t"))],
        )];
        let module = FunctionRenderer::new(&decls, Path::new("operator.h"))
            .render(&mut session)
            .unwrap();
        let binding = &module.fragments(FragmentKind::FunctionBinding)[0].text;
        assert!(binding.contains("pub unsafe fn fill(out: *mut Foo, n: u64) {"));
        assert!(binding.contains("# Safety"));
        assert_eq!(
            module.fragments(FragmentKind::Shim)[0].text,
            "extern \"C\" __device__ void __bind_shim_fill_ptr_Foo_u64(Foo * out, size_t n) {\n    fill(out, n);\n}\n"
        );
    }
}
