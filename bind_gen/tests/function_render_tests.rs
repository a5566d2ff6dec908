/* Function/Operator Renderer Tests
 *
 * Shim and proxy emission for plain functions and operator overloads, and the
 * validation that runs before anything is committed.
 */

use bind_gen::codegen::{FragmentKind, FunctionRenderer, RenderConfig, RenderError, Session, StructRenderer};
use bind_gen::model::{DataModel, MappingSpec, TypeMapping};
use bind_types::{FieldDecl, FunctionDecl, NativeType, Operator, ParamDecl, StructDecl};
use std::path::Path;

fn ty(spelling: &str) -> NativeType {
    NativeType::parse(spelling).unwrap()
}

fn register_foo(session: &mut Session, model: DataModel) {
    let structs = vec![StructDecl::new("Foo", vec![FieldDecl::new("x", ty("int"))])];
    let spec = MappingSpec::new().with("Foo", TypeMapping::new(model, "operator.h"));
    StructRenderer::new(&structs, &spec).render(session).unwrap();
}

fn binary(name: &str, operator: Operator, ret: &str, lhs: &str, rhs: &str) -> FunctionDecl {
    FunctionDecl::new(
        name,
        ty(ret),
        vec![ParamDecl::new(Some("lhs"), ty(lhs)), ParamDecl::new(Some("rhs"), ty(rhs))],
    )
    .with_operator(operator)
}

fn render(session: &mut Session, decls: &[FunctionDecl]) -> Result<bind_gen::GeneratedModule, RenderError> {
    FunctionRenderer::new(decls, Path::new("operator.h")).render(session)
}

#[test]
fn test_operator_without_registered_proxy_is_rejected() {
    let mut session = Session::default();
    let decls = vec![binary("operator+", Operator::Add, "Foo", "Foo", "Foo")];
    let err = render(&mut session, &decls).unwrap_err();
    assert!(matches!(err, RenderError::MissingOperandMapping { ref type_name, .. } if type_name == "Foo"));
    assert_eq!(session.cache_len(), 0);
}

#[test]
fn test_operator_arity_mismatch() {
    let mut session = Session::default();
    register_foo(&mut session, DataModel::Struct);

    let unary_add = FunctionDecl::new("operator+", ty("Foo"), vec![ParamDecl::new(None, ty("Foo"))])
        .with_operator(Operator::Add);
    assert_eq!(
        render(&mut session, &[unary_add]).unwrap_err(),
        RenderError::UnsupportedOperatorArity {
            function: "operator+".to_string(),
            operator: Operator::Add,
            expected: 2,
            found: 1,
        }
    );

    let ternary = FunctionDecl::new(
        "operator+",
        ty("Foo"),
        vec![
            ParamDecl::new(None, ty("Foo")),
            ParamDecl::new(None, ty("Foo")),
            ParamDecl::new(None, ty("Foo")),
        ],
    )
    .with_operator(Operator::Add);
    assert!(matches!(
        render(&mut session, &[ternary]),
        Err(RenderError::UnsupportedOperatorArity { found: 3, .. })
    ));
}

#[test]
fn test_by_value_return_limit() {
    let config = RenderConfig {
        by_value_return_limit: Some(8),
        ..Default::default()
    };
    let mut session = Session::new(config);
    register_foo(&mut session, DataModel::Struct);

    let decls = vec![binary("operator+", Operator::Add, "Foo", "Foo", "Foo")];
    let module = render(&mut session, &decls).unwrap();
    let shim = &module.fragments(FragmentKind::Shim)[0].text;
    assert_eq!(
        shim,
        "extern \"C\" Foo __bind_shim_operator_add_Foo_Foo(Foo const *lhs, Foo const *rhs) {\n    return (*lhs) + (*rhs);\n}\n"
    );
    let proxy = &module.fragments(FragmentKind::FunctionBinding)[0].text;
    assert!(proxy.contains("fn __bind_shim_operator_add_Foo_Foo(lhs: *const Foo, rhs: *const Foo) -> Foo;"));
    assert!(!proxy.contains("MaybeUninit"));
    assert!(module
        .fragments(FragmentKind::Import)
        .iter()
        .all(|import| !import.name.contains("MaybeUninit")));
}

#[test]
fn test_opaque_proxies_always_use_the_output_parameter() {
    let config = RenderConfig {
        by_value_return_limit: Some(64),
        ..Default::default()
    };
    let mut session = Session::new(config);
    register_foo(&mut session, DataModel::Opaque);

    let decls = vec![binary("operator-", Operator::Sub, "Foo", "Foo", "Foo")];
    let module = render(&mut session, &decls).unwrap();
    assert!(module.fragments(FragmentKind::Shim)[0].text.contains("Foo *retval"));
}

#[test]
fn test_unary_operator() {
    let mut session = Session::default();
    register_foo(&mut session, DataModel::Struct);
    let decls = vec![FunctionDecl::new("operator-", ty("Foo"), vec![ParamDecl::new(Some("v"), ty("const Foo &"))])
        .with_operator(Operator::Neg)];
    let module = render(&mut session, &decls).unwrap();

    let bindings = module.fragments(FragmentKind::FunctionBinding);
    assert_eq!(bindings[0].name, "operator_neg_cref_Foo");
    assert_eq!(bindings[1].name, "impl Neg for Foo");
    assert!(bindings[1].text.contains("fn neg(self) -> Self::Output {"));
    assert!(module.fragments(FragmentKind::Shim)[0].text.contains("*retval = -(*v);"));
}

#[test]
fn test_mixed_operand_operator() {
    let mut session = Session::default();
    register_foo(&mut session, DataModel::Struct);
    let decls = vec![binary("operator*", Operator::Mul, "Foo", "float", "const Foo &")];
    let module = render(&mut session, &decls).unwrap();

    let bindings = module.fragments(FragmentKind::FunctionBinding);
    assert_eq!(bindings[1].name, "impl Mul<Foo> for f32");
    assert!(bindings[0].text.contains("pub fn operator_mul_f32_cref_Foo(lhs: f32, rhs: Foo) -> Foo {"));
    assert!(module.fragments(FragmentKind::Shim)[0].text.contains("float lhs, Foo const *rhs)"));
}

#[test]
fn test_equality_must_return_bool_or_integer() {
    let mut session = Session::default();
    register_foo(&mut session, DataModel::Struct);

    let float_eq = binary("operator==", Operator::Eq, "float", "Foo", "Foo");
    assert!(matches!(
        render(&mut session, &[float_eq]),
        Err(RenderError::UnsupportedOperatorReturn { .. })
    ));

    let bool_eq = binary("operator==", Operator::Eq, "bool", "const Foo &", "const Foo &");
    let module = render(&mut session, &[bool_eq]).unwrap();
    let eq_impl = &module.fragments(FragmentKind::FunctionBinding)[1].text;
    assert!(eq_impl.contains("        operator_eq_cref_Foo_cref_Foo(*self, *other)\n"));
}

#[test]
fn test_plain_function_without_parameters() {
    let mut session = Session::default();
    let decls = vec![FunctionDecl::new("tick", ty("void"), vec![])];
    let module = render(&mut session, &decls).unwrap();
    assert_eq!(
        module.fragments(FragmentKind::Shim)[0].text,
        "extern \"C\" void __bind_shim_tick_void(void) {\n    tick();\n}\n"
    );
    let proxy = &module.fragments(FragmentKind::FunctionBinding)[0].text;
    assert!(proxy.contains("pub fn tick() {\n    unsafe { __bind_shim_tick_void() };\n}\n"));
    assert!(module.fragments(FragmentKind::Import).is_empty());
}

#[test]
fn test_void_pointer_parameters_import_c_void() {
    let mut session = Session::default();
    let decls = vec![FunctionDecl::new(
        "release",
        ty("int"),
        vec![ParamDecl::new(Some("handle"), ty("void *"))],
    )];
    let module = render(&mut session, &decls).unwrap();
    let imports: Vec<&str> = module
        .fragments(FragmentKind::Import)
        .iter()
        .map(|import| import.name.as_str())
        .collect();
    assert!(imports.contains(&"use core::ffi::c_void;"));
    assert!(module.fragments(FragmentKind::FunctionBinding)[0]
        .text
        .contains("pub unsafe fn release(handle: *mut c_void) -> i32 {"));
}

#[test]
fn test_failing_declaration_keeps_earlier_ones() {
    let mut session = Session::default();
    register_foo(&mut session, DataModel::Struct);
    let before = session.cache_len();
    let decls = vec![
        binary("operator+", Operator::Add, "Foo", "Foo", "Foo"),
        binary("operator-", Operator::Sub, "Foo", "Foo", "Bar"),
    ];
    assert!(render(&mut session, &decls).is_err());
    assert_eq!(session.cache_len(), before + 1);
    assert!(session.fragment(FragmentKind::FunctionBinding, "impl Add<Foo> for Foo").is_some());
    assert!(session.fragment(FragmentKind::FunctionBinding, "impl Sub<Bar> for Foo").is_none());
}

#[test]
fn test_shim_prefix_is_configurable() {
    let config = RenderConfig {
        shim_prefix: "__my_".to_string(),
        ..Default::default()
    };
    let mut session = Session::new(config);
    let decls = vec![FunctionDecl::new("sq", ty("double"), vec![ParamDecl::new(Some("v"), ty("double"))])];
    let module = render(&mut session, &decls).unwrap();
    assert_eq!(module.fragments(FragmentKind::Shim)[0].name, "__my_sq_f64");
}

#[test]
fn test_pointer_to_const_pointer_keeps_its_qualifier() {
    let mut session = Session::default();
    let decls = vec![FunctionDecl::new(
        "g",
        ty("void"),
        vec![ParamDecl::new(Some("p"), ty("float * const *"))],
    )];
    let module = render(&mut session, &decls).unwrap();
    assert_eq!(
        module.fragments(FragmentKind::Shim)[0].text,
        "extern \"C\" void __bind_shim_g_cptr_ptr_f32(float * const * p) {\n    g(p);\n}\n"
    );
    assert!(module.fragments(FragmentKind::FunctionBinding)[0]
        .text
        .contains("pub unsafe fn g(p: *const *mut f32) {"));
}

#[test]
fn test_unnamed_parameter_does_not_reuse_a_declared_name() {
    let mut session = Session::default();
    let decls = vec![FunctionDecl::new(
        "f",
        ty("void"),
        vec![ParamDecl::new(Some("arg1"), ty("int")), ParamDecl::new(None, ty("int"))],
    )];
    let module = render(&mut session, &decls).unwrap();
    assert_eq!(
        module.fragments(FragmentKind::Shim)[0].text,
        "extern \"C\" void __bind_shim_f_i32_i32(int arg1, int arg1_) {\n    f(arg1, arg1_);\n}\n"
    );
    assert!(module.fragments(FragmentKind::FunctionBinding)[0]
        .text
        .contains("pub fn f(arg1: i32, arg1_: i32) {\n    unsafe { __bind_shim_f_i32_i32(arg1, arg1_) };\n}\n"));
}
