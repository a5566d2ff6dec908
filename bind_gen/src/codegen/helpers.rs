use bind_types::{FloatingPointType, IntegralType, NativeType, PrimitiveType};

pub const C_VOID: &str = "c_void";

/* Escape identifiers that collide with Rust keywords */
pub fn escape_rust_keyword(name: &str) -> String {
    const RUST_KEYWORDS: &[&str] = &[
        "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
        "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
        "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
        "await", "dyn", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
        "priv", "typeof", "unsized", "virtual", "yield", "try",
    ];
    /* These cannot be raw identifiers */
    const RESERVED_PATHS: &[&str] = &["crate", "self", "Self", "super", "_"];

    if RESERVED_PATHS.contains(&name) {
        format!("{}_", name)
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Identifier-safe stem of a native name (`ns::Foo` -> `ns_Foo`).
pub fn sanitize_identifier(native: &str) -> String {
    let flattened = native.replace("::", "_");
    let mut out: String = flattened
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) || out.is_empty() {
        out.insert(0, '_');
    }
    out
}

/// Host spelling of a primitive. `f16` travels as its raw bits.
pub fn primitive_host_name(prim: PrimitiveType) -> &'static str {
    match prim {
        PrimitiveType::Bool => "bool",
        PrimitiveType::Integral(int_type) => match int_type {
            IntegralType::U8 => "u8",
            IntegralType::U16 => "u16",
            IntegralType::U32 => "u32",
            IntegralType::U64 => "u64",
            IntegralType::I8 => "i8",
            IntegralType::I16 => "i16",
            IntegralType::I32 => "i32",
            IntegralType::I64 => "i64",
        },
        PrimitiveType::FloatingPoint(float_type) => match float_type {
            FloatingPointType::F16 => "u16",
            FloatingPointType::F32 => "f32",
            FloatingPointType::F64 => "f64",
        },
    }
}

pub fn is_f16(prim: PrimitiveType) -> bool {
    prim == PrimitiveType::FloatingPoint(FloatingPointType::F16)
}

/// Host spelling of a storable native type.
///
/// `lookup` maps a named native type to its proxy name. Pointers to named
/// types without a proxy degrade to `c_void`. Returns `None` for `void`,
/// references and unresolvable named values.
pub fn host_type(ty: &NativeType, lookup: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    match ty {
        NativeType::Void | NativeType::Reference { .. } => None,
        NativeType::Primitive { prim, .. } => Some(primitive_host_name(*prim).to_string()),
        NativeType::Named(name) => lookup(name),
        NativeType::Pointer { pointee, is_const } => {
            let inner = match pointee.as_ref() {
                NativeType::Void => C_VOID.to_string(),
                NativeType::Named(name) => lookup(name).unwrap_or_else(|| C_VOID.to_string()),
                NativeType::Reference { .. } => return None,
                other => host_type(other, lookup)?,
            };
            let mutability = if *is_const { "const" } else { "mut" };
            Some(format!("*{} {}", mutability, inner))
        }
        NativeType::Array { element, len } => {
            Some(format!("[{}; {}]", host_type(element, lookup)?, len))
        }
    }
}

pub fn contains_pointer(ty: &NativeType) -> bool {
    match ty {
        NativeType::Pointer { .. } => true,
        NativeType::Array { element, .. } => contains_pointer(element),
        NativeType::Reference { referent, .. } => contains_pointer(referent),
        _ => false,
    }
}

/// Collision-free identifier fragment for a native type.
pub fn mangle_type(ty: &NativeType) -> String {
    match ty {
        NativeType::Void => "void".to_string(),
        NativeType::Primitive { prim, .. } => {
            if is_f16(*prim) {
                "f16".to_string()
            } else {
                primitive_host_name(*prim).to_string()
            }
        }
        NativeType::Named(name) => sanitize_identifier(name),
        NativeType::Pointer { pointee, is_const } => {
            let marker = if *is_const { "cptr" } else { "ptr" };
            format!("{}_{}", marker, mangle_type(pointee))
        }
        NativeType::Reference { referent, is_const } => {
            let marker = if *is_const { "cref" } else { "ref" };
            format!("{}_{}", marker, mangle_type(referent))
        }
        NativeType::Array { element, len } => format!("arr{}_{}", len, mangle_type(element)),
    }
}

pub fn mangle_params<'a>(params: impl IntoIterator<Item = &'a NativeType>) -> String {
    let parts: Vec<String> = params.into_iter().map(mangle_type).collect();
    if parts.is_empty() {
        "void".to_string()
    } else {
        parts.join("_")
    }
}

/// Indent every non-empty line of `text` by `width` spaces.
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
