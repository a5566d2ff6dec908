use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IntegralType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FloatingPointType {
    F16,
    F32,
    F64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveType {
    Bool,
    Integral(IntegralType),
    FloatingPoint(FloatingPointType),
}

impl PrimitiveType {
    /// Size in bytes; alignment is the same for every primitive we model.
    pub fn size(&self) -> u64 {
        match self {
            PrimitiveType::Bool => 1,
            PrimitiveType::Integral(int_type) => match int_type {
                IntegralType::U8 | IntegralType::I8 => 1,
                IntegralType::U16 | IntegralType::I16 => 2,
                IntegralType::U32 | IntegralType::I32 => 4,
                IntegralType::U64 | IntegralType::I64 => 8,
            },
            PrimitiveType::FloatingPoint(float_type) => match float_type {
                FloatingPointType::F16 => 2,
                FloatingPointType::F32 => 4,
                FloatingPointType::F64 => 8,
            },
        }
    }

    /// Spelling used when the declaration did not carry one.
    pub fn canonical_spelling(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Integral(int_type) => match int_type {
                IntegralType::U8 => "uint8_t",
                IntegralType::U16 => "uint16_t",
                IntegralType::U32 => "uint32_t",
                IntegralType::U64 => "uint64_t",
                IntegralType::I8 => "int8_t",
                IntegralType::I16 => "int16_t",
                IntegralType::I32 => "int32_t",
                IntegralType::I64 => "int64_t",
            },
            PrimitiveType::FloatingPoint(float_type) => match float_type {
                FloatingPointType::F16 => "_Float16",
                FloatingPointType::F32 => "float",
                FloatingPointType::F64 => "double",
            },
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, PrimitiveType::Integral(_))
    }

    /* Map a builtin C/C++ spelling (whitespace-normalized, qualifiers removed) */
    fn from_builtin(spelling: &str) -> Option<Self> {
        use FloatingPointType::*;
        use IntegralType::*;

        let prim = match spelling {
            "bool" | "_Bool" => PrimitiveType::Bool,
            "char" | "signed char" | "int8_t" => PrimitiveType::Integral(I8),
            "unsigned char" | "uint8_t" => PrimitiveType::Integral(U8),
            "short" | "short int" | "signed short" | "signed short int" | "int16_t" => {
                PrimitiveType::Integral(I16)
            }
            "unsigned short" | "unsigned short int" | "uint16_t" => PrimitiveType::Integral(U16),
            "int" | "signed" | "signed int" | "int32_t" => PrimitiveType::Integral(I32),
            "unsigned" | "unsigned int" | "uint32_t" => PrimitiveType::Integral(U32),
            "long" | "long int" | "signed long" | "signed long int" | "long long"
            | "long long int" | "signed long long" | "signed long long int" | "int64_t"
            | "ptrdiff_t" | "ssize_t" | "intptr_t" => PrimitiveType::Integral(I64),
            "unsigned long" | "unsigned long int" | "unsigned long long"
            | "unsigned long long int" | "uint64_t" | "size_t" | "uintptr_t" => {
                PrimitiveType::Integral(U64)
            }
            "float" => PrimitiveType::FloatingPoint(F32),
            "double" => PrimitiveType::FloatingPoint(F64),
            "half" | "__half" | "_Float16" | "__fp16" => PrimitiveType::FloatingPoint(F16),
            _ => return None,
        };
        Some(prim)
    }
}

/// A native type as written in a declaration.
///
/// Serialized as its C spelling, e.g. `"const Foo &"` or `"int32_t[4]"`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum NativeType {
    Void,
    Primitive {
        prim: PrimitiveType,
        /// Original spelling, kept so shims name the exact same type.
        spelling: String,
    },
    Named(String),
    Pointer {
        pointee: Box<NativeType>,
        is_const: bool,
    },
    Reference {
        referent: Box<NativeType>,
        is_const: bool,
    },
    Array {
        element: Box<NativeType>,
        len: u64,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeParseError {
    #[error("empty type spelling")]
    Empty,

    #[error("rvalue references are not supported: '{0}'")]
    RvalueReference(String),

    #[error("invalid array bound in '{0}'")]
    InvalidArrayBound(String),

    #[error("unsupported type spelling '{0}'")]
    Unsupported(String),
}

impl NativeType {
    pub fn primitive(prim: PrimitiveType) -> Self {
        NativeType::Primitive {
            prim,
            spelling: prim.canonical_spelling().to_string(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        NativeType::Named(name.into())
    }

    pub fn pointer_to(pointee: NativeType, is_const: bool) -> Self {
        NativeType::Pointer {
            pointee: Box::new(pointee),
            is_const,
        }
    }

    pub fn reference_to(referent: NativeType, is_const: bool) -> Self {
        NativeType::Reference {
            referent: Box::new(referent),
            is_const,
        }
    }

    pub fn parse(spelling: &str) -> Result<Self, TypeParseError> {
        spelling.parse()
    }

    pub fn is_void(&self) -> bool {
        matches!(self, NativeType::Void)
    }

    /// The type with one level of reference removed (values are returned as-is).
    pub fn strip_reference(&self) -> &NativeType {
        match self {
            NativeType::Reference { referent, .. } => referent,
            other => other,
        }
    }

    /// Named struct behind an optional reference.
    pub fn value_name(&self) -> Option<&str> {
        match self.strip_reference() {
            NativeType::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self.strip_reference() {
            NativeType::Primitive { prim, .. } => Some(*prim),
            _ => None,
        }
    }

    /* Innermost element plus array bounds, outermost first */
    fn array_parts(&self) -> (&NativeType, Vec<u64>) {
        let mut dims = Vec::new();
        let mut current = self;
        while let NativeType::Array { element, len } = current {
            dims.push(*len);
            current = element;
        }
        (current, dims)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Void => write!(f, "void"),
            NativeType::Primitive { spelling, .. } => write!(f, "{}", spelling),
            NativeType::Named(name) => write!(f, "{}", name),
            NativeType::Pointer { pointee, is_const } => write_qualified(f, pointee, *is_const, "*"),
            NativeType::Reference { referent, is_const } => write_qualified(f, referent, *is_const, "&"),
            NativeType::Array { .. } => {
                let (element, dims) = self.array_parts();
                write!(f, "{}", element)?;
                for dim in dims {
                    write!(f, "[{}]", dim)?;
                }
                Ok(())
            }
        }
    }
}

/* A const pointer pointee must be written east-const: `float * const *` */
fn write_qualified(f: &mut fmt::Formatter<'_>, inner: &NativeType, is_const: bool, declarator: &str) -> fmt::Result {
    match (is_const, inner) {
        (false, _) => write!(f, "{} {}", inner, declarator),
        (true, NativeType::Pointer { .. }) => write!(f, "{} const {}", inner, declarator),
        (true, _) => write!(f, "const {} {}", inner, declarator),
    }
}

impl FromStr for NativeType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypeParseError::Empty);
        }

        /* Array bounds: `T[2][3]` is an array of 2 arrays of 3 */
        if trimmed.ends_with(']') {
            let open = trimmed
                .find('[')
                .ok_or_else(|| TypeParseError::InvalidArrayBound(trimmed.to_string()))?;
            let mut dims = Vec::new();
            for bound in trimmed[open..].split('[').skip(1) {
                let bound = bound
                    .strip_suffix(']')
                    .ok_or_else(|| TypeParseError::InvalidArrayBound(trimmed.to_string()))?;
                let len = bound
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| TypeParseError::InvalidArrayBound(trimmed.to_string()))?;
                dims.push(len);
            }
            let mut element: NativeType = trimmed[..open].parse()?;
            for len in dims.into_iter().rev() {
                element = NativeType::Array {
                    element: Box::new(element),
                    len,
                };
            }
            return Ok(element);
        }

        /* `T * const` - constness of the pointer itself does not matter here */
        let trimmed = strip_trailing_const(trimmed);

        if trimmed.ends_with("&&") {
            return Err(TypeParseError::RvalueReference(s.trim().to_string()));
        }
        if let Some(rest) = trimmed.strip_suffix('&') {
            let (is_const, rest) = split_const(rest);
            return Ok(NativeType::reference_to(rest.parse()?, is_const));
        }
        if let Some(rest) = trimmed.strip_suffix('*') {
            let (is_const, rest) = split_const(rest);
            return Ok(NativeType::pointer_to(rest.parse()?, is_const));
        }

        let words: Vec<&str> = trimmed
            .split_whitespace()
            .filter(|word| !matches!(*word, "const" | "volatile" | "struct" | "class"))
            .collect();
        if words.is_empty() {
            return Err(TypeParseError::Unsupported(s.trim().to_string()));
        }
        let base = words.join(" ");

        if base == "void" {
            return Ok(NativeType::Void);
        }
        if let Some(prim) = PrimitiveType::from_builtin(&base) {
            return Ok(NativeType::Primitive {
                prim,
                spelling: base,
            });
        }
        if words.len() == 1 && is_qualified_identifier(&base) {
            return Ok(NativeType::Named(base));
        }

        Err(TypeParseError::Unsupported(s.trim().to_string()))
    }
}

impl TryFrom<String> for NativeType {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NativeType> for String {
    fn from(value: NativeType) -> Self {
        value.to_string()
    }
}

fn strip_trailing_const(s: &str) -> &str {
    let mut current = s.trim_end();
    while let Some(rest) = current.strip_suffix("const") {
        /* Only a standalone keyword, not the tail of an identifier */
        if rest.ends_with(|c: char| c.is_whitespace() || c == '*' || c == '&') {
            current = rest.trim_end();
        } else {
            break;
        }
    }
    current
}

/* Split the `const` qualifying this level off a pointer or reference target.
 * A trailing `const` always belongs here; a leading one only when no inner
 * declarator would claim it (`const float * *` is a pointer to `const float *`). */
fn split_const(s: &str) -> (bool, &str) {
    let current = s.trim();
    let stripped = strip_trailing_const(current);
    if stripped.len() != current.len() {
        return (true, stripped);
    }
    if !current.contains('*') {
        if let Some(rest) = current.strip_prefix("const ") {
            return (true, rest.trim_start());
        }
    }
    (false, current)
}

fn is_qualified_identifier(s: &str) -> bool {
    s.split("::").all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}
