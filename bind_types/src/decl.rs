use crate::native::NativeType;
use crate::operator::Operator;
use serde_derive::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    pub name: String,
    pub field_type: NativeType,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ParamDecl {
    #[serde(default)]
    pub name: Option<String>,
    pub param_type: NativeType,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: NativeType,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Set when the function implements an operator overload.
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// Everything a parser extracted from one header.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Declarations {
    pub header: PathBuf,
    /// Opaque target tag, passed through untouched.
    #[serde(default)]
    pub target_arch: Option<String>,
    /// Content fingerprint of `header`, when the loader could read it.
    #[serde(default)]
    pub header_digest: Option<String>,
    #[serde(default)]
    pub structs: Vec<StructDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            fields,
            comment: None,
        }
    }
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, field_type: NativeType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

impl ParamDecl {
    pub fn new(name: Option<&str>, param_type: NativeType) -> Self {
        Self {
            name: name.map(str::to_string),
            param_type,
        }
    }
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, return_type: NativeType, params: Vec<ParamDecl>) -> Self {
        Self {
            name: name.into(),
            return_type,
            params,
            operator: None,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn is_operator(&self) -> bool {
        self.operator.is_some()
    }
}

impl Declarations {
    pub fn new(header: impl Into<PathBuf>) -> Self {
        Self {
            header: header.into(),
            target_arch: None,
            header_digest: None,
            structs: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn struct_named(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|decl| decl.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{IntegralType, PrimitiveType};

    #[test]
    fn declarations_load_from_yaml() {
        let yaml = r#"
header: operator.h
target-arch: sm_50
structs:
  - name: Foo
    fields:
      - name: x
        field-type: int
functions:
  - name: operator+
    return-type: Foo
    params:
      - name: lhs
        param-type: "const Foo &"
      - param-type: "const Foo &"
    operator: add
"#;
        let decls: Declarations = serde_yml::from_str(yaml).unwrap();
        assert_eq!(decls.target_arch.as_deref(), Some("sm_50"));
        assert_eq!(decls.header_digest, None);

        let foo = decls.struct_named("Foo").unwrap();
        assert_eq!(
            foo.fields[0].field_type.as_primitive(),
            Some(PrimitiveType::Integral(IntegralType::I32))
        );

        let add = &decls.functions[0];
        assert_eq!(add.operator, Some(Operator::Add));
        assert_eq!(add.params.len(), 2);
        assert_eq!(add.params[1].name, None);
        assert_eq!(add.params[0].param_type.value_name(), Some("Foo"));
    }

    #[test]
    fn bad_type_spelling_fails_deserialization() {
        let yaml = r#"
name: Broken
fields:
  - name: y
    field-type: "Foo&&"
"#;
        let err = serde_yml::from_str::<StructDecl>(yaml).unwrap_err();
        assert!(err.to_string().contains("rvalue"), "{}", err);
    }
}
