/* Calling-convention analysis for one function declaration */

use crate::codegen::config::RenderConfig;
use crate::codegen::errors::{RenderError, RenderResult};
use crate::codegen::helpers::{
    contains_pointer, escape_rust_keyword, host_type, is_f16, mangle_params, sanitize_identifier, C_VOID,
};
use crate::codegen::session::Session;
use crate::model::DataModel;
use bind_types::{FunctionDecl, NativeType, Operator, PrimitiveType};

/// How one argument crosses the shim boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassMode {
    /// Passed as is.
    Direct,
    /// Passed as `const T *`; the host proxy takes the value.
    Indirect,
    /// Passed as `T *`; the host proxy takes `&mut T`.
    MutRef,
}

#[derive(Debug, Clone)]
pub(crate) struct ParamPlan {
    pub ident: String,
    pub native: NativeType,
    /// Value type seen through references and array decay.
    pub value: NativeType,
    pub host: String,
    pub mode: PassMode,
}

#[derive(Debug, Clone)]
pub(crate) enum ReturnPlan {
    Void,
    /// Written through the leading `retval` output parameter.
    OutParam { value: NativeType, host: String },
    ByValue { value: NativeType, host: String },
}

impl ReturnPlan {
    pub fn host(&self) -> Option<&str> {
        match self {
            ReturnPlan::Void => None,
            ReturnPlan::OutParam { host, .. } | ReturnPlan::ByValue { host, .. } => Some(host),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FunctionPlan {
    pub native_name: String,
    pub operator: Option<Operator>,
    pub params: Vec<ParamPlan>,
    pub ret: ReturnPlan,
    /// Declared return type, kept for diagnostics.
    pub native_return: NativeType,
    pub shim_name: String,
    pub proxy_name: String,
    pub is_unsafe: bool,
}

impl FunctionPlan {
    pub fn uses_c_void(&self) -> bool {
        self.params.iter().any(|param| param.host.contains(C_VOID))
            || self.ret.host().is_some_and(|host| host.contains(C_VOID))
    }
}

/* Names the shim and the host proxy reserve for themselves */
const RESERVED_IDENTS: &[&str] = &["retval", "__retval"];

pub(crate) fn plan_function(
    decl: &FunctionDecl,
    overloaded: bool,
    session: &Session,
) -> RenderResult<FunctionPlan> {
    let config = session.config();
    if let Some(operator) = decl.operator {
        if decl.params.len() != operator.arity() {
            return Err(RenderError::UnsupportedOperatorArity {
                function: decl.name.clone(),
                operator,
                expected: operator.arity(),
                found: decl.params.len(),
            });
        }
    }

    let lookup = |name: &str| -> Option<String> { session.proxy(name).map(|proxy| proxy.host_name.clone()) };
    let is_assign = decl.operator.is_some_and(|operator| operator.is_assign());

    let mut params: Vec<ParamPlan> = Vec::with_capacity(decl.params.len());
    for (index, param) in decl.params.iter().enumerate() {
        let native = param.param_type.clone();
        let (value, mut mode) = match &native {
            NativeType::Void => {
                return Err(RenderError::MissingOperandMapping {
                    function: decl.name.clone(),
                    type_name: native.to_string(),
                    reason: "void is not a parameter type".to_string(),
                });
            }
            NativeType::Reference { referent, is_const } => {
                let mode = if *is_const { PassMode::Indirect } else { PassMode::MutRef };
                (referent.as_ref().clone(), mode)
            }
            NativeType::Array { element, .. } => {
                (NativeType::pointer_to(element.as_ref().clone(), false), PassMode::Direct)
            }
            NativeType::Pointer { .. } => (native.clone(), PassMode::Direct),
            NativeType::Primitive { prim, .. } if is_f16(*prim) => (native.clone(), PassMode::Indirect),
            NativeType::Primitive { .. } => (native.clone(), PassMode::Direct),
            NativeType::Named(_) => (native.clone(), PassMode::Indirect),
        };
        if is_assign && index == 0 {
            mode = PassMode::MutRef;
        }

        let host = host_type(&value, &lookup).ok_or_else(|| RenderError::MissingOperandMapping {
            function: decl.name.clone(),
            type_name: native.to_string(),
            reason: "no struct proxy is registered for it".to_string(),
        })?;

        params.push(ParamPlan {
            ident: param_ident(param.name.as_deref(), index, &params),
            native,
            value,
            host,
            mode,
        });
    }

    let ret = plan_return(decl, is_assign, config, session, &lookup)?;

    if let Some(operator) = decl.operator {
        check_operator(decl, operator, &params, &ret, session)?;
    }

    let stem = match decl.operator {
        Some(operator) => format!("operator_{}", operator.mnemonic()),
        None => sanitize_identifier(&decl.name),
    };
    let mangled = mangle_params(decl.params.iter().map(|param| &param.param_type));
    let shim_name = format!("{}{}_{}", config.shim_prefix, stem, mangled);
    let proxy_name = if decl.operator.is_some() || overloaded {
        format!("{}_{}", stem, mangled)
    } else {
        escape_rust_keyword(&stem)
    };

    let is_unsafe = params.iter().any(|param| contains_pointer(&param.value))
        || match &ret {
            ReturnPlan::Void => false,
            ReturnPlan::OutParam { value, .. } | ReturnPlan::ByValue { value, .. } => contains_pointer(value),
        };

    Ok(FunctionPlan {
        native_name: decl.name.clone(),
        operator: decl.operator,
        params,
        ret,
        native_return: decl.return_type.clone(),
        shim_name,
        proxy_name,
        is_unsafe,
    })
}

fn param_ident(declared: Option<&str>, index: usize, taken: &[ParamPlan]) -> String {
    let is_taken = |ident: &str| taken.iter().any(|param| param.ident == ident);
    let declared = declared.filter(|name| {
        !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !RESERVED_IDENTS.contains(name)
    });
    if let Some(name) = declared {
        let ident = escape_rust_keyword(name);
        if !ident.starts_with("r#") && !is_taken(&ident) {
            return ident;
        }
    }

    let mut fallback = format!("arg{}", index);
    while is_taken(&fallback) {
        fallback.push('_');
    }
    fallback
}

fn plan_return(
    decl: &FunctionDecl,
    is_assign: bool,
    config: &RenderConfig,
    session: &Session,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> RenderResult<ReturnPlan> {
    /* Compound assignment mutates its left operand; the native result is dropped */
    if decl.return_type.is_void() || is_assign {
        return Ok(ReturnPlan::Void);
    }
    let value = decl.return_type.strip_reference().clone();
    let host = host_type(&value, lookup).ok_or_else(|| RenderError::MissingOperandMapping {
        function: decl.name.clone(),
        type_name: decl.return_type.to_string(),
        reason: "return type has no host representation".to_string(),
    })?;

    let by_value_size = match &value {
        NativeType::Primitive { prim, .. } if !is_f16(*prim) => Some(prim.size()),
        NativeType::Pointer { .. } => Some(config.pointer_width),
        /* Opaque proxies would not classify like the native struct */
        NativeType::Named(name) => session
            .proxy(name)
            .filter(|proxy| proxy.model == DataModel::Struct)
            .map(|proxy| proxy.size),
        _ => None,
    };
    let by_value = match (config.by_value_return_limit, by_value_size) {
        (Some(limit), Some(size)) => size <= limit,
        _ => false,
    };

    Ok(if by_value {
        ReturnPlan::ByValue { value, host }
    } else {
        ReturnPlan::OutParam { value, host }
    })
}

fn check_operator(
    decl: &FunctionDecl,
    operator: Operator,
    params: &[ParamPlan],
    ret: &ReturnPlan,
    session: &Session,
) -> RenderResult<()> {
    if let Some(pointer) = params.iter().find(|param| contains_pointer(&param.value)) {
        return Err(RenderError::MissingOperandMapping {
            function: decl.name.clone(),
            type_name: pointer.native.to_string(),
            reason: "operator operands must be passable by value".to_string(),
        });
    }
    let has_proxy_operand = params.iter().any(|param| match &param.value {
        NativeType::Named(name) => session.proxy(name).is_some(),
        _ => false,
    });
    if !has_proxy_operand {
        let type_name = params
            .first()
            .map(|param| param.native.to_string())
            .unwrap_or_default();
        return Err(RenderError::MissingOperandMapping {
            function: decl.name.clone(),
            type_name,
            reason: "an operator needs at least one struct proxy operand".to_string(),
        });
    }

    if operator == Operator::Eq {
        let comparable = match ret {
            ReturnPlan::Void => false,
            ReturnPlan::OutParam { value, .. } | ReturnPlan::ByValue { value, .. } => matches!(
                value,
                NativeType::Primitive { prim, .. }
                    if *prim == PrimitiveType::Bool || prim.is_integral()
            ),
        };
        if !comparable {
            return Err(RenderError::UnsupportedOperatorReturn {
                function: decl.name.clone(),
                operator,
                return_type: decl.return_type.to_string(),
            });
        }
    }
    Ok(())
}
