/* Native `extern "C"` shim emission */

use super::signature::{FunctionPlan, PassMode, ReturnPlan};

fn param_declaration(ident: &str, value: &str, mode: PassMode) -> String {
    match mode {
        PassMode::Direct => format!("{} {}", value, ident),
        /* East const keeps `T const *` correct when T is itself a pointer */
        PassMode::Indirect => format!("{} const *{}", value, ident),
        PassMode::MutRef => format!("{} *{}", value, ident),
    }
}

fn call_expression(plan: &FunctionPlan) -> String {
    let args: Vec<String> = plan
        .params
        .iter()
        .map(|param| match param.mode {
            PassMode::Direct => param.ident.clone(),
            PassMode::Indirect | PassMode::MutRef => format!("*{}", param.ident),
        })
        .collect();

    match plan.operator {
        Some(operator) if operator.is_unary() => format!("{}({})", operator.cxx_symbol(), args[0]),
        Some(operator) => format!("({}) {} ({})", args[0], operator.cxx_symbol(), args[1]),
        None => format!("{}({})", plan.native_name, args.join(", ")),
    }
}

pub(super) fn shim_function(plan: &FunctionPlan, qualifiers: &str) -> String {
    let mut params: Vec<String> = Vec::new();
    if let ReturnPlan::OutParam { value, .. } = &plan.ret {
        params.push(format!("{} *retval", value));
    }
    for param in &plan.params {
        params.push(param_declaration(&param.ident, &param.value.to_string(), param.mode));
    }
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };

    let return_type = match &plan.ret {
        ReturnPlan::ByValue { value, .. } => value.to_string(),
        _ => "void".to_string(),
    };
    let qualifiers = if qualifiers.trim().is_empty() {
        String::new()
    } else {
        format!("{} ", qualifiers.trim())
    };

    let call = call_expression(plan);
    let body = match &plan.ret {
        ReturnPlan::Void => format!("{};", call),
        ReturnPlan::OutParam { .. } => format!("*retval = {};", call),
        ReturnPlan::ByValue { .. } => format!("return {};", call),
    };

    format!(
        "extern \"C\" {}{} {}({}) {{\n    {}\n}}\n",
        qualifiers, return_type, plan.shim_name, params, body
    )
}
