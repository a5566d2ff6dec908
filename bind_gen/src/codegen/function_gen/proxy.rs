/* Host-side extern declaration plus safe(ish) proxy function */

use super::signature::{FunctionPlan, PassMode, ReturnPlan};

fn extern_declaration(plan: &FunctionPlan) -> String {
    let mut params: Vec<String> = Vec::new();
    if let ReturnPlan::OutParam { host, .. } = &plan.ret {
        params.push(format!("retval: *mut {}", host));
    }
    for param in &plan.params {
        let ty = match param.mode {
            PassMode::Direct => param.host.clone(),
            PassMode::Indirect => format!("*const {}", param.host),
            PassMode::MutRef => format!("*mut {}", param.host),
        };
        params.push(format!("{}: {}", param.ident, ty));
    }
    let output = match &plan.ret {
        ReturnPlan::ByValue { host, .. } => format!(" -> {}", host),
        _ => String::new(),
    };
    format!(
        "unsafe extern \"C\" {{\n    fn {}({}){};\n}}\n",
        plan.shim_name,
        params.join(", "),
        output
    )
}

pub(super) fn proxy_function(plan: &FunctionPlan, header: &str) -> String {
    let mut output = extern_declaration(plan);
    output.push('\n');

    let native_params: Vec<String> = plan.params.iter().map(|param| param.native.to_string()).collect();
    output.push_str(&format!(
        "/// Calls native `{}({})` (`{}`).\n",
        plan.native_name,
        native_params.join(", "),
        header
    ));
    if plan.is_unsafe {
        output.push_str("///\n/// # Safety\n///\n/// Raw pointers are handed to native code unchecked.\n");
    }

    let params: Vec<String> = plan
        .params
        .iter()
        .map(|param| match param.mode {
            PassMode::Direct | PassMode::Indirect => format!("{}: {}", param.ident, param.host),
            PassMode::MutRef => format!("{}: &mut {}", param.ident, param.host),
        })
        .collect();
    let output_type = match plan.ret.host() {
        Some(host) => format!(" -> {}", host),
        None => String::new(),
    };
    let qualifier = if plan.is_unsafe { "pub unsafe fn" } else { "pub fn" };
    output.push_str(&format!(
        "{} {}({}){} {{\n",
        qualifier,
        plan.proxy_name,
        params.join(", "),
        output_type
    ));

    let mut args: Vec<String> = Vec::new();
    if matches!(plan.ret, ReturnPlan::OutParam { .. }) {
        args.push("__retval.as_mut_ptr()".to_string());
    }
    for param in &plan.params {
        args.push(match param.mode {
            PassMode::Direct | PassMode::MutRef => param.ident.clone(),
            PassMode::Indirect => format!("&{}", param.ident),
        });
    }
    let call = format!("{}({})", plan.shim_name, args.join(", "));

    match &plan.ret {
        ReturnPlan::Void => output.push_str(&format!("    unsafe {{ {} }};\n", call)),
        ReturnPlan::ByValue { .. } => output.push_str(&format!("    unsafe {{ {} }}\n", call)),
        ReturnPlan::OutParam { host, .. } => {
            output.push_str(&format!("    let mut __retval = MaybeUninit::<{}>::uninit();\n", host));
            output.push_str(&format!("    unsafe {{ {} }};\n", call));
            output.push_str("    unsafe { __retval.assume_init() }\n");
        }
    }
    output.push_str("}\n");
    output
}
