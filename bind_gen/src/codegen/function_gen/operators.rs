/* Operator trait impls forwarding to the proxy function */

use super::signature::{FunctionPlan, PassMode, ReturnPlan};
use bind_types::{Operator, PrimitiveType};

/// `impl Trait<Rhs> for Lhs` header; also the fragment identity of the impl.
pub(super) fn impl_header(operator: Operator, plan: &FunctionPlan) -> String {
    let host_trait = operator.host_trait();
    let lhs = &plan.params[0].host;
    match plan.params.get(1) {
        Some(rhs) => format!("impl {}<{}> for {}", host_trait.name, rhs.host, lhs),
        None => format!("impl {} for {}", host_trait.name, lhs),
    }
}

pub(super) fn trait_import(operator: Operator) -> String {
    format!("use core::{};", operator.host_trait().path)
}

/* Argument expressions for the proxy call; `MutRef` operands go through a local copy */
fn operand_args(plan: &FunctionPlan, sources: &[&str], body: &mut String) -> Vec<String> {
    plan.params
        .iter()
        .zip(sources)
        .enumerate()
        .map(|(index, (param, source))| match param.mode {
            PassMode::MutRef => {
                body.push_str(&format!("        let mut operand{} = {};\n", index, source));
                format!("&mut operand{}", index)
            }
            PassMode::Direct | PassMode::Indirect => source.to_string(),
        })
        .collect()
}

pub(super) fn operator_impl(operator: Operator, plan: &FunctionPlan) -> String {
    let host_trait = operator.host_trait();
    let header = impl_header(operator, plan);
    let output_type = plan.ret.host().unwrap_or("()").to_string();
    let mut body = String::new();

    let signature = if operator == Operator::Eq {
        let args = operand_args(plan, &["*self", "*other"], &mut body);
        let call = format!("{}({})", plan.proxy_name, args.join(", "));
        let is_bool = match &plan.ret {
            ReturnPlan::OutParam { value, .. } | ReturnPlan::ByValue { value, .. } => {
                value.as_primitive() == Some(PrimitiveType::Bool)
            }
            ReturnPlan::Void => false,
        };
        if is_bool {
            body.push_str(&format!("        {}\n", call));
        } else {
            body.push_str(&format!("        {} != 0\n", call));
        }
        format!(
            "    fn {}(&self, other: &{}) -> bool {{\n",
            host_trait.method, plan.params[1].host
        )
    } else if operator.is_assign() {
        /* `self` already is the `&mut` the proxy wants */
        let mut args = vec!["self".to_string()];
        args.extend(operand_args_tail(plan, &mut body));
        body.push_str(&format!("        {}({});\n", plan.proxy_name, args.join(", ")));
        format!(
            "    fn {}(&mut self, rhs: {}) {{\n",
            host_trait.method, plan.params[1].host
        )
    } else if operator.is_unary() {
        let args = operand_args(plan, &["self"], &mut body);
        body.push_str(&format!("        {}({})\n", plan.proxy_name, args.join(", ")));
        format!("    fn {}(self) -> Self::Output {{\n", host_trait.method)
    } else {
        let args = operand_args(plan, &["self", "rhs"], &mut body);
        body.push_str(&format!("        {}({})\n", plan.proxy_name, args.join(", ")));
        format!(
            "    fn {}(self, rhs: {}) -> Self::Output {{\n",
            host_trait.method, plan.params[1].host
        )
    };

    let mut output = format!("{} {{\n", header);
    if operator != Operator::Eq && !operator.is_assign() {
        output.push_str(&format!("    type Output = {};\n\n", output_type));
    }
    output.push_str(&signature);
    output.push_str(&body);
    output.push_str("    }\n}\n");
    output
}

fn operand_args_tail(plan: &FunctionPlan, body: &mut String) -> Vec<String> {
    match plan.params.get(1) {
        Some(param) if param.mode == PassMode::MutRef => {
            body.push_str("        let mut operand1 = rhs;\n");
            vec!["&mut operand1".to_string()]
        }
        Some(_) => vec!["rhs".to_string()],
        None => Vec::new(),
    }
}
