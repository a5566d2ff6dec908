use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Operator an overload-tagged function implements.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Neg,
    Not,
    BitNot,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
}

/// Host trait an operator is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorTrait {
    /// Path below `core`, e.g. `ops::Add`.
    pub path: &'static str,
    pub name: &'static str,
    pub method: &'static str,
}

impl Operator {
    pub const ALL: [Operator; 24] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Rem,
        Operator::BitAnd,
        Operator::BitOr,
        Operator::BitXor,
        Operator::Shl,
        Operator::Shr,
        Operator::Eq,
        Operator::Neg,
        Operator::Not,
        Operator::BitNot,
        Operator::AddAssign,
        Operator::SubAssign,
        Operator::MulAssign,
        Operator::DivAssign,
        Operator::RemAssign,
        Operator::BitAndAssign,
        Operator::BitOrAssign,
        Operator::BitXorAssign,
        Operator::ShlAssign,
        Operator::ShrAssign,
    ];

    /// Number of operands, counting the receiver of member operators.
    pub fn arity(&self) -> usize {
        match self {
            Operator::Neg | Operator::Not | Operator::BitNot => 1,
            _ => 2,
        }
    }

    pub fn is_unary(&self) -> bool {
        self.arity() == 1
    }

    pub fn is_assign(&self) -> bool {
        matches!(
            self,
            Operator::AddAssign
                | Operator::SubAssign
                | Operator::MulAssign
                | Operator::DivAssign
                | Operator::RemAssign
                | Operator::BitAndAssign
                | Operator::BitOrAssign
                | Operator::BitXorAssign
                | Operator::ShlAssign
                | Operator::ShrAssign
        )
    }

    /// C++ operator token.
    pub fn cxx_symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub | Operator::Neg => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::Shl => "<<",
            Operator::Shr => ">>",
            Operator::Eq => "==",
            Operator::Not => "!",
            Operator::BitNot => "~",
            Operator::AddAssign => "+=",
            Operator::SubAssign => "-=",
            Operator::MulAssign => "*=",
            Operator::DivAssign => "/=",
            Operator::RemAssign => "%=",
            Operator::BitAndAssign => "&=",
            Operator::BitOrAssign => "|=",
            Operator::BitXorAssign => "^=",
            Operator::ShlAssign => "<<=",
            Operator::ShrAssign => ">>=",
        }
    }

    /// Identifier-safe name used in generated symbols.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
            Operator::Rem => "rem",
            Operator::BitAnd => "bitand",
            Operator::BitOr => "bitor",
            Operator::BitXor => "bitxor",
            Operator::Shl => "shl",
            Operator::Shr => "shr",
            Operator::Eq => "eq",
            Operator::Neg => "neg",
            Operator::Not => "not",
            Operator::BitNot => "bitnot",
            Operator::AddAssign => "add_assign",
            Operator::SubAssign => "sub_assign",
            Operator::MulAssign => "mul_assign",
            Operator::DivAssign => "div_assign",
            Operator::RemAssign => "rem_assign",
            Operator::BitAndAssign => "bitand_assign",
            Operator::BitOrAssign => "bitor_assign",
            Operator::BitXorAssign => "bitxor_assign",
            Operator::ShlAssign => "shl_assign",
            Operator::ShrAssign => "shr_assign",
        }
    }

    /// `!` and `~` share `Not`; a type can only carry one of them.
    pub fn host_trait(&self) -> OperatorTrait {
        let (path, name, method) = match self {
            Operator::Add => ("ops::Add", "Add", "add"),
            Operator::Sub => ("ops::Sub", "Sub", "sub"),
            Operator::Mul => ("ops::Mul", "Mul", "mul"),
            Operator::Div => ("ops::Div", "Div", "div"),
            Operator::Rem => ("ops::Rem", "Rem", "rem"),
            Operator::BitAnd => ("ops::BitAnd", "BitAnd", "bitand"),
            Operator::BitOr => ("ops::BitOr", "BitOr", "bitor"),
            Operator::BitXor => ("ops::BitXor", "BitXor", "bitxor"),
            Operator::Shl => ("ops::Shl", "Shl", "shl"),
            Operator::Shr => ("ops::Shr", "Shr", "shr"),
            Operator::Eq => ("cmp::PartialEq", "PartialEq", "eq"),
            Operator::Neg => ("ops::Neg", "Neg", "neg"),
            Operator::Not | Operator::BitNot => ("ops::Not", "Not", "not"),
            Operator::AddAssign => ("ops::AddAssign", "AddAssign", "add_assign"),
            Operator::SubAssign => ("ops::SubAssign", "SubAssign", "sub_assign"),
            Operator::MulAssign => ("ops::MulAssign", "MulAssign", "mul_assign"),
            Operator::DivAssign => ("ops::DivAssign", "DivAssign", "div_assign"),
            Operator::RemAssign => ("ops::RemAssign", "RemAssign", "rem_assign"),
            Operator::BitAndAssign => ("ops::BitAndAssign", "BitAndAssign", "bitand_assign"),
            Operator::BitOrAssign => ("ops::BitOrAssign", "BitOrAssign", "bitor_assign"),
            Operator::BitXorAssign => ("ops::BitXorAssign", "BitXorAssign", "bitxor_assign"),
            Operator::ShlAssign => ("ops::ShlAssign", "ShlAssign", "shl_assign"),
            Operator::ShrAssign => ("ops::ShrAssign", "ShrAssign", "shr_assign"),
        };
        OperatorTrait { path, name, method }
    }

    /// Map a parser's `operator<symbol>` plus operand count to a tag.
    ///
    /// Member operators must be presented with the receiver as first operand.
    pub fn from_cxx(symbol: &str, arity: usize) -> Option<Self> {
        let symbol = symbol.trim();
        let symbol = symbol.strip_prefix("operator").unwrap_or(symbol).trim();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.cxx_symbol() == symbol && op.arity() == arity)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operator{}", self.cxx_symbol())
    }
}
