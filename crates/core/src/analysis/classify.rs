use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Expr, ExprKind, Item};

/// How a field access participates in its statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageKind {
    #[serde(rename = "R")]
    Read,
    #[serde(rename = "W")]
    Write,
    /// Passed (possibly inside a larger expression) as a call argument.
    #[serde(rename = "Arg")]
    Argument,
}

impl UsageKind {
    /// Short tag used in the persisted index and in CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            UsageKind::Read => "R",
            UsageKind::Write => "W",
            UsageKind::Argument => "Arg",
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" | "r" | "read" => Ok(UsageKind::Read),
            "W" | "w" | "write" => Ok(UsageKind::Write),
            "Arg" | "A" | "arg" | "argument" => Ok(UsageKind::Argument),
            other => Err(format!("unknown usage kind '{other}'")),
        }
    }
}

/// Classify the access `expr` given its ancestors (outermost first).
///
/// Walks outward from the direct parent; the first rule that matches decides:
/// - a call the node is an argument of (not the callee) -> `Argument`
/// - a statement boundary -> `Read`
/// - an assignment: `Write` when coming from its left-hand side, else `Read`
///
/// Returns `None` when the chain runs out without reaching a statement, which
/// only happens for trees that violate the decompiler contract.
pub fn classify_usage(expr: &Expr, ancestors: &[Item<'_>]) -> Option<UsageKind> {
    let mut child = expr;
    for parent in ancestors.iter().rev() {
        let parent = match parent {
            Item::Stmt(_) => return Some(UsageKind::Read),
            Item::Expr(e) => *e,
        };
        match &parent.kind {
            ExprKind::Call { callee, .. } if !std::ptr::eq(&**callee, child) => {
                return Some(UsageKind::Argument);
            }
            ExprKind::Assign { lhs, .. } | ExprKind::CompoundAssign { lhs, .. } => {
                if std::ptr::eq(&**lhs, child) {
                    return Some(UsageKind::Write);
                }
                return Some(UsageKind::Read);
            }
            _ => {}
        }
        child = parent;
    }
    None
}
