//! One-line pseudocode rendering.
//!
//! Produces the text stored alongside every usage record. Compound statements
//! render only their header (`if ( cond )`, `while ( cond )`, ...), so a line
//! never spans the nested body.

use crate::model::{BinaryOp, Expr, ExprKind, Stmt, StmtKind, UnaryOp};

/// Render the header line of a statement.
pub fn render_stmt_line(stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Block { .. } => "{ ... }".to_string(),
        StmtKind::Expr { expr } => format!("{};", render_expr(expr)),
        StmtKind::If { cond, .. } => format!("if ( {} )", render_expr(cond)),
        StmtKind::While { cond, .. } => format!("while ( {} )", render_expr(cond)),
        StmtKind::DoWhile { cond, .. } => format!("while ( {} );", render_expr(cond)),
        StmtKind::For { init, cond, step, .. } => {
            let part = |e: &Option<Expr>| e.as_ref().map(render_expr).unwrap_or_default();
            format!("for ( {}; {}; {} )", part(init), part(cond), part(step))
        }
        StmtKind::Switch { expr, .. } => format!("switch ( {} )", render_expr(expr)),
        StmtKind::Return { value: Some(v) } => format!("return {};", render_expr(v)),
        StmtKind::Return { value: None } => "return;".to_string(),
        StmtKind::Break => "break;".to_string(),
        StmtKind::Continue => "continue;".to_string(),
        StmtKind::Goto { label } => format!("goto {label};"),
    }
}

/// Render an expression in C syntax, parenthesizing compound operands.
pub fn render_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Num { value } => {
            if *value > 9 || *value < -9 {
                if *value < 0 {
                    format!("-0x{:X}", value.unsigned_abs())
                } else {
                    format!("0x{value:X}")
                }
            } else {
                value.to_string()
            }
        }
        ExprKind::Str { value } => format!("{value:?}"),
        ExprKind::Var { name } => name.clone(),
        ExprKind::Obj { ea, name } => match name {
            Some(n) => n.clone(),
            None => format!("sub_{ea:X}"),
        },
        ExprKind::MemberPtr { base, offset, field } => {
            format!("{}->{}", operand(base), field_name(*offset, field.as_deref()))
        }
        ExprKind::MemberRef { base, offset, field } => {
            format!("{}.{}", operand(base), field_name(*offset, field.as_deref()))
        }
        ExprKind::Assign { lhs, rhs } => format!("{} = {}", render_expr(lhs), render_expr(rhs)),
        ExprKind::CompoundAssign { binop, lhs, rhs } => {
            format!("{} {}= {}", render_expr(lhs), binop.symbol(), render_expr(rhs))
        }
        ExprKind::Binary { binop: BinaryOp::Comma, lhs, rhs } => {
            format!("{}, {}", render_expr(lhs), render_expr(rhs))
        }
        ExprKind::Binary { binop, lhs, rhs } => {
            format!("{} {} {}", operand(lhs), binop.symbol(), operand(rhs))
        }
        ExprKind::Unary { unop, operand: inner } => {
            let inner = operand(inner);
            match unop {
                UnaryOp::Neg => format!("-{inner}"),
                UnaryOp::Not => format!("!{inner}"),
                UnaryOp::BitNot => format!("~{inner}"),
                UnaryOp::Deref => format!("*{inner}"),
                UnaryOp::AddrOf => format!("&{inner}"),
                UnaryOp::PreInc => format!("++{inner}"),
                UnaryOp::PreDec => format!("--{inner}"),
                UnaryOp::PostInc => format!("{inner}++"),
                UnaryOp::PostDec => format!("{inner}--"),
            }
        }
        ExprKind::Cast { operand: inner } => format!("({}){}", expr.ty.display(), operand(inner)),
        ExprKind::Index { base, index } => format!("{}[{}]", operand(base), render_expr(index)),
        ExprKind::Ternary { cond, then, otherwise } => {
            format!("{} ? {} : {}", operand(cond), operand(then), operand(otherwise))
        }
        ExprKind::Call { callee, args } => {
            let args: Vec<String> = args.iter().map(render_expr).collect();
            format!("{}({})", operand(callee), args.join(", "))
        }
    }
}

fn field_name(offset: u64, name: Option<&str>) -> String {
    match name {
        Some(n) => n.to_string(),
        None => format!("field_{offset:X}"),
    }
}

/// Render a sub-expression, wrapping it in parentheses unless it is atomic.
fn operand(expr: &Expr) -> String {
    let text = render_expr(expr);
    match expr.kind {
        ExprKind::Num { .. }
        | ExprKind::Str { .. }
        | ExprKind::Var { .. }
        | ExprKind::Obj { .. }
        | ExprKind::MemberPtr { .. }
        | ExprKind::MemberRef { .. }
        | ExprKind::Index { .. }
        | ExprKind::Call { .. } => text,
        _ => format!("({text})"),
    }
}
