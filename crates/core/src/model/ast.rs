//! Typed pseudocode tree as produced by a decompiler.
//!
//! Nodes own their children; there are no parent links. Code that needs the
//! syntactic context of a node walks the tree while keeping an explicit
//! ancestor stack (see [`Item`]).

use serde::{Deserialize, Serialize};

use crate::model::types::{FieldOffset, TypeRef};

/// A decompiled function: entry address plus its root statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CFunction {
    pub entry: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub body: Stmt,
}

impl CFunction {
    pub fn new(entry: u64, body: Stmt) -> Self {
        Self { entry, name: None, body }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub ea: Option<u64>,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StmtKind {
    Block {
        stmts: Vec<Stmt>,
    },
    Expr {
        expr: Expr,
    },
    If {
        cond: Expr,
        then: Box<Stmt>,
        #[serde(default)]
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        #[serde(default)]
        init: Option<Expr>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        expr: Expr,
        cases: Vec<SwitchCase>,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    Break,
    Continue,
    Goto {
        label: String,
    },
}

/// One arm of a switch; an empty `values` list is the `default` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub values: Vec<i64>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default)]
    pub ea: Option<u64>,
    #[serde(default)]
    pub ty: TypeRef,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Comma,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Comma => ",",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    Deref,
    AddrOf,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ExprKind {
    Num {
        value: i64,
    },
    Str {
        value: String,
    },
    Var {
        name: String,
    },
    /// Global object or function referenced by address.
    Obj {
        ea: u64,
        #[serde(default)]
        name: Option<String>,
    },
    /// `base->field`
    MemberPtr {
        base: Box<Expr>,
        offset: FieldOffset,
        #[serde(default)]
        field: Option<String>,
    },
    /// `base.field`
    MemberRef {
        base: Box<Expr>,
        offset: FieldOffset,
        #[serde(default)]
        field: Option<String>,
    },
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    CompoundAssign {
        binop: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Binary {
        binop: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        unop: UnaryOp,
        operand: Box<Expr>,
    },
    Cast {
        operand: Box<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeRef) -> Self {
        Self { ea: None, ty, kind }
    }

    pub fn at(mut self, ea: u64) -> Self {
        self.ea = Some(ea);
        self
    }

    pub fn num(value: i64) -> Self {
        Expr::new(ExprKind::Num { value }, TypeRef::int(4))
    }

    pub fn var(name: impl Into<String>, ty: TypeRef) -> Self {
        Expr::new(ExprKind::Var { name: name.into() }, ty)
    }

    pub fn obj(ea: u64, name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Obj { ea, name: Some(name.into()) }, TypeRef::Func)
    }

    pub fn member_ptr(base: Expr, offset: FieldOffset, field: &str, ty: TypeRef) -> Self {
        Expr::new(
            ExprKind::MemberPtr { base: Box::new(base), offset, field: Some(field.to_string()) },
            ty,
        )
    }

    pub fn member_ref(base: Expr, offset: FieldOffset, field: &str, ty: TypeRef) -> Self {
        Expr::new(
            ExprKind::MemberRef { base: Box::new(base), offset, field: Some(field.to_string()) },
            ty,
        )
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        let ty = lhs.ty.clone();
        Expr::new(ExprKind::Assign { lhs: Box::new(lhs), rhs: Box::new(rhs) }, ty)
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Call { callee: Box::new(callee), args }, TypeRef::Void)
    }

    pub fn unary(unop: UnaryOp, operand: Expr, ty: TypeRef) -> Self {
        Expr::new(ExprKind::Unary { unop, operand: Box::new(operand) }, ty)
    }

    pub fn binary(binop: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        let ty = lhs.ty.clone();
        Expr::new(ExprKind::Binary { binop, lhs: Box::new(lhs), rhs: Box::new(rhs) }, ty)
    }

    /// Whether this node is a field access (`->` or `.`).
    pub fn is_member_access(&self) -> bool {
        matches!(self.kind, ExprKind::MemberPtr { .. } | ExprKind::MemberRef { .. })
    }

    /// Immediate sub-expressions, in evaluation/print order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Num { .. }
            | ExprKind::Str { .. }
            | ExprKind::Var { .. }
            | ExprKind::Obj { .. } => Vec::new(),
            ExprKind::MemberPtr { base, .. } | ExprKind::MemberRef { base, .. } => vec![&**base],
            ExprKind::Assign { lhs, rhs }
            | ExprKind::CompoundAssign { lhs, rhs, .. }
            | ExprKind::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            ExprKind::Unary { operand, .. } | ExprKind::Cast { operand } => vec![&**operand],
            ExprKind::Index { base, index } => vec![&**base, &**index],
            ExprKind::Ternary { cond, then, otherwise } => {
                vec![&**cond, &**then, &**otherwise]
            }
            ExprKind::Call { callee, args } => {
                let mut out = Vec::with_capacity(args.len() + 1);
                out.push(&**callee);
                out.extend(args.iter());
                out
            }
        }
    }
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self { ea: None, kind }
    }

    pub fn at(mut self, ea: u64) -> Self {
        self.ea = Some(ea);
        self
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::new(StmtKind::Block { stmts })
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::new(StmtKind::Expr { expr })
    }

    /// Expressions hanging directly off this statement (conditions, operands).
    pub fn exprs(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::Expr { expr } => vec![expr],
            StmtKind::If { cond, .. }
            | StmtKind::While { cond, .. }
            | StmtKind::DoWhile { cond, .. } => vec![cond],
            StmtKind::For { init, cond, step, .. } => {
                [init, cond, step].into_iter().filter_map(Option::as_ref).collect()
            }
            StmtKind::Switch { expr, .. } => vec![expr],
            StmtKind::Return { value } => value.iter().collect(),
            StmtKind::Block { .. }
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Goto { .. } => Vec::new(),
        }
    }

    /// Nested statements, in source order.
    pub fn stmts(&self) -> Vec<&Stmt> {
        match &self.kind {
            StmtKind::Block { stmts } => stmts.iter().collect(),
            StmtKind::If { then, otherwise, .. } => {
                let mut out = vec![&**then];
                if let Some(other) = otherwise {
                    out.push(&**other);
                }
                out
            }
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::For { body, .. } => vec![&**body],
            StmtKind::Switch { cases, .. } => cases.iter().map(|c| &c.body).collect(),
            StmtKind::Expr { .. }
            | StmtKind::Return { .. }
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Goto { .. } => Vec::new(),
        }
    }
}

/// Borrowed reference to any tree node; the element type of ancestor stacks.
#[derive(Debug, Clone, Copy)]
pub enum Item<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> Item<'a> {
    pub fn ea(&self) -> Option<u64> {
        match self {
            Item::Stmt(s) => s.ea,
            Item::Expr(e) => e.ea,
        }
    }

    pub fn as_stmt(&self) -> Option<&'a Stmt> {
        match self {
            Item::Stmt(s) => Some(s),
            Item::Expr(_) => None,
        }
    }
}
