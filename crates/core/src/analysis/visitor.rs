use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::analysis::classify::{classify_usage, UsageKind};
use crate::analysis::render::render_stmt_line;
use crate::analysis::resolver::resolve_address;
use crate::model::{CFunction, Expr, ExprKind, FieldOffset, Item, Stmt, TypeOrdinal, TypeRef};
use crate::services::decompiler::TypeDatabase;

/// One recorded use of a field inside a function.
///
/// Persisted as the triple `[offset, line, kind]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, String, UsageKind)", into = "(i64, String, UsageKind)")]
pub struct UsageRecord {
    /// Access address minus the function entry.
    pub offset: i64,
    /// Rendered text of the enclosing statement.
    pub line: String,
    pub kind: UsageKind,
}

impl UsageRecord {
    pub fn new(offset: i64, line: impl Into<String>, kind: UsageKind) -> Self {
        Self { offset, line: line.into(), kind }
    }
}

impl From<(i64, String, UsageKind)> for UsageRecord {
    fn from((offset, line, kind): (i64, String, UsageKind)) -> Self {
        Self { offset, line, kind }
    }
}

impl From<UsageRecord> for (i64, String, UsageKind) {
    fn from(record: UsageRecord) -> Self {
        (record.offset, record.line, record.kind)
    }
}

/// Usages of every field of one composite, within one function.
pub type FieldUsages = BTreeMap<FieldOffset, Vec<UsageRecord>>;

/// Everything one function contributes, grouped by composite type.
pub type FunctionFindings = BTreeMap<TypeOrdinal, FieldUsages>;

/// Result of walking a single function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionScan {
    pub entry: u64,
    pub findings: FunctionFindings,
    /// Direct call targets seen in the body.
    pub callees: BTreeSet<u64>,
    /// Field accesses dropped because their type or address did not resolve.
    pub skipped: usize,
}

impl FunctionScan {
    pub fn usage_count(&self) -> usize {
        self.findings.values().flat_map(|fields| fields.values()).map(Vec::len).sum()
    }
}

/// Single-pass walker collecting field accesses and call targets.
///
/// The ancestor chain is an explicit stack threaded through the recursion, so
/// the visitor holds no global state and can run on any tree in isolation.
pub struct FieldAccessVisitor<'a> {
    func: &'a CFunction,
    types: &'a dyn TypeDatabase,
    /// Rendered statement text, keyed by node identity.
    lines: HashMap<*const Stmt, String>,
    scan: FunctionScan,
}

impl<'a> FieldAccessVisitor<'a> {
    pub fn new(func: &'a CFunction, types: &'a dyn TypeDatabase) -> Self {
        Self {
            func,
            types,
            lines: HashMap::new(),
            scan: FunctionScan { entry: func.entry, ..FunctionScan::default() },
        }
    }

    /// Walk the whole body once and return what was found.
    pub fn process(mut self) -> FunctionScan {
        let func = self.func;
        let mut ancestors = Vec::new();
        self.visit_stmt(&func.body, &mut ancestors);
        self.scan
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt, ancestors: &mut Vec<Item<'a>>) {
        ancestors.push(Item::Stmt(stmt));
        for expr in stmt.exprs() {
            self.visit_expr(expr, ancestors);
        }
        for child in stmt.stmts() {
            self.visit_stmt(child, ancestors);
        }
        ancestors.pop();
    }

    fn visit_expr(&mut self, expr: &'a Expr, ancestors: &mut Vec<Item<'a>>) {
        self.inspect(expr, ancestors);
        ancestors.push(Item::Expr(expr));
        for child in expr.children() {
            self.visit_expr(child, ancestors);
        }
        ancestors.pop();
    }

    fn inspect(&mut self, expr: &'a Expr, ancestors: &[Item<'a>]) {
        let (composite, field_offset) = match &expr.kind {
            ExprKind::Call { callee, .. } => {
                if let ExprKind::Obj { ea, .. } = callee.kind {
                    self.scan.callees.insert(ea);
                }
                return;
            }
            ExprKind::MemberPtr { base, offset, .. } => (base.ty.pointed_to(), *offset),
            ExprKind::MemberRef { base, offset, .. } => (Some(&base.ty), *offset),
            _ => return,
        };

        let ea = resolve_address(expr, ancestors);
        let ordinal = composite.and_then(|ty| self.resolve_ordinal(ty));
        let (ea, ordinal) = match (ea, ordinal) {
            (Some(ea), Some(ordinal)) => (ea, ordinal),
            _ => {
                log::warn!(
                    "Failed to parse at address {}, ordinal - {}, type - {}",
                    ea.map(|a| format!("{a:#X}")).unwrap_or_else(|| "BADADDR".into()),
                    ordinal.unwrap_or(0),
                    composite.map(TypeRef::display).unwrap_or_else(|| "?".into()),
                );
                self.scan.skipped += 1;
                return;
            }
        };

        let Some(kind) = classify_usage(expr, ancestors) else {
            log::error!(
                "No statement encloses the access at {ea:#X} in function {:#X}",
                self.func.entry
            );
            self.scan.skipped += 1;
            return;
        };
        let Some(line) = self.line_for(ancestors) else {
            log::error!("Parent statement not found for access at {ea:#X}");
            self.scan.skipped += 1;
            return;
        };

        let offset = ea.wrapping_sub(self.func.entry) as i64;
        self.scan
            .findings
            .entry(ordinal)
            .or_default()
            .entry(field_offset)
            .or_default()
            .push(UsageRecord { offset, line, kind });
    }

    /// Ordinal of `ty`, recovering anonymous composites through their name.
    fn resolve_ordinal(&self, ty: &TypeRef) -> Option<TypeOrdinal> {
        match ty.ordinal() {
            0 => self.types.resolve_type_by_name(&ty.lookup_name()).filter(|o| *o != 0),
            ordinal => Some(ordinal),
        }
    }

    /// Text of the innermost enclosing statement, rendered once per statement.
    fn line_for(&mut self, ancestors: &[Item<'a>]) -> Option<String> {
        let stmt = ancestors.iter().rev().find_map(Item::as_stmt)?;
        let line = self
            .lines
            .entry(stmt as *const Stmt)
            .or_insert_with(|| render_stmt_line(stmt));
        Some(line.clone())
    }
}
