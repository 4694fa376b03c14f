use crate::model::{Expr, Item};

/// Nearest concrete address for `expr`.
///
/// Falls back to the ancestors, innermost first, when the node itself has no
/// address. `ancestors` is ordered outermost to innermost, i.e. the last
/// element is the direct parent.
pub fn resolve_address(expr: &Expr, ancestors: &[Item<'_>]) -> Option<u64> {
    if let Some(ea) = expr.ea {
        return Some(ea);
    }
    ancestors.iter().rev().find_map(Item::ea)
}
