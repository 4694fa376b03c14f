use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of one reachability closure (or full-index pass).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureReport {
    /// Functions analyzed successfully, in visit order.
    pub analyzed: Vec<u64>,
    /// Functions whose analysis failed; their callees are not explored.
    pub failed: Vec<u64>,
}

impl ClosureReport {
    pub fn is_empty(&self) -> bool {
        self.analyzed.is_empty() && self.failed.is_empty()
    }
}

/// Visited-set driven traversal of the direct call graph.
///
/// A function is analyzed at most once for the lifetime of this value; the
/// set only grows. Dropping it (or creating a fresh one) starts a new session.
#[derive(Debug, Default)]
pub struct Reachability {
    visited: HashSet<u64>,
}

impl Reachability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, address: u64) -> bool {
        self.visited.contains(&address)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Analyze `root` and everything transitively called from it.
    ///
    /// `analyze` runs once per newly reached function and returns its direct
    /// call targets. Failures are logged and recorded; the traversal continues
    /// with the remaining functions.
    pub fn close_from<E, F>(&mut self, root: u64, mut analyze: F) -> ClosureReport
    where
        E: fmt::Display,
        F: FnMut(u64) -> Result<BTreeSet<u64>, E>,
    {
        let mut report = ClosureReport::default();
        let mut pending = vec![root];

        while let Some(address) = pending.pop() {
            if !self.visited.insert(address) {
                continue;
            }
            match analyze(address) {
                Ok(callees) => {
                    report.analyzed.push(address);
                    // Reverse so the lowest callee is explored first.
                    pending.extend(
                        callees.into_iter().rev().filter(|c| !self.visited.contains(c)),
                    );
                }
                Err(err) => {
                    log::error!("Failed to analyze function at {address:#X}: {err}");
                    report.failed.push(address);
                }
            }
        }

        report
    }
}
