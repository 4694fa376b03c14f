use std::time::Instant;

use crate::analysis::{ClosureReport, FieldAccessVisitor, FunctionScan, Reachability};
use crate::db::BlobStore;
use crate::services::decompiler::{DecompileError, Decompiler, TypeDatabase};
use crate::services::store::XrefStore;

/// Drives decompilation and field analysis into an [`XrefStore`].
///
/// One indexer is one analysis session: the reachability set lives as long as
/// the indexer, so a function is walked at most once per session by
/// [`XrefIndexer::close_from`]. Direct calls to [`XrefIndexer::index_function`]
/// always re-walk and replace that function's records.
pub struct XrefIndexer<'a, B: BlobStore> {
    decompiler: &'a dyn Decompiler,
    types: &'a dyn TypeDatabase,
    store: XrefStore<B>,
    reachability: Reachability,
}

impl<'a, B: BlobStore> XrefIndexer<'a, B> {
    pub fn new(
        decompiler: &'a dyn Decompiler,
        types: &'a dyn TypeDatabase,
        store: XrefStore<B>,
    ) -> Self {
        Self { decompiler, types, store, reachability: Reachability::new() }
    }

    /// Decompile and walk one function, replacing its records in the store.
    pub fn index_function(&mut self, address: u64) -> Result<FunctionScan, DecompileError> {
        analyze_function(self.decompiler, self.types, &mut self.store, address)
    }

    /// Index `root` and every function transitively reachable through direct calls.
    pub fn close_from(&mut self, root: u64) -> ClosureReport {
        let Self { decompiler, types, store, reachability } = self;
        let started = Instant::now();
        let report = reachability.close_from(root, |address| {
            analyze_function(*decompiler, *types, store, address).map(|scan| scan.callees)
        });
        log::info!(
            "Closure from {root:#X}: {} analyzed, {} failed in {:?}",
            report.analyzed.len(),
            report.failed.len(),
            started.elapsed()
        );
        report
    }

    /// Index every function the decompiler knows about.
    pub fn index_all(&mut self) -> ClosureReport {
        let mut report = ClosureReport::default();
        for address in self.decompiler.functions() {
            match self.index_function(address) {
                Ok(_) => report.analyzed.push(address),
                Err(err) => {
                    log::error!("Failed to analyze function at {address:#X}: {err}");
                    report.failed.push(address);
                }
            }
        }
        log::info!(
            "Indexed {} functions ({} failed), {} types in index",
            report.analyzed.len(),
            report.failed.len(),
            self.store.len_types()
        );
        report
    }

    pub fn store(&self) -> &XrefStore<B> {
        &self.store
    }

    pub fn reachability(&self) -> &Reachability {
        &self.reachability
    }

    pub fn into_store(self) -> XrefStore<B> {
        self.store
    }
}

fn analyze_function<B: BlobStore>(
    decompiler: &dyn Decompiler,
    types: &dyn TypeDatabase,
    store: &mut XrefStore<B>,
    address: u64,
) -> Result<FunctionScan, DecompileError> {
    let started = Instant::now();
    let func = decompiler.decompile(address)?;
    let scan = FieldAccessVisitor::new(&func, types).process();
    // Types the function no longer touches must not keep its old records.
    store.forget_function(func.entry);
    for (ordinal, usages) in &scan.findings {
        store.update_structure_info(*ordinal, func.entry, usages.clone());
    }
    log::debug!(
        "Function {:#X}: {} usages across {} types, {} skipped in {:?}",
        func.entry,
        scan.usage_count(),
        scan.findings.len(),
        scan.skipped,
        started.elapsed()
    );
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("Xref index size: {} bytes", store.encoded_size());
    }
    Ok(scan)
}
