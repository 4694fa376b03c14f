use std::cell::Cell;

use fieldref_core::analysis::UsageKind;
use fieldref_core::db::{ProjectDb, ScopedBlobs, XrefSettings};
use fieldref_core::model::{CFunction, CompositeKind, CompositeType, Expr, Stmt, TypeRef};
use fieldref_core::services::backends::{DumpFunction, ProgramDump};
use fieldref_core::services::decompiler::{DecompileError, Decompiler};
use fieldref_core::services::indexer::XrefIndexer;
use fieldref_core::services::store::XrefStore;

const PLAYER: u32 = 3;
const ENEMY: u32 = 9;

fn composite(ordinal: u32, name: &str) -> CompositeType {
    CompositeType {
        ordinal,
        name: name.to_string(),
        kind: CompositeKind::Struct,
        size: None,
        members: Vec::new(),
    }
}

fn ptr_to(name: &str, ordinal: u32) -> TypeRef {
    TypeRef::ptr(TypeRef::structure(name, ordinal))
}

fn field(var: &str, ty: TypeRef, offset: u64, name: &str) -> Expr {
    Expr::member_ptr(Expr::var(var, ty), offset, name, TypeRef::int(4))
}

fn function(entry: u64, name: &str, stmts: Vec<Stmt>) -> DumpFunction {
    DumpFunction {
        entry,
        name: Some(name.to_string()),
        body: Some(Stmt::block(stmts)),
        error: None,
    }
}

/// tick -> heal -> tick, lonely -> broken (which fails to decompile).
fn program() -> ProgramDump {
    let hp = || field("player", ptr_to("Player", PLAYER), 0, "hp");
    let tick = function(
        0x1100,
        "tick",
        vec![
            Stmt::expr(Expr::assign(hp(), Expr::num(100))).at(0x1104),
            Stmt::expr(Expr::call(Expr::obj(0x1200, "heal"), vec![hp()])).at(0x1108),
            // Anonymous reference, recovered through the type name.
            Stmt::expr(Expr::assign(field("enemy", ptr_to("Enemy", 0), 4, "armor"), Expr::num(0)))
                .at(0x110C),
            // Unknown to the type database: dropped.
            Stmt::expr(Expr::assign(field("ghost", ptr_to("Ghost", 0), 0, "x"), Expr::num(1)))
                .at(0x1110),
        ],
    );
    let heal = function(
        0x1200,
        "heal",
        vec![
            Stmt::expr(Expr::assign(Expr::var("x", TypeRef::int(4)), hp())).at(0x1204),
            Stmt::expr(Expr::call(Expr::obj(0x1100, "tick"), vec![])).at(0x1208),
        ],
    );
    let lonely = function(
        0x1400,
        "lonely",
        vec![Stmt::expr(Expr::call(Expr::obj(0x1300, "broken"), vec![])).at(0x1404)],
    );
    let broken = DumpFunction {
        entry: 0x1300,
        name: Some("broken".into()),
        body: None,
        error: Some("decompilation failure".into()),
    };
    ProgramDump::new(
        0x1000,
        vec![composite(PLAYER, "Player"), composite(ENEMY, "Enemy")],
        vec![tick, heal, broken, lonely],
    )
}

fn store(db: &ProjectDb) -> XrefStore<ScopedBlobs<'_>> {
    let mut store =
        XrefStore::new(ScopedBlobs::new(db, "game.json"), XrefSettings::default(), 0x1000);
    store.open();
    store
}

#[test]
fn index_function_records_usages_and_callees() {
    let dump = program();
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));

    let scan = indexer.index_function(0x1100).expect("tick decompiles");
    assert_eq!(scan.entry, 0x1100);
    assert_eq!(scan.callees.iter().copied().collect::<Vec<_>>(), vec![0x1200]);
    assert_eq!(scan.skipped, 1);
    assert_eq!(scan.findings.keys().copied().collect::<Vec<_>>(), vec![PLAYER, ENEMY]);

    let hp = indexer.store().get_structure_info(PLAYER, 0);
    let summary: Vec<(u64, i64, &str, UsageKind)> =
        hp.iter().map(|i| (i.func_ea, i.offset, i.line.as_str(), i.kind)).collect();
    assert_eq!(
        summary,
        vec![
            (0x1100, 4, "player->hp = 0x64;", UsageKind::Write),
            (0x1100, 8, "heal(player->hp);", UsageKind::Argument),
        ]
    );

    let armor = indexer.store().get_structure_info(ENEMY, 4);
    assert_eq!(armor.len(), 1);
    assert_eq!(armor[0].line, "enemy->armor = 0;");
    assert_eq!(armor[0].ea(), 0x110C);

    // Direct indexing does not count as a visit.
    assert_eq!(indexer.reachability().visited_count(), 0);
}

#[test]
fn reindexing_a_function_is_idempotent() {
    let dump = program();
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));

    indexer.index_function(0x1100).unwrap();
    let first = indexer.store().get_structure_info(PLAYER, 0);
    indexer.index_function(0x1100).unwrap();
    assert_eq!(indexer.store().get_structure_info(PLAYER, 0), first);
}

#[test]
fn closure_follows_cycles_once() {
    let dump = program();
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));

    let report = indexer.close_from(0x1100);
    assert_eq!(report.analyzed, vec![0x1100, 0x1200]);
    assert!(report.failed.is_empty());

    let funcs: Vec<u64> =
        indexer.store().get_structure_info(PLAYER, 0).iter().map(|i| i.func_ea).collect();
    assert_eq!(funcs, vec![0x1100, 0x1100, 0x1200]);

    // Same session: nothing left to do.
    assert!(indexer.close_from(0x1100).is_empty());
    assert!(indexer.close_from(0x1200).is_empty());
}

#[test]
fn closure_continues_past_decompile_failures() {
    let dump = program();
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));

    let report = indexer.close_from(0x1400);
    assert_eq!(report.analyzed, vec![0x1400]);
    assert_eq!(report.failed, vec![0x1300]);
}

#[test]
fn index_all_covers_every_function() {
    let dump = program();
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));

    let report = indexer.index_all();
    assert_eq!(report.analyzed, vec![0x1100, 0x1200, 0x1400]);
    assert_eq!(report.failed, vec![0x1300]);
    assert_eq!(indexer.store().len_types(), 2);
}

#[test]
fn indexed_usages_survive_a_new_session() {
    let dump = program();
    let db = ProjectDb::open_in_memory().unwrap();
    {
        let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));
        indexer.index_all();
        indexer.into_store().close().expect("close store");
    }

    let reopened = store(&db);
    let reads: Vec<UsageKind> =
        reopened.get_structure_info(PLAYER, 0).iter().map(|i| i.kind).collect();
    assert_eq!(reads, vec![UsageKind::Write, UsageKind::Argument, UsageKind::Read]);
}

/// Hands out `p->f = 1;` typed as `Player*` first and as `Enemy*` afterwards,
/// the way a retyped variable looks after re-decompiling.
struct RetypingDecompiler {
    calls: Cell<usize>,
}

impl Decompiler for RetypingDecompiler {
    fn decompile(&self, address: u64) -> Result<CFunction, DecompileError> {
        let ty = match self.calls.replace(self.calls.get() + 1) {
            0 => ptr_to("Player", PLAYER),
            _ => ptr_to("Enemy", ENEMY),
        };
        let write = Stmt::expr(Expr::assign(field("p", ty, 0, "f"), Expr::num(1))).at(address + 4);
        let body = Stmt::block(vec![write]);
        Ok(CFunction { entry: address, name: Some("retyped".into()), body })
    }

    fn image_base(&self) -> u64 {
        0x1000
    }

    fn functions(&self) -> Vec<u64> {
        vec![0x1100]
    }
}

#[test]
fn rewalk_drops_types_the_function_no_longer_touches() {
    let decompiler = RetypingDecompiler { calls: Cell::new(0) };
    let types = program();
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&decompiler, &types, store(&db));

    indexer.index_function(0x1100).unwrap();
    assert_eq!(indexer.store().get_structure_info(PLAYER, 0).len(), 1);

    indexer.index_function(0x1100).unwrap();
    assert!(indexer.store().get_structure_info(PLAYER, 0).is_empty());
    let enemy = indexer.store().get_structure_info(ENEMY, 0);
    assert_eq!(enemy.len(), 1);
    assert_eq!(enemy[0].line, "p->f = 1;");
    assert_eq!(enemy[0].kind, UsageKind::Write);
    assert_eq!(indexer.store().len_types(), 1);
}

#[test]
fn access_without_any_address_is_skipped() {
    let hp = || field("player", ptr_to("Player", PLAYER), 0, "hp");
    let dump = ProgramDump::new(
        0x1000,
        vec![composite(PLAYER, "Player")],
        vec![function(
            0x1500,
            "unplaced",
            vec![
                // Neither the statement nor any expression carries an address.
                Stmt::expr(Expr::assign(hp(), Expr::num(1))),
                Stmt::expr(Expr::assign(Expr::var("x", TypeRef::int(4)), hp())).at(0x1508),
            ],
        )],
    );
    let db = ProjectDb::open_in_memory().unwrap();
    let mut indexer = XrefIndexer::new(&dump, &dump, store(&db));

    let scan = indexer.index_function(0x1500).expect("unplaced decompiles");
    assert_eq!(scan.skipped, 1);
    assert_eq!(scan.usage_count(), 1);

    let hp_usages = indexer.store().get_structure_info(PLAYER, 0);
    assert_eq!(hp_usages.len(), 1);
    assert_eq!(hp_usages[0].ea(), 0x1508);
    assert_eq!(hp_usages[0].kind, UsageKind::Read);
}
