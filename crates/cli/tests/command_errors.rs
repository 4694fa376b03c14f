use assert_cmd::cargo::cargo_bin_cmd;
use fieldref::commands::{
    add_binary_command, export_xrefs_command, index_command, init_project_command,
    list_binaries_command, project_info_command, xrefs_command, FieldSelector, IndexScope,
};
use predicates::str::contains;
use tempfile::tempdir;

const GAME_DUMP: &str = include_str!("fixtures/game.json");

/// Project with the fixture dump registered as `game.json`; returns the root string.
fn project_with_dump(temp: &tempfile::TempDir) -> String {
    let root = temp.path().to_string_lossy().to_string();
    init_project_command(&root, Some("Errors".into()), true).unwrap();
    std::fs::write(temp.path().join("game.json"), GAME_DUMP).unwrap();
    add_binary_command(&root, "game.json", None, None, None, true).unwrap();
    root
}

#[test]
fn list_binaries_errors_when_config_missing() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    let err = list_binaries_command(&root, false).unwrap_err();
    assert!(err.to_string().contains("Failed to read project config"), "unexpected error: {err}");
}

#[test]
fn index_errors_when_db_missing() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    init_project_command(&root, Some("ErrDb".into()), true).unwrap();
    let layout = fieldref_core::db::ProjectLayout::new(&root);
    let mut cfg: fieldref_core::db::ProjectConfig =
        serde_json::from_str(&std::fs::read_to_string(&layout.project_config_path).unwrap())
            .unwrap();
    cfg.db.path = ".fieldref/project.json/bad.db".into();
    std::fs::write(&layout.project_config_path, serde_json::to_string_pretty(&cfg).unwrap())
        .unwrap();
    let err = index_command(&root, "game.json", IndexScope::All, false).unwrap_err();
    assert!(err.to_string().contains("Failed to open project database"), "unexpected error: {err}");
}

#[test]
fn project_info_errors_when_config_corrupt() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    init_project_command(&root, Some("CorruptProj".into()), true).unwrap();
    let layout = fieldref_core::db::ProjectLayout::new(&root);
    std::fs::write(&layout.project_config_path, "not-json").unwrap();
    let err = project_info_command(&root, true).unwrap_err();
    assert!(err.to_string().contains("Failed to parse project config JSON"));
}

#[test]
fn add_binary_errors_when_dump_missing() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    init_project_command(&root, None, true).unwrap();
    let err = add_binary_command(&root, "nope.json", None, None, None, false).unwrap_err();
    assert!(err.to_string().contains("Program dump does not exist"));
}

#[test]
fn commands_reject_unregistered_binary() {
    let temp = tempdir().unwrap();
    let root = project_with_dump(&temp);

    let err = index_command(&root, "other.json", IndexScope::All, false).unwrap_err();
    assert!(err.to_string().contains("not registered"), "unexpected error: {err}");

    let err = xrefs_command(&root, "other.json", "Player", FieldSelector::Offset(0), false)
        .unwrap_err();
    assert!(err.to_string().contains("not registered"), "unexpected error: {err}");

    let err = export_xrefs_command(&root, "other.json", None).unwrap_err();
    assert!(err.to_string().contains("not registered"), "unexpected error: {err}");
}

#[test]
fn xrefs_rejects_unknown_type_and_field() {
    let temp = tempdir().unwrap();
    let root = project_with_dump(&temp);

    let err = xrefs_command(&root, "game.json", "Enemy", FieldSelector::Offset(0), false)
        .unwrap_err();
    assert!(err.to_string().contains("Unknown type 'Enemy'"));

    let err =
        xrefs_command(&root, "game.json", "Player", FieldSelector::Name("mana".into()), false)
            .unwrap_err();
    assert!(err.to_string().contains("has no field named 'mana'"));

    // An ordinal without a layout can only be queried by offset.
    let err = xrefs_command(&root, "game.json", "77", FieldSelector::Name("hp".into()), false)
        .unwrap_err();
    assert!(err.to_string().contains("no known layout"));
    xrefs_command(&root, "game.json", "77", FieldSelector::Offset(0), false).unwrap();
}

#[test]
fn index_rejects_unknown_function() {
    let temp = tempdir().unwrap();
    let root = project_with_dump(&temp);
    let err = index_command(&root, "game.json", IndexScope::Function(0xdead), false).unwrap_err();
    assert!(err.to_string().contains("Failed to index function at 0xDEAD"));
}

#[test]
fn cli_rejects_bad_address() {
    let temp = tempdir().unwrap();
    cargo_bin_cmd!("fieldref")
        .args(["index", "--binary", "game.json", "--function", "tick", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(contains("Invalid address"));
}

#[test]
fn cli_requires_function_for_closure() {
    let temp = tempdir().unwrap();
    cargo_bin_cmd!("fieldref")
        .args(["index", "--binary", "game.json", "--closure", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(contains("--function"));
}

#[test]
fn cli_requires_field_or_offset() {
    let temp = tempdir().unwrap();
    cargo_bin_cmd!("fieldref")
        .args(["xrefs", "--binary", "game.json", "--type", "Player", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(contains("--field"));

    cargo_bin_cmd!("fieldref")
        .args(["xrefs", "--binary", "game.json", "--type", "Player", "--field", "hp"])
        .args(["--offset", "0", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));
}
