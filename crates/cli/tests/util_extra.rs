use fieldref::commands::util::{open_binary_session, print_dir_status, resolve_type_arg};
use fieldref::commands::{add_binary_command, init_project_command};
use fieldref_core::services::backends::ProgramDump;
use tempfile::tempdir;

const GAME_DUMP: &str = include_str!("fixtures/game.json");

#[test]
fn print_dir_status_handles_missing_and_existing_dirs() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing_dir");
    // Should not panic when directory is missing.
    print_dir_status("Missing", &missing);
    // And for existing dir.
    print_dir_status("Existing", temp.path());
}

#[test]
fn resolve_type_arg_accepts_names_and_ordinals() {
    let dump = ProgramDump::from_json_str(GAME_DUMP).unwrap();

    let (ordinal, layout) = resolve_type_arg(&dump, "Player").unwrap();
    assert_eq!(ordinal, 3);
    assert_eq!(layout.map(|t| t.name.as_str()), Some("Player"));

    let (ordinal, layout) = resolve_type_arg(&dump, "4").unwrap();
    assert_eq!(ordinal, 4);
    assert_eq!(layout.map(|t| t.name.as_str()), Some("Vec3"));

    // Ordinals without a layout are still queryable.
    let (ordinal, layout) = resolve_type_arg(&dump, "77").unwrap();
    assert_eq!(ordinal, 77);
    assert!(layout.is_none());

    let err = resolve_type_arg(&dump, "Enemy").unwrap_err();
    assert!(err.to_string().contains("Unknown type"));
}

#[test]
fn open_binary_session_loads_registered_dump() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    init_project_command(&root, Some("Session".into()), true).unwrap();
    std::fs::write(temp.path().join("game.json"), GAME_DUMP).unwrap();
    add_binary_command(&root, "game.json", None, None, None, true).unwrap();

    let session = open_binary_session(&root, "game.json").unwrap();
    assert_eq!(session.record.name, "game.json");
    assert_eq!(session.dump.image_base, 0x1000);
    assert_eq!(session.dump.functions.len(), 4);

    let err = open_binary_session(&root, "other.json").err().unwrap();
    assert!(err.to_string().contains("not registered"));
}

#[test]
fn open_binary_session_reports_broken_dumps() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    init_project_command(&root, Some("Broken".into()), true).unwrap();
    std::fs::write(temp.path().join("game.json"), "{ truncated").unwrap();
    add_binary_command(&root, "game.json", None, None, None, true).unwrap();

    let err = open_binary_session(&root, "game.json").err().unwrap();
    assert!(err.to_string().contains("Failed to load program dump"), "unexpected error: {err}");
}
