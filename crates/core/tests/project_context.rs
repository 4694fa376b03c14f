use fieldref_core::db::{
    resolve_db_path, BinaryRecord, ProjectConfig, ProjectContext, ProjectLayout,
};

fn write_project(root: &std::path::Path, name: &str) -> ProjectLayout {
    let layout = ProjectLayout::new(root);
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    let config = ProjectConfig::new(name, layout.db_path_relative_string());
    std::fs::write(&layout.project_config_path, serde_json::to_string_pretty(&config).unwrap())
        .unwrap();
    layout
}

#[test]
fn project_context_loads_config_and_db() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path(), "CtxProject");

    let ctx = ProjectContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.config.name, "CtxProject");
    assert!(ctx.db_path.is_file());

    // DB should be initialized and usable.
    ctx.db.list_binaries().expect("list binaries");
}

#[test]
fn project_context_looks_up_binaries_by_name() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path(), "Lookup");

    let ctx = ProjectContext::from_root(temp.path()).expect("context");
    ctx.db.insert_binary(&BinaryRecord::new("game.json", "dumps/game.json")).unwrap();

    let record = ctx.binary("game.json").expect("registered binary");
    assert_eq!(ctx.binary_path(&record), temp.path().join("dumps/game.json"));

    let err = ctx.binary("missing.json").unwrap_err();
    assert!(err.to_string().contains("not registered"));
}

#[test]
fn project_context_errors_without_config() {
    let temp = tempfile::tempdir().unwrap();
    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to read project config"));
    assert!(err.to_string().contains("fieldref init-project"));
}

#[test]
fn db_path_honors_absolute_and_relative_config() {
    let temp = tempfile::tempdir().unwrap();
    let layout = write_project(temp.path(), "Paths");
    let mut config = ProjectConfig::new("Paths", ".fieldref/project.db");
    assert_eq!(resolve_db_path(&layout, &config), layout.db_path);

    let elsewhere = temp.path().join("shared").join("xrefs.db");
    config.db.path = elsewhere.to_string_lossy().to_string();
    assert_eq!(resolve_db_path(&layout, &config), elsewhere);
}
