use std::fs;
use std::path::Path;

use fieldref::{canonicalize_or_current, infer_project_name, parse_address, sha256_file};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_resolves_existing_relative_path() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current("nested").expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("C:/work/fieldref")), "fieldref");
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
}

#[test]
fn infer_project_name_falls_back_when_missing() {
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn parse_address_accepts_decimal_and_hex() {
    assert_eq!(parse_address("4352").unwrap(), 0x1100);
    assert_eq!(parse_address("0x1100").unwrap(), 0x1100);
    assert_eq!(parse_address("0X1100").unwrap(), 0x1100);
    assert_eq!(parse_address(" 0x40_1000 ").unwrap(), 0x401000);
}

#[test]
fn parse_address_rejects_garbage() {
    let err = parse_address("tick").unwrap_err();
    assert!(err.to_string().contains("Invalid address"));
    assert!(parse_address("0x").is_err());
    assert!(parse_address("-4").is_err());
}

#[test]
fn sha256_file_hashes_contents() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("empty.json");
    fs::write(&path, b"").expect("write");
    assert_eq!(
        sha256_file(&path).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert!(sha256_file(&tmp.path().join("missing.json")).is_err());
}
