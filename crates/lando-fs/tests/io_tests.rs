use lando_fs::{format, io};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("deeper").join("file.json");

    io::write_atomic(&path, b"{}").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("file.txt");

    io::write_text(&path, "one").unwrap();
    io::write_text(&path, "two").unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["file.txt"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "two");
}

#[test]
fn test_failed_rename_removes_temp_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("occupied");
    fs::create_dir_all(target.join("child")).unwrap();

    assert!(io::write_text(&target, "content").is_err());

    let mut names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["occupied"]);
    assert!(target.join("child").is_dir());
}

#[test]
fn test_read_text_opt_missing_is_none() {
    let temp = TempDir::new().unwrap();
    assert!(io::read_text_opt(temp.path().join("missing")).unwrap().is_none());
}

#[test]
fn test_recreate_dir_empties_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("cache");
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("entry"), "x").unwrap();

    io::recreate_dir(&dir).unwrap();

    assert!(dir.is_dir());
    assert!(!io::is_populated_dir(&dir));
}

#[test]
fn test_remove_file_if_exists() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("entry");
    fs::write(&file, "x").unwrap();

    assert!(io::remove_file_if_exists(&file).unwrap());
    assert!(!io::remove_file_if_exists(&file).unwrap());
}

#[test]
fn test_load_value_by_extension() {
    let temp = TempDir::new().unwrap();
    let yaml = temp.path().join("config.yml");
    let json_file = temp.path().join("config.json");
    let toml_file = temp.path().join("config.toml");
    fs::write(&yaml, "core:\n  engine: docker-engine\n").unwrap();
    fs::write(&json_file, r#"{"core": {"engine": "docker-engine"}}"#).unwrap();
    fs::write(&toml_file, "[core]\nengine = \"docker-engine\"\n").unwrap();

    let expected = json!({"core": {"engine": "docker-engine"}});
    assert_eq!(format::load_value(&yaml).unwrap(), expected);
    assert_eq!(format::load_value(&json_file).unwrap(), expected);
    assert_eq!(format::load_value(&toml_file).unwrap(), expected);
}

#[test]
fn test_load_value_or_empty_for_missing_file() {
    let temp = TempDir::new().unwrap();
    let value = format::load_value_or_empty(&temp.path().join("config.yml")).unwrap();
    assert_eq!(value, json!({}));
}

#[test]
fn test_save_value_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("snapshot.json");
    let tree = json!({"plugins": ["a", "b"], "core": {"caching": false}});

    format::save_value(&path, &tree).unwrap();
    assert_eq!(format::load_value(&path).unwrap(), tree);
}

#[test]
fn test_parse_error_names_format_and_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{not json").unwrap();

    let err = format::load_value(&path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("JSON"), "got: {}", message);
    assert!(message.contains("broken.json"), "got: {}", message);
}
