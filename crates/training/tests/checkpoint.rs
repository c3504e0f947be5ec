use std::fs;
use training::checkpoint::{latest_checkpoint, list_checkpoints, resolve_restore_path, step_dir_name};
use training::CheckpointError;

#[test]
fn highest_numeric_directory_wins() {
    let dir = tempfile::tempdir().unwrap();
    for step in ["3", "10", "2"] {
        fs::create_dir(dir.path().join(step)).unwrap();
    }
    let latest = resolve_restore_path(Some(dir.path())).unwrap().unwrap();
    assert_eq!(latest.file_name().unwrap(), "10");
}

#[test]
fn comparison_is_numeric_not_lexical() {
    let dir = tempfile::tempdir().unwrap();
    for step in ["9", "000000000100", "20"] {
        fs::create_dir(dir.path().join(step)).unwrap();
    }
    let steps: Vec<u64> = list_checkpoints(dir.path()).unwrap().into_iter().map(|(s, _)| s).collect();
    assert_eq!(steps, vec![9, 20, 100]);
    assert!(latest_checkpoint(dir.path()).unwrap().ends_with("000000000100"));
}

#[test]
fn empty_directory_has_no_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_restore_path(Some(dir.path())).unwrap_err();
    assert!(matches!(err, CheckpointError::NoCheckpointFound(_)));
}

#[test]
fn loose_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.json"), "{}").unwrap();
    assert!(matches!(latest_checkpoint(dir.path()), Err(CheckpointError::NoCheckpointFound(_))));

    fs::create_dir(dir.path().join("5")).unwrap();
    assert!(latest_checkpoint(dir.path()).unwrap().ends_with("5"));
}

#[test]
fn non_numeric_directory_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("3")).unwrap();
    fs::create_dir(dir.path().join("abc")).unwrap();
    match resolve_restore_path(Some(dir.path())).unwrap_err() {
        CheckpointError::MalformedCheckpointName { name, .. } => assert_eq!(name, "abc"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn signed_names_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("+7")).unwrap();
    assert!(matches!(
        list_checkpoints(dir.path()),
        Err(CheckpointError::MalformedCheckpointName { .. })
    ));
}

#[test]
fn file_path_is_used_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("policy.json");
    fs::write(&file, "{}").unwrap();
    let resolved = resolve_restore_path(Some(&file)).unwrap().unwrap();
    assert_eq!(resolved, fs::canonicalize(&file).unwrap());
}

#[test]
fn no_path_means_no_restore() {
    assert!(resolve_restore_path(None).unwrap().is_none());
}

#[test]
fn missing_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_restore_path(Some(&dir.path().join("nope"))).unwrap_err();
    assert!(matches!(err, CheckpointError::Io { .. }));
}

#[test]
fn step_names_parse_back() {
    assert_eq!(step_dir_name(1234), "000000001234");
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(step_dir_name(1234))).unwrap();
    assert_eq!(list_checkpoints(dir.path()).unwrap()[0].0, 1234);
}
