use fsnode_core::{
    Children, ExistingDestination, FileNode, FsAccess, FsOp, Manifest, MemoryFs, NodeError,
    ReadOptions, WriteOptions,
};
use std::io;
use std::path::{Path, PathBuf};

fn write(node: &mut FileNode, fs: &MemoryFs, to: &str) -> Result<(), NodeError> {
    node.write(fs, Path::new(to), &WriteOptions::default(), None)
}

fn following() -> ReadOptions {
    ReadOptions::builder().follow_symlinks(true).build().unwrap()
}

fn sample_tree() -> FileNode {
    let mut docs = Children::new();
    docs.insert("readme.md".into(), FileNode::new_file("# title\n"));
    docs.insert("empty".into(), FileNode::empty_directory());

    let mut children = Children::new();
    children.insert("a.bin".into(), FileNode::new_file(vec![0u8, 1, 2, 255]));
    children.insert("docs".into(), FileNode::new_directory(docs));
    children.insert("zero".into(), FileNode::new_file(Vec::new()));
    FileNode::new_directory(children)
}

#[test]
fn test_leaf_write_then_read_back() {
    let fs = MemoryFs::new();
    let payload = vec![7u8, 0, 42, 13, 10];
    let mut node = FileNode::new_file(payload.clone());

    write(&mut node, &fs, "/blob").unwrap();

    assert_eq!(fs.file("/blob"), Some(payload.clone()));
    let read = FileNode::from_filesystem(&fs, Path::new("/blob"), &ReadOptions::default()).unwrap();
    assert_eq!(read.payload(), Some(payload.as_slice()));
    assert_eq!(read.stored_name.as_deref(), Some("blob"));
    assert_eq!(read.preferred_name.as_deref(), Some("blob"));
}

#[test]
fn test_directory_write_then_read_back() {
    let fs = MemoryFs::new();
    let mut tree = sample_tree();

    write(&mut tree, &fs, "/out").unwrap();
    let read = FileNode::from_filesystem(&fs, Path::new("/out"), &ReadOptions::default()).unwrap();

    assert_eq!(
        Manifest::from_node("root", &tree),
        Manifest::from_node("root", &read)
    );
    assert!(read.child("docs").unwrap().child("empty").unwrap().is_directory());
    assert_eq!(read.stored_name.as_deref(), Some("out"));
}

#[test]
fn test_add_child_with_free_preferred_name() {
    let mut dir = FileNode::empty_directory();
    dir.add_child(FileNode::new_file("1").named("one")).unwrap();
    let before = dir.child_count();

    let name = dir.add_child(FileNode::new_file("2").named("two")).unwrap();

    assert_eq!(name, "two");
    assert_eq!(dir.child_count(), before + 1);
    assert_eq!(dir.child("two").unwrap().payload(), Some(&b"2"[..]));
}

#[test]
fn test_add_child_with_colliding_name() {
    let mut dir = FileNode::empty_directory();
    dir.add_child(FileNode::new_file("first").named("same")).unwrap();

    let name = dir.add_child(FileNode::new_file("second").named("same")).unwrap();

    assert_ne!(name, "same");
    assert_eq!(dir.child_count(), 2);
    let child = dir.child(&name).unwrap();
    assert_eq!(child.preferred_name.as_deref(), Some(name.as_str()));
    assert_eq!(child.payload(), Some(&b"second"[..]));
    assert_eq!(dir.child("same").unwrap().payload(), Some(&b"first"[..]));
}

#[test]
fn test_add_child_without_name() {
    let mut dir = FileNode::empty_directory();
    let name = dir.add_child(FileNode::new_file("x")).unwrap();

    assert!(!name.is_empty());
    assert_eq!(
        dir.child(&name).unwrap().preferred_name.as_deref(),
        Some(name.as_str())
    );
}

#[test]
fn test_add_child_on_file_is_error() {
    let mut file = FileNode::new_file("data");
    let result = file.add_child(FileNode::new_file("x").named("x"));
    assert!(matches!(result, Err(NodeError::NotADirectory)));
}

#[test]
fn test_directory_write_over_existing_destination() {
    let fs = MemoryFs::new();
    fs.insert_file("/out/old.txt", "stale");
    let mut tree = sample_tree();

    let err = write(&mut tree, &fs, "/out").unwrap_err();

    assert!(matches!(err, NodeError::DestinationExists { cleanup: None, .. }));
    assert!(!fs.exists(Path::new("/out")));
    assert_eq!(fs.operations(), [FsOp::Remove(PathBuf::from("/out"))]);
}

#[test]
fn test_directory_write_keeps_existing_destination() {
    let fs = MemoryFs::new();
    fs.insert_file("/out/old.txt", "stale");
    let options = WriteOptions::builder()
        .existing_directory(ExistingDestination::Keep)
        .build()
        .unwrap();

    let err = sample_tree()
        .write(&fs, Path::new("/out"), &options, None)
        .unwrap_err();

    assert!(matches!(err, NodeError::DestinationExists { .. }));
    assert_eq!(fs.file("/out/old.txt"), Some(b"stale".to_vec()));
    assert!(fs.operations().is_empty());
}

#[test]
fn test_cleanup_failure_is_reported() {
    let fs = MemoryFs::new();
    fs.insert_dir("/locked/out");
    fs.deny_mutations_under("/locked/out");

    let err = write(&mut sample_tree(), &fs, "/locked/out").unwrap_err();

    match err {
        NodeError::DestinationExists {
            cleanup: Some(cleanup),
            ..
        } => assert_eq!(cleanup.kind(), io::ErrorKind::PermissionDenied),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(fs.is_dir("/locked/out"));
}

#[test]
fn test_children_written_in_key_order() {
    let fs = MemoryFs::new();
    let mut dir = FileNode::empty_directory();
    for name in ["b", "a", "c"] {
        dir.add_child(FileNode::new_file(name).named(name)).unwrap();
    }

    write(&mut dir, &fs, "/out").unwrap();

    let paths: Vec<_> = fs.operations().iter().map(|op| op.path().to_path_buf()).collect();
    assert_eq!(
        paths,
        [
            PathBuf::from("/out"),
            PathBuf::from("/out/a"),
            PathBuf::from("/out/b"),
            PathBuf::from("/out/c"),
        ]
    );
}

#[test]
fn test_leaf_overwrite_replaces_content() {
    let fs = MemoryFs::new();

    write(&mut FileNode::new_file("first payload, longer"), &fs, "/f").unwrap();
    write(&mut FileNode::new_file("second"), &fs, "/f").unwrap();

    assert_eq!(fs.file("/f"), Some(b"second".to_vec()));
}

#[test]
fn test_empty_directory_write() {
    let fs = MemoryFs::new();
    write(&mut FileNode::empty_directory(), &fs, "/empty").unwrap();

    assert!(fs.is_dir("/empty"));
    assert!(fs.list("/empty").is_empty());
    assert!(
        fs.list_children(Path::new("/empty"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_duplicate_resolved_names_fail_before_writing() {
    let fs = MemoryFs::new();
    let mut dir = FileNode::empty_directory();
    dir.add_child(FileNode::new_file("1").named("x")).unwrap();
    let mut shadow = FileNode::new_file("2").named("y");
    shadow.stored_name = Some("x".into());
    dir.add_child(shadow).unwrap();

    let err = write(&mut dir, &fs, "/out").unwrap_err();

    assert!(matches!(err, NodeError::DuplicateResolvedName { ref name, .. } if name == "x"));
    assert!(fs.operations().is_empty());
    assert!(!fs.exists(Path::new("/out")));
}

#[test]
fn test_invalid_resolved_name_fails_before_writing() {
    let fs = MemoryFs::new();
    let mut dir = FileNode::empty_directory();
    dir.add_child(FileNode::new_file("1").named("ok")).unwrap();
    dir.child_mut("ok").unwrap().preferred_name = Some("../escape".into());

    let err = write(&mut dir, &fs, "/out").unwrap_err();

    assert!(matches!(err, NodeError::InvalidName { .. }));
    assert!(fs.operations().is_empty());
}

#[test]
fn test_child_failure_aborts_remaining_siblings() {
    let fs = MemoryFs::new();
    fs.deny_mutations_under("/out/b");
    let mut dir = FileNode::empty_directory();
    for name in ["a", "b", "c"] {
        dir.add_child(FileNode::new_file(name).named(name)).unwrap();
    }

    let err = write(&mut dir, &fs, "/out").unwrap_err();

    assert!(matches!(err, NodeError::Write { ref path, .. } if path == Path::new("/out/b")));
    assert_eq!(fs.file("/out/a"), Some(b"a".to_vec()));
    assert!(!fs.exists(Path::new("/out/c")));
}

#[test]
fn test_unsupported_locations() {
    let fs = MemoryFs::new();

    let err = FileNode::from_filesystem(&fs, Path::new("s3://bucket/tree"), &ReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedLocation { .. }));

    let err = write(&mut FileNode::new_file("x"), &fs, "https://host/file").unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedLocation { .. }));
}

#[test]
fn test_destination_not_directory_path() {
    let fs = MemoryFs::new();
    fs.insert_dir("/out");

    let err = write(&mut FileNode::empty_directory(), &fs, "/out/..").unwrap_err();

    assert!(matches!(err, NodeError::DestinationNotDirectoryPath { .. }));
    assert!(fs.is_dir("/out"));
}

#[test]
fn test_missing_parent_is_create_failure() {
    let fs = MemoryFs::new();
    let err = write(&mut FileNode::empty_directory(), &fs, "/missing/out").unwrap_err();
    assert!(matches!(err, NodeError::Create { .. }));

    let err = write(&mut FileNode::new_file("x"), &fs, "/missing/file").unwrap_err();
    assert!(matches!(err, NodeError::Write { .. }));
}

#[test]
fn test_leaf_removal_failure() {
    let fs = MemoryFs::new();
    fs.insert_file("/locked/file", "old");
    fs.deny_mutations_under("/locked");

    let err = write(&mut FileNode::new_file("new"), &fs, "/locked/file").unwrap_err();

    assert!(matches!(err, NodeError::Remove { .. }));
    assert_eq!(fs.file("/locked/file"), Some(b"old".to_vec()));
}

#[test]
fn test_leaf_replaces_existing_directory() {
    let fs = MemoryFs::new();
    fs.insert_file("/target/inner", "x");

    write(&mut FileNode::new_file("flat"), &fs, "/target").unwrap();

    assert_eq!(fs.file("/target"), Some(b"flat".to_vec()));
    assert!(!fs.exists(Path::new("/target/inner")));
}

#[test]
fn test_record_names_on_write() {
    let fs = MemoryFs::new();
    let mut children = Children::new();
    children.insert("named".into(), FileNode::new_file("1"));
    let mut dir = FileNode::new_directory(children);
    dir.child_mut("named").unwrap().preferred_name = None;

    write(&mut dir, &fs, "/out").unwrap();

    let stored = dir.child("named").unwrap().stored_name.clone().unwrap();
    assert_eq!(fs.list("/out"), [stored.as_str()]);
    assert_eq!(dir.stored_name.as_deref(), Some("out"));
}

#[test]
fn test_names_untouched_without_recording() {
    let fs = MemoryFs::new();
    let options = WriteOptions::builder().record_names(false).build().unwrap();
    let mut dir = FileNode::empty_directory();
    dir.add_child(FileNode::new_file("1").named("one")).unwrap();

    dir.write(&fs, Path::new("/out"), &options, None).unwrap();

    assert!(dir.stored_name.is_none());
    assert!(dir.child("one").unwrap().stored_name.is_none());
    assert_eq!(fs.file("/out/one"), Some(b"1".to_vec()));
}

#[test]
fn test_atomic_flag_is_forwarded() {
    let fs = MemoryFs::new();
    let options = WriteOptions::builder().atomic(false).build().unwrap();

    FileNode::new_file("x")
        .write(&fs, Path::new("/f"), &options, None)
        .unwrap();

    assert_eq!(
        fs.operations(),
        [FsOp::WriteFile {
            path: PathBuf::from("/f"),
            atomic: false,
        }]
    );
}

#[test]
fn test_symlinks_kept_when_not_following() {
    let fs = MemoryFs::new();
    fs.insert_file("/src/real.txt", "data");
    fs.insert_symlink("/src/alias", "real.txt");

    let mut tree =
        FileNode::from_filesystem(&fs, Path::new("/src"), &ReadOptions::default()).unwrap();
    assert!(tree.child("alias").unwrap().is_symlink());

    write(&mut tree, &fs, "/dst").unwrap();
    assert_eq!(fs.read_link(Path::new("/dst/alias")).unwrap(), PathBuf::from("real.txt"));

    let followed = FileNode::from_filesystem(&fs, Path::new("/src"), &following()).unwrap();
    assert_eq!(followed.child("alias").unwrap().payload(), Some(&b"data"[..]));
}

#[test]
fn test_written_tree_can_be_written_again() {
    let fs = MemoryFs::new();
    let mut tree = sample_tree();

    write(&mut tree, &fs, "/one").unwrap();
    let names: Vec<_> = tree
        .children()
        .unwrap()
        .values()
        .map(|c| c.stored_name.clone())
        .collect();

    write(&mut tree, &fs, "/two").unwrap();
    let again: Vec<_> = tree
        .children()
        .unwrap()
        .values()
        .map(|c| c.stored_name.clone())
        .collect();

    assert_eq!(names, again);
    assert_eq!(fs.list("/one"), fs.list("/two"));
    assert_eq!(tree.stored_name.as_deref(), Some("one"));
}

#[test]
fn test_followed_self_link_is_recorded_as_symlink() {
    let fs = MemoryFs::new();
    fs.insert_file("/src/a.txt", "a");
    fs.insert_symlink("/src/self", ".");
    fs.insert_symlink("/src/up", "..");

    let tree = FileNode::from_filesystem(&fs, Path::new("/src"), &following()).unwrap();

    assert_eq!(tree.child_count(), 3);
    assert_eq!(tree.child("a.txt").unwrap().payload(), Some(&b"a"[..]));
    assert_eq!(
        tree.child("self").unwrap().symlink_target(),
        Some(Path::new("."))
    );
    assert_eq!(
        tree.child("up").unwrap().symlink_target(),
        Some(Path::new(".."))
    );
}

#[test]
fn test_followed_directory_link_is_entered() {
    let fs = MemoryFs::new();
    fs.insert_file("/src/d/f", "inner");
    fs.insert_symlink("/src/link", "d");

    let tree = FileNode::from_filesystem(&fs, Path::new("/src"), &following()).unwrap();

    let linked = tree.child("link").unwrap();
    assert!(linked.is_directory());
    assert_eq!(linked.child("f").unwrap().payload(), Some(&b"inner"[..]));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_child_name_is_inconsistent() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fs = MemoryFs::new();
    let bad = Path::new(OsStr::from_bytes(b"/src/bad\xff"));
    fs.insert_file(bad, "x");

    let err = FileNode::from_filesystem(&fs, Path::new("/src"), &ReadOptions::default())
        .unwrap_err();

    match err {
        NodeError::InconsistentChild { path } => assert_eq!(path, bad),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unlistable_directory_fails_read() {
    let fs = MemoryFs::new();
    fs.insert_file("/src/ok.txt", "ok");
    fs.insert_file("/src/locked/f", "x");
    fs.deny_reads_under("/src/locked");

    let err = FileNode::from_filesystem(&fs, Path::new("/src"), &ReadOptions::default())
        .unwrap_err();

    match &err {
        NodeError::List { path, .. } => assert_eq!(path.as_path(), Path::new("/src/locked")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.io_error().map(io::Error::kind),
        Some(io::ErrorKind::PermissionDenied)
    );
}

#[test]
fn test_manifest_json_round_trip() {
    let tree = sample_tree();
    let manifest = Manifest::from_node("root", &tree);

    let json = serde_json::to_string(&manifest).unwrap();
    let parsed: Manifest = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, manifest);
    assert!(json.contains("\"readme.md\""));
}

#[test]
fn test_options_deserialize_with_defaults() {
    let read: ReadOptions = serde_json::from_str("{}").unwrap();
    assert!(!read.follow_symlinks);

    let write: WriteOptions = serde_json::from_str(r#"{"atomic": false}"#).unwrap();
    assert!(!write.atomic);
    assert!(write.record_names);
    assert_eq!(write.existing_directory, ExistingDestination::Clear);
}
