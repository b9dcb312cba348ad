use assert_fs::TempDir;
use bytes::Bytes;
use mingit::areas::index::Index;
use mingit::areas::repository::Repository;
use mingit::artifacts::index::entry_mode::EntryMode;
use mingit::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use mingit::artifacts::objects::blob::Blob;
use mingit::artifacts::objects::object_id::ObjectId;
use mingit::artifacts::objects::tree::{tree_to_map, write_index_tree};
use pretty_assertions::assert_eq;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn staged(name: &str, oid: &ObjectId) -> IndexEntry {
    IndexEntry::new(
        PathBuf::from(name),
        oid.clone(),
        EntryMetadata {
            mode: EntryMode::REGULAR,
            ..Default::default()
        },
    )
}

fn repository() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repository = Repository::init(dir.path()).unwrap();
    (dir, repository)
}

#[test]
fn build_then_flatten_reproduces_the_staged_mapping() {
    let (_dir, repository) = repository();
    let database = repository.database();

    let oid_b = database.store(&Blob::new(Bytes::from_static(b"b"))).unwrap();
    let oid_d = database.store(&Blob::new(Bytes::from_static(b"d"))).unwrap();
    let oid_e = database.store(&Blob::new(Bytes::from_static(b"e"))).unwrap();

    let mut index = Index::new(repository.gitdir().join("index").into_boxed_path());
    index.add(staged("a/b.txt", &oid_b));
    index.add(staged("a/c/d.txt", &oid_d));
    index.add(staged("e.txt", &oid_e));

    let root = write_index_tree(database, &index).unwrap().unwrap();

    let map = tree_to_map(&repository, root.as_ref(), Path::new("")).unwrap();

    let mut expected = BTreeMap::new();
    expected.insert(PathBuf::from("a/b.txt"), oid_b);
    expected.insert(PathBuf::from("a/c/d.txt"), oid_d);
    expected.insert(PathBuf::from("e.txt"), oid_e);
    assert_eq!(map, expected);
}

#[test]
fn root_identifier_is_insertion_order_independent() {
    let (_dir, repository) = repository();
    let database = repository.database();

    let oid_b = database.store(&Blob::new(Bytes::from_static(b"b"))).unwrap();
    let oid_d = database.store(&Blob::new(Bytes::from_static(b"d"))).unwrap();
    let oid_e = database.store(&Blob::new(Bytes::from_static(b"e"))).unwrap();

    let mut forward = Index::new(repository.gitdir().join("i1").into_boxed_path());
    forward.add(staged("a/b.txt", &oid_b));
    forward.add(staged("a/c/d.txt", &oid_d));
    forward.add(staged("e.txt", &oid_e));

    let mut backward = Index::new(repository.gitdir().join("i2").into_boxed_path());
    backward.add(staged("e.txt", &oid_e));
    backward.add(staged("a/c/d.txt", &oid_d));
    backward.add(staged("a/b.txt", &oid_b));

    let first = write_index_tree(database, &forward).unwrap().unwrap();
    let second = write_index_tree(database, &backward).unwrap().unwrap();

    assert_eq!(first, second);
}

#[test]
fn intermediate_directories_without_direct_files_are_materialized() {
    let (_dir, repository) = repository();
    let database = repository.database();

    let oid = database.store(&Blob::new(Bytes::from_static(b"x"))).unwrap();

    let mut index = Index::new(repository.gitdir().join("index").into_boxed_path());
    index.add(staged("a/c/d.txt", &oid));

    let root = write_index_tree(database, &index).unwrap().unwrap();
    let map = tree_to_map(&repository, root.as_ref(), Path::new("")).unwrap();

    let mut expected = BTreeMap::new();
    expected.insert(PathBuf::from("a/c/d.txt"), oid);
    assert_eq!(map, expected);
}

#[test]
fn empty_index_builds_no_tree() {
    let (_dir, repository) = repository();

    let index = Index::new(repository.gitdir().join("index").into_boxed_path());
    let root = write_index_tree(repository.database(), &index).unwrap();

    assert!(root.is_none());
}

#[test]
fn single_file_root_tree_matches_hand_framed_sha1() {
    let (_dir, repository) = repository();
    let database = repository.database();

    let blob_id = database
        .store(&Blob::new(Bytes::from_static(b"hi\n")))
        .unwrap();
    assert_eq!(blob_id.as_ref(), "45b983be36b73c0788dc9cbcb76cbb80fc7bb057");

    let mut index = Index::new(repository.gitdir().join("index").into_boxed_path());
    index.add(staged("foo.txt", &blob_id));

    let root = write_index_tree(database, &index).unwrap().unwrap();

    // Frame the single leaf by hand and hash it.
    let mut leaf = Vec::new();
    leaf.extend_from_slice(b"100644 foo.txt\0");
    leaf.extend_from_slice(&hex::decode(blob_id.as_ref()).unwrap());

    let mut framed = format!("tree {}\0", leaf.len()).into_bytes();
    framed.extend_from_slice(&leaf);

    let mut hasher = Sha1::new();
    hasher.update(&framed);
    let expected = format!("{:x}", hasher.finalize());

    assert_eq!(root.as_ref(), expected);
}
