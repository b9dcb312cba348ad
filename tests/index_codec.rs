use assert_fs::TempDir;
use mingit::areas::index::Index;
use mingit::areas::repository::Repository;
use mingit::artifacts::index::entry_mode::EntryMode;
use mingit::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use mingit::artifacts::objects::object_id::ObjectId;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn entry(name: &str, mode: EntryMode) -> IndexEntry {
    IndexEntry::new(
        PathBuf::from(name),
        ObjectId::try_parse("45b983be36b73c0788dc9cbcb76cbb80fc7bb057".to_string()).unwrap(),
        EntryMetadata {
            ctime: 1_700_000_000,
            ctime_nsec: 11,
            mtime: 1_700_000_200,
            mtime_nsec: 22,
            dev: 2049,
            ino: 44_001,
            mode,
            uid: 1000,
            gid: 100,
            size: 4,
        },
    )
}

#[test]
fn written_index_rehydrates_identically() {
    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("index");

    let mut index = Index::new(index_path.clone().into_boxed_path());
    index.add(entry("src/lib.rs", EntryMode::REGULAR));
    index.add(entry("bin/run.sh", EntryMode::EXECUTABLE));
    index.add(entry("link", EntryMode::SYMLINK));
    index.write_updates().unwrap();

    let mut reloaded = Index::new(index_path.into_boxed_path());
    reloaded.rehydrate().unwrap();

    assert_eq!(
        reloaded.entries().cloned().collect::<Vec<_>>(),
        index.entries().cloned().collect::<Vec<_>>()
    );
    assert_eq!(reloaded.version(), 2);
}

#[test]
fn rewriting_without_changes_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("index");

    let mut index = Index::new(index_path.clone().into_boxed_path());
    index.add(entry("a.txt", EntryMode::REGULAR));
    index.add(entry("deep/nested/b.txt", EntryMode::REGULAR));
    index.write_updates().unwrap();
    let first = std::fs::read(&index_path).unwrap();

    let mut reloaded = Index::new(index_path.clone().into_boxed_path());
    reloaded.rehydrate().unwrap();
    reloaded.write_updates().unwrap();
    let second = std::fs::read(&index_path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn write_is_skipped_while_nothing_changed() {
    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("index");

    let mut index = Index::new(index_path.clone().into_boxed_path());
    index.add(entry("a.txt", EntryMode::REGULAR));
    index.write_updates().unwrap();

    // the flag was consumed by the write, so a rewrite is a no-op
    std::fs::remove_file(&index_path).unwrap();
    index.write_updates().unwrap();
    assert!(!index_path.exists());

    index.add(entry("b.txt", EntryMode::REGULAR));
    index.write_updates().unwrap();
    assert!(index_path.exists());
}

#[test]
fn absent_index_file_means_no_staged_entries() {
    let dir = TempDir::new().unwrap();
    let repository = Repository::init(dir.path()).unwrap();

    let mut index = repository.index();
    index.rehydrate().unwrap();

    assert!(index.is_empty());
    assert_eq!(index.version(), 2);
}

#[test]
fn remove_then_rewrite_drops_the_entry() {
    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("index");

    let mut index = Index::new(index_path.clone().into_boxed_path());
    index.add(entry("keep.txt", EntryMode::REGULAR));
    index.add(entry("drop.txt", EntryMode::REGULAR));
    index.remove(std::path::Path::new("drop.txt"));
    index.write_updates().unwrap();

    let mut reloaded = Index::new(index_path.into_boxed_path());
    reloaded.rehydrate().unwrap();

    let names: Vec<PathBuf> = reloaded.entries().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec![PathBuf::from("keep.txt")]);
}
