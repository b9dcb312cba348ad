use assert_fs::TempDir;
use bytes::Bytes;
use mingit::areas::repository::Repository;
use mingit::artifacts::objects::blob::Blob;
use mingit::artifacts::objects::commit::{Author, Commit};
use mingit::artifacts::objects::object::Packable;
use mingit::artifacts::objects::object_id::ObjectId;
use mingit::artifacts::objects::object_type::ObjectType;
use mingit::artifacts::objects::tag::Tag;
use mingit::artifacts::objects::tree::{Tree, TreeLeaf};
use mingit::error::Error;
use pretty_assertions::assert_eq;
use std::io::Write;

fn repository() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repository = Repository::init(dir.path()).unwrap();
    (dir, repository)
}

fn author() -> Author {
    Author::try_from("Ada L <ada@example.com> 815464800 +0100").unwrap()
}

#[test]
fn identical_payloads_share_an_identifier() {
    let (_dir, repository) = repository();

    let first = repository
        .database()
        .store(&Blob::new(Bytes::from_static(b"same bytes")))
        .unwrap();
    let second = repository
        .database()
        .store(&Blob::new(Bytes::from_static(b"same bytes")))
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn store_then_load_round_trips_every_variant() {
    let (_dir, repository) = repository();
    let database = repository.database();

    let blob = Blob::new(Bytes::from_static(b"hi\n"));
    let blob_id = database.store(&blob).unwrap();

    let tree = Tree::new(vec![TreeLeaf::new(
        "100644".to_string(),
        "foo.txt".to_string(),
        blob_id.clone(),
    )]);
    let tree_id = database.store(&tree).unwrap();

    let commit = Commit::new(vec![], tree_id.clone(), author(), "initial\n".to_string());
    let commit_id = database.store(&commit).unwrap();

    let tag = Tag::new(
        commit_id.clone(),
        ObjectType::Commit,
        "v1.0".to_string(),
        Some(author()),
        "release\n".to_string(),
    );
    let tag_id = database.store(&tag).unwrap();

    let loaded_blob = database.load(&blob_id).unwrap().into_blob().unwrap();
    assert_eq!(loaded_blob.payload().unwrap(), blob.payload().unwrap());

    let loaded_tree = database.load(&tree_id).unwrap().into_tree().unwrap();
    assert_eq!(loaded_tree.payload().unwrap(), tree.payload().unwrap());

    let loaded_commit = database.load(&commit_id).unwrap().into_commit().unwrap();
    assert_eq!(loaded_commit.payload().unwrap(), commit.payload().unwrap());

    let loaded_tag = database.load(&tag_id).unwrap().into_tag().unwrap();
    assert_eq!(loaded_tag.payload().unwrap(), tag.payload().unwrap());
}

#[test]
fn stored_object_lands_at_the_fanout_path() {
    let (_dir, repository) = repository();

    let blob = Blob::new(Bytes::from_static(b"hi\n"));
    let oid = repository.database().store(&blob).unwrap();
    assert_eq!(oid.as_ref(), "45b983be36b73c0788dc9cbcb76cbb80fc7bb057");

    let object_path = repository
        .database()
        .objects_path()
        .join("45")
        .join("b983be36b73c0788dc9cbcb76cbb80fc7bb057");
    assert!(object_path.is_file());
}

#[test]
fn missing_object_is_object_not_found() {
    let (_dir, repository) = repository();

    let absent =
        ObjectId::try_parse("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string()).unwrap();
    let err = repository.database().load(&absent).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ObjectNotFound(_))
    ));
}

fn plant_raw_object(repository: &Repository, oid: &str, framed: &[u8]) {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(framed).unwrap();
    let compressed = encoder.finish().unwrap();

    let (dir, file) = oid.split_at(2);
    let bucket = repository.database().objects_path().join(dir);
    std::fs::create_dir_all(&bucket).unwrap();
    std::fs::write(bucket.join(file), compressed).unwrap();
}

#[test]
fn unknown_type_tag_is_rejected() {
    let (_dir, repository) = repository();

    let oid = "cccccccccccccccccccccccccccccccccccccccc";
    plant_raw_object(&repository, oid, b"wibble 2\0hi");

    let err = repository
        .database()
        .load(&ObjectId::try_parse(oid.to_string()).unwrap())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::UnknownFormat(tag)) if tag == "wibble"
    ));
}

#[test]
fn declared_length_mismatch_is_a_format_error() {
    let (_dir, repository) = repository();

    let oid = "dddddddddddddddddddddddddddddddddddddddd";
    plant_raw_object(&repository, oid, b"blob 99\0hi\n");

    let err = repository
        .database()
        .load(&ObjectId::try_parse(oid.to_string()).unwrap())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Format(_))
    ));
}

#[test]
fn prefix_scan_on_empty_bucket_yields_zero_candidates() {
    let (_dir, repository) = repository();

    let matches = repository
        .database()
        .find_objects_by_prefix("abcd")
        .unwrap();
    assert!(matches.is_empty());
}
