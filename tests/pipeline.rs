mod common;

use common::{chunk, sign, stored_zip};
use std::{
    fs::{create_dir_all, read_to_string, remove_file, write},
    path::{Path, PathBuf},
};
use worldtext::{
    archive::extract_datapack,
    decode_legacy_name,
    nbt::{ListTag, Tag},
    package::unpack_export,
    region::RegionFile,
    world::{AnvilWorld, ChunkPos, Dimension, World},
    Error, ReadMode, ReaderBuilder, WriterBuilder,
};

const LEGACY_README: &[u8] = b"\x90\xe0\x96\xbe.txt";

/// A world export as downloaded: a world folder, a datapack, a readme and a legacy-named note.
fn sample_export(dir: &Path) -> PathBuf {
    let mut region = RegionFile::new(dir.join("unused.mca"));
    region
        .write_chunk(
            ChunkPos::new(0, 0),
            &chunk(0, 0, vec![sign(1, 64, 2, &[r#"{"text":"ようこそ"}"#, "看板"])]),
        )
        .unwrap();

    let region = region.to_bytes();

    let datapack = stored_zip(&[(
        b"data/demo/function/greet.mcfunction".as_slice(),
        "say \"こんにちは\"\nsay \"hello\"".as_bytes(),
    )]);

    let export = stored_zip(&[
        (b"World/level.dat".as_slice(), b"".as_slice()),
        (b"World/region/r.0.0.mca".as_slice(), region.as_slice()),
        (b"World/datapacks/pack.zip".as_slice(), datapack.as_slice()),
        (b"README.md".as_slice(), b"# World\n".as_slice()),
        (LEGACY_README, "説明".as_bytes()),
    ]);

    let path = dir.join("World.zip");
    write(&path, export).unwrap();
    path
}

fn sample_mapping(dir: &Path) -> PathBuf {
    let path = dir.join("mapping.json");
    write(
        &path,
        r#"{"こんにちは":"你好","ようこそ":"欢迎","看板":"告示牌"}"#,
    )
    .unwrap();
    path
}

#[test]
fn legacy_names_are_decoded() {
    assert_eq!(decode_legacy_name(LEGACY_README).as_deref(), Some("説明.txt"));
    assert_eq!(decode_legacy_name(b"readme.txt").as_deref(), Some("readme.txt"));
}

#[test]
fn extracts_text_pool() {
    let dir = tempfile::tempdir().unwrap();
    let export = sample_export(dir.path());
    let workspace = dir.path().join("workspace");
    let pool_path = dir.path().join("text_pool.json");

    let reader = ReaderBuilder::new().workspace(&workspace).batch_size(1).build();
    let pool = reader.read(&export, &pool_path).unwrap();

    assert_eq!(
        pool.iter().map(String::as_str).collect::<Vec<_>>(),
        ["こんにちは", "ようこそ", "看板"]
    );

    assert!(workspace.join("説明.txt").is_file());
    assert!(workspace.join("block_entities.json").is_file());

    let stored: Vec<String> =
        serde_json::from_str(&read_to_string(&pool_path).unwrap()).unwrap();
    assert_eq!(stored, ["こんにちは", "ようこそ", "看板"]);

    // An existing pool is returned without touching the export
    remove_file(&export).unwrap();
    assert_eq!(reader.read(&export, &pool_path).unwrap(), pool);
}

#[test]
fn forced_read_rescans() {
    let dir = tempfile::tempdir().unwrap();
    let export = sample_export(dir.path());
    let workspace = dir.path().join("workspace");
    let pool_path = dir.path().join("text_pool.json");

    write(&pool_path, r#"["stale"]"#).unwrap();

    let pool = ReaderBuilder::new()
        .workspace(&workspace)
        .read_mode(ReadMode::Force)
        .build()
        .read(&export, &pool_path)
        .unwrap();

    assert_eq!(pool.len(), 3);
    assert!(!pool.contains("stale"));
}

#[test]
fn applies_mapping_and_packages() {
    let dir = tempfile::tempdir().unwrap();
    let export = sample_export(dir.path());
    let mapping = sample_mapping(dir.path());
    let output = dir.path().join("out/World_translated.zip");
    let work_dir = dir.path().join("packing");

    let attachments = dir.path().join("attachments");
    create_dir_all(&attachments).unwrap();
    write(attachments.join("LICENSE.txt"), "CC BY-NC 4.0").unwrap();

    let results = WriterBuilder::new()
        .work_dir(&work_dir)
        .attachments(&attachments)
        .stamp("Built: ", 0)
        .batch_size(1)
        .build()
        .write(&export, &mapping, &output)
        .unwrap();

    assert_eq!(results.datapacks_rewritten, 1);
    assert_eq!(results.members_changed, 1);
    assert_eq!(results.world.chunks_changed, 1);
    assert_eq!(results.world.block_entities_changed, 1);
    assert!(!work_dir.exists());

    let unpacked = dir.path().join("check");
    unpack_export(&output, &unpacked).unwrap();

    assert!(unpacked.join("LICENSE.txt").is_file());
    assert!(unpacked.join("説明.txt").is_file());

    let readme = read_to_string(unpacked.join("README.md")).unwrap();
    assert!(readme.starts_with("# World\n\nBuilt: "));
    assert!(readme.ends_with("+00:00"));

    assert_eq!(
        extract_datapack(&unpacked.join("World/datapacks/pack.zip")).unwrap(),
        ["你好"]
    );

    let mut world = AnvilWorld::open(unpacked.join("World")).unwrap();
    let chunk = world
        .chunk(&Dimension::Overworld, ChunkPos::new(0, 0))
        .unwrap()
        .unwrap();
    let messages = chunk.block_entities().next().unwrap()["front_text"]
        .as_compound()
        .unwrap()["messages"]
        .clone();

    assert_eq!(
        messages,
        Tag::List(
            ListTag::from_values(vec![
                r#"{"text":"欢迎"}"#.into(),
                "告示牌".into(),
            ])
            .unwrap()
        )
    );
}

#[test]
fn missing_mapping_is_reported_first() {
    let dir = tempfile::tempdir().unwrap();
    let export = sample_export(dir.path());
    let work_dir = dir.path().join("packing");

    let result = WriterBuilder::new().work_dir(&work_dir).build().write(
        &export,
        &dir.path().join("missing.json"),
        &dir.path().join("out.zip"),
    );

    assert!(matches!(result, Err(Error::MappingMissing(_))));
    assert!(!work_dir.exists());
}
