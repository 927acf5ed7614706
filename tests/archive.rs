use std::{
    fs::{create_dir_all, read, read_dir, File},
    io::{Read, Write},
    path::Path,
};
use worldtext::{
    archive::{
        extract_datapack, find_datapacks, find_literals, rewrite_datapack,
        translate_literals,
    },
    Error, TextMapping,
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

const FUNCTION: &str = "data/demo/function/greet.mcfunction";
const ADVANCEMENT: &str = "data/demo/advancement/root.json";
const ICON: &str = "pack.png";
const ICON_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0xFF, 0x00];
const BROKEN_BYTES: &[u8] = &[b'"', 0xFF, 0xFE, b'"'];

fn write_datapack(path: &Path, entries: &[(&str, &[u8], CompressionMethod)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());

    for (name, data, method) in entries {
        writer
            .start_file(
                *name,
                SimpleFileOptions::default().compression_method(*method),
            )
            .unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap();
}

fn read_member(path: &Path, name: &str) -> (Vec<u8>, CompressionMethod) {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    (bytes, file.compression())
}

fn sample_datapack(path: &Path) {
    write_datapack(
        path,
        &[
            (
                FUNCTION,
                "say \"こんにちは\"\ntellraw @a \"こんにちは\"\nsay \"hello\"\n"
                    .as_bytes(),
                CompressionMethod::Deflated,
            ),
            (
                ADVANCEMENT,
                r#"{"display":{"title":{"text":"看板"},"description":"ok"}}"#
                    .as_bytes(),
                CompressionMethod::Stored,
            ),
            (ICON, ICON_BYTES, CompressionMethod::Stored),
            ("notes.txt", "メモ".as_bytes(), CompressionMethod::Deflated),
        ],
    );
}

#[test]
fn literals_keep_their_delimiter() {
    let content = r#"say "plain" then \\"看板\\""#;
    let literals: Vec<_> = find_literals(content).collect();

    assert_eq!(literals, [("\"", "plain"), (r#"\\""#, "看板")]);
}

#[test]
fn escaped_delimiter_wins_at_same_position() {
    let content = r#"give @p book{title:\\"日記\\"}"#;
    let literals: Vec<_> = find_literals(content).collect();

    assert_eq!(literals, [(r#"\\""#, "日記")]);
}

#[test]
fn only_candidates_are_replaced() {
    let mapping: TextMapping =
        [("hello", "world"), ("こんにちは", "你好")].into_iter().collect();
    let content = "say \"hello\"\nsay \"こんにちは\"\ntitle @a \"こんにちは\"";

    assert_eq!(
        translate_literals(content, &mapping),
        "say \"hello\"\nsay \"你好\"\ntitle @a \"你好\""
    );
}

#[test]
fn extracts_candidates_from_eligible_members() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.zip");
    sample_datapack(&path);

    assert_eq!(
        extract_datapack(&path).unwrap(),
        ["こんにちは", "こんにちは", "看板"]
    );
}

#[test]
fn undecodable_members_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.zip");

    write_datapack(
        &path,
        &[
            ("data/broken.json", BROKEN_BYTES, CompressionMethod::Stored),
            (FUNCTION, "say \"ようこそ\"".as_bytes(), CompressionMethod::Deflated),
        ],
    );

    assert_eq!(extract_datapack(&path).unwrap(), ["ようこそ"]);
}

#[test]
fn rewrite_translates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.zip");
    sample_datapack(&path);

    let mapping: TextMapping =
        [("こんにちは", "你好"), ("看板", "告示牌"), ("メモ", "笔记")]
            .into_iter()
            .collect();

    assert_eq!(rewrite_datapack(&path, &mapping).unwrap(), 2);

    let (function, _) = read_member(&path, FUNCTION);
    assert_eq!(
        String::from_utf8(function).unwrap(),
        "say \"你好\"\ntellraw @a \"你好\"\nsay \"hello\"\n"
    );

    let (advancement, method) = read_member(&path, ADVANCEMENT);
    assert_eq!(
        String::from_utf8(advancement).unwrap(),
        r#"{"display":{"title":{"text":"告示牌"},"description":"ok"}}"#
    );
    assert_eq!(method, CompressionMethod::Stored);

    let (icon, _) = read_member(&path, ICON);
    assert_eq!(icon, ICON_BYTES);

    let (notes, _) = read_member(&path, "notes.txt");
    assert_eq!(notes, "メモ".as_bytes());

    assert_eq!(read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn failed_rewrite_leaves_original_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.zip");

    write_datapack(
        &path,
        &[
            (FUNCTION, "say \"こんにちは\"".as_bytes(), CompressionMethod::Deflated),
            ("data/broken.json", BROKEN_BYTES, CompressionMethod::Stored),
        ],
    );

    let before = read(&path).unwrap();
    let mapping: TextMapping = [("こんにちは", "你好")].into_iter().collect();

    assert!(matches!(
        rewrite_datapack(&path, &mapping),
        Err(Error::InvalidUtf8 { .. })
    ));
    assert_eq!(read(&path).unwrap(), before);
    assert_eq!(read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn datapacks_are_found_recursively_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let datapacks = dir.path().join("datapacks");
    create_dir_all(datapacks.join("nested")).unwrap();

    for name in ["b.zip", "a.zip", "nested/c.zip", "readme.txt"] {
        File::create(datapacks.join(name)).unwrap();
    }

    assert_eq!(
        find_datapacks(dir.path()),
        [
            datapacks.join("a.zip"),
            datapacks.join("b.zip"),
            datapacks.join("nested/c.zip"),
        ]
    );
}
