mod common;

use common::{chunk, sign};
use std::{
    fs::{create_dir_all, read, write, File},
    path::{Path, PathBuf},
};
use worldtext::{
    nbt::{from_snbt, Compound, ListTag, NamedTag, Tag},
    processors::{Coordinator, TranslationStats},
    region::{occupied_indices, RegionFile},
    world::{AnvilWorld, ChunkPos, Dimension, World},
    Error, TextMapping,
};

fn new_world(dir: &Path) -> PathBuf {
    let root = dir.join("World");
    create_dir_all(&root).unwrap();
    File::create(root.join("level.dat")).unwrap();
    root
}

fn write_region(path: &Path, chunks: &[(ChunkPos, NamedTag)]) {
    create_dir_all(path.parent().unwrap()).unwrap();

    let mut region = RegionFile::new(path);

    for (pos, tag) in chunks {
        region.write_chunk(*pos, tag).unwrap();
    }

    region.save().unwrap();
}

fn messages(tag: &Compound) -> Vec<String> {
    tag["front_text"].as_compound().unwrap()["messages"]
        .as_list()
        .unwrap()
        .iter()
        .map(|message| message.as_str().unwrap().to_owned())
        .collect()
}

/// Overworld with two chunks in one region, and one nether chunk in a negative region.
fn sample_world(dir: &Path) -> PathBuf {
    let root = new_world(dir);

    write_region(
        &root.join("region/r.0.0.mca"),
        &[
            (
                ChunkPos::new(0, 0),
                chunk(0, 0, vec![sign(1, 64, 2, &[r#"{"text":"ようこそ"}"#, "看板"])]),
            ),
            (ChunkPos::new(1, 0), chunk(1, 0, vec![sign(17, 64, 2, &["hello"])])),
        ],
    );

    write_region(
        &root.join("DIM-1/region/r.-1.-1.mca"),
        &[(
            ChunkPos::new(-1, -1),
            chunk(-1, -1, vec![sign(-5, 40, -5, &["ようこそ"])]),
        )],
    );

    root
}

#[test]
fn region_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.-1.-1.mca");
    let pos = ChunkPos::new(-1, -1);
    let tag = chunk(-1, -1, vec![sign(-5, 40, -5, &["看板"])]);

    write_region(&path, &[(pos, tag.clone())]);

    assert_eq!(occupied_indices(&path).unwrap(), [1023]);

    let region = RegionFile::open(&path).unwrap();
    assert_eq!(region.indices().collect::<Vec<_>>(), [1023]);
    assert_eq!(region.read_chunk(pos).unwrap(), Some(tag));
    assert_eq!(region.read_chunk(ChunkPos::new(0, 0)).unwrap(), None);
    assert!(!region.is_dirty());
}

#[test]
fn empty_region_file_has_no_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.0.0.mca");
    File::create(&path).unwrap();

    assert!(occupied_indices(&path).unwrap().is_empty());
    assert_eq!(RegionFile::open(&path).unwrap().indices().count(), 0);
}

#[test]
fn truncated_region_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.0.0.mca");
    write(&path, [0u8; 100]).unwrap();

    assert!(matches!(
        RegionFile::open(&path),
        Err(Error::MalformedRegion { .. })
    ));
}

#[test]
fn unsupported_compression_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let root = new_world(dir.path());
    let path = root.join("region/r.0.0.mca");
    create_dir_all(path.parent().unwrap()).unwrap();

    // One LZ4 chunk at sector 2
    let mut bytes = vec![0u8; 3 * 4096];
    bytes[..4].copy_from_slice(&((2u32 << 8) | 1).to_be_bytes());
    bytes[8192..8196].copy_from_slice(&4u32.to_be_bytes());
    bytes[8196] = 4;
    write(&path, &bytes).unwrap();

    let region = RegionFile::open(&path).unwrap();
    assert!(matches!(
        region.read_chunk(ChunkPos::new(0, 0)),
        Err(Error::UnsupportedCompression(4))
    ));

    let mut world = AnvilWorld::open(&root).unwrap();
    assert_eq!(
        world.chunk(&Dimension::Overworld, ChunkPos::new(0, 0)).unwrap(),
        None
    );
}

#[test]
fn world_without_level_dat_is_missing() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        AnvilWorld::open(dir.path()),
        Err(Error::WorldMissing(_))
    ));
}

#[test]
fn dimensions_include_custom_ones() {
    let dir = tempfile::tempdir().unwrap();
    let root = new_world(dir.path());

    for region_dir in ["region", "DIM-1/region", "dimensions/demo/arena/region"] {
        create_dir_all(root.join(region_dir)).unwrap();
    }

    let world = AnvilWorld::open(&root).unwrap();
    let dimensions = world.dimensions();

    assert_eq!(
        dimensions,
        [
            Dimension::Overworld,
            Dimension::Nether,
            Dimension::Custom {
                namespace: "demo".into(),
                path: "arena".into(),
            },
        ]
    );
    assert_eq!(dimensions[2].to_string(), "demo:arena");
}

#[test]
fn chunk_coords_follow_region_layout() {
    let dir = tempfile::tempdir().unwrap();
    let root = sample_world(dir.path());
    let world = AnvilWorld::open(&root).unwrap();

    assert_eq!(
        world.chunk_coords(&Dimension::Overworld).unwrap(),
        [ChunkPos::new(0, 0), ChunkPos::new(1, 0)]
    );
    assert_eq!(
        world.chunk_coords(&Dimension::Nether).unwrap(),
        [ChunkPos::new(-1, -1)]
    );
}

#[test]
fn dumps_block_entities_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = new_world(dir.path());
    let duplicate = sign(1, 64, 2, &["看板"]);

    write_region(
        &root.join("region/r.0.0.mca"),
        &[
            (ChunkPos::new(0, 0), chunk(0, 0, vec![duplicate.clone()])),
            (ChunkPos::new(0, 1), chunk(0, 1, vec![duplicate.clone()])),
        ],
    );

    let records = Coordinator::new(|| AnvilWorld::open(&root))
        .batch_size(1)
        .dump_block_entities()
        .unwrap();

    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.namespaced_name, "minecraft:sign");
    assert_eq!(record.namespace, "minecraft");
    assert_eq!(record.name, "sign");
    assert_eq!((record.x, record.y, record.z), (1, 64, 2));
    assert_eq!(from_snbt(&record.snbt).unwrap(), Tag::Compound(duplicate));
}

#[test]
fn legacy_tile_entities_are_recognized() {
    let dir = tempfile::tempdir().unwrap();
    let root = new_world(dir.path());

    let tile_entities =
        ListTag::from_values(vec![Tag::Compound(sign(0, 70, 0, &["看板"]))])
            .unwrap();

    let mut level = Compound::new();
    level.insert("xPos".into(), Tag::Int(0));
    level.insert("zPos".into(), Tag::Int(0));
    level.insert("TileEntities".into(), tile_entities.into());

    let mut root_tag = Compound::new();
    root_tag.insert("DataVersion".into(), Tag::Int(1343));
    root_tag.insert("Level".into(), level.into());

    write_region(
        &root.join("region/r.0.0.mca"),
        &[(ChunkPos::new(0, 0), NamedTag::new("", root_tag))],
    );

    let records = Coordinator::new(|| AnvilWorld::open(&root))
        .dump_block_entities()
        .unwrap();
    assert_eq!(records.len(), 1);

    let mapping: TextMapping = [("看板", "告示牌")].into_iter().collect();
    let stats = Coordinator::new(|| AnvilWorld::open(&root))
        .translate_block_entities(&mapping)
        .unwrap();
    assert_eq!(stats.block_entities_changed, 1);

    let mut world = AnvilWorld::open(&root).unwrap();
    let chunk = world
        .chunk(&Dimension::Overworld, ChunkPos::new(0, 0))
        .unwrap()
        .unwrap();
    let block_entity = chunk.block_entities().next().unwrap();

    assert_eq!(messages(block_entity), ["告示牌"]);
}

#[test]
fn translates_block_entities_in_batches() {
    let dir = tempfile::tempdir().unwrap();
    let root = sample_world(dir.path());
    let untouched = read(root.join("region/r.0.0.mca")).unwrap();

    let mapping: TextMapping = [("ようこそ", "欢迎"), ("看板", "告示牌")]
        .into_iter()
        .collect();

    let stats = Coordinator::new(|| AnvilWorld::open(&root))
        .batch_size(1)
        .translate_block_entities(&mapping)
        .unwrap();

    assert_eq!(
        stats,
        TranslationStats {
            chunks_visited: 3,
            chunks_changed: 2,
            block_entities_changed: 2,
        }
    );
    assert_ne!(read(root.join("region/r.0.0.mca")).unwrap(), untouched);

    let mut world = AnvilWorld::open(&root).unwrap();

    let overworld = world
        .chunk(&Dimension::Overworld, ChunkPos::new(0, 0))
        .unwrap()
        .unwrap();
    assert_eq!(
        messages(overworld.block_entities().next().unwrap()),
        [r#"{"text":"欢迎"}"#, "告示牌"]
    );

    let skipped = world
        .chunk(&Dimension::Overworld, ChunkPos::new(1, 0))
        .unwrap()
        .unwrap();
    assert_eq!(messages(skipped.block_entities().next().unwrap()), ["hello"]);

    let nether = world
        .chunk(&Dimension::Nether, ChunkPos::new(-1, -1))
        .unwrap()
        .unwrap();
    assert_eq!(messages(nether.block_entities().next().unwrap()), ["欢迎"]);
}

#[test]
fn empty_mapping_leaves_regions_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let root = sample_world(dir.path());

    let overworld = root.join("region/r.0.0.mca");
    let nether = root.join("DIM-1/region/r.-1.-1.mca");
    let before = (read(&overworld).unwrap(), read(&nether).unwrap());

    let stats = Coordinator::new(|| AnvilWorld::open(&root))
        .translate_block_entities(&TextMapping::default())
        .unwrap();

    assert_eq!(stats.chunks_visited, 3);
    assert_eq!(stats.chunks_changed, 0);
    assert_eq!((read(&overworld).unwrap(), read(&nether).unwrap()), before);
}
