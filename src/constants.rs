use const_format::formatcp;
use phf::phf_set;

pub(crate) mod localization {
    pub const PROCESSING_DATAPACK_MSG: &str = "Processing datapack";
    pub const UPDATED_DATAPACK_MSG: &str = "Successfully updated datapack";
    pub const FAILED_DATAPACK_MSG: &str = "Failed to rewrite datapack";
    pub const SKIPPED_MEMBER_MSG: &str =
        "Archive member couldn't be read and was skipped.";
    pub const MALFORMED_JSON_MSG: &str =
        "String looks like a JSON text component, but couldn't be parsed. Treating it as plain text.";
    pub const UNSUPPORTED_CHUNK_MSG: &str =
        "Chunk is stored in an unsupported way and was skipped.";
    pub const TRANSLATED_BLOCK_ENTITY_MSG: &str = "Translated block entity";
    pub const CACHE_HIT_MSG: &str =
        "Cache file exists, using it instead of rescanning. Use `ReadMode::Force` to rebuild it.";
    pub const POOL_EXISTS_MSG: &str =
        "Text pool already exists, returning it. Use `ReadMode::Force` to re-extract text.";
    pub const SAVING_BATCH_MSG: &str = "Saving batch";
    pub const SAVED_BATCH_MSG: &str = "Saved batch";
    pub const UNPACKED_EXPORT_MSG: &str = "Unpacked export archive to";
    pub const DUMPED_BLOCK_ENTITIES_MSG: &str = "Dumped block entities";
    pub const WROTE_TEXT_POOL_MSG: &str = "Wrote text pool";
    pub const TRANSLATED_WORLD_MSG: &str = "Translated world";
    pub const PACKAGED_MSG: &str = "Packaged translated world to";
}

/// Archive members with these extensions are scanned for text literals.
pub(crate) const ELIGIBLE_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "json",
    "mcfunction",
};

/// Delimited text literal: either `\\"body\\"` or `"body"`.
///
/// The first alternative must come first, so that at the same start position the escaped form wins.
pub(crate) const TEXT_LITERAL_PATTERN: &str =
    r#"\\\\"((?:[^"\\]|\\.)*)\\\\"|"((?:[^"\\]|\\.)*)""#;
pub const PLAIN_DELIMITER: &str = "\"";
pub const ESCAPED_DELIMITER: &str = r#"\\""#;

pub const DATAPACKS_DIR: &str = "datapacks";
pub const LEVEL_DAT_FILE: &str = "level.dat";
pub const README_FILE: &str = "README.md";
pub const README_EXTENSION: &str = "txt";

pub const DEFAULT_WORKSPACE_DIR: &str = "workspace";
pub const DEFAULT_WORK_DIR: &str = "packing";
pub const BLOCK_ENTITIES_CACHE_FILE: &str = "block_entities.json";
pub const TEMP_FILE_PREFIX: &str = "temp_";

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;
pub const DEFAULT_STAMP_LABEL: &str = "Package built at: ";

pub const REGION_DIR: &str = "region";
pub const NETHER_REGION_DIR: &str = formatcp!("DIM-1/{REGION_DIR}");
pub const END_REGION_DIR: &str = formatcp!("DIM1/{REGION_DIR}");
pub const CUSTOM_DIMENSIONS_DIR: &str = "dimensions";
pub const REGION_EXTENSION: &str = "mca";

pub const SECTOR_SIZE: usize = 4096;
pub const CHUNKS_PER_REGION: usize = 1024;
pub const REGION_HEADER_SIZE: usize = 2 * SECTOR_SIZE;

pub const BLOCK_ENTITIES_KEY: &str = "block_entities";
pub const LEGACY_LEVEL_KEY: &str = "Level";
pub const LEGACY_BLOCK_ENTITIES_KEY: &str = "TileEntities";
pub const DEFAULT_NAMESPACE: &str = "minecraft";

pub const MAX_NBT_DEPTH: usize = 512;
