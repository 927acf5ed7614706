use crate::{
    constants::DEFAULT_NAMESPACE,
    functions::read_to_string_without_bom,
    nbt::{to_snbt, Compound, TagKind},
    world::ChunkPos,
};
use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::{io, path::Path, path::PathBuf, str::FromStr};
use strum_macros::{Display, EnumIs};
use thiserror::Error;

/// Unique candidate strings, in the order they were first encountered.
pub type TextPool = IndexSet<String>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}: IO error occurred: {1}")]
    Io(PathBuf, io::Error),
    #[error("{0}: archive error occurred: {1}")]
    Zip(PathBuf, zip::result::ZipError),
    #[error("Parsing JSON data failed with: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("{path}: member `{member}` is not valid UTF-8 text")]
    InvalidUtf8 { path: PathBuf, member: String },
    #[error("Malformed NBT data: {0}")]
    MalformedNbt(String),
    #[error("Malformed SNBT at byte {position}: {message}")]
    MalformedSnbt { position: usize, message: String },
    #[error("List elements must all be {expected}, found {found}")]
    MixedList { expected: TagKind, found: TagKind },
    #[error("{path}: malformed region file: {message}")]
    MalformedRegion { path: PathBuf, message: String },
    #[error("Chunk compression type {0} is not supported")]
    UnsupportedCompression(u8),
    #[error("Chunk at {0} is too large to be stored in a region file")]
    ChunkTooLarge(ChunkPos),
    #[error(
        "{0}: mapping file doesn't exist. It is required to apply translations."
    )]
    MappingMissing(PathBuf),
    #[error("{0}: no directory containing `level.dat` was found.")]
    WorldMissing(PathBuf),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumIs, Display)]
/// Defines which phase is being run.
///
/// - [`Mode::Read`] extracts candidate strings.
/// - [`Mode::Write`] applies a finished mapping.
pub enum Mode {
    #[default]
    Read,
    Write,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumIs)]
/// There's two read modes:
///
/// - [`ReadMode::Default`] - reuses existing cache artifacts (block entity cache, text pool) if they're present.
/// - [`ReadMode::Force`] - ignores existing cache artifacts, rescans everything and overwrites them.
pub enum ReadMode {
    #[default]
    Default,
    Force,
}

impl FromStr for ReadMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => Self::Default,
            "force" => Self::Force,
            _ => return Err("Expected `default` or `force` string"),
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// There's two [`SourceFlags`] variants:
    /// - [`SourceFlags::Datapacks`] - enables processing of datapack archives.
    /// - [`SourceFlags::World`] - enables processing of block entities stored in the world.
    pub struct SourceFlags: u8 {
        /// Zip archives inside the world's `datapacks` directory.
        const Datapacks = 1 << 0;

        /// Block entities in region files.
        const World = 1 << 1;
    }
}

impl Default for SourceFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Finished source → translation table. Lookups are exact, whole-string matches.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextMapping(IndexMap<String, String>);

impl TextMapping {
    /// Loads the mapping from a JSON object of strings. A leading BOM is ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::MappingMissing(path.to_path_buf()));
        }

        let content = read_to_string_without_bom(path)
            .map_err(|err| Error::Io(path.to_path_buf(), err))?;

        Ok(serde_json::from_str(&content)?)
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.0.contains_key(source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TextMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(source, translation)| {
                    (source.into(), translation.into())
                })
                .collect(),
        )
    }
}

/// A block entity as stored in the block entity cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockEntityRecord {
    pub namespaced_name: String,
    pub name: String,
    pub namespace: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub snbt: String,
}

impl BlockEntityRecord {
    /// Builds a record from a block entity compound. Missing fields default to empty/zero.
    #[must_use]
    pub fn from_compound(compound: &Compound) -> Self {
        let namespaced_name = compound
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or_default()
            .to_owned();

        let (namespace, name) = match namespaced_name.split_once(':') {
            Some((namespace, name)) => (namespace.to_owned(), name.to_owned()),
            None => (DEFAULT_NAMESPACE.to_owned(), namespaced_name.clone()),
        };

        let coordinate = |key: &str| {
            compound
                .get(key)
                .and_then(|value| value.as_int())
                .unwrap_or_default()
        };

        Self {
            x: coordinate("x"),
            y: coordinate("y"),
            z: coordinate("z"),
            snbt: to_snbt(&compound.clone().into()),
            namespaced_name,
            namespace,
            name,
        }
    }
}
