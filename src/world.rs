use crate::{
    constants::{
        localization::UNSUPPORTED_CHUNK_MSG, BLOCK_ENTITIES_KEY,
        CUSTOM_DIMENSIONS_DIR, DEFAULT_NAMESPACE, END_REGION_DIR,
        LEGACY_BLOCK_ENTITIES_KEY, LEGACY_LEVEL_KEY, LEVEL_DAT_FILE,
        NETHER_REGION_DIR, REGION_DIR, REGION_EXTENSION,
    },
    nbt::{Compound, ListTag, NamedTag, Tag},
    region::{occupied_indices, RegionFile},
    types::Error,
};
use log::warn;
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Coordinates of the region containing this chunk.
    #[must_use]
    pub const fn region(self) -> (i32, i32) {
        (self.x >> 5, self.z >> 5)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// A dimension, identified by where its region files live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    Overworld,
    Nether,
    End,
    /// Datapack dimension stored at `dimensions/<namespace>/<path>/region`.
    Custom { namespace: String, path: String },
}

impl Dimension {
    /// Directory holding this dimension's `.mca` files.
    #[must_use]
    pub fn region_dir(&self, world_dir: &Path) -> PathBuf {
        match self {
            Self::Overworld => world_dir.join(REGION_DIR),
            Self::Nether => world_dir.join(NETHER_REGION_DIR),
            Self::End => world_dir.join(END_REGION_DIR),
            Self::Custom { namespace, path } => world_dir
                .join(CUSTOM_DIMENSIONS_DIR)
                .join(namespace)
                .join(path)
                .join(REGION_DIR),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overworld => write!(f, "{DEFAULT_NAMESPACE}:overworld"),
            Self::Nether => write!(f, "{DEFAULT_NAMESPACE}:the_nether"),
            Self::End => write!(f, "{DEFAULT_NAMESPACE}:the_end"),
            Self::Custom { namespace, path } => write!(f, "{namespace}:{path}"),
        }
    }
}

/// A decoded chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub tag: NamedTag,
}

impl Chunk {
    #[must_use]
    pub const fn new(tag: NamedTag) -> Self {
        Self { tag }
    }

    fn block_entity_list(&self) -> Option<&ListTag> {
        let root = &self.tag.root;

        match root.get(BLOCK_ENTITIES_KEY) {
            Some(list) => list.as_list(),
            None => root
                .get(LEGACY_LEVEL_KEY)?
                .as_compound()?
                .get(LEGACY_BLOCK_ENTITIES_KEY)?
                .as_list(),
        }
    }

    fn block_entity_list_mut(&mut self) -> Option<&mut ListTag> {
        let root = &mut self.tag.root;

        if root.contains_key(BLOCK_ENTITIES_KEY) {
            return root.get_mut(BLOCK_ENTITIES_KEY)?.as_list_mut();
        }

        root.get_mut(LEGACY_LEVEL_KEY)?
            .as_compound_mut()?
            .get_mut(LEGACY_BLOCK_ENTITIES_KEY)?
            .as_list_mut()
    }

    /// Block entities of the chunk. Both the current and the pre-1.18 layouts are recognized.
    pub fn block_entities(&self) -> impl Iterator<Item = &Compound> {
        self.block_entity_list()
            .into_iter()
            .flat_map(ListTag::iter)
            .filter_map(Tag::as_compound)
    }

    /// Replaces the block entity at `index`. Out-of-range indices are ignored.
    pub fn replace_block_entity(
        &mut self,
        index: usize,
        block_entity: Compound,
    ) -> Result<(), Error> {
        match self.block_entity_list_mut() {
            Some(list) => list.set(index, Tag::Compound(block_entity)),
            None => Ok(()),
        }
    }
}

/// A loaded world, exclusively owned by whoever processes it.
///
/// Chunk changes are buffered by [`World::put_chunk`] and only persisted by [`World::save`].
pub trait World {
    fn dimensions(&self) -> Vec<Dimension>;

    fn chunk_coords(&self, dimension: &Dimension) -> Result<Vec<ChunkPos>, Error>;

    fn chunk(
        &mut self,
        dimension: &Dimension,
        pos: ChunkPos,
    ) -> Result<Option<Chunk>, Error>;

    fn put_chunk(
        &mut self,
        dimension: &Dimension,
        pos: ChunkPos,
        chunk: &Chunk,
    ) -> Result<(), Error>;

    fn save(&mut self) -> Result<(), Error>;
}

/// Parses `r.<x>.<z>.mca` into region coordinates.
fn parse_region_name(name: &str) -> Option<(i32, i32)> {
    let mut parts = name.split('.');

    if parts.next()? != "r" {
        return None;
    }

    let x = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;

    if parts.next()? != REGION_EXTENSION || parts.next().is_some() {
        return None;
    }

    Some((x, z))
}

/// Anvil world on disk. Region files are opened lazily and kept until the world is dropped.
pub struct AnvilWorld {
    root: PathBuf,
    regions: HashMap<PathBuf, RegionFile>,
}

impl AnvilWorld {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();

        if !root.join(LEVEL_DAT_FILE).is_file() {
            return Err(Error::WorldMissing(root));
        }

        Ok(Self {
            root,
            regions: HashMap::new(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn region_path(&self, dimension: &Dimension, pos: ChunkPos) -> PathBuf {
        let (x, z) = pos.region();
        dimension
            .region_dir(&self.root)
            .join(format!("r.{x}.{z}.{REGION_EXTENSION}"))
    }

    fn region(
        &mut self,
        dimension: &Dimension,
        pos: ChunkPos,
    ) -> Result<Option<&mut RegionFile>, Error> {
        let path = self.region_path(dimension, pos);

        if !self.regions.contains_key(&path) {
            if !path.is_file() {
                return Ok(None);
            }

            let region = RegionFile::open(&path)?;
            self.regions.insert(path.clone(), region);
        }

        Ok(self.regions.get_mut(&path))
    }
}

impl World for AnvilWorld {
    fn dimensions(&self) -> Vec<Dimension> {
        let mut dimensions: Vec<Dimension> =
            [Dimension::Overworld, Dimension::Nether, Dimension::End]
                .into_iter()
                .filter(|dimension| dimension.region_dir(&self.root).is_dir())
                .collect();

        let custom_dir = self.root.join(CUSTOM_DIMENSIONS_DIR);

        let mut custom: Vec<Dimension> = WalkDir::new(&custom_dir)
            .min_depth(3)
            .sort_by_file_name()
            .into_iter()
            .flatten()
            .filter(|entry| {
                entry.file_type().is_dir() && entry.file_name() == REGION_DIR
            })
            .filter_map(|entry| {
                let relative =
                    entry.path().parent()?.strip_prefix(&custom_dir).ok()?;
                let mut components =
                    relative.iter().filter_map(|component| component.to_str());

                let namespace = components.next()?.to_owned();
                let path = components.collect::<Vec<_>>().join("/");

                (!path.is_empty())
                    .then_some(Dimension::Custom { namespace, path })
            })
            .collect();

        dimensions.append(&mut custom);
        dimensions
    }

    fn chunk_coords(&self, dimension: &Dimension) -> Result<Vec<ChunkPos>, Error> {
        let region_dir = dimension.region_dir(&self.root);

        let mut regions: Vec<(PathBuf, (i32, i32))> = WalkDir::new(&region_dir)
            .max_depth(1)
            .into_iter()
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let coords = parse_region_name(entry.file_name().to_str()?)?;
                Some((entry.into_path(), coords))
            })
            .collect();

        regions.sort_by_key(|(_, coords)| *coords);

        let mut coords = Vec::new();

        for (path, (region_x, region_z)) in regions {
            for index in occupied_indices(&path)? {
                coords.push(ChunkPos::new(
                    region_x * 32 + (index % 32) as i32,
                    region_z * 32 + (index / 32) as i32,
                ));
            }
        }

        Ok(coords)
    }

    fn chunk(
        &mut self,
        dimension: &Dimension,
        pos: ChunkPos,
    ) -> Result<Option<Chunk>, Error> {
        let Some(region) = self.region(dimension, pos)? else {
            return Ok(None);
        };

        match region.read_chunk(pos) {
            Ok(tag) => Ok(tag.map(Chunk::new)),
            Err(Error::UnsupportedCompression(compression)) => {
                warn!(
                    "{UNSUPPORTED_CHUNK_MSG} Dimension: {dimension}, chunk: {pos}, compression: {compression}"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn put_chunk(
        &mut self,
        dimension: &Dimension,
        pos: ChunkPos,
        chunk: &Chunk,
    ) -> Result<(), Error> {
        let path = self.region_path(dimension, pos);

        if self.region(dimension, pos)?.is_none() {
            self.regions
                .insert(path.clone(), RegionFile::new(path.clone()));
        }

        match self.regions.get_mut(&path) {
            Some(region) => region.write_chunk(pos, &chunk.tag),
            None => Ok(()),
        }
    }

    fn save(&mut self) -> Result<(), Error> {
        for region in self.regions.values_mut() {
            if region.is_dirty() {
                if let Some(parent) = region.path().parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|err| Error::Io(parent.to_path_buf(), err))?;
                }

                region.save()?;
            }
        }

        Ok(())
    }
}
