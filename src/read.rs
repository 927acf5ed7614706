use crate::{
    archive::{extract_datapack, find_datapacks},
    cache::{
        load_block_entities, load_text_pool, store_block_entities,
        store_text_pool,
    },
    constants::{
        localization::{
            CACHE_HIT_MSG, DUMPED_BLOCK_ENTITIES_MSG, FAILED_DATAPACK_MSG,
            POOL_EXISTS_MSG, PROCESSING_DATAPACK_MSG, UNPACKED_EXPORT_MSG,
            WROTE_TEXT_POOL_MSG,
        },
        BLOCK_ENTITIES_CACHE_FILE, DEFAULT_BATCH_SIZE, DEFAULT_WORKSPACE_DIR,
    },
    functions::is_candidate,
    generic::extract_text,
    nbt::from_snbt,
    package::{locate_world, unpack_export},
    processors::Coordinator,
    types::{BlockEntityRecord, Error, ReadMode, SourceFlags, TextPool},
    world::AnvilWorld,
};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// A struct used for extracting translatable text from a world export into a text pool.
///
/// # Fields
/// - `source_flags`: Indicates which sources should be scanned. Use [`Reader::set_flags`] to set them.
/// - `read_mode`: Defines whether existing cache artifacts are reused. Use [`Reader::set_read_mode`] to set it.
/// - `batch_size`: Amount of chunks loaded per world handle. Use [`Reader::set_batch_size`] to set it.
/// - `logging`: If enabled, logs operations and progress. Use [`Reader::set_logging`] to set it. As this crate uses `log` for logging, you should [set up logging in your program](https://docs.rs/log/latest/log/#available-logging-implementations).
/// - `workspace`: Directory the export is unpacked to. Use [`Reader::set_workspace`] to set it.
///
/// # Example
/// ```no_run
/// use worldtext::{Reader, SourceFlags};
///
/// let mut reader = Reader::new();
/// reader.set_flags(SourceFlags::Datapacks);
/// reader.read("./download/World.zip", "./text_pool.json");
/// ```
pub struct Reader {
    source_flags: SourceFlags,
    read_mode: ReadMode,
    batch_size: usize,
    logging: bool,
    workspace: Option<PathBuf>,
}

impl Default for Reader {
    fn default() -> Self {
        Self {
            source_flags: SourceFlags::default(),
            read_mode: ReadMode::Default,
            batch_size: DEFAULT_BATCH_SIZE,
            logging: false,
            workspace: None,
        }
    }
}

impl Reader {
    /// Creates a new [`Reader`] instance with default values.
    ///
    /// By default, both datapacks and the world are scanned, the [`ReadMode::Default`] read mode is used, and chunks are processed in batches of 1000.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source flags to determine which parts of the export will be scanned.
    ///
    /// There's two SourceFlags variants:
    /// - [`SourceFlags::Datapacks`] - enables scanning datapack archives.
    /// - [`SourceFlags::World`] - enables scanning block entities stored in region files.
    pub fn set_flags(&mut self, flags: SourceFlags) {
        self.source_flags = flags;
    }

    /// Sets the read mode.
    ///
    /// - [`ReadMode::Default`] - reuses the workspace, the block entity cache and the text pool if they exist.
    /// - [`ReadMode::Force`] - unpacks and rescans everything, overwriting the existing artifacts.
    pub fn set_read_mode(&mut self, mode: ReadMode) {
        self.read_mode = mode;
    }

    /// Sets how many chunks are loaded per world handle before it is released.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    /// Sets whether to output progress logs. Warnings are always logged.
    pub fn set_logging(&mut self, enabled: bool) {
        self.logging = enabled;
    }

    /// Sets the directory the export archive is unpacked to. Defaults to `./workspace`.
    pub fn set_workspace<P: AsRef<Path>>(&mut self, workspace: P) {
        self.workspace = Some(workspace.as_ref().to_path_buf());
    }

    fn prepare_workspace(&self, export_path: &Path) -> Result<PathBuf, Error> {
        if export_path.is_dir() {
            return Ok(export_path.to_path_buf());
        }

        let workspace = self
            .workspace
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_DIR));

        if self.read_mode.is_force() || locate_world(&workspace).is_err() {
            unpack_export(export_path, &workspace)?;

            if self.logging {
                info!("{UNPACKED_EXPORT_MSG} {}", workspace.display());
            }
        }

        Ok(workspace)
    }

    fn read_datapacks(&self, world_dir: &Path, pool: &mut TextPool) {
        for datapack in find_datapacks(world_dir) {
            if self.logging {
                info!("{PROCESSING_DATAPACK_MSG} {}", datapack.display());
            }

            match extract_datapack(&datapack) {
                Ok(lines) => pool.extend(lines),
                Err(err) => warn!("{FAILED_DATAPACK_MSG}: {err}"),
            }
        }
    }

    fn block_entities(
        &self,
        workspace: &Path,
        world_dir: &Path,
    ) -> Result<Vec<BlockEntityRecord>, Error> {
        let cache_path = workspace.join(BLOCK_ENTITIES_CACHE_FILE);

        if self.read_mode.is_default() {
            if let Some(records) = load_block_entities(&cache_path)? {
                info!("{CACHE_HIT_MSG} {}", cache_path.display());
                return Ok(records);
            }
        }

        let records = Coordinator::new(|| AnvilWorld::open(world_dir))
            .batch_size(self.batch_size)
            .logging(self.logging)
            .dump_block_entities()?;

        store_block_entities(&cache_path, &records)?;

        if self.logging {
            info!("{DUMPED_BLOCK_ENTITIES_MSG}: {}", records.len());
        }

        Ok(records)
    }

    /// Extracts candidate strings from `export_path` and writes them to `pool_path` as a JSON array.
    ///
    /// `export_path` may be either the export archive or an already unpacked directory.
    /// If `pool_path` already exists and the read mode isn't [`ReadMode::Force`], it is returned as is.
    ///
    /// # Example
    /// ```compile_fail
    /// let pool = reader.read("./download/World.zip", "./text_pool.json")?;
    /// ```
    pub fn read<P: AsRef<Path>>(
        &self,
        export_path: P,
        pool_path: P,
    ) -> Result<TextPool, Error> {
        let export_path = export_path.as_ref();
        let pool_path = pool_path.as_ref();

        if self.read_mode.is_default() {
            if let Some(pool) = load_text_pool(pool_path)? {
                info!("{POOL_EXISTS_MSG} {}", pool_path.display());
                return Ok(pool);
            }
        }

        let mut pool = TextPool::new();

        if self.source_flags.is_empty() {
            return Ok(pool);
        }

        let workspace = self.prepare_workspace(export_path)?;
        let world_dir = locate_world(&workspace)?;

        if self.source_flags.contains(SourceFlags::Datapacks) {
            self.read_datapacks(&world_dir, &mut pool);
        }

        if self.source_flags.contains(SourceFlags::World) {
            for record in self.block_entities(&workspace, &world_dir)? {
                match from_snbt(&record.snbt) {
                    Ok(tag) => pool.extend(extract_text(&tag)),
                    Err(err) => warn!(
                        "{err}: {name} at {x} {y} {z}",
                        name = record.namespaced_name,
                        x = record.x,
                        y = record.y,
                        z = record.z
                    ),
                }
            }
        }

        pool.retain(|line| is_candidate(line));
        store_text_pool(pool_path, &pool)?;

        if self.logging {
            info!("{WROTE_TEXT_POOL_MSG} {}", pool_path.display());
        }

        Ok(pool)
    }
}

/// A builder struct for [`Reader`].
///
/// # Example
/// ```
/// use worldtext::{ReaderBuilder, SourceFlags};
/// let reader = ReaderBuilder::new().with_flags(SourceFlags::World).build();
/// ```
#[derive(Default)]
pub struct ReaderBuilder {
    reader: Reader,
}

impl ReaderBuilder {
    /// Creates a new [`ReaderBuilder`] instance with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`Reader::set_flags`].
    #[must_use]
    pub fn with_flags(mut self, flags: SourceFlags) -> Self {
        self.reader.source_flags = flags;
        self
    }

    /// See [`Reader::set_read_mode`].
    #[must_use]
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.reader.read_mode = mode;
        self
    }

    /// See [`Reader::set_batch_size`].
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.reader.batch_size = batch_size;
        self
    }

    /// Sets whether to output logs.
    ///
    /// As this crate uses `log` for logging, you should [set up logging in your program](https://docs.rs/log/latest/log/#available-logging-implementations).
    #[must_use]
    pub fn logging(mut self, enabled: bool) -> Self {
        self.reader.logging = enabled;
        self
    }

    /// See [`Reader::set_workspace`].
    #[must_use]
    pub fn workspace<P: AsRef<Path>>(mut self, workspace: P) -> Self {
        self.reader.set_workspace(workspace);
        self
    }

    /// Builds and returns the [`Reader`].
    #[must_use]
    pub fn build(self) -> Reader {
        self.reader
    }
}
