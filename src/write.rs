use crate::{
    archive::{find_datapacks, rewrite_datapack},
    constants::{
        localization::{
            FAILED_DATAPACK_MSG, PACKAGED_MSG, PROCESSING_DATAPACK_MSG,
            TRANSLATED_WORLD_MSG, UNPACKED_EXPORT_MSG, UPDATED_DATAPACK_MSG,
        },
        DEFAULT_BATCH_SIZE, DEFAULT_STAMP_LABEL, DEFAULT_UTC_OFFSET_HOURS,
        DEFAULT_WORK_DIR,
    },
    package::{assemble_package, build_stamp, locate_world, unpack_export},
    processors::{Coordinator, TranslationStats},
    types::{Error, SourceFlags, TextMapping},
    world::AnvilWorld,
};
use log::{error, info};
use std::{
    fs::remove_dir_all,
    path::{Path, PathBuf},
};

/// A struct used for applying a finished mapping to a world export and packaging the result.
///
/// # Fields
/// - `source_flags`: Indicates which sources should be translated. Use [`Writer::set_flags`] to set them.
/// - `batch_size`: Amount of chunks loaded per world handle. Use [`Writer::set_batch_size`] to set it.
/// - `logging`: If enabled, logs operations and progress. Use [`Writer::set_logging`] to set it.
/// - `work_dir`: Directory the export is unpacked to and modified in. Removed after packaging. Use [`Writer::set_work_dir`] to set it.
/// - `attachments`: File or directory copied into the package root. Use [`Writer::set_attachments`] to set it.
/// - `stamp_label`/`utc_offset_hours`: Build time line appended to the package readme. Use [`Writer::set_stamp`] to set them.
///
/// # Example
/// ```no_run
/// use worldtext::Writer;
///
/// let writer = Writer::new();
/// writer.write("./download/World.zip", "./mapping.json", "./World_translated.zip");
/// ```
pub struct Writer {
    source_flags: SourceFlags,
    batch_size: usize,
    logging: bool,
    work_dir: Option<PathBuf>,
    attachments: Option<PathBuf>,
    stamp_label: String,
    utc_offset_hours: i32,
}

impl Default for Writer {
    fn default() -> Self {
        Self {
            source_flags: SourceFlags::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            logging: false,
            work_dir: None,
            attachments: None,
            stamp_label: DEFAULT_STAMP_LABEL.to_owned(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

/// What [`Writer::write`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteResults {
    pub datapacks_rewritten: usize,
    pub members_changed: usize,
    pub world: TranslationStats,
}

impl Writer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets which parts of the export are translated. See [`SourceFlags`].
    pub fn set_flags(&mut self, flags: SourceFlags) {
        self.source_flags = flags;
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    pub fn set_logging(&mut self, enabled: bool) {
        self.logging = enabled;
    }

    /// Sets the working directory. Defaults to `./packing`.
    ///
    /// **Its previous contents are removed.**
    pub fn set_work_dir<P: AsRef<Path>>(&mut self, work_dir: P) {
        self.work_dir = Some(work_dir.as_ref().to_path_buf());
    }

    pub fn set_attachments<P: AsRef<Path>>(&mut self, attachments: P) {
        self.attachments = Some(attachments.as_ref().to_path_buf());
    }

    /// Sets the readme build stamp: `label` followed by the build time at the given UTC offset.
    pub fn set_stamp(&mut self, label: &str, utc_offset_hours: i32) {
        self.stamp_label = label.to_owned();
        self.utc_offset_hours = utc_offset_hours;
    }

    fn write_datapacks(
        &self,
        world_dir: &Path,
        mapping: &TextMapping,
        results: &mut WriteResults,
    ) -> Result<(), Error> {
        for datapack in find_datapacks(world_dir) {
            if self.logging {
                info!("{PROCESSING_DATAPACK_MSG} {}", datapack.display());
            }

            let changed = rewrite_datapack(&datapack, mapping).inspect_err(
                |err| error!("{FAILED_DATAPACK_MSG} {}: {err}", datapack.display()),
            )?;

            results.datapacks_rewritten += 1;
            results.members_changed += changed;

            if self.logging {
                info!("{UPDATED_DATAPACK_MSG} {}", datapack.display());
            }
        }

        Ok(())
    }

    /// Applies the mapping at `mapping_path` to the export archive at `export_path`, and packages the result to `output_path`.
    ///
    /// The mapping is loaded first, and its absence is an error. The working directory is removed once the package is written.
    ///
    /// # Example
    /// ```compile_fail
    /// writer.write("./download/World.zip", "./mapping.json", "./World_translated.zip")?;
    /// ```
    pub fn write<P: AsRef<Path>>(
        &self,
        export_path: P,
        mapping_path: P,
        output_path: P,
    ) -> Result<WriteResults, Error> {
        let export_path = export_path.as_ref();
        let output_path = output_path.as_ref();

        let mapping = TextMapping::load(mapping_path)?;

        let work_dir = self
            .work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));

        if work_dir.exists() {
            remove_dir_all(&work_dir)
                .map_err(|err| Error::Io(work_dir.clone(), err))?;
        }

        unpack_export(export_path, &work_dir)?;

        if self.logging {
            info!("{UNPACKED_EXPORT_MSG} {}", work_dir.display());
        }

        let world_dir = locate_world(&work_dir)?;
        let mut results = WriteResults::default();

        if self.source_flags.contains(SourceFlags::Datapacks) {
            self.write_datapacks(&world_dir, &mapping, &mut results)?;
        }

        if self.source_flags.contains(SourceFlags::World) {
            results.world = Coordinator::new(|| AnvilWorld::open(&world_dir))
                .batch_size(self.batch_size)
                .logging(self.logging)
                .translate_block_entities(&mapping)?;

            if self.logging {
                info!("{TRANSLATED_WORLD_MSG}: {:?}", results.world);
            }
        }

        let stamp = build_stamp(&self.stamp_label, self.utc_offset_hours);
        assemble_package(
            &work_dir,
            output_path,
            self.attachments.as_deref(),
            &stamp,
        )?;

        if self.logging {
            info!("{PACKAGED_MSG} {}", output_path.display());
        }

        Ok(results)
    }
}

/// A builder struct for [`Writer`].
///
/// # Example
/// ```
/// use worldtext::{WriterBuilder, SourceFlags};
/// let writer = WriterBuilder::new().with_flags(SourceFlags::Datapacks).batch_size(500).build();
/// ```
#[derive(Default)]
pub struct WriterBuilder {
    writer: Writer,
}

impl WriterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SourceFlags) -> Self {
        self.writer.source_flags = flags;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.writer.batch_size = batch_size;
        self
    }

    /// Sets whether to output logs.
    ///
    /// As this crate uses `log` for logging, you should [set up logging in your program](https://docs.rs/log/latest/log/#available-logging-implementations).
    #[must_use]
    pub fn logging(mut self, enabled: bool) -> Self {
        self.writer.logging = enabled;
        self
    }

    #[must_use]
    pub fn work_dir<P: AsRef<Path>>(mut self, work_dir: P) -> Self {
        self.writer.set_work_dir(work_dir);
        self
    }

    #[must_use]
    pub fn attachments<P: AsRef<Path>>(mut self, attachments: P) -> Self {
        self.writer.set_attachments(attachments);
        self
    }

    #[must_use]
    pub fn stamp(mut self, label: &str, utc_offset_hours: i32) -> Self {
        self.writer.set_stamp(label, utc_offset_hours);
        self
    }

    /// Builds and returns the [`Writer`].
    #[must_use]
    pub fn build(self) -> Writer {
        self.writer
    }
}
