use crate::{
    constants::{
        localization::{
            SAVED_BATCH_MSG, SAVING_BATCH_MSG, TRANSLATED_BLOCK_ENTITY_MSG,
        },
        DEFAULT_BATCH_SIZE,
    },
    generic::GenericBase,
    nbt::Tag,
    types::{BlockEntityRecord, Error, TextMapping},
    world::{ChunkPos, Dimension, World},
};
use indexmap::IndexSet;
use log::info;

/// Counters reported by [`Coordinator::translate_block_entities`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TranslationStats {
    pub chunks_visited: usize,
    pub chunks_changed: usize,
    pub block_entities_changed: usize,
}

/// Replays chunk coordinates in fixed-size batches, loading a fresh world handle for every batch.
///
/// Coordinates are snapshotted up front with a separate handle, since the set of chunks may change once writes begin.
pub struct Coordinator<F> {
    load: F,
    batch_size: usize,
    logging: bool,
}

impl<W: World, F: Fn() -> Result<W, Error>> Coordinator<F> {
    pub fn new(load: F) -> Self {
        Self {
            load,
            batch_size: DEFAULT_BATCH_SIZE,
            logging: false,
        }
    }

    /// Sets the amount of chunks processed per world handle. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Enumerates every chunk of every dimension, using a handle that is dropped before returning.
    pub fn preload_chunk_coords(
        &self,
    ) -> Result<Vec<(Dimension, ChunkPos)>, Error> {
        let world = (self.load)()?;
        let mut coords = Vec::new();

        for dimension in world.dimensions() {
            for pos in world.chunk_coords(&dimension)? {
                coords.push((dimension.clone(), pos));
            }
        }

        Ok(coords)
    }

    /// Collects all block entities of the world, deduplicated and in chunk order.
    pub fn dump_block_entities(&self) -> Result<Vec<BlockEntityRecord>, Error> {
        let coords = self.preload_chunk_coords()?;
        let mut records: IndexSet<BlockEntityRecord> = IndexSet::new();

        for batch in coords.chunks(self.batch_size) {
            let mut world = (self.load)()?;

            for (dimension, pos) in batch {
                let Some(chunk) = world.chunk(dimension, *pos)? else {
                    continue;
                };

                records.extend(
                    chunk.block_entities().map(BlockEntityRecord::from_compound),
                );
            }
        }

        Ok(records.into_iter().collect())
    }

    /// Translates the text of every block entity, saving each batch before moving to the next one.
    ///
    /// A chunk is only written back if one of its block entities actually changed.
    pub fn translate_block_entities(
        &self,
        mapping: &TextMapping,
    ) -> Result<TranslationStats, Error> {
        let coords = self.preload_chunk_coords()?;
        let batch_count = coords.len().div_ceil(self.batch_size);
        let mut stats = TranslationStats::default();

        for (batch_index, batch) in coords.chunks(self.batch_size).enumerate() {
            let mut world = (self.load)()?;

            for (dimension, pos) in batch {
                let Some(mut chunk) = world.chunk(dimension, *pos)? else {
                    continue;
                };

                stats.chunks_visited += 1;

                let translated: Vec<(usize, Tag)> = chunk
                    .block_entities()
                    .enumerate()
                    .filter_map(|(index, block_entity)| {
                        let tag = Tag::Compound(block_entity.clone());
                        GenericBase::writer(mapping)
                            .translate(&tag)
                            .map(|translated| (index, translated))
                    })
                    .collect();

                if translated.is_empty() {
                    continue;
                }

                for (index, block_entity) in translated {
                    if let Tag::Compound(block_entity) = block_entity {
                        chunk.replace_block_entity(index, block_entity)?;
                        stats.block_entities_changed += 1;
                    }
                }

                world.put_chunk(dimension, *pos, &chunk)?;
                stats.chunks_changed += 1;

                if self.logging {
                    info!("{TRANSLATED_BLOCK_ENTITY_MSG} {dimension} {pos}");
                }
            }

            info!(
                "{SAVING_BATCH_MSG} {current}/{batch_count}",
                current = batch_index + 1
            );
            world.save()?;
            info!(
                "{SAVED_BATCH_MSG} {current}/{batch_count}",
                current = batch_index + 1
            );
        }

        Ok(stats)
    }
}
