//! JSON artifacts persisted between runs: the block entity dump and the text pool.
//!
//! Both are trusted on presence. Nothing checks whether they still match the world they came from.

use crate::{
    functions::read_to_string_without_bom,
    types::{BlockEntityRecord, Error, TextPool},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{create_dir_all, write},
    path::Path,
};

fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, Error> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = read_to_string_without_bom(path)
        .map_err(|err| Error::Io(path.to_path_buf(), err))?;

    Ok(Some(serde_json::from_str(&content)?))
}

fn store<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .map_err(|err| Error::Io(parent.to_path_buf(), err))?;
    }

    let content = serde_json::to_string_pretty(value)?;
    write(path, content).map_err(|err| Error::Io(path.to_path_buf(), err))
}

/// Reads a block entity dump. An absent or empty file yields [`None`].
pub fn load_block_entities(
    path: &Path,
) -> Result<Option<Vec<BlockEntityRecord>>, Error> {
    Ok(load::<Vec<BlockEntityRecord>>(path)?
        .filter(|records| !records.is_empty()))
}

pub fn store_block_entities(
    path: &Path,
    records: &[BlockEntityRecord],
) -> Result<(), Error> {
    store(path, records)
}

/// Reads a text pool. An absent file yields [`None`].
pub fn load_text_pool(path: &Path) -> Result<Option<TextPool>, Error> {
    load(path)
}

pub fn store_text_pool(path: &Path, pool: &TextPool) -> Result<(), Error> {
    store(path, pool)
}
