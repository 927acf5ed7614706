//! Anvil region files: a 32×32 grid of compressed chunk payloads behind a two-sector header.

use crate::{
    constants::{CHUNKS_PER_REGION, REGION_HEADER_SIZE, SECTOR_SIZE},
    nbt::{from_bytes, to_bytes, NamedTag},
    types::Error,
    world::ChunkPos,
};
use byteorder::{BigEndian, ByteOrder};
use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::{
    fs::{read, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

/// Set on the compression byte when the payload lives in a separate `.mcc` file.
const EXTERNAL_FLAG: u8 = 0x80;
/// A chunk can span at most this many sectors, since the count is stored in one byte.
const MAX_CHUNK_SECTORS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Compression {
    Gzip = 1,
    Zlib = 2,
    None = 3,
}

impl Compression {
    fn decompress(self, payload: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(payload.len() * 4);

        match self {
            Self::Gzip => GzDecoder::new(payload).read_to_end(&mut output)?,
            Self::Zlib => ZlibDecoder::new(payload).read_to_end(&mut output)?,
            Self::None => {
                output.extend_from_slice(payload);
                payload.len()
            }
        };

        Ok(output)
    }

    fn compress(self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let level = flate2::Compression::default();

        match self {
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::None => Ok(data.to_vec()),
        }
    }
}

#[derive(Debug, Clone)]
struct RawChunk {
    /// Compression byte as stored, external flag included.
    compression: u8,
    payload: Vec<u8>,
    timestamp: u32,
}

fn chunk_index(pos: ChunkPos) -> usize {
    ((pos.x & 31) + (pos.z & 31) * 32) as usize
}

fn malformed(path: &Path, message: impl Into<String>) -> Error {
    Error::MalformedRegion {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Returns the table indices of all chunks present in a region file, reading only its location table.
pub fn occupied_indices(path: &Path) -> Result<Vec<usize>, Error> {
    let file =
        File::open(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;

    let mut locations = Vec::with_capacity(SECTOR_SIZE);
    file.take(SECTOR_SIZE as u64)
        .read_to_end(&mut locations)
        .map_err(|err| Error::Io(path.to_path_buf(), err))?;

    if locations.is_empty() {
        return Ok(Vec::new());
    }

    if locations.len() < SECTOR_SIZE {
        return Err(malformed(path, "truncated location table"));
    }

    Ok(locations
        .chunks_exact(4)
        .enumerate()
        .filter(|(_, entry)| BigEndian::read_u32(entry) != 0)
        .map(|(index, _)| index)
        .collect())
}

/// An in-memory region file. Changes are only written back by [`RegionFile::save`].
pub struct RegionFile {
    path: PathBuf,
    chunks: Vec<Option<RawChunk>>,
    dirty: bool,
}

impl RegionFile {
    /// Creates an empty region that will be written to `path` on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunks: vec![None; CHUNKS_PER_REGION],
            dirty: false,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path: PathBuf = path.into();
        let bytes = read(&path).map_err(|err| Error::Io(path.clone(), err))?;

        let mut chunks = vec![None; CHUNKS_PER_REGION];

        // The game leaves empty region files behind
        if bytes.is_empty() {
            return Ok(Self {
                path,
                chunks,
                dirty: false,
            });
        }

        if bytes.len() < REGION_HEADER_SIZE {
            return Err(malformed(&path, "truncated header"));
        }

        let (locations, timestamps) =
            bytes[..REGION_HEADER_SIZE].split_at(SECTOR_SIZE);

        for (index, slot) in chunks.iter_mut().enumerate() {
            let location = BigEndian::read_u32(&locations[index * 4..]);

            if location == 0 {
                continue;
            }

            let offset = (location >> 8) as usize * SECTOR_SIZE;

            if offset < REGION_HEADER_SIZE || offset + 5 > bytes.len() {
                return Err(malformed(
                    &path,
                    format!("chunk {index} points outside of the file"),
                ));
            }

            let length = BigEndian::read_u32(&bytes[offset..]) as usize;
            let end = offset + 4 + length;

            if length == 0 || end > bytes.len() {
                return Err(malformed(
                    &path,
                    format!("chunk {index} has an invalid length {length}"),
                ));
            }

            *slot = Some(RawChunk {
                compression: bytes[offset + 4],
                payload: bytes[offset + 5..end].to_vec(),
                timestamp: BigEndian::read_u32(&timestamps[index * 4..]),
            });
        }

        Ok(Self {
            path,
            chunks,
            dirty: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Indices of present chunks, in table order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.is_some())
            .map(|(index, _)| index)
    }

    /// Decodes the chunk at `pos`, or returns [`None`] if it isn't present.
    ///
    /// LZ4-compressed and externally stored chunks yield [`Error::UnsupportedCompression`].
    pub fn read_chunk(&self, pos: ChunkPos) -> Result<Option<NamedTag>, Error> {
        let Some(raw) = &self.chunks[chunk_index(pos)] else {
            return Ok(None);
        };

        if raw.compression & EXTERNAL_FLAG != 0 {
            return Err(Error::UnsupportedCompression(raw.compression));
        }

        let compression = Compression::try_from(raw.compression)
            .map_err(|_| Error::UnsupportedCompression(raw.compression))?;

        let data = compression
            .decompress(&raw.payload)
            .map_err(|err| malformed(&self.path, format!("chunk {pos}: {err}")))?;

        from_bytes(&data).map(Some)
    }

    /// Encodes `tag` into the slot at `pos`, keeping the slot's previous compression if it had a supported one.
    pub fn write_chunk(&mut self, pos: ChunkPos, tag: &NamedTag) -> Result<(), Error> {
        let index = chunk_index(pos);

        let compression = self.chunks[index]
            .as_ref()
            .and_then(|raw| Compression::try_from(raw.compression).ok())
            .unwrap_or(Compression::Zlib);

        let payload = compression
            .compress(&to_bytes(tag)?)
            .map_err(|err| Error::Io(self.path.clone(), err))?;

        if (payload.len() + 5).div_ceil(SECTOR_SIZE) > MAX_CHUNK_SECTORS {
            return Err(Error::ChunkTooLarge(pos));
        }

        self.chunks[index] = Some(RawChunk {
            compression: compression.into(),
            payload,
            timestamp: chrono::Utc::now().timestamp() as u32,
        });
        self.dirty = true;

        Ok(())
    }

    /// Serializes the region with chunks packed back to back, in table order.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = vec![0u8; REGION_HEADER_SIZE];
        let mut sector = REGION_HEADER_SIZE / SECTOR_SIZE;

        for (index, chunk) in self.chunks.iter().enumerate() {
            let Some(raw) = chunk else {
                continue;
            };

            let start = output.len();
            let mut length = [0u8; 4];
            BigEndian::write_u32(&mut length, raw.payload.len() as u32 + 1);

            output.extend_from_slice(&length);
            output.push(raw.compression);
            output.extend_from_slice(&raw.payload);
            output.resize(output.len().next_multiple_of(SECTOR_SIZE), 0);

            let sectors = (output.len() - start) / SECTOR_SIZE;

            BigEndian::write_u32(
                &mut output[index * 4..],
                ((sector as u32) << 8) | sectors as u32,
            );
            BigEndian::write_u32(
                &mut output[SECTOR_SIZE + index * 4..],
                raw.timestamp,
            );

            sector += sectors;
        }

        output
    }

    /// Writes the region back to its path through a temporary file, if anything changed.
    pub fn save(&mut self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }

        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|err| Error::Io(parent.to_path_buf(), err))?;

        temp.write_all(&self.to_bytes())
            .map_err(|err| Error::Io(temp.path().to_path_buf(), err))?;

        temp.persist(&self.path)
            .map_err(|err| Error::Io(self.path.clone(), err.error))?;

        self.dirty = false;
        Ok(())
    }
}
